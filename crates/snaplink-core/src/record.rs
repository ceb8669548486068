use crate::error::{Result, ShortenerError};
use crate::shortcode::{CodeOrigin, ShortCode};
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize, Serializer};
use url::Url;

/// Shortest allowed validity period, in minutes.
pub const MIN_VALIDITY_MINUTES: u32 = 1;
/// Longest allowed validity period (one week), in minutes.
pub const MAX_VALIDITY_MINUTES: u32 = 10_080;
/// Validity used when the caller does not pick one.
pub const DEFAULT_VALIDITY_MINUTES: u32 = 30;

/// Returns `true` if `url` is an absolute URL with a scheme and an authority.
///
/// No network access is performed.
pub fn validate_url(url: &str) -> bool {
    Url::parse(url).is_ok_and(|parsed| parsed.has_host())
}

/// Checks that `minutes` lies within the accepted validity window.
pub fn validate_validity(minutes: u32) -> Result<()> {
    if !(MIN_VALIDITY_MINUTES..=MAX_VALIDITY_MINUTES).contains(&minutes) {
        return Err(ShortenerError::InvalidValidityPeriod {
            minutes,
            min: MIN_VALIDITY_MINUTES,
            max: MAX_VALIDITY_MINUTES,
        });
    }
    Ok(())
}

/// A single recorded access to a short code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickEvent {
    pub timestamp: Timestamp,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

/// Request details the caller knows about a click.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickContext {
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

impl ClickContext {
    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Stamps this context with the time of the click.
    pub fn into_event(self, timestamp: Timestamp) -> ClickEvent {
        ClickEvent {
            timestamp,
            referrer: self.referrer,
            user_agent: self.user_agent,
        }
    }
}

/// A shortened link together with its click history.
///
/// Everything except the click counter and history is fixed at creation.
/// The counter only moves through [`LinkRecord::record_click`], which keeps
/// it equal to the history length. Deserialization re-checks the code, the
/// URL, the validity period and the counter, so a stored record obeys the
/// same rules as a fresh one.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "StoredLinkRecord")]
pub struct LinkRecord {
    original_url: String,
    short_code: ShortCode,
    created_at: Timestamp,
    expires_at: Timestamp,
    validity_minutes: u32,
    clicks: u64,
    click_history: Vec<ClickEvent>,
}

/// Wire form of a [`LinkRecord`] as written to storage.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WireLinkRecord<'a> {
    original_url: &'a str,
    short_code: &'a str,
    code_origin: CodeOrigin,
    created_at: Timestamp,
    #[serde(rename = "expiryTime")]
    expires_at: Timestamp,
    validity_minutes: u32,
    clicks: u64,
    click_history: &'a [ClickEvent],
}

/// Unchecked wire form of a [`LinkRecord`] as read from storage.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredLinkRecord {
    original_url: String,
    short_code: String,
    #[serde(default)]
    code_origin: CodeOrigin,
    created_at: Timestamp,
    #[serde(rename = "expiryTime")]
    expires_at: Timestamp,
    validity_minutes: u32,
    #[serde(default)]
    clicks: u64,
    #[serde(default)]
    click_history: Vec<ClickEvent>,
}

impl Serialize for LinkRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        WireLinkRecord {
            original_url: &self.original_url,
            short_code: self.short_code.as_str(),
            code_origin: self.short_code.origin(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            validity_minutes: self.validity_minutes,
            clicks: self.clicks,
            click_history: &self.click_history,
        }
        .serialize(serializer)
    }
}

impl TryFrom<StoredLinkRecord> for LinkRecord {
    type Error = ShortenerError;

    fn try_from(stored: StoredLinkRecord) -> Result<Self> {
        let short_code = ShortCode::with_origin(stored.code_origin, stored.short_code)?;
        if !validate_url(&stored.original_url) {
            return Err(ShortenerError::InvalidUrl(stored.original_url));
        }
        validate_validity(stored.validity_minutes)?;

        if stored.expires_at < stored.created_at {
            return Err(ShortenerError::InconsistentRecord {
                code: short_code.to_string(),
                reason: "expires before it was created".to_string(),
            });
        }
        if stored.clicks != stored.click_history.len() as u64 {
            return Err(ShortenerError::InconsistentRecord {
                code: short_code.to_string(),
                reason: format!(
                    "{} clicks but {} history entries",
                    stored.clicks,
                    stored.click_history.len()
                ),
            });
        }

        Ok(Self {
            original_url: stored.original_url,
            short_code,
            created_at: stored.created_at,
            expires_at: stored.expires_at,
            validity_minutes: stored.validity_minutes,
            clicks: stored.clicks,
            click_history: stored.click_history,
        })
    }
}

impl LinkRecord {
    /// Creates a record with no clicks, expiring `validity_minutes` after `created_at`.
    pub fn new(
        short_code: ShortCode,
        original_url: impl Into<String>,
        created_at: Timestamp,
        validity_minutes: u32,
    ) -> Result<Self> {
        let original_url = original_url.into();
        if !validate_url(&original_url) {
            return Err(ShortenerError::InvalidUrl(original_url));
        }
        validate_validity(validity_minutes)?;

        let expires_at = created_at
            .checked_add(SignedDuration::from_mins(i64::from(validity_minutes)))
            .map_err(|_| ShortenerError::InvalidValidityPeriod {
                minutes: validity_minutes,
                min: MIN_VALIDITY_MINUTES,
                max: MAX_VALIDITY_MINUTES,
            })?;

        Ok(Self {
            original_url,
            short_code,
            created_at,
            expires_at,
            validity_minutes,
            clicks: 0,
            click_history: Vec::new(),
        })
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn short_code(&self) -> &ShortCode {
        &self.short_code
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn expires_at(&self) -> Timestamp {
        self.expires_at
    }

    pub fn validity_minutes(&self) -> u32 {
        self.validity_minutes
    }

    pub fn clicks(&self) -> u64 {
        self.clicks
    }

    /// Click events, oldest first.
    pub fn click_history(&self) -> &[ClickEvent] {
        &self.click_history
    }

    /// A link is expired strictly after its expiry instant.
    pub fn is_expired_at(&self, now: Timestamp) -> bool {
        now > self.expires_at
    }

    /// Appends a click and bumps the counter.
    pub fn record_click(&mut self, event: ClickEvent) {
        self.click_history.push(event);
        self.clicks += 1;
    }
}
