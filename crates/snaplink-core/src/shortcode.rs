use crate::error::ShortenerError;
use serde::{Deserialize, Serialize, Serializer};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt::Display;
use std::hash::{Hash, Hasher};

/// Shortest custom code a caller may choose.
pub const MIN_LENGTH: usize = 3;
/// Longest custom code a caller may choose.
pub const MAX_LENGTH: usize = 20;

/// Where a short code came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeOrigin {
    /// Chosen by the caller.
    Custom,
    /// Drawn by a generator.
    #[default]
    Generated,
}

/// A short code identifying a shortened URL.
///
/// Codes are case-sensitive and made of ASCII letters and digits only.
/// Caller-supplied codes go through [`ShortCode::new`]; codes produced by a
/// generator are trusted and built with [`ShortCode::generated`].
///
/// Equality, ordering and hashing look at the code text only, so a
/// `ShortCode` can be looked up by `&str` in maps and sets.
#[derive(Clone, Debug)]
pub enum ShortCode {
    /// A code drawn by a generator.
    Generated(String),
    /// A caller-supplied code.
    Custom(String),
}

impl ShortCode {
    /// Wraps a code produced by a generator, without validation.
    pub fn generated(code: impl Into<String>) -> Self {
        Self::Generated(code.into())
    }

    /// Creates a new custom `ShortCode` after validating the input.
    ///
    /// The alphabet is checked before the length, so `"a b"` reports
    /// [`ShortenerError::InvalidFormat`] and `"ab"` reports
    /// [`ShortenerError::InvalidLength`].
    pub fn new(code: impl Into<String>) -> Result<Self, ShortenerError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(Self::Custom(code))
    }

    /// Creates a custom `ShortCode` without validation.
    ///
    /// Use this only for codes produced by trusted internal sources.
    pub fn new_unchecked(code: impl Into<String>) -> Self {
        Self::Custom(code.into())
    }

    /// Rebuilds a code of a known origin, validating the text.
    pub fn with_origin(
        origin: CodeOrigin,
        code: impl Into<String>,
    ) -> Result<Self, ShortenerError> {
        let code = code.into();
        Self::validate(&code)?;
        Ok(match origin {
            CodeOrigin::Custom => Self::Custom(code),
            CodeOrigin::Generated => Self::Generated(code),
        })
    }

    pub fn origin(&self) -> CodeOrigin {
        match self {
            ShortCode::Generated(_) => CodeOrigin::Generated,
            ShortCode::Custom(_) => CodeOrigin::Custom,
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, ShortCode::Custom(_))
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            ShortCode::Generated(code) | ShortCode::Custom(code) => code.as_str(),
        }
    }

    fn validate(code: &str) -> Result<(), ShortenerError> {
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ShortenerError::InvalidFormat(code.to_string()));
        }

        if code.len() < MIN_LENGTH || code.len() > MAX_LENGTH {
            return Err(ShortenerError::InvalidLength {
                length: code.len(),
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }

        Ok(())
    }
}

impl PartialEq for ShortCode {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ShortCode {}

impl PartialOrd for ShortCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ShortCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_str().cmp(other.as_str())
    }
}

impl Hash for ShortCode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl Borrow<str> for ShortCode {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl Serialize for ShortCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
