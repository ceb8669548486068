use crate::error::Result;
use crate::record::{ClickContext, LinkRecord, DEFAULT_VALIDITY_MINUTES};
use crate::stats::{LinkStats, LinkStatus, LinkSummary};
use typed_builder::TypedBuilder;

/// Parameters for creating a shortened URL.
#[derive(Debug, Clone, PartialEq, Eq, TypedBuilder)]
pub struct ShortenRequest {
    /// The original URL to be shortened.
    #[builder(setter(into))]
    pub original_url: String,
    /// Optional caller-chosen short code, used verbatim when valid.
    #[builder(default, setter(into))]
    pub custom_code: Option<String>,
    /// Minutes until the link stops resolving.
    #[builder(default = DEFAULT_VALIDITY_MINUTES)]
    pub validity_minutes: u32,
}

/// The operations a URL shortener exposes to its callers.
///
/// `resolve` and `get` report both unknown and expired codes as `None`;
/// callers that need to tell them apart ask [`Shortener::status`].
pub trait Shortener: Send + Sync + 'static {
    /// Creates a shortened URL and returns the stored record.
    fn shorten(&self, request: ShortenRequest) -> Result<LinkRecord>;

    /// Returns the destination of a live code and records the click.
    fn resolve(&self, code: &str, context: ClickContext) -> Option<String>;

    /// Looks up a live code without recording a click.
    fn get(&self, code: &str) -> Option<LinkRecord>;

    /// Every stored link, expired ones included.
    fn list_all(&self) -> Vec<LinkSummary>;

    /// Detailed statistics for a code, whether expired or not.
    fn stats_for(&self, code: &str) -> Option<LinkStats>;

    /// Whether a code is live, expired, or unknown.
    fn status(&self, code: &str) -> LinkStatus;
}
