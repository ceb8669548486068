use jiff::tz::TimeZone;
use snaplink_core::shortcode::MAX_LENGTH;
use typed_builder::TypedBuilder;

/// Length of a freshly generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;
/// Draws per code length before the length is widened.
pub const DEFAULT_MAX_ATTEMPTS: usize = 32;
/// Generated codes never widen past this length.
pub const MAX_GENERATED_LENGTH: usize = MAX_LENGTH;
/// Origin prefixed to short codes when building short URLs.
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Tunables of a [`ShortLinkStore`][crate::ShortLinkStore].
#[derive(Debug, Clone, TypedBuilder)]
pub struct StoreSettings {
    /// Length of generated codes before any widening.
    #[builder(default = DEFAULT_CODE_LENGTH)]
    pub code_length: usize,
    /// Collisions tolerated at one length before trying a longer code.
    #[builder(default = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: usize,
    /// Origin used by [`ShortLinkStore::short_url`][crate::ShortLinkStore::short_url].
    #[builder(default = DEFAULT_BASE_URL.to_string(), setter(into))]
    pub base_url: String,
    /// Zone whose wall clock defines the hour and day buckets of click stats.
    #[builder(default = TimeZone::system())]
    pub time_zone: TimeZone,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}
