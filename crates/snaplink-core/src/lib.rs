//! Core types and traits for the Snaplink URL shortener.
//!
//! This crate provides the domain model shared by the generator, the
//! storage backends and the shortener service: validated short codes,
//! link records with their click history, the statistics views, and the
//! clock and key-value seams the service is built on.

pub mod clock;
pub mod error;
pub mod kv;
pub mod record;
pub mod shortcode;
pub mod shortener;
pub mod stats;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, ShortenerError, StorageError};
pub use kv::KeyValueStore;
pub use record::{ClickContext, ClickEvent, LinkRecord};
pub use shortcode::{CodeOrigin, ShortCode};
pub use shortener::{ShortenRequest, Shortener};
pub use stats::{DailyClicks, HourlyClicks, LinkStats, LinkStatus, LinkSummary};
