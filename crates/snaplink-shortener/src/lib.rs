//! URL shortener service implementation.
//!
//! This crate provides [`ShortLinkStore`], the in-memory link table backed
//! by a [`KeyValueStore`][snaplink_core::KeyValueStore], together with the
//! table persistence adapter and the store settings. Core types are
//! re-exported from `snaplink_core`.

pub mod service;
pub mod settings;
pub mod table;

pub use service::ShortLinkStore;
pub use settings::StoreSettings;
pub use snaplink_core::{
    ClickContext, LinkRecord, LinkStats, LinkStatus, LinkSummary, ShortCode, ShortenRequest,
    Shortener, ShortenerError,
};
pub use table::LinkTable;
