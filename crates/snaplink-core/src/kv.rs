use crate::error::StorageError;
use std::sync::Arc;

/// Result type for key-value operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A string-keyed durable store.
///
/// This is the only persistence seam the shortener needs: the whole link
/// table is written as one value under a fixed key and read back once at
/// startup. Implementations decide where the bytes live.
pub trait KeyValueStore: Send + Sync + 'static {
    /// Returns the value stored under `key`, or `None` if it was never set.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
