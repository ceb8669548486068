//! [`KeyValueStore`] backends for the Snaplink shortener.

pub mod file;
pub mod memory;

pub use file::FileKvStore;
pub use memory::InMemoryKvStore;
pub use snaplink_core::{KeyValueStore, StorageError};

/// Keys are used as file names, so they are restricted to a safe alphabet.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
