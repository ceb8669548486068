use crate::validate_key;
use dashmap::DashMap;
use snaplink_core::kv::{KeyValueStore, Result};
use snaplink_core::StorageError;
use tracing::trace;

/// In-memory implementation of [`KeyValueStore`] using DashMap.
///
/// An optional byte quota caps the combined size of all keys and values,
/// mirroring the limited local storage a browser gives a page. Writes that
/// would exceed it fail with [`StorageError::QuotaExceeded`] and leave the
/// previous value in place.
#[derive(Debug, Clone, Default)]
pub struct InMemoryKvStore {
    storage: DashMap<String, String>,
    quota: Option<usize>,
}

impl InMemoryKvStore {
    /// Creates a new, unbounded in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes once `quota` bytes are used.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            storage: DashMap::new(),
            quota: Some(quota),
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.storage
            .iter()
            .map(|entry| entry.key().len() + entry.value().len())
            .sum()
    }
}

impl KeyValueStore for InMemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.storage.get(key).map(|value| value.clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        if let Some(quota) = self.quota {
            let others: usize = self
                .storage
                .iter()
                .filter(|entry| entry.key() != key)
                .map(|entry| entry.key().len() + entry.value().len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        trace!(key, bytes = value.len(), "storing value in memory");
        self.storage.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}
