use thiserror::Error;

/// Errors returned by the shortening operations.
pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("short code must contain only alphanumeric characters: '{0}'")]
    InvalidFormat(String),
    #[error("short code length must be between {min} and {max}, got {length}")]
    InvalidLength {
        length: usize,
        min: usize,
        max: usize,
    },
    #[error("short code already exists: {0}")]
    CodeTaken(String),
    #[error("validity period must be between {min} and {max} minutes, got {minutes}")]
    InvalidValidityPeriod { minutes: u32, min: u32, max: u32 },
    #[error("no free short code left up to length {max_length}")]
    CodeSpaceExhausted { max_length: usize },
    #[error("stored record for '{code}' is inconsistent: {reason}")]
    InconsistentRecord { code: String, reason: String },
}

/// Errors raised by [`KeyValueStore`][crate::kv::KeyValueStore] backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(String),
    #[error("stored value could not be (de)serialized: {0}")]
    Serialization(String),
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("invalid storage key: '{0}'")]
    InvalidKey(String),
}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}
