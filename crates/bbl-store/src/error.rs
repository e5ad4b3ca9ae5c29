use bbl_types::MediaKey;

/// Errors from binary object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing storage cannot be read or written (missing, full,
    /// permission denied, switched off).
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A record's metadata could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The record exists but its parts disagree.
    #[error("corrupt record {key}: {reason}")]
    CorruptRecord { key: MediaKey, reason: String },
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::StorageUnavailable(e.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
