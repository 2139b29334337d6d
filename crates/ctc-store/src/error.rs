/// Errors from key-value and blob store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A stored value could not be decoded as the requested record type.
    #[error("corrupt record {key}: {reason}")]
    Corrupt { key: String, reason: String },

    /// A record could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An in-memory backend's lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),

    /// A directory backend found a file name that is not an encoded key.
    #[error("invalid key encoding: {0}")]
    InvalidKey(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
