use maritime_types::SchemaError;

/// Errors from the key-value side of the store (fleet/track hashes and id sets).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store connection error: {0}")]
    Connection(#[from] redis::RedisError),
    #[error("store entry {key} missing required field {field}")]
    MissingField { key: String, field: String },
}

/// Errors from the append-only stream side of the store (the observation bus).
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("bus connection error: {0}")]
    Connection(#[from] redis::RedisError),
    #[error("malformed message on {0}")]
    Schema(#[from] SchemaError),
}

impl StoreError {
    /// Transient I/O errors are the only ones the caller should treat as
    /// retryable-after-backoff rather than fatal or poison-message.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Connection(e) if e.is_timeout() || e.is_io_error())
    }
}

impl BusError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BusError::Connection(e) if e.is_timeout() || e.is_io_error())
    }
}
