//! Error types for the credential storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by credential storage primitives.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Errors coming from a backing key/value store.
    #[error("store error: {0}")]
    Backend(String),

    /// Serialization/deserialization failures for stored snapshots.
    #[error("serialization error: {0}")]
    Serialization(String),
}
