//! Storage error types.
//!
//! Every variant carries the key or path involved so a failure can be
//! diagnosed from the message alone.

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The backend cannot be used (missing directory, no home, read-only).
    #[error("storage unavailable at '{location}': {reason}")]
    Unavailable { location: String, reason: String },

    /// Failed to read a value from storage.
    #[error("failed to read key '{key}': {reason}")]
    Read { key: String, reason: String },

    /// Failed to write a value to storage.
    #[error("failed to write key '{key}': {reason}")]
    Write { key: String, reason: String },

    /// Failed to delete a key from storage.
    #[error("failed to delete key '{key}': {reason}")]
    Delete { key: String, reason: String },

    /// A key cannot be mapped onto the backend (empty, path separators).
    #[error("invalid storage key '{key}'")]
    InvalidKey { key: String },
}
