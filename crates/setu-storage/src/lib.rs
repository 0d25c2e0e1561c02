//! Storage backend abstraction for the Setu eSign client.
//!
//! This crate defines the [`StorageBackend`] trait — a small key-value
//! interface that knows nothing about credentials or the signing API. The
//! credential store in `setu-core` wraps a backend and owns the record format.
//!
//! Two implementations are provided:
//!
//! - [`FileBackend`] — one file per key inside a per-user directory
//! - [`MemoryBackend`] — in-memory, for tests and embedding

mod error;
mod file;
mod memory;

pub use error::StorageError;
pub use file::FileBackend;
pub use memory::MemoryBackend;

/// A pluggable key-value storage backend.
///
/// Keys are short UTF-8 identifiers (e.g. `setuCredentials`). Values are
/// opaque byte arrays; callers decide the encoding.
///
/// Implementations must be safe to share across async tasks (`Send + Sync`).
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync + 'static {
    /// Retrieve a value by key.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store a key-value pair, overwriting any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Write`] if the underlying backend fails, or
    /// [`StorageError::Unavailable`] if the backend cannot accept writes.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. This is idempotent — deleting a non-existent key is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Delete`] if the underlying backend fails.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists in storage.
    ///
    /// The default implementation calls [`get`](StorageBackend::get) and checks
    /// for `Some`. Backends may override this with a cheaper check.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Read`] if the underlying backend fails.
    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Capability check: whether the backend can currently be used at all.
    ///
    /// Callers that treat missing storage as "nothing stored" consult this
    /// before reading instead of probing the platform themselves.
    async fn is_available(&self) -> bool {
        true
    }
}
