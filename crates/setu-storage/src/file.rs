//! File-per-key storage backend.
//!
//! Each key maps to `<dir>/<key>.json`. Writes go to a sibling temp file that
//! is renamed over the target, so a reader never sees a half-written record.
//! On Unix the temp file is created owner-only (0600) since records hold API
//! secrets, and it is removed again if the write does not complete.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::{StorageBackend, StorageError};

/// A storage backend that keeps each value in its own file.
///
/// The directory is created lazily on the first write.
///
/// # Examples
///
/// ```no_run
/// # use setu_storage::FileBackend;
/// let backend = FileBackend::new("/home/me/.setu-esign");
/// ```
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Create a backend rooted at `dir`. Nothing is touched on disk yet.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Return the directory this backend stores files in.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Return the file path a key is stored under.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] if the key is empty or would
    /// escape the storage directory.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let invalid = key.is_empty()
            || key == "."
            || key == ".."
            || key.contains(['/', '\\', '\0']);
        if invalid {
            return Err(StorageError::InvalidKey {
                key: key.to_owned(),
            });
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn unavailable(&self, reason: impl Into<String>) -> StorageError {
        StorageError::Unavailable {
            location: self.dir.display().to_string(),
            reason: reason.into(),
        }
    }
}

#[async_trait::async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read {
                key: key.to_owned(),
                reason: e.to_string(),
            }),
        }
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if !self.is_available().await {
            return Err(self.unavailable("not a directory"));
        }
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| self.unavailable(e.to_string()))?;

        let write_err = |e: std::io::Error| StorageError::Write {
            key: key.to_owned(),
            reason: e.to_string(),
        };

        let tmp = path.with_extension("json.tmp");
        // A leftover temp file may carry older permissions.
        match tokio::fs::remove_file(&tmp).await {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(write_err(e)),
            _ => {}
        }

        let written = match write_private(&tmp, value).await {
            Ok(()) => tokio::fs::rename(&tmp, &path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = written {
            match tokio::fs::remove_file(&tmp).await {
                Err(cleanup) if cleanup.kind() != ErrorKind::NotFound => {
                    warn!(path = %tmp.display(), error = %cleanup, "failed to remove temp record");
                }
                _ => {}
            }
            return Err(write_err(e));
        }
        debug!(path = %path.display(), bytes = value.len(), "stored record");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(path = %path.display(), "removed record");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Delete {
                key: key.to_owned(),
                reason: e.to_string(),
            }),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| StorageError::Read {
                key: key.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Available when the directory exists as a directory, or does not exist
    /// yet (it is created on the first write).
    async fn is_available(&self) -> bool {
        match tokio::fs::metadata(&self.dir).await {
            Ok(meta) => meta.is_dir(),
            Err(e) => e.kind() == ErrorKind::NotFound,
        }
    }
}

/// Write `value` to a new file that only the owner can read.
async fn write_private(path: &Path, value: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(value).await?;
    file.sync_all().await
}
