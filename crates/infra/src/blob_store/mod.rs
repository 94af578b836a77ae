//! Key/value blob storage: the only contract the ledger store needs from
//! persistence. A save replaces the whole blob under its key.

pub mod file;
pub mod in_memory;

use std::sync::Arc;

use crate::error::PersistenceError;

pub use file::FileBlobStore;
pub use in_memory::InMemoryBlobStore;

pub trait BlobStore: Send + Sync {
    /// Blob stored under `key`, or `None` if nothing was ever saved there.
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Atomically replace the blob under `key`.
    fn save(&self, key: &str, blob: &str) -> Result<(), PersistenceError>;

    /// Every key currently holding a blob (recovery scans).
    fn keys(&self) -> Result<Vec<String>, PersistenceError>;
}

impl<S> BlobStore for Arc<S>
where
    S: BlobStore + ?Sized,
{
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        (**self).save(key, blob)
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        (**self).keys()
    }
}

/// Keys double as file names in [`FileBlobStore`], so they are restricted to
/// a portable character set.
pub(crate) fn validate_key(key: &str) -> Result<(), PersistenceError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(PersistenceError::InvalidKey(key.to_string()))
    }
}
