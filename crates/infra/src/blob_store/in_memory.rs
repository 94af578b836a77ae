use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::blob_store::{validate_key, BlobStore};
use crate::error::PersistenceError;

/// In-memory blob store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    inner: RwLock<BTreeMap<String, String>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with blobs, e.g. data left behind by older versions.
    pub fn with_blobs<K, V>(blobs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            inner: RwLock::new(
                blobs
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}

fn poisoned() -> PersistenceError {
    PersistenceError::Unavailable("in-memory blob store lock poisoned".to_string())
}

impl BlobStore for InMemoryBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        validate_key(key)?;
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        map.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.keys().cloned().collect())
    }
}
