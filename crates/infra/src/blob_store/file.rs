use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use crate::blob_store::{validate_key, BlobStore};
use crate::error::PersistenceError;

const BLOB_EXTENSION: &str = "json";
const TMP_SUFFIX: &str = "tmp";

/// Filesystem-backed blob store: one `<key>.json` file per key in a directory.
///
/// Saves write a sibling temp file and rename it over the target, so a crash
/// mid-write leaves the previous blob intact.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{BLOB_EXTENSION}"))
    }
}

impl BlobStore for FileBlobStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        validate_key(key)?;
        match fs::read_to_string(self.blob_path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn save(&self, key: &str, blob: &str) -> Result<(), PersistenceError> {
        validate_key(key)?;
        let path = self.blob_path(key);
        let tmp = path.with_extension(format!("{BLOB_EXTENSION}.{TMP_SUFFIX}"));
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(blob.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &path)?;
        tracing::debug!(key, path = %path.display(), bytes = blob.len(), "blob saved");
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PersistenceError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_blobs_and_lists_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path().join("data")).unwrap();

        assert_eq!(store.load("inventory").unwrap(), None);
        store.save("inventory", "{\"a\":1}").unwrap();
        store.save("inventory", "{\"a\":2}").unwrap();
        store.save("backup", "{}").unwrap();

        assert_eq!(store.load("inventory").unwrap().as_deref(), Some("{\"a\":2}"));
        assert_eq!(store.keys().unwrap(), vec!["backup".to_string(), "inventory".to_string()]);
        assert!(!store.blob_path("inventory").with_extension("json.tmp").exists());
    }

    #[test]
    fn rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileBlobStore::new(dir.path()).unwrap();
        assert!(matches!(
            store.save("../escape", "x"),
            Err(PersistenceError::InvalidKey(_))
        ));
    }
}
