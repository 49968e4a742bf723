use std::fs;
use std::path::{Path, PathBuf};

use crate::error::MediaError;
use crate::traits::MediaStore;

/// FileStore is a MediaStore backed by the local filesystem.
///
/// Keys map to paths under `base_dir`; stored media is served under
/// `public_base`, so `videos/intro.mp4` becomes
/// `{public_base}/videos/intro.mp4`. Parent directories are created
/// automatically on `store`.
pub struct FileStore {
    base_dir: PathBuf,
    public_base: String,
}

impl FileStore {
    /// Create a new FileStore rooted at `base_dir`, serving under
    /// `public_base` (e.g. `http://localhost:8080/media`).
    /// The directory is created if it doesn't exist.
    pub fn open(base_dir: &Path, public_base: &str) -> Result<Self, MediaError> {
        fs::create_dir_all(base_dir).map_err(|e| MediaError::Io(e.to_string()))?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    /// Resolve a key to a filesystem path. Rejects keys that escape base_dir.
    fn resolve(&self, key: &str) -> Result<PathBuf, MediaError> {
        if key.is_empty() || key.starts_with('/') || key.starts_with('\\') {
            return Err(MediaError::InvalidKey(key.to_string()));
        }
        for component in key.split('/') {
            if component.is_empty() || component == "." || component == ".." {
                return Err(MediaError::InvalidKey(key.to_string()));
            }
        }
        Ok(self.base_dir.join(key))
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.public_base, key)
    }
}

impl MediaStore for FileStore {
    fn store(&self, key: &str, data: &[u8]) -> Result<String, MediaError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| MediaError::Io(e.to_string()))?;
        }
        fs::write(&path, data).map_err(|e| MediaError::Io(e.to_string()))?;
        Ok(self.url_for(key))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, MediaError> {
        let path = self.resolve(key)?;
        match fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }

    fn delete(&self, key: &str) -> Result<(), MediaError> {
        let path = self.resolve(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediaError::Io(e.to_string())),
        }
    }

    fn exists(&self, key: &str) -> Result<bool, MediaError> {
        Ok(self.resolve(key)?.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (tempfile::TempDir, FileStore) {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path(), "http://localhost:8080/media/").unwrap();
        (tmp, store)
    }

    #[test]
    fn test_store_returns_public_url() {
        let (_tmp, store) = open_store();
        let url = store.store("videos/lectures/intro.mp4", b"bytes").unwrap();
        assert_eq!(url, "http://localhost:8080/media/videos/lectures/intro.mp4");
        assert!(store.exists("videos/lectures/intro.mp4").unwrap());
        assert_eq!(store.get("videos/lectures/intro.mp4").unwrap().unwrap(), b"bytes");
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_tmp, store) = open_store();
        store.store("a/b.mp4", b"x").unwrap();
        store.delete("a/b.mp4").unwrap();
        store.delete("a/b.mp4").unwrap();
        assert!(!store.exists("a/b.mp4").unwrap());
    }

    #[test]
    fn test_rejects_traversal() {
        let (_tmp, store) = open_store();
        assert!(matches!(
            store.store("../escape.mp4", b"x"),
            Err(MediaError::InvalidKey(_))
        ));
        assert!(matches!(store.get("/abs"), Err(MediaError::InvalidKey(_))));
        assert!(matches!(store.get(""), Err(MediaError::InvalidKey(_))));
    }
}
