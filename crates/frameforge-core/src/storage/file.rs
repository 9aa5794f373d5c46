//! One file per key under a base directory.

use super::{Storage, StorageError, StorageResult};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each key as `<key>.json`. Characters outside `[A-Za-z0-9_-]`
/// become `_` in the file name.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Create a file storage rooted at `base_path`, creating the directory if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Cannot create {}: {}", base_path.display(), e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create file storage in the platform data directory.
    ///
    /// On Unix: `~/.local/share/frameforge/state/`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("No data directory on this platform".to_string()))?;
        Self::new(base.join("frameforge").join("state"))
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| match c {
                'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' => c,
                _ => '_',
            })
            .collect();
        self.base_path.join(format!("{}.json", safe))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

impl Storage for FileStorage {
    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.key_path(key);
        fs::write(&path, value)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to remove {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{TempDir, tempdir};

    fn store() -> (TempDir, FileStorage) {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf()).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_save_writes_json_file() {
        let (dir, storage) = store();
        storage.save("canvasState", "[]").unwrap();
        assert_eq!(storage.load("canvasState").unwrap().as_deref(), Some("[]"));
        assert!(dir.path().join("canvasState.json").exists());
    }

    #[test]
    fn test_missing_key_is_none() {
        let (_dir, storage) = store();
        assert!(storage.load("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_clear_is_idempotent() {
        let (_dir, storage) = store();
        storage.save("state", "{}").unwrap();
        storage.clear("state").unwrap();
        assert!(storage.load("state").unwrap().is_none());
        storage.clear("state").unwrap();
    }

    #[test]
    fn test_key_is_sanitized() {
        let (dir, storage) = store();
        storage.save("a/b:c*d", "x").unwrap();
        assert_eq!(storage.load("a/b:c*d").unwrap().as_deref(), Some("x"));
        assert!(dir.path().join("a_b_c_d.json").exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("deep").join("store");
        let storage = FileStorage::new(nested.clone()).unwrap();
        assert_eq!(storage.base_path(), nested.as_path());
        assert!(nested.exists());
    }
}
