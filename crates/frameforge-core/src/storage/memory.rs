//! Process-local storage.

use super::{Storage, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::RwLock;

/// A `HashMap` behind a lock. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn save(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        Ok(entries.get(key).cloned())
    }

    fn clear(&self, key: &str) -> StorageResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| StorageError::Other(format!("Lock error: {}", e)))?;
        entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let storage = MemoryStorage::new();
        storage.save("state", "[1,2,3]").unwrap();
        assert_eq!(storage.load("state").unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_missing_key_is_none() {
        let storage = MemoryStorage::new();
        assert!(storage.load("nonexistent").unwrap().is_none());
    }

    #[test]
    fn test_last_write_wins() {
        let storage = MemoryStorage::new();
        storage.save("state", "a").unwrap();
        storage.save("state", "b").unwrap();
        assert_eq!(storage.load("state").unwrap().as_deref(), Some("b"));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn test_clear() {
        let storage = MemoryStorage::new();
        storage.save("state", "a").unwrap();
        storage.clear("state").unwrap();
        storage.clear("state").unwrap();
        assert!(storage.is_empty());
    }
}
