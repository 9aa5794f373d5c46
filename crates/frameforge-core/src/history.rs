//! Undo/redo log of whole-tree snapshots.
//!
//! The log is linear: committing after an undo discards the redo branch.
//! Scopes coalesce the intermediate commits of one interaction into a single
//! entry.

use crate::shapes::Node;
use crate::storage::{CANVAS_STATE_KEY, Storage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Default maximum number of entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Label of the entry recorded when a manager is created.
pub const INITIAL_STATE_LABEL: &str = "Initial State";

/// An immutable snapshot of the whole node list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub label: String,
    pub nodes: Vec<Node>,
}

/// Bounded, branch-discarding history with scoped commits.
pub struct HistoryManager {
    entries: Vec<HistoryEntry>,
    cursor: usize,
    capacity: usize,
    scope_depth: usize,
    pending: Option<HistoryEntry>,
    storage: Option<Arc<dyn Storage>>,
    key: String,
}

impl fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("entries", &self.entries.len())
            .field("cursor", &self.cursor)
            .field("capacity", &self.capacity)
            .field("scope_depth", &self.scope_depth)
            .field("persistent", &self.storage.is_some())
            .finish()
    }
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(&[], DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryManager {
    /// Create a manager whose first entry is `initial`.
    pub fn new(initial: &[Node], capacity: usize) -> Self {
        Self {
            entries: vec![HistoryEntry {
                label: INITIAL_STATE_LABEL.to_string(),
                nodes: initial.to_vec(),
            }],
            cursor: 0,
            capacity: capacity.max(1),
            scope_depth: 0,
            pending: None,
            storage: None,
            key: CANVAS_STATE_KEY.to_string(),
        }
    }

    /// Persist the log to `storage` after every commit.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Override the storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Record `nodes` as a new entry.
    ///
    /// Inside a scope the snapshot only replaces the pending state; it is
    /// appended when the outermost scope ends.
    pub fn commit(&mut self, nodes: &[Node], label: impl Into<String>) {
        let entry = HistoryEntry {
            label: label.into(),
            nodes: nodes.to_vec(),
        };
        if self.scope_depth > 0 {
            self.pending = Some(entry);
            return;
        }
        self.push(entry);
    }

    /// Open a scope. Scopes nest; only the outermost one commits.
    pub fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    /// Close a scope, appending the last pending snapshot under `label`.
    ///
    /// Returns `true` if an entry was appended.
    pub fn end_scope(&mut self, label: impl Into<String>) -> bool {
        if self.scope_depth == 0 {
            return false;
        }
        self.scope_depth -= 1;
        if self.scope_depth > 0 {
            return false;
        }
        match self.pending.take() {
            Some(mut entry) => {
                entry.label = label.into();
                self.push(entry);
                true
            }
            None => false,
        }
    }

    /// Drop any open scopes and their pending snapshot.
    pub fn cancel_scope(&mut self) {
        self.scope_depth = 0;
        self.pending = None;
    }

    pub fn in_scope(&self) -> bool {
        self.scope_depth > 0
    }

    fn push(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor + 1);
        log::debug!("History commit '{}'", entry.label);
        self.entries.push(entry);
        self.cursor = self.entries.len() - 1;
        if self.entries.len() > self.capacity {
            self.entries.remove(0);
            self.cursor -= 1;
        }
        self.persist();
    }

    /// Step back one entry and return a copy of its snapshot.
    pub fn undo(&mut self) -> Option<Vec<Node>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        Some(self.entries[self.cursor].nodes.clone())
    }

    /// Step forward one entry and return a copy of its snapshot.
    pub fn redo(&mut self) -> Option<Vec<Node>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        Some(self.entries[self.cursor].nodes.clone())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// Number of entries, including the initial one.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The entry the cursor points at.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.cursor)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }

    fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let result = serde_json::to_string(&self.entries)
            .map_err(|e| e.to_string())
            .and_then(|json| storage.save(&self.key, &json).map_err(|e| e.to_string()));
        if let Err(e) = result {
            log::warn!("Failed to persist history: {}", e);
        }
    }

    /// Restore the log from storage and return the newest snapshot.
    ///
    /// Returns `None` (leaving the log untouched) when there is no storage,
    /// nothing stored, or the stored data cannot be read.
    pub fn load(&mut self) -> Option<Vec<Node>> {
        let storage = self.storage.as_ref()?;
        let json = match storage.load(&self.key) {
            Ok(Some(json)) => json,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Failed to load history: {}", e);
                return None;
            }
        };
        let mut entries: Vec<HistoryEntry> = match serde_json::from_str(&json) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Stored history is unreadable: {}", e);
                return None;
            }
        };
        if entries.is_empty() {
            return None;
        }
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            log::debug!("Dropping {} stored entries over capacity", excess);
            entries.drain(..excess);
        }
        log::info!("Loaded {} history entries", entries.len());
        self.entries = entries;
        self.cursor = self.entries.len() - 1;
        self.pending = None;
        self.scope_depth = 0;
        Some(self.entries[self.cursor].nodes.clone())
    }

    /// Remove the persisted log.
    pub fn clear_storage(&self) {
        if let Some(storage) = &self.storage {
            if let Err(e) = storage.clear(&self.key) {
                log::warn!("Failed to clear stored history: {}", e);
            } else {
                log::info!("Cleared stored history");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::NodeKind;
    use crate::storage::{MemoryStorage, StorageError, StorageResult};

    fn state(ids: &[&str]) -> Vec<Node> {
        ids.iter()
            .map(|id| Node::new(NodeKind::Rectangle, 0.0, 0.0, "10px", "10px").with_id(*id))
            .collect()
    }

    fn ids(nodes: &[Node]) -> Vec<&str> {
        nodes.iter().map(|n| n.id.as_str()).collect()
    }

    #[test]
    fn test_undo_walks_back_each_commit() {
        let mut history = HistoryManager::default();
        history.commit(&state(&["a"]), "add a");
        history.commit(&state(&["a", "b"]), "add b");
        history.commit(&state(&["a", "b", "c"]), "add c");

        assert_eq!(ids(&history.undo().unwrap()), vec!["a", "b"]);
        assert_eq!(ids(&history.undo().unwrap()), vec!["a"]);
        assert!(history.undo().unwrap().is_empty());
        assert!(history.undo().is_none());
    }

    #[test]
    fn test_redo_branch_is_discarded() {
        let mut history = HistoryManager::default();
        history.commit(&state(&["a"]), "A");
        history.commit(&state(&["b"]), "B");
        history.undo();
        history.commit(&state(&["c"]), "C");

        assert!(history.redo().is_none());
        assert_eq!(history.labels(), vec![INITIAL_STATE_LABEL, "A", "C"]);
        assert_eq!(ids(&history.undo().unwrap()), vec!["a"]);
        assert_eq!(ids(&history.redo().unwrap()), vec!["c"]);
    }

    #[test]
    fn test_scope_coalesces_commits() {
        let mut history = HistoryManager::default();
        history.begin_scope();
        history.commit(&state(&["a"]), "step");
        history.commit(&state(&["a", "b"]), "step");
        history.commit(&state(&["a", "b", "c"]), "step");
        assert_eq!(history.len(), 1);
        assert!(history.end_scope("drag"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.current().unwrap().label, "drag");
        assert_eq!(history.current().unwrap().nodes.len(), 3);
    }

    #[test]
    fn test_nested_scopes_commit_once() {
        let mut history = HistoryManager::default();
        history.begin_scope();
        history.begin_scope();
        history.commit(&state(&["a"]), "inner");
        assert!(!history.end_scope("inner"));
        assert_eq!(history.len(), 1);
        assert!(history.end_scope("outer"));
        assert_eq!(history.labels(), vec![INITIAL_STATE_LABEL, "outer"]);
        assert!(!history.end_scope("unbalanced"));
    }

    #[test]
    fn test_empty_scope_commits_nothing() {
        let mut history = HistoryManager::default();
        history.begin_scope();
        assert!(!history.end_scope("noop"));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut history = HistoryManager::new(&[], 3);
        for i in 0..5 {
            history.commit(&state(&[i.to_string().as_str()]), format!("c{}", i));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.cursor(), 2);
        assert_eq!(history.labels(), vec!["c2", "c3", "c4"]);
        assert_eq!(ids(&history.undo().unwrap()), vec!["3"]);
    }

    #[test]
    fn test_returned_snapshot_is_independent() {
        let mut history = HistoryManager::default();
        history.commit(&state(&["a"]), "A");
        history.commit(&state(&["b"]), "B");
        let mut snapshot = history.undo().unwrap();
        snapshot[0].x = 999.0;
        snapshot.clear();
        let again = history.redo().and_then(|_| history.undo()).unwrap();
        assert_eq!(again[0].x, 0.0);
    }

    #[test]
    fn test_persists_and_loads() {
        let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
        let mut history = HistoryManager::default().with_storage(storage.clone());
        history.commit(&state(&["a"]), "A");
        history.commit(&state(&["a", "b"]), "B");
        assert!(storage.load(CANVAS_STATE_KEY).unwrap().is_some());

        let mut restored = HistoryManager::default().with_storage(storage.clone());
        let nodes = restored.load().unwrap();
        assert_eq!(ids(&nodes), vec!["a", "b"]);
        assert_eq!(restored.len(), 3);
        assert!(restored.can_undo());
        assert!(!restored.can_redo());

        restored.clear_storage();
        assert!(storage.load(CANVAS_STATE_KEY).unwrap().is_none());
        assert!(HistoryManager::default().with_storage(storage).load().is_none());
    }

    #[test]
    fn test_load_keeps_newest_within_capacity() {
        let storage: Arc<MemoryStorage> = Arc::new(MemoryStorage::new());
        let mut history = HistoryManager::default().with_storage(storage.clone());
        for i in 0..5 {
            history.commit(&state(&[i.to_string().as_str()]), format!("c{}", i));
        }
        assert_eq!(history.len(), 6);

        let mut small = HistoryManager::new(&[], 2).with_storage(storage);
        let nodes = small.load().unwrap();
        assert_eq!(ids(&nodes), vec!["4"]);
        assert_eq!(small.labels(), vec!["c3", "c4"]);
        assert_eq!(small.cursor(), 1);
        assert_eq!(ids(&small.undo().unwrap()), vec!["3"]);
        assert!(!small.can_undo());
    }

    struct FailingStorage;

    impl Storage for FailingStorage {
        fn save(&self, _key: &str, _value: &str) -> StorageResult<()> {
            Err(StorageError::Io("disk full".into()))
        }
        fn load(&self, _key: &str) -> StorageResult<Option<String>> {
            Err(StorageError::Io("unreadable".into()))
        }
        fn clear(&self, _key: &str) -> StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_storage_failures_do_not_block_commits() {
        let mut history = HistoryManager::default().with_storage(Arc::new(FailingStorage));
        history.commit(&state(&["a"]), "A");
        assert_eq!(history.len(), 2);
        assert!(history.load().is_none());
        assert_eq!(history.len(), 2);
    }
}
