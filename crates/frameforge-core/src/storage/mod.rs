//! Persistence port for serialized canvas state.
//!
//! Backends are simple string key/value stores. Callers treat writes as
//! fire-and-forget: a failed save is logged, never surfaced to the user.

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Key under which the history log is stored.
pub const CANVAS_STATE_KEY: &str = "canvasState";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A durable key/value store. Last write wins.
pub trait Storage: Send + Sync {
    /// Store `value` under `key`, replacing any previous value.
    fn save(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Fetch the value stored under `key`, if any.
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    /// Remove `key`. Removing a missing key is not an error.
    fn clear(&self, key: &str) -> StorageResult<()>;
}
