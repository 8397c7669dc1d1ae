//! Key/value persistence for progress snapshots
//!
//! Values are JSON documents addressed by string keys. The session manager
//! never talks to a store directly; it goes through
//! [`ProgressStore`](crate::progress::ProgressStore).

mod file;

pub use file::JsonFileStore;

use std::collections::HashMap;

use parking_lot::RwLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

pub trait StateStore: Send + Sync {
    fn load(&self, key: &str) -> StorageResult<Option<String>>;

    fn save(&self, key: &str, json: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}

// ============================================================
// MemoryStore
// ============================================================

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.read().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl StateStore for MemoryStore {
    fn load(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn save(&self, key: &str, json: &str) -> StorageResult<()> {
        self.entries.write().insert(key.to_string(), json.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(store.load("a").unwrap(), None);
        store.save("a", "{\"x\":1}").unwrap();
        assert_eq!(store.load("a").unwrap().as_deref(), Some("{\"x\":1}"));
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }
}
