//! In-memory node storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::trace;

use crate::traits::NodeStore;

/// In-memory store backed by a `RwLock<HashMap>`.
///
/// Readers share the lock; `put` and `delete` take it exclusively for the
/// duration of a single map operation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Bytes>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for MemoryStore {
    fn put(&self, key: String, value: Bytes) -> Option<Bytes> {
        let mut map = self.entries.write().expect("lock poisoned");
        trace!(%key, size = value.len(), "storing entry in memory");
        map.insert(key, value)
    }

    fn get(&self, key: &str) -> Option<Bytes> {
        let map = self.entries.read().expect("lock poisoned");
        map.get(key).cloned()
    }

    fn delete(&self, key: &str) -> Option<Bytes> {
        let mut map = self.entries.write().expect("lock poisoned");
        let removed = map.remove(key);
        if removed.is_some() {
            trace!(%key, "deleted entry from memory");
        }
        removed
    }

    fn keys(&self) -> Vec<String> {
        let map = self.entries.read().expect("lock poisoned");
        map.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }
}
