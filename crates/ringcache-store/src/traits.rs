//! Core trait for node storage.

use bytes::Bytes;

/// Exact-match key-value store held by one cache node.
///
/// All implementations must be `Send + Sync`: a store is shared between the
/// directory and concurrent readers. Operations are infallible; stores hold
/// data in memory and have no eviction policy.
///
/// Values are passed as [`Bytes`] so moving an entry between stores during a
/// migration does not copy its payload.
pub trait NodeStore: Send + Sync {
    /// Insert or replace a value. Returns the previous value, if any.
    fn put(&self, key: String, value: Bytes) -> Option<Bytes>;

    /// Retrieve a value. Returns `None` if not found.
    fn get(&self, key: &str) -> Option<Bytes>;

    /// Remove a value, returning it if it was present.
    fn delete(&self, key: &str) -> Option<Bytes>;

    /// List all stored keys.
    fn keys(&self) -> Vec<String>;

    /// Number of stored keys.
    fn len(&self) -> usize;

    /// Whether the store holds no keys.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
