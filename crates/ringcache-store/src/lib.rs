//! Node storage trait and the in-memory backend.
//!
//! This crate defines the [`NodeStore`] trait: the exact-match key-value map
//! each cache node keeps. [`MemoryStore`] is the only backend, an in-memory
//! map behind a `RwLock`.

mod memory_store;
mod traits;

pub use memory_store::MemoryStore;
pub use traits::NodeStore;
