//! The cache directory: ring plus per-node stores as one unit of consistency.
//!
//! [`Directory`] is the shared structure callers route cache operations
//! through. The ring and the store registry live behind a single `RwLock`:
//!
//! - `set` / `get` / `delete` / `lookup` and the introspection calls take the
//!   lock shared. Stores have their own interior lock, so writes to different
//!   keys proceed in parallel.
//! - `add_node` / `remove_node` take the lock exclusively for the whole
//!   transaction (plan against the current ring, move keys, commit the ring
//!   change). A concurrent reader therefore never sees a key mid-transfer.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use bytes::Bytes;
use ringcache_placement::{Blake3Hasher, HashAlgorithm, Ring, TokenHasher};
use ringcache_store::{MemoryStore, NodeStore};
use ringcache_types::NodeId;
use tracing::{debug, info, warn};

use crate::config::ClusterConfig;
use crate::error::DirectoryError;
use crate::migration::{self, MigrationReport, StoreMap};

/// Builds the store for a node when it joins.
pub type StoreFactory = Arc<dyn Fn(&NodeId) -> Arc<dyn NodeStore> + Send + Sync>;

fn memory_store(_: &NodeId) -> Arc<dyn NodeStore> {
    Arc::new(MemoryStore::new())
}

/// Ring and stores, always mutated together.
///
/// Every node on the ring has an entry in `stores`.
struct DirectoryState<H> {
    ring: Ring<H>,
    stores: StoreMap,
}

impl<H: TokenHasher> DirectoryState<H> {
    /// The owner of `key` and its store. `None` iff the ring is empty.
    fn route(&self, key: &str) -> Option<(&NodeId, &Arc<dyn NodeStore>)> {
        let owner = self.ring.lookup(key)?;
        let store = self.stores.get(owner)?;
        Some((owner, store))
    }
}

/// Consistent-hash cache directory.
///
/// Routes each key to the node owning it on the ring and keeps every node's
/// store consistent with the ring as nodes join and leave.
pub struct Directory<H = Blake3Hasher> {
    state: RwLock<DirectoryState<H>>,
    store_factory: StoreFactory,
}

impl Directory {
    /// Create an empty directory hashed with BLAKE3.
    ///
    /// A `replicas` of 0 is replaced by the ring's default.
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, Blake3Hasher)
    }
}

impl Directory<HashAlgorithm> {
    /// Build a directory from configuration and register its initial nodes.
    pub fn from_config(config: &ClusterConfig) -> Self {
        let directory = Self::with_hasher(config.replicas(), config.hash_algorithm());
        for node_id in &config.cluster.nodes {
            directory.add_node(node_id);
        }
        directory
    }
}

impl<H: TokenHasher> Directory<H> {
    /// Create an empty directory with a custom hash function.
    pub fn with_hasher(replicas: usize, hasher: H) -> Self {
        Self {
            state: RwLock::new(DirectoryState {
                ring: Ring::with_hasher(replicas, hasher),
                stores: BTreeMap::new(),
            }),
            store_factory: Arc::new(memory_store),
        }
    }

    /// Use `factory` to build the store of every node that joins from now on.
    pub fn with_store_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&NodeId) -> Arc<dyn NodeStore> + Send + Sync + 'static,
    {
        self.store_factory = Arc::new(factory);
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, DirectoryState<H>> {
        self.state.read().expect("lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, DirectoryState<H>> {
        self.state.write().expect("lock poisoned")
    }

    // -----------------------------------------------------------------------
    // Topology changes
    // -----------------------------------------------------------------------

    /// Add a node, moving to it exactly the keys its tokens take over.
    ///
    /// A no-op (reported with `applied == false`) if the node is already
    /// present.
    pub fn add_node(&self, node_id: impl Into<NodeId>) -> MigrationReport {
        let node_id = node_id.into();
        let mut state = self.write();
        if state.ring.contains_node(&node_id) {
            debug!(%node_id, "node already present");
            return MigrationReport::noop(node_id);
        }

        let plan = migration::plan_join(&state.ring, &state.stores, &node_id);
        let store = (self.store_factory)(&node_id);
        state.stores.insert(node_id.clone(), store);
        let moved = migration::apply(plan.moves, &state.stores);
        state.ring.add_node(node_id.clone());

        info!(
            %node_id,
            moved = moved.len(),
            nodes = state.ring.node_count(),
            "node joined"
        );
        MigrationReport {
            node: node_id,
            applied: true,
            moved,
            discarded: Vec::new(),
        }
    }

    /// Remove a node, handing each of its keys to the node that inherits the
    /// key's interval.
    ///
    /// If it is the last node, its keys are discarded and the ring becomes
    /// empty. A no-op (reported with `applied == false`) if the node is
    /// absent.
    pub fn remove_node(&self, node_id: impl Into<NodeId>) -> MigrationReport {
        let node_id = node_id.into();
        let mut state = self.write();
        if !state.ring.contains_node(&node_id) {
            debug!(%node_id, "node not present");
            return MigrationReport::noop(node_id);
        }

        let plan = migration::plan_leave(&state.ring, &state.stores, &node_id);
        let moved = migration::apply(plan.moves, &state.stores);
        if !plan.discarded.is_empty() {
            warn!(
                %node_id,
                discarded = plan.discarded.len(),
                "last node left, discarding its keys"
            );
        }
        state.stores.remove(&node_id);
        state.ring.remove_node(&node_id);

        info!(
            %node_id,
            moved = moved.len(),
            nodes = state.ring.node_count(),
            "node left"
        );
        MigrationReport {
            node: node_id,
            applied: true,
            moved,
            discarded: plan.discarded,
        }
    }

    // -----------------------------------------------------------------------
    // Cache operations
    // -----------------------------------------------------------------------

    /// The node owning `key`, or `None` if no nodes are registered.
    pub fn lookup(&self, key: &str) -> Option<NodeId> {
        self.read().ring.lookup(key).cloned()
    }

    /// Store `value` under `key` on its owner. Returns the owner.
    pub fn set(
        &self,
        key: impl Into<String>,
        value: impl Into<Bytes>,
    ) -> Result<NodeId, DirectoryError> {
        let key = key.into();
        let state = self.read();
        let (owner, store) = state.route(&key).ok_or(DirectoryError::EmptyRing)?;
        store.put(key, value.into());
        Ok(owner.clone())
    }

    /// Read `key` from its owner. Returns the value and the owner.
    pub fn get(&self, key: &str) -> Result<(Bytes, NodeId), DirectoryError> {
        let state = self.read();
        let (owner, store) = state.route(key).ok_or(DirectoryError::EmptyRing)?;
        match store.get(key) {
            Some(value) => Ok((value, owner.clone())),
            None => Err(DirectoryError::KeyNotFound {
                key: key.to_string(),
                node: owner.clone(),
            }),
        }
    }

    /// Delete `key` from its owner. Returns the removed value and the owner.
    pub fn delete(&self, key: &str) -> Result<(Bytes, NodeId), DirectoryError> {
        let state = self.read();
        let (owner, store) = state.route(key).ok_or(DirectoryError::EmptyRing)?;
        match store.delete(key) {
            Some(value) => Ok((value, owner.clone())),
            None => Err(DirectoryError::KeyNotFound {
                key: key.to_string(),
                node: owner.clone(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Registered nodes, sorted.
    pub fn list_nodes(&self) -> Vec<NodeId> {
        self.read().ring.nodes()
    }

    /// Number of registered nodes.
    pub fn node_count(&self) -> usize {
        self.read().ring.node_count()
    }

    /// Tokens per node.
    pub fn replicas(&self) -> usize {
        self.read().ring.replicas()
    }

    /// Number of keys stored on each node (nodes with no keys included).
    pub fn key_counts(&self) -> BTreeMap<NodeId, usize> {
        self.read()
            .stores
            .iter()
            .map(|(node_id, store)| (node_id.clone(), store.len()))
            .collect()
    }

    /// Point-in-time map of every stored key to the node holding it.
    pub fn snapshot_key_owners(&self) -> BTreeMap<String, NodeId> {
        let state = self.read();
        let mut owners = BTreeMap::new();
        for (node_id, store) in &state.stores {
            for key in store.keys() {
                owners.insert(key, node_id.clone());
            }
        }
        owners
    }

    /// The store of a registered node.
    pub fn store(&self, node_id: &str) -> Option<Arc<dyn NodeStore>> {
        self.read().stores.get(node_id).cloned()
    }
}

impl<H: TokenHasher + Clone> Directory<H> {
    /// Return a clone of the current ring.
    pub fn ring(&self) -> Ring<H> {
        self.read().ring.clone()
    }
}

impl<H> std::fmt::Debug for Directory<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory").finish_non_exhaustive()
    }
}
