//! Shared test harness for ringcache integration tests.
//!
//! Provides seeded directories, deterministic key sets, a brute-force owner
//! reference and [`TableHasher`] for placing tokens and keys by hand.

use std::collections::HashMap;

use ringcache_cluster::Directory;
use ringcache_placement::{Ring, TokenHasher};
use ringcache_types::{NodeId, Token};

/// `count` distinct keys: `key-0`, `key-1`, ...
pub fn test_keys(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("key-{i}")).collect()
}

/// The value written for `key` by [`seeded_directory`].
pub fn value_for(key: &str) -> String {
    format!("value-of-{key}")
}

/// `count` node IDs: `node-0`, `node-1`, ...
pub fn node_ids(count: usize) -> Vec<NodeId> {
    (0..count).map(|i| NodeId::from(format!("node-{i}"))).collect()
}

/// A BLAKE3-hashed directory with `nodes` nodes and `keys` keys written
/// through it (see [`test_keys`] and [`value_for`]).
pub fn seeded_directory(replicas: usize, nodes: usize, keys: usize) -> Directory {
    let directory = Directory::new(replicas);
    for node_id in node_ids(nodes) {
        directory.add_node(node_id);
    }
    for key in test_keys(keys) {
        let value = value_for(&key);
        directory
            .set(key, value)
            .expect("seeded directory has nodes");
    }
    directory
}

/// Brute-force owner: the node of the smallest token >= the key's hash,
/// or of the smallest token overall.
pub fn reference_owner<H: TokenHasher>(ring: &Ring<H>, key: &str) -> Option<NodeId> {
    let position = ring.hash_key(key);
    let tokens: Vec<(Token, &NodeId)> = ring.tokens().collect();
    tokens
        .iter()
        .filter(|(token, _)| *token >= position)
        .min_by_key(|(token, _)| *token)
        .or_else(|| tokens.iter().min_by_key(|(token, _)| *token))
        .map(|(_, owner)| (*owner).clone())
}

/// Hasher with hand-picked positions. Panics on inputs it has no entry for.
#[derive(Clone)]
pub struct TableHasher(HashMap<&'static str, Token>);

impl TableHasher {
    pub fn new(entries: &[(&'static str, Token)]) -> Self {
        Self(entries.iter().copied().collect())
    }
}

impl TokenHasher for TableHasher {
    fn hash(&self, data: &[u8]) -> Token {
        let input = std::str::from_utf8(data).expect("table inputs are UTF-8");
        *self
            .0
            .get(input)
            .unwrap_or_else(|| panic!("no fixed position for {input:?}"))
    }
}
