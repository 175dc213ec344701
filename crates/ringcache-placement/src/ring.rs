//! Consistent hashing ring implementation.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use ringcache_types::{NodeId, Token};
use tracing::{debug, warn};

use crate::hasher::{Blake3Hasher, TokenHasher};
use crate::range::TokenRange;

/// Replica count used when a ring is created with zero replicas.
pub const DEFAULT_REPLICAS: usize = 100;

/// Consistent hashing ring for deterministic key placement.
///
/// Each node is mapped to `replicas` virtual nodes (tokens) on a u64 ring.
/// A key is owned by the node holding the first token at or after the key's
/// hash, wrapping to the lowest token when the hash is above every token.
///
/// Tokens are never stored per node: they are re-derived from the node ID
/// and the replica count whenever needed.
#[derive(Debug, Clone)]
pub struct Ring<H = Blake3Hasher> {
    /// Token positions: ring position -> owning node.
    tokens: BTreeMap<Token, NodeId>,
    /// Registered nodes.
    nodes: BTreeSet<NodeId>,
    /// Number of tokens derived for every node.
    replicas: usize,
    hasher: H,
}

impl Ring {
    /// Create a new empty ring hashed with BLAKE3.
    ///
    /// A `replicas` of 0 is replaced by [`DEFAULT_REPLICAS`].
    pub fn new(replicas: usize) -> Self {
        Self::with_hasher(replicas, Blake3Hasher)
    }
}

impl<H: TokenHasher> Ring<H> {
    /// Create a new empty ring with a custom hash function.
    ///
    /// A `replicas` of 0 is replaced by [`DEFAULT_REPLICAS`].
    pub fn with_hasher(replicas: usize, hasher: H) -> Self {
        let replicas = if replicas == 0 {
            DEFAULT_REPLICAS
        } else {
            replicas
        };
        Self {
            tokens: BTreeMap::new(),
            nodes: BTreeSet::new(),
            replicas,
            hasher,
        }
    }

    /// Number of tokens derived for each node.
    pub fn replicas(&self) -> usize {
        self.replicas
    }

    /// The hash function placing tokens and keys.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Position of `key` on the ring.
    pub fn hash_key(&self, key: &str) -> Token {
        self.hasher.hash(key.as_bytes())
    }

    /// Derive the `replicas` tokens of a node, in replica order.
    ///
    /// This is a pure function of the node ID, the replica count and the
    /// hash function: it does not matter whether the node is registered.
    pub fn tokens_for_node(&self, node_id: &NodeId) -> Vec<Token> {
        (0..self.replicas)
            .map(|replica| self.hasher.hash(node_id.replica_label(replica).as_bytes()))
            .collect()
    }

    /// Derived tokens that are currently registered to `node_id`, sorted.
    ///
    /// Equal to [`tokens_for_node`](Self::tokens_for_node) unless a token
    /// collided with another node's when this node joined.
    pub fn owned_tokens(&self, node_id: &NodeId) -> Vec<Token> {
        let mut owned: Vec<Token> = self
            .tokens_for_node(node_id)
            .into_iter()
            .filter(|token| self.tokens.get(token) == Some(node_id))
            .collect();
        owned.sort_unstable();
        owned.dedup();
        owned
    }

    /// Derived tokens of `node_id` not yet present on the ring, sorted.
    ///
    /// These are exactly the tokens [`add_node`](Self::add_node) would
    /// insert.
    pub fn claimable_tokens(&self, node_id: &NodeId) -> Vec<Token> {
        let mut claimable: Vec<Token> = self
            .tokens_for_node(node_id)
            .into_iter()
            .filter(|token| !self.tokens.contains_key(token))
            .collect();
        claimable.sort_unstable();
        claimable.dedup();
        claimable
    }

    /// Add a node to the ring.
    ///
    /// Returns `false` (and changes nothing) if the node is already present.
    /// A derived token that is already held by another node stays with that
    /// node.
    pub fn add_node(&mut self, node_id: NodeId) -> bool {
        if self.nodes.contains(&node_id) {
            return false;
        }

        let mut claimed = 0usize;
        for token in self.tokens_for_node(&node_id) {
            match self.tokens.entry(token) {
                Entry::Vacant(slot) => {
                    slot.insert(node_id.clone());
                    claimed += 1;
                }
                Entry::Occupied(slot) => {
                    if *slot.get() != node_id {
                        warn!(
                            %node_id,
                            owner = %slot.get(),
                            token,
                            "token collision, keeping existing owner"
                        );
                    }
                }
            }
        }

        debug!(%node_id, tokens = claimed, "added node to ring");
        self.nodes.insert(node_id);
        true
    }

    /// Remove a node and all of its tokens from the ring.
    ///
    /// A released token that another registered node also derives (one that
    /// lost a collision to the departing node) passes to that node instead of
    /// leaving the ring. Returns `false` if the node was not present.
    pub fn remove_node(&mut self, node_id: &NodeId) -> bool {
        if !self.nodes.remove(node_id) {
            return false;
        }

        let released = self.owned_tokens(node_id);
        let reclaimers = self.reclaimers(&released, node_id);
        for token in &released {
            match reclaimers.get(token) {
                Some(heir) => {
                    self.tokens.insert(*token, heir.clone());
                }
                None => {
                    self.tokens.remove(token);
                }
            }
        }

        debug!(
            %node_id,
            tokens = released.len(),
            reclaimed = reclaimers.len(),
            "removed node from ring"
        );
        true
    }

    /// For each of `tokens`, the registered node other than `excluded` that
    /// also derives it, lowest node ID first.
    ///
    /// These are the nodes that take the tokens over when `excluded` leaves.
    /// Tokens no other node derives are absent from the result.
    pub fn reclaimers(&self, tokens: &[Token], excluded: &NodeId) -> BTreeMap<Token, NodeId> {
        let mut found = BTreeMap::new();
        if tokens.is_empty() {
            return found;
        }
        for node_id in self.nodes.iter().filter(|node_id| *node_id != excluded) {
            for token in self.tokens_for_node(node_id) {
                if tokens.contains(&token) {
                    found.entry(token).or_insert_with(|| node_id.clone());
                }
            }
            if found.len() == tokens.len() {
                break;
            }
        }
        found
    }

    /// Determine which node owns a key.
    ///
    /// Returns `None` only when the ring is empty.
    pub fn lookup(&self, key: &str) -> Option<&NodeId> {
        self.lookup_hash(self.hash_key(key)).map(|(_, node_id)| node_id)
    }

    /// Find the token answering for a raw ring position, and its owner.
    ///
    /// That is the smallest token `>= position`, wrapping to the smallest
    /// token overall.
    pub fn lookup_hash(&self, position: Token) -> Option<(Token, &NodeId)> {
        self.tokens
            .range(position..)
            .next()
            .or_else(|| self.tokens.first_key_value())
            .map(|(token, node_id)| (*token, node_id))
    }

    /// The smallest registered token strictly greater than `token`, wrapping
    /// to the smallest token overall.
    pub fn successor(&self, token: Token) -> Option<Token> {
        self.tokens
            .range((Bound::Excluded(token), Bound::Unbounded))
            .next()
            .or_else(|| self.tokens.first_key_value())
            .map(|(token, _)| *token)
    }

    /// The largest registered token strictly less than `token`, wrapping to
    /// the largest token overall.
    pub fn predecessor(&self, token: Token) -> Option<Token> {
        self.tokens
            .range(..token)
            .next_back()
            .or_else(|| self.tokens.last_key_value())
            .map(|(token, _)| *token)
    }

    /// Reverse lookup: the node a registered token belongs to.
    pub fn owner_of_token(&self, token: Token) -> Option<&NodeId> {
        self.tokens.get(&token)
    }

    /// The interval `(predecessor(token), token]` a registered token answers
    /// for. `None` if `token` is not on the ring.
    pub fn owned_range(&self, token: Token) -> Option<TokenRange> {
        if !self.tokens.contains_key(&token) {
            return None;
        }
        self.predecessor(token)
            .map(|previous| TokenRange::new(previous, token))
    }

    /// Walk clockwise from `token` (exclusive) and return the first owner
    /// that is not `excluded`.
    ///
    /// This is the node that inherits `token`'s interval once `excluded`
    /// leaves. `None` when no other node is registered.
    pub fn next_owner_excluding(&self, token: Token, excluded: &NodeId) -> Option<&NodeId> {
        let after = self
            .tokens
            .range((Bound::Excluded(token), Bound::Unbounded));
        let before = self.tokens.range(..=token);

        after
            .chain(before)
            .map(|(_, node_id)| node_id)
            .find(|node_id| *node_id != excluded)
    }

    /// Whether `node_id` is registered.
    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.nodes.contains(node_id)
    }

    /// Return all node IDs in the ring, sorted.
    pub fn nodes(&self) -> Vec<NodeId> {
        self.nodes.iter().cloned().collect()
    }

    /// Return the number of physical nodes in the ring.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Return the total number of tokens in the ring.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no node is registered.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Iterate over `(token, owner)` in ascending token order.
    pub fn tokens(&self) -> impl Iterator<Item = (Token, &NodeId)> + '_ {
        self.tokens.iter().map(|(token, node_id)| (*token, node_id))
    }
}
