//! Shared types and identifiers for ringcache.
//!
//! This crate defines the two values every other crate in the workspace
//! speaks in: [`NodeId`], the opaque name of a cache node, and [`Token`], a
//! position on the 64-bit hash ring.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A position on the circular 64-bit token space.
///
/// The space wraps from `u64::MAX` back to `0`.
pub type Token = u64;

// ---------------------------------------------------------------------------
// Node identifier
// ---------------------------------------------------------------------------

/// Identifier for a cache node.
///
/// Opaque to the ring: it is only hashed (together with a replica index) to
/// derive the node's tokens, compared, and displayed.
#[derive(Clone, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a node identifier from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Build the hash input for one of this node's virtual nodes:
    /// `"{node_id}#{replica}"`.
    pub fn replica_label(&self, replica: usize) -> String {
        format!("{}#{replica}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&NodeId> for NodeId {
    fn from(id: &NodeId) -> Self {
        id.clone()
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for NodeId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for NodeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}
