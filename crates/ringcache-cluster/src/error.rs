//! Error types for the cluster crate.

use ringcache_types::NodeId;

/// Errors returned by [`Directory`](crate::Directory) cache operations.
///
/// Adding a node that is already present or removing one that is absent is
/// not an error: those edits report `applied == false`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    /// No nodes are registered, so no key has an owner.
    #[error("ring is empty: no nodes registered")]
    EmptyRing,

    /// The key's owner exists but does not hold the key.
    #[error("key not found: {key} (owner {node})")]
    KeyNotFound {
        /// The requested key.
        key: String,
        /// The node the ring routed the key to.
        node: NodeId,
    },
}

/// Errors produced while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`ClusterConfig`](crate::ClusterConfig).
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
