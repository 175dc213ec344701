//! TOML configuration for building a [`Directory`](crate::Directory).
//!
//! Every section is optional; missing values fall back to defaults through
//! the effective-value getters on [`ClusterConfig`].

use std::path::Path;

use ringcache_placement::{DEFAULT_REPLICAS, HashAlgorithm};
use ringcache_types::NodeId;
use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Ring parameters.
    pub ring: RingSection,
    /// Initial membership.
    pub cluster: ClusterSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[ring]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RingSection {
    /// Tokens per node. Non-positive or missing values use the default (100).
    pub replicas: Option<i64>,
    /// Hash function: `"blake3"` (default) or `"fnv1a"`.
    ///
    /// Changing it re-places every token and key, so it must stay fixed for
    /// the lifetime of a directory.
    pub hash: HashAlgorithm,
}

/// `[cluster]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    /// Nodes registered when the directory is built.
    pub nodes: Vec<NodeId>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ClusterConfig {
    /// Load config from a TOML file, or use defaults if no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                Self::from_toml(&content)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string.
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Effective replica count.
    pub fn replicas(&self) -> usize {
        self.ring
            .replicas
            .filter(|&n| n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(DEFAULT_REPLICAS)
    }

    /// Effective hash algorithm.
    pub fn hash_algorithm(&self) -> HashAlgorithm {
        self.ring.hash
    }

    /// Effective log level filter.
    pub fn log_level(&self) -> &str {
        &self.log.level
    }
}
