//! Cache directory over a consistent hashing ring.
//!
//! This crate provides:
//!
//! - [`Directory`]: routes `set`/`get`/`delete` to the owning node's store
//!   and migrates exactly the affected keys when nodes join or leave.
//! - [`KeyMigration`] / [`MigrationReport`]: what a topology change moved.
//! - [`ClusterConfig`]: TOML configuration for building a directory.
//! - [`changed_owners`] / [`moved_fraction`]: diagnostics over
//!   [`Directory::snapshot_key_owners`] snapshots.

mod config;
mod directory;
mod error;
mod migration;


pub use config::{ClusterConfig, ClusterSection, LogSection, RingSection};
pub use directory::{Directory, StoreFactory};
pub use error::{ConfigError, DirectoryError};
pub use migration::{KeyMigration, MigrationReport, changed_owners, moved_fraction};
