//! Consistent hashing ring for deterministic key placement.
//!
//! This crate implements a consistent hash ring that maps cache keys to
//! node IDs. Each physical node is given a fixed number of virtual nodes
//! (tokens) at positions `hash("{node_id}#{replica}")`. A key belongs to the
//! node owning the first token at or after `hash(key)`, wrapping around the
//! top of the 64-bit space.
//!
//! The hash function is pluggable through [`TokenHasher`]; the default is
//! [`Blake3Hasher`].

mod hasher;
mod range;
mod ring;

pub use hasher::{Blake3Hasher, Fnv1aHasher, HashAlgorithm, TokenHasher};
pub use range::TokenRange;
pub use ring::{DEFAULT_REPLICAS, Ring};
