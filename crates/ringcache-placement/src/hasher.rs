//! Hash functions that place tokens and keys on the ring.

use std::str::FromStr;

use ringcache_types::Token;
use serde::de::IntoDeserializer;
use serde::{Deserialize, Serialize};

/// Maps an arbitrary byte sequence to a position on the ring.
///
/// Implementations must be deterministic: tokens are never stored per node,
/// they are re-derived from `(node_id, replica)` whenever needed, so changing
/// the hash function invalidates every existing placement.
pub trait TokenHasher: Send + Sync {
    /// Hash `data` to a ring position.
    fn hash(&self, data: &[u8]) -> Token;
}

/// BLAKE3, truncated to the first 8 bytes (little-endian).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3Hasher;

impl TokenHasher for Blake3Hasher {
    fn hash(&self, data: &[u8]) -> Token {
        let hash = blake3::hash(data);
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

/// 64-bit FNV-1a.
///
/// Cheap, but inputs that differ only in their last bytes land close to each
/// other in the high bits, so distribution across the ring is noticeably
/// worse than with [`Blake3Hasher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Fnv1aHasher;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl TokenHasher for Fnv1aHasher {
    fn hash(&self, data: &[u8]) -> Token {
        let mut hash = FNV_OFFSET_BASIS;
        for &byte in data {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash
    }
}

/// Hash algorithm selectable at runtime (e.g. from configuration).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// [`Blake3Hasher`].
    #[default]
    Blake3,
    /// [`Fnv1aHasher`].
    Fnv1a,
}

impl TokenHasher for HashAlgorithm {
    fn hash(&self, data: &[u8]) -> Token {
        match self {
            HashAlgorithm::Blake3 => Blake3Hasher.hash(data),
            HashAlgorithm::Fnv1a => Fnv1aHasher.hash(data),
        }
    }
}

/// Parses the same lowercase names the config file accepts.
impl FromStr for HashAlgorithm {
    type Err = serde::de::value::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::deserialize(s.into_deserializer())
    }
}

impl<T: TokenHasher + ?Sized> TokenHasher for std::sync::Arc<T> {
    fn hash(&self, data: &[u8]) -> Token {
        (**self).hash(data)
    }
}
