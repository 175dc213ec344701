//! Circular token intervals.

use std::fmt;

use ringcache_types::Token;

/// The circular interval `(start, end]` a token answers for.
///
/// `start` is the predecessor token (exclusive), `end` the owning token
/// (inclusive). When `start >= end` the interval wraps through zero; with a
/// single token on the ring `start == end` and the interval is the whole
/// circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenRange {
    /// Exclusive lower bound.
    pub start: Token,
    /// Inclusive upper bound.
    pub end: Token,
}

impl TokenRange {
    /// Create the interval `(start, end]`.
    pub fn new(start: Token, end: Token) -> Self {
        Self { start, end }
    }

    /// Whether `position` falls inside `(start, end]`.
    pub fn contains(&self, position: Token) -> bool {
        if self.start < self.end {
            self.start < position && position <= self.end
        } else {
            position > self.start || position <= self.end
        }
    }
}

impl fmt::Display for TokenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:#018x}, {:#018x}]", self.start, self.end)
    }
}
