//! 64-bit hashed token.

use crate::token::traits::Token;
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

/// Token produced by hashing key bytes with SipHash-1-3 (fixed zero key, so
/// every node computes the same position for the same bytes).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct HashToken(pub u64);

impl Token for HashToken {
    fn distance_to(&self, other: &Self) -> Self {
        HashToken(other.0.wrapping_sub(self.0))
    }
}

impl HashToken {
    /// Creates a token from a byte slice.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = SipHasher13::new();
        data.hash(&mut hasher);
        HashToken(hasher.finish())
    }

    /// Creates a token from a string key.
    pub fn from_key(key: &str) -> Self {
        Self::from_bytes(key.as_bytes())
    }
}
