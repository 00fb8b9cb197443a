//! SipHash partitioner implementation.

use crate::partitioner::traits::Partitioner;
use crate::token::hashed::HashToken;

/// Partitioner mapping keys onto the 64-bit `HashToken` space.
#[derive(Clone, Copy, Debug, Default)]
pub struct SipHashPartitioner;

impl Partitioner for SipHashPartitioner {
    type TokenType = HashToken;

    fn partition(&self, key: &[u8]) -> Self::TokenType {
        HashToken::from_bytes(key)
    }

    fn name(&self) -> &'static str {
        "SipHashPartitioner"
    }
}
