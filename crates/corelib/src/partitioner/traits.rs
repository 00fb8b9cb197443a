//! Key to ring position mapping.

use crate::token::Token;

/// Maps key bytes to a ring position.
///
/// Every node must map the same bytes to the same position, so
/// implementations carry no per-process state.
pub trait Partitioner: Send + Sync + 'static {
    type TokenType: Token;

    fn partition(&self, key: &[u8]) -> Self::TokenType;

    fn name(&self) -> &'static str;
}
