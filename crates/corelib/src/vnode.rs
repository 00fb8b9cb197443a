//! Virtual node abstractions.
//!
//! Each physical node owns several tokens on the ring (virtual nodes). More
//! tokens per node give a smoother key distribution and mean that a topology
//! change moves only a fraction of the keys, which keeps rebalances small.
//!
//! Virtual node tokens are derived from `"{node_id}:{index}"`, so two topology
//! snapshots that both contain node N place N's vnodes at the same positions.
//! Replica placement for a key only changes where the set of nodes changed.

use crate::node::NodeId;
use crate::token::hashed::HashToken;
use crate::token::Token;

/// A virtual node on the hash ring.
///
/// # Invariants
///
/// - Every `VirtualNode` belongs to exactly one physical node
/// - Tokens are ordered, so vnodes sort by ring position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VirtualNode {
    /// Token position on the ring.
    pub token: HashToken,

    /// The physical node that owns this virtual node.
    pub node_id: NodeId,
}

impl VirtualNode {
    #[inline]
    pub fn new(token: HashToken, node_id: NodeId) -> Self {
        Self { token, node_id }
    }

    /// Create a virtual node from a node ID and vnode index.
    ///
    /// The token is the hash of `"node_id:vnode_index"`, which is stable across
    /// processes and topology snapshots.
    pub fn from_index(node_id: NodeId, vnode_index: usize) -> Self {
        let vnode_key = format!("{}:{}", node_id, vnode_index);
        Self::new(HashToken::from_key(&vnode_key), node_id)
    }

    #[inline]
    pub fn token(&self) -> HashToken {
        self.token
    }

    #[inline]
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Clockwise distance to another virtual node.
    #[inline]
    pub fn distance_to(&self, other: &Self) -> HashToken {
        self.token.distance_to(&other.token)
    }
}

impl std::fmt::Display for VirtualNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VNode(token={:016x}, node={})", self.token.0, self.node_id)
    }
}
