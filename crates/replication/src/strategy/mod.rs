//! Replication strategy abstractions.
//!
//! Replication strategies determine how many replicas a key has and which
//! nodes hold them. Different strategies optimize for different goals:
//!
//! - **SimpleStrategy**: N replicas placed sequentially around the ring
//! - **NetworkTopologyStrategy**: N_z replicas per zone, walking the ring

pub mod network_topology;
pub mod simple;

pub use network_topology::NetworkTopologyStrategy;
pub use simple::SimpleStrategy;

use corelib::node::NodeId;
use corelib::ring::HashRing;

/// Trait for replication strategies.
///
/// # Thread Safety
///
/// Implementations must be thread-safe (Send + Sync) as they may be
/// shared across threads.
pub trait ReplicationStrategy: Send + Sync + 'static {
    /// Total number of replicas this strategy creates.
    fn replication_factor(&self) -> usize;

    /// Find replica nodes for a given key, primary first.
    ///
    /// Returns fewer than `replication_factor()` nodes when the ring does not
    /// have enough (eligible) nodes.
    fn replicas_for_key(&self, ring: &HashRing, key: &[u8]) -> Vec<NodeId>;

    /// Strategy name (for logging/debugging).
    fn name(&self) -> &'static str;
}
