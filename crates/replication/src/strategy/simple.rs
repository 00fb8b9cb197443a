//! Simple replication strategy.
//!
//! Places N replicas sequentially around the ring (clockwise from the primary),
//! ignoring zones.
//!
//! # Algorithm
//!
//! 1. Hash the key and find the primary node (first token clockwise)
//! 2. Continue clockwise, skipping nodes already chosen
//! 3. Stop after N distinct nodes (or when the ring is exhausted)

use crate::strategy::ReplicationStrategy;
use corelib::node::NodeId;
use corelib::ring::HashRing;

/// Simple replication strategy: N replicas placed sequentially around the ring.
#[derive(Debug, Clone)]
pub struct SimpleStrategy {
    /// Number of replicas to create (including primary).
    replication_factor: usize,
}

impl SimpleStrategy {
    pub fn new(replication_factor: usize) -> Self {
        Self { replication_factor }
    }
}

impl Default for SimpleStrategy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl ReplicationStrategy for SimpleStrategy {
    fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    fn replicas_for_key(&self, ring: &HashRing, key: &[u8]) -> Vec<NodeId> {
        if self.replication_factor == 0 {
            return Vec::new();
        }

        let mut replicas = ring.successors(key);
        replicas.truncate(self.replication_factor);
        replicas
    }

    fn name(&self) -> &'static str {
        "SimpleStrategy"
    }
}
