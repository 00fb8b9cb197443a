//! Zone-aware replication strategy.
//!
//! Each zone gets its own replication factor. Walking the ring clockwise from
//! the key's token, a node is taken as a replica if its zone still needs
//! replicas. A node's position among the chosen replicas of its own zone is
//! its *zone replica rank* for the key.

use crate::strategy::ReplicationStrategy;
use corelib::node::{NodeId, ZoneId};
use corelib::ring::HashRing;
use std::collections::BTreeMap;

/// Replicas placed per zone, `N_z` distinct nodes of each zone `z`.
#[derive(Debug, Clone)]
pub struct NetworkTopologyStrategy {
    zone_replication_factor: BTreeMap<ZoneId, usize>,
}

impl NetworkTopologyStrategy {
    pub fn new(zone_replication_factor: BTreeMap<ZoneId, usize>) -> Self {
        Self {
            zone_replication_factor,
        }
    }

    pub fn zone_replication_factor(&self, zone: ZoneId) -> usize {
        self.zone_replication_factor.get(&zone).copied().unwrap_or(0)
    }
}

impl ReplicationStrategy for NetworkTopologyStrategy {
    fn replication_factor(&self) -> usize {
        self.zone_replication_factor.values().sum()
    }

    fn replicas_for_key(&self, ring: &HashRing, key: &[u8]) -> Vec<NodeId> {
        let wanted = self.replication_factor();
        let mut chosen_per_zone: BTreeMap<ZoneId, usize> = BTreeMap::new();
        let mut replicas = Vec::with_capacity(wanted);

        for node_id in ring.successors(key) {
            if replicas.len() == wanted {
                break;
            }
            let Some(node) = ring.get_node(&node_id) else {
                continue;
            };
            let chosen = chosen_per_zone.entry(node.zone).or_insert(0);
            if *chosen < self.zone_replication_factor(node.zone) {
                *chosen += 1;
                replicas.push(node_id);
            }
        }
        replicas
    }

    fn name(&self) -> &'static str {
        "NetworkTopologyStrategy"
    }
}
