//! Per-store routing over one topology snapshot.
//!
//! A `RoutingSnapshot` pairs a topology with a store definition and answers
//! two questions about a key:
//!
//! - `replica_rank(zone, node, key)`: where does `node` sit among the key's
//!   replicas in `zone`?
//! - `node_for_rank(zone, rank, key)`: which node sits at `rank` in `zone`?
//!
//! Both are pure functions of (topology, store definition, key). The snapshot
//! itself is two `Arc`s, so building one per operation is cheap.

use crate::error::{ReplicationError, Result};
use crate::store_def::StoreDefinition;
use corelib::{NodeId, Topology, ZoneId};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct RoutingSnapshot {
    topology: Arc<Topology>,
    store_def: Arc<StoreDefinition>,
}

impl RoutingSnapshot {
    pub fn new(topology: Arc<Topology>, store_def: Arc<StoreDefinition>) -> Self {
        Self {
            topology,
            store_def,
        }
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    pub fn store_def(&self) -> &Arc<StoreDefinition> {
        &self.store_def
    }

    /// All replicas of `key`, in ranked order across zones.
    pub fn replicas_for_key(&self, key: &[u8]) -> Vec<NodeId> {
        self.store_def
            .strategy()
            .replicas_for_key(self.topology.ring(), key)
    }

    /// Replicas of `key` that live in `zone`, in rank order.
    pub fn zone_replicas(&self, zone: ZoneId, key: &[u8]) -> Result<Vec<NodeId>> {
        if !self.topology.has_zone(zone) {
            return Err(ReplicationError::ZoneNotRepresented { zone });
        }
        Ok(self
            .replicas_for_key(key)
            .into_iter()
            .filter(|id| {
                self.topology
                    .node(*id)
                    .is_some_and(|node| node.zone == zone)
            })
            .collect())
    }

    /// Rank of `node` among the replicas of `key` in `zone`.
    pub fn replica_rank(&self, zone: ZoneId, node: NodeId, key: &[u8]) -> Result<usize> {
        self.zone_replicas(zone, key)?
            .iter()
            .position(|id| *id == node)
            .ok_or(ReplicationError::NotAReplica { node, zone })
    }

    /// Node holding replica `rank` of `key` in `zone`.
    ///
    /// Fails with `ZoneNotRepresented` when the topology has no node in `zone`.
    pub fn node_for_rank(&self, zone: ZoneId, rank: usize, key: &[u8]) -> Result<NodeId> {
        let replicas = self.zone_replicas(zone, key)?;
        replicas
            .get(rank)
            .copied()
            .ok_or(ReplicationError::RankOutOfRange {
                zone,
                rank,
                available: replicas.len(),
            })
    }
}
