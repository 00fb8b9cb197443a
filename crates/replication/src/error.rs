//! Routing and replication errors.

use corelib::{NodeId, ZoneId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReplicationError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// The zone has no nodes in this topology. Expected during zone expansion.
    #[error("{zone} is not represented in the topology")]
    ZoneNotRepresented { zone: ZoneId },

    #[error("node {node} is not a replica in {zone} for this key")]
    NotAReplica { node: NodeId, zone: ZoneId },

    #[error("no replica of rank {rank} in {zone} ({available} replicas)")]
    RankOutOfRange {
        zone: ZoneId,
        rank: usize,
        available: usize,
    },

    #[error(transparent)]
    Core(#[from] corelib::Error),
}
