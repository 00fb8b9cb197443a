//! Node abstractions for the cluster topology.
//!
//! Nodes represent physical participants in the cluster. They are identified by
//! a compact `NodeId` that is cheap to compare and hash, and belong to exactly
//! one `ZoneId`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default socket port used when a node description omits one.
pub const DEFAULT_PORT: u16 = 6666;

/// Compact identifier for a node in the cluster.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical grouping of nodes (a datacenter, an availability zone).
///
/// Replica ranks are computed per zone, so two nodes in different zones can
/// both be "replica 0" for the same key.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ZoneId(pub u32);

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "zone-{}", self.0)
    }
}

/// Physical node participating in the cluster.
///
/// Keep this struct small and cheap to clone; heavy mutable state (connections,
/// failure detection, etc.) lives elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Hostname or address used to open remote store handles.
    pub host: String,
    /// Socket port of the node's store service.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Zone membership, used for zone-aware replication.
    #[serde(default)]
    pub zone: ZoneId,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Node {
    /// Construct a node in zone 0 on the default port.
    pub fn new(id: NodeId, host: impl Into<String>) -> Self {
        Self {
            id,
            host: host.into(),
            port: DEFAULT_PORT,
            zone: ZoneId::default(),
        }
    }

    pub fn with_topology(id: NodeId, host: impl Into<String>, port: u16, zone: ZoneId) -> Self {
        Self {
            id,
            host: host.into(),
            port,
            zone,
        }
    }

    /// `host:port` form, for logging and connection strings.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node(id={}, {}, {})", self.id, self.address(), self.zone)
    }
}
