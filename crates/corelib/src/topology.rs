//! Cluster topology snapshots.
//!
//! A `Topology` is one immutable, point-in-time view of the cluster: the nodes,
//! the zones they belong to and the hash ring built from them. Consumers hold
//! snapshots behind `Arc` and never mutate them; a topology change produces a
//! new snapshot.

use crate::error::{Error, Result};
use crate::node::{Node, NodeId, ZoneId};
use crate::ring::{HashRing, RingBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Vnodes per node used by `Topology::new`.
pub const DEFAULT_TOPOLOGY_VNODES: usize = 64;

/// Serializable description of a topology (nodes plus vnode count).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyDescriptor {
    #[serde(default = "default_vnodes")]
    pub vnodes_per_node: usize,
    pub nodes: Vec<Node>,
}

fn default_vnodes() -> usize {
    DEFAULT_TOPOLOGY_VNODES
}

impl TopologyDescriptor {
    pub fn build(&self) -> Result<Topology> {
        Topology::with_vnodes(self.nodes.iter().cloned(), self.vnodes_per_node)
    }
}

/// Immutable view of the cluster at one point in time.
#[derive(Debug)]
pub struct Topology {
    nodes: BTreeMap<NodeId, Node>,
    zones: BTreeSet<ZoneId>,
    ring: HashRing,
    vnodes_per_node: usize,
}

impl Topology {
    /// Build a topology with `DEFAULT_TOPOLOGY_VNODES` vnodes per node.
    pub fn new(nodes: impl IntoIterator<Item = Node>) -> Result<Self> {
        Self::with_vnodes(nodes, DEFAULT_TOPOLOGY_VNODES)
    }

    /// Build a topology, rejecting duplicate node ids and a zero vnode count.
    pub fn with_vnodes(nodes: impl IntoIterator<Item = Node>, vnodes_per_node: usize) -> Result<Self> {
        if vnodes_per_node == 0 {
            return Err(Error::InvalidNode("vnodes_per_node must be positive".into()));
        }

        let mut by_id = BTreeMap::new();
        for node in nodes {
            if by_id.contains_key(&node.id) {
                return Err(Error::DuplicateNode(node.id));
            }
            by_id.insert(node.id, node);
        }

        let zones = by_id.values().map(|node| node.zone).collect();
        let ring = by_id
            .values()
            .fold(RingBuilder::new().with_vnodes(vnodes_per_node), |builder, node| {
                builder.add_node(node.clone())
            })
            .build();

        Ok(Self {
            nodes: by_id,
            zones,
            ring,
            vnodes_per_node,
        })
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Like `node`, but an absent id is an error.
    pub fn node_by_id(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(Error::UnknownNode(id))
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Nodes ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn zones(&self) -> impl Iterator<Item = ZoneId> + '_ {
        self.zones.iter().copied()
    }

    pub fn has_zone(&self, zone: ZoneId) -> bool {
        self.zones.contains(&zone)
    }

    pub fn nodes_in_zone(&self, zone: ZoneId) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(move |node| node.zone == zone)
    }

    pub fn ring(&self) -> &HashRing {
        &self.ring
    }

    pub fn vnodes_per_node(&self) -> usize {
        self.vnodes_per_node
    }

    pub fn descriptor(&self) -> TopologyDescriptor {
        TopologyDescriptor {
            vnodes_per_node: self.vnodes_per_node,
            nodes: self.nodes.values().cloned().collect(),
        }
    }
}
