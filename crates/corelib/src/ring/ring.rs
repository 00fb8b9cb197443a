//! Hash ring data structure.
//!
//! Holds a `BTreeMap<HashToken, NodeId>` behind a read-write lock together with
//! the metadata of every node that owns tokens.
//!
//! # Lookup
//!
//! A key is hashed to a token; the owning vnode is the first token at or after
//! it, wrapping around to the smallest token at the end of the ring.
//!
//! # Performance
//!
//! - `lookup`: O(log n) where n = total tokens
//! - `successors`: O(n) worst case, stops once every node has been seen

use crate::node::{Node, NodeId};
use crate::partitioner::{Partitioner, SipHashPartitioner};
use crate::token::HashToken;
use crate::vnode::VirtualNode;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Bound;

/// Vnodes per node used by `RingBuilder` unless overridden.
pub const DEFAULT_VNODES: usize = 256;

#[derive(Debug, Default)]
struct RingState {
    tokens: BTreeMap<HashToken, NodeId>,
    nodes: HashMap<NodeId, Node>,
    /// Number of vnodes placed per node, so re-adding continues the index.
    vnode_counts: HashMap<NodeId, usize>,
}

/// Consistent hash ring of physical nodes and their virtual nodes.
///
/// Thread-safe: all methods take `&self`.
#[derive(Debug, Default)]
pub struct HashRing {
    state: RwLock<RingState>,
    partitioner: SipHashPartitioner,
}

impl HashRing {
    /// Create an empty ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `vnodes` virtual nodes for `node`.
    ///
    /// Adding a node that is already present places `vnodes` additional
    /// tokens for it (indices continue where the previous call stopped) and
    /// refreshes its metadata.
    pub fn add_node(&self, node: Node, vnodes: usize) {
        let mut state = self.state.write();
        let start = state.vnode_counts.get(&node.id).copied().unwrap_or(0);
        for index in start..start + vnodes {
            let vnode = VirtualNode::from_index(node.id, index);
            state.tokens.insert(vnode.token(), vnode.node_id());
        }
        state.vnode_counts.insert(node.id, start + vnodes);
        state.nodes.insert(node.id, node);
    }

    /// Remove a node and all of its tokens. Returns false if it was absent.
    pub fn remove_node(&self, node_id: &NodeId) -> bool {
        let mut state = self.state.write();
        if state.nodes.remove(node_id).is_none() {
            return false;
        }
        state.vnode_counts.remove(node_id);
        state.tokens.retain(|_, owner| owner != node_id);
        true
    }

    /// Node id owning `key` (first token clockwise from the key's token).
    pub fn lookup(&self, key: &[u8]) -> Option<NodeId> {
        let token = self.partitioner.partition(key);
        let state = self.state.read();
        state
            .tokens
            .range((Bound::Included(token), Bound::Unbounded))
            .next()
            .or_else(|| state.tokens.iter().next())
            .map(|(_, node_id)| *node_id)
    }

    /// Full metadata of the node owning `key`.
    pub fn lookup_node(&self, key: &[u8]) -> Option<Node> {
        let node_id = self.lookup(key)?;
        self.get_node(&node_id)
    }

    /// Distinct nodes in clockwise order starting at the key's owner.
    ///
    /// The first element is the node `lookup` would return; every node on the
    /// ring appears exactly once.
    pub fn successors(&self, key: &[u8]) -> Vec<NodeId> {
        let token = self.partitioner.partition(key);
        let state = self.state.read();
        let mut seen = HashSet::with_capacity(state.nodes.len());
        let mut ordered = Vec::with_capacity(state.nodes.len());

        let clockwise = state
            .tokens
            .range((Bound::Included(token), Bound::Unbounded))
            .chain(state.tokens.range((Bound::Unbounded, Bound::Excluded(token))));
        for (_, node_id) in clockwise {
            if seen.insert(*node_id) {
                ordered.push(*node_id);
                if ordered.len() == state.nodes.len() {
                    break;
                }
            }
        }
        ordered
    }

    pub fn get_node(&self, node_id: &NodeId) -> Option<Node> {
        self.state.read().nodes.get(node_id).cloned()
    }

    /// All nodes on the ring, ordered by id.
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.state.read().nodes.values().cloned().collect();
        nodes.sort_by_key(|node| node.id);
        nodes
    }

    /// All `(token, owner)` pairs in ring order.
    pub fn tokens(&self) -> Vec<(HashToken, NodeId)> {
        self.state
            .read()
            .tokens
            .iter()
            .map(|(token, node_id)| (*token, *node_id))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn token_count(&self) -> usize {
        self.state.read().tokens.len()
    }

    pub fn partitioner_name(&self) -> &'static str {
        self.partitioner.name()
    }
}

/// Builder for a `HashRing` with a default vnode count per node.
#[derive(Debug)]
pub struct RingBuilder {
    vnodes: usize,
    nodes: Vec<(Node, Option<usize>)>,
}

impl Default for RingBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RingBuilder {
    pub fn new() -> Self {
        Self {
            vnodes: DEFAULT_VNODES,
            nodes: Vec::new(),
        }
    }

    /// Vnode count for nodes added without an explicit count.
    pub fn with_vnodes(mut self, vnodes: usize) -> Self {
        self.vnodes = vnodes;
        self
    }

    pub fn add_node(mut self, node: Node) -> Self {
        self.nodes.push((node, None));
        self
    }

    pub fn add_node_with_vnodes(mut self, node: Node, vnodes: usize) -> Self {
        self.nodes.push((node, Some(vnodes)));
        self
    }

    pub fn build(self) -> HashRing {
        let ring = HashRing::new();
        for (node, vnodes) in self.nodes {
            ring.add_node(node, vnodes.unwrap_or(self.vnodes));
        }
        ring
    }
}
