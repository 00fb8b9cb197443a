//! Failure detector capability.

use crate::error::StoreError;
use corelib::{Node, NodeId};
use dashmap::{DashMap, DashSet};
use tracing::debug;

/// Reachability oracle and latency sink for remote nodes.
pub trait FailureDetector: Send + Sync {
    fn is_available(&self, node: &Node) -> bool;

    fn record_success(&self, node: &Node, elapsed_ms: u64);

    fn record_exception(&self, node: &Node, elapsed_ms: u64, error: &StoreError);
}

/// Failure detector whose availability is set explicitly.
///
/// Recorded outcomes are counted but never change availability.
#[derive(Debug, Default)]
pub struct StaticFailureDetector {
    down: DashSet<NodeId>,
    successes: DashMap<NodeId, u64>,
    failures: DashMap<NodeId, u64>,
}

impl StaticFailureDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_down(&self, node: NodeId) {
        self.down.insert(node);
    }

    pub fn mark_up(&self, node: NodeId) {
        self.down.remove(&node);
    }

    pub fn successes(&self, node: NodeId) -> u64 {
        self.successes.get(&node).map(|count| *count).unwrap_or(0)
    }

    pub fn failures(&self, node: NodeId) -> u64 {
        self.failures.get(&node).map(|count| *count).unwrap_or(0)
    }
}

impl FailureDetector for StaticFailureDetector {
    fn is_available(&self, node: &Node) -> bool {
        !self.down.contains(&node.id)
    }

    fn record_success(&self, node: &Node, _elapsed_ms: u64) {
        *self.successes.entry(node.id).or_insert(0) += 1;
    }

    fn record_exception(&self, node: &Node, elapsed_ms: u64, error: &StoreError) {
        debug!(node = %node.id, elapsed_ms, %error, "recorded failure");
        *self.failures.entry(node.id).or_insert(0) += 1;
    }
}
