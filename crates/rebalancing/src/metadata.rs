//! Cluster metadata as seen by one node.
//!
//! The topology-management side of the system owns these values and swaps
//! them during a rebalance; the redirecting layer only reads them. Any two
//! reads may observe different snapshots.

use crate::error::{Result, StoreError};
use corelib::{NodeId, Topology};
use parking_lot::RwLock;
use replication::StoreDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Migration state of this node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    #[default]
    Normal,
    /// Stealing partitions; a source topology must be present.
    Rebalancing,
}

/// Read-only view of cluster metadata.
pub trait MetadataStore: Send + Sync {
    fn node_id(&self) -> NodeId;

    fn current_topology(&self) -> Arc<Topology>;

    /// Pre-rebalance topology; `None` outside a rebalance.
    fn source_topology(&self) -> Option<Arc<Topology>>;

    fn server_state(&self) -> ServerState;

    fn store_definition(&self, store_name: &str) -> Result<Arc<StoreDefinition>>;
}

#[derive(Debug)]
struct ClusterState {
    current: Arc<Topology>,
    source: Option<Arc<Topology>>,
    server_state: ServerState,
}

/// `MetadataStore` held in memory, with the mutations a topology manager
/// performs around a rebalance.
#[derive(Debug)]
pub struct InMemoryMetadata {
    node_id: NodeId,
    cluster: RwLock<ClusterState>,
    store_defs: RwLock<HashMap<String, Arc<StoreDefinition>>>,
}

impl InMemoryMetadata {
    pub fn new(node_id: NodeId, topology: Arc<Topology>) -> Self {
        Self {
            node_id,
            cluster: RwLock::new(ClusterState {
                current: topology,
                source: None,
                server_state: ServerState::Normal,
            }),
            store_defs: RwLock::new(HashMap::new()),
        }
    }

    pub fn add_store_definition(&self, store_def: StoreDefinition) {
        self.store_defs
            .write()
            .insert(store_def.name.clone(), Arc::new(store_def));
    }

    /// Enter the rebalancing state: the current topology becomes the source
    /// and `target` becomes current. The source is set before the state flips.
    pub fn begin_rebalancing(&self, target: Arc<Topology>) {
        let mut cluster = self.cluster.write();
        let previous = std::mem::replace(&mut cluster.current, target);
        cluster.source = Some(previous);
        cluster.server_state = ServerState::Rebalancing;
        info!(node = %self.node_id, "entered rebalancing state");
    }

    /// Leave the rebalancing state. The state flips before the source is
    /// cleared.
    pub fn finish_rebalancing(&self) {
        let mut cluster = self.cluster.write();
        cluster.server_state = ServerState::Normal;
        cluster.source = None;
        info!(node = %self.node_id, "left rebalancing state");
    }

    pub fn set_current_topology(&self, topology: Arc<Topology>) {
        self.cluster.write().current = topology;
    }

    pub fn set_source_topology(&self, topology: Option<Arc<Topology>>) {
        self.cluster.write().source = topology;
    }

    pub fn set_server_state(&self, state: ServerState) {
        self.cluster.write().server_state = state;
    }
}

impl MetadataStore for InMemoryMetadata {
    fn node_id(&self) -> NodeId {
        self.node_id
    }

    fn current_topology(&self) -> Arc<Topology> {
        Arc::clone(&self.cluster.read().current)
    }

    fn source_topology(&self) -> Option<Arc<Topology>> {
        self.cluster.read().source.clone()
    }

    fn server_state(&self) -> ServerState {
        self.cluster.read().server_state
    }

    fn store_definition(&self, store_name: &str) -> Result<Arc<StoreDefinition>> {
        self.store_defs
            .read()
            .get(store_name)
            .cloned()
            .ok_or_else(|| StoreError::UnknownStore(store_name.to_string()))
    }
}
