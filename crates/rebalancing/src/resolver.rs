//! Redirect resolution.
//!
//! A stealer proxies to whichever node played the *same replica role in the
//! same zone* under the source topology. Redirection is role-preserving, so
//! zone-local semantics hold while data moves.
//!
//! No redirection applies when:
//! - redirection is disabled or the node is not rebalancing
//! - the source topology is missing (should not happen while rebalancing)
//! - this node is not a replica of the key in the current topology
//! - the zone does not exist in the source topology (zone expansion)
//! - the source has no node at that rank, or the node is this node

use crate::error::Result;
use crate::metadata::{MetadataStore, ServerState};
use crate::store::key_hex;
use corelib::{NodeId, ZoneId};
use replication::{ReplicationError, RoutingSnapshot, StoreDefinition};
use std::sync::Arc;
use tracing::{trace, warn};

/// Routing state captured once per operation while redirection applies.
#[derive(Debug, Clone)]
pub struct RedirectPlan {
    node_id: NodeId,
    zone: ZoneId,
    current: RoutingSnapshot,
    source: RoutingSnapshot,
}

impl RedirectPlan {
    pub fn current(&self) -> &RoutingSnapshot {
        &self.current
    }

    pub fn source(&self) -> &RoutingSnapshot {
        &self.source
    }

    /// Donor to proxy `key` to, if any.
    pub fn donor_for(&self, key: &[u8]) -> Option<NodeId> {
        let rank = match self.current.replica_rank(self.zone, self.node_id, key) {
            Ok(rank) => rank,
            Err(err) => {
                trace!(node = %self.node_id, key = %key_hex(key), %err, "no local replica role");
                return None;
            }
        };

        match self.source.node_for_rank(self.zone, rank, key) {
            Ok(donor) if donor == self.node_id => None,
            Ok(donor) => Some(donor),
            Err(ReplicationError::ZoneNotRepresented { zone }) => {
                trace!(%zone, key = %key_hex(key), "zone absent from source topology");
                None
            }
            Err(err) => {
                trace!(node = %self.node_id, key = %key_hex(key), %err, "no donor for replica role");
                None
            }
        }
    }
}

/// Decides whether this node must redirect a key, and to whom.
pub struct RedirectResolver {
    metadata: Arc<dyn MetadataStore>,
}

impl RedirectResolver {
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    /// Plan for `store_name`, or `None` when no redirection can apply.
    ///
    /// The store definition is only looked up once redirection is known to be
    /// possible, so the normal path pays for two atomic loads at most.
    pub fn plan(&self, store_name: &str, redirecting_enabled: bool) -> Result<Option<RedirectPlan>> {
        if !self.is_redirecting(redirecting_enabled) {
            return Ok(None);
        }
        let store_def = self.metadata.store_definition(store_name)?;
        Ok(self.plan_for(store_def, redirecting_enabled))
    }

    /// Plan for an already resolved store definition.
    pub fn plan_for(&self, store_def: Arc<StoreDefinition>, redirecting_enabled: bool) -> Option<RedirectPlan> {
        if !self.is_redirecting(redirecting_enabled) {
            return None;
        }

        let node_id = self.metadata.node_id();
        let Some(source) = self.metadata.source_topology() else {
            warn!(node = %node_id, store = %store_def.name, "rebalancing without a source topology");
            return None;
        };

        let current = RoutingSnapshot::new(self.metadata.current_topology(), Arc::clone(&store_def));
        let Some(zone) = current.topology().node(node_id).map(|node| node.zone) else {
            warn!(node = %node_id, "node is missing from the current topology");
            return None;
        };

        Some(RedirectPlan {
            node_id,
            zone,
            current,
            source: RoutingSnapshot::new(source, store_def),
        })
    }

    /// Donor for a single key of `store_name`.
    pub fn resolve(&self, store_name: &str, key: &[u8], redirecting_enabled: bool) -> Result<Option<NodeId>> {
        Ok(self
            .plan(store_name, redirecting_enabled)?
            .and_then(|plan| plan.donor_for(key)))
    }

    fn is_redirecting(&self, redirecting_enabled: bool) -> bool {
        redirecting_enabled && self.metadata.server_state() == ServerState::Rebalancing
    }
}

impl std::fmt::Debug for RedirectResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectResolver")
            .field("node_id", &self.metadata.node_id())
            .finish()
    }
}
