//! Store definitions.

use crate::strategy::{NetworkTopologyStrategy, ReplicationStrategy, SimpleStrategy};
use corelib::ZoneId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage kind of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    #[default]
    ReadWrite,
    /// Bulk-loaded store; rejects writes.
    ReadOnly,
}

/// Parameters of the routing strategy used by a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingParams {
    /// First `replication_factor` distinct nodes clockwise, regardless of zone.
    Consistent { replication_factor: usize },
    /// First `n` distinct nodes clockwise within each zone.
    ZoneAware {
        zone_replication_factor: BTreeMap<ZoneId, usize>,
    },
}

/// Replication definition of one store, looked up by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreDefinition {
    pub name: String,
    #[serde(default)]
    pub kind: StoreKind,
    pub routing: RoutingParams,
}

impl StoreDefinition {
    pub fn consistent(name: impl Into<String>, replication_factor: usize) -> Self {
        Self {
            name: name.into(),
            kind: StoreKind::ReadWrite,
            routing: RoutingParams::Consistent { replication_factor },
        }
    }

    pub fn zone_aware(
        name: impl Into<String>,
        zone_replication_factor: impl IntoIterator<Item = (ZoneId, usize)>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: StoreKind::ReadWrite,
            routing: RoutingParams::ZoneAware {
                zone_replication_factor: zone_replication_factor.into_iter().collect(),
            },
        }
    }

    pub fn with_kind(mut self, kind: StoreKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn is_read_only(&self) -> bool {
        self.kind == StoreKind::ReadOnly
    }

    /// Total number of replicas per key.
    pub fn replication_factor(&self) -> usize {
        match &self.routing {
            RoutingParams::Consistent { replication_factor } => *replication_factor,
            RoutingParams::ZoneAware {
                zone_replication_factor,
            } => zone_replication_factor.values().sum(),
        }
    }

    /// Strategy implementing this definition's routing parameters.
    pub fn strategy(&self) -> Box<dyn ReplicationStrategy> {
        match &self.routing {
            RoutingParams::Consistent { replication_factor } => {
                Box::new(SimpleStrategy::new(*replication_factor))
            }
            RoutingParams::ZoneAware {
                zone_replication_factor,
            } => Box::new(NetworkTopologyStrategy::new(zone_replication_factor.clone())),
        }
    }
}
