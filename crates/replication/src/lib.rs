//! Replication strategies and per-store routing.
//!
//! This crate determines, for a store and a topology snapshot:
//! - How many replicas a key has, in total and per zone
//! - Which nodes hold those replicas, in rank order
//! - Which node plays a given replica role in a given zone

pub mod error;
pub mod routing;
pub mod store_def;
pub mod strategy;

pub use error::{ReplicationError, Result};
pub use routing::RoutingSnapshot;
pub use store_def::{RoutingParams, StoreDefinition, StoreKind};
pub use strategy::{NetworkTopologyStrategy, ReplicationStrategy, SimpleStrategy};
