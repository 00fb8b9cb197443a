//! Core library for the cluster data model.
//!
//! This crate provides the fundamental abstractions shared by the routing and
//! rebalancing layers:
//! - Node and zone identity
//! - Token types, partitioners and virtual nodes
//! - The consistent hash ring
//! - Immutable cluster topology snapshots
//! - Vector-clock versions

pub mod error;
pub mod node;
pub mod partitioner;
pub mod ring;
pub mod token;
pub mod topology;
pub mod version;
pub mod vnode;

pub use error::{Error, Result};
pub use node::{Node, NodeId, ZoneId};
pub use partitioner::Partitioner;
pub use ring::{HashRing, RingBuilder};
pub use token::Token;
pub use topology::{Topology, TopologyDescriptor};
pub use version::{Occurred, VectorClock, Versioned};
pub use vnode::VirtualNode;
