//! Error types for the core library.

use crate::node::NodeId;
use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid node configuration
    #[error("Invalid node: {0}")]
    InvalidNode(String),
    /// The same node id appears twice in one topology
    #[error("Duplicate node id {0} in topology")]
    DuplicateNode(NodeId),
    /// A node id that the topology does not know about
    #[error("Unknown node {0}")]
    UnknownNode(NodeId),
    /// Topology error
    #[error("Topology error: {0}")]
    Topology(String),
}
