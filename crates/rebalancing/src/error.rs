//! Store errors.

use corelib::NodeId;
use replication::ReplicationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The write is not newer than a version already stored. Expected while a
    /// partition is migrating.
    #[error("obsolete version: {0}")]
    ObsoleteVersion(String),

    /// Transport-level failure talking to a remote store.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// A donor needed for a synchronous catch-up could not be reached.
    #[error("failed to reach proxy node {node}: {reason}")]
    ProxyUnreachable { node: NodeId, reason: String },

    #[error("unsupported operation: {0}")]
    Unsupported(String),

    #[error("unknown store {0}")]
    UnknownStore(String),

    #[error(transparent)]
    Metadata(#[from] corelib::Error),

    #[error(transparent)]
    Routing(#[from] ReplicationError),
}

impl StoreError {
    pub fn is_obsolete_version(&self) -> bool {
        matches!(self, StoreError::ObsoleteVersion(_))
    }
}
