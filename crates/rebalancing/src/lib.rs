//! Online-migration redirection for a replicated key-value store.
//!
//! While a node is rebalancing it may own keys it does not hold yet. The
//! [`RedirectingStore`] decorator fetches those keys from the node that used to
//! play the same replica role (the donor), merges them into local storage and,
//! on writes, forwards the committed value back to the donor in the background.

pub mod config;
pub mod error;
pub mod failure_detector;
pub mod forward;
pub mod merge;
pub mod metadata;
pub mod proxy;
pub mod redirecting;
pub mod remote;
pub mod resolver;
pub mod stats;
pub mod store;

pub use config::{ConfigError, RedirectConfig};
pub use error::{Result, StoreError};
pub use failure_detector::{FailureDetector, StaticFailureDetector};
pub use forward::{BoundedWorkerPool, Job, PoolError, ProxyPutTask, WorkerPool};
pub use merge::{merge_all_locally, merge_locally};
pub use metadata::{InMemoryMetadata, MetadataStore, ServerState};
pub use proxy::DonorProxy;
pub use redirecting::RedirectingStore;
pub use remote::{RemoteStoreCache, RemoteStoreFactory};
pub use resolver::{RedirectPlan, RedirectResolver};
pub use stats::{FlagSnapshot, ProxyPutCounts, ProxyPutStats, RedirectFlags, RedirectStatus};
pub use store::{InMemoryStore, Key, Store, Transforms, Value};
