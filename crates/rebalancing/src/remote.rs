//! Remote store handles, one per (store, donor node).

use crate::error::Result;
use crate::store::Store;
use corelib::{Node, NodeId};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Opens handles to a store hosted on another node.
pub trait RemoteStoreFactory: Send + Sync {
    fn connect(&self, store_name: &str, host: &str, port: u16) -> Result<Arc<dyn Store>>;
}

/// Lazily created, process-lifetime cache of remote store handles.
///
/// Connecting happens outside any map guard, so a slow donor never stalls
/// lookups of other handles. Racing first uses of the same donor may each
/// connect; the first handle published wins and the rest are dropped.
/// Handles are never evicted.
pub struct RemoteStoreCache {
    factory: Arc<dyn RemoteStoreFactory>,
    handles: DashMap<(String, NodeId), Arc<dyn Store>>,
}

impl RemoteStoreCache {
    pub fn new(factory: Arc<dyn RemoteStoreFactory>) -> Self {
        Self {
            factory,
            handles: DashMap::new(),
        }
    }

    pub fn get_or_create(&self, store_name: &str, donor: &Node) -> Result<Arc<dyn Store>> {
        let cache_key = (store_name.to_string(), donor.id);
        if let Some(handle) = self.handles.get(&cache_key) {
            return Ok(Arc::clone(handle.value()));
        }

        info!(
            store = store_name,
            donor = %donor.id,
            address = %donor.address(),
            "creating redirecting store handle"
        );
        let handle = self.factory.connect(store_name, &donor.host, donor.port)?;
        match self.handles.entry(cache_key) {
            Entry::Occupied(entry) => {
                debug!(store = store_name, donor = %donor.id, "handle raced, keeping published one");
                Ok(Arc::clone(entry.get()))
            }
            Entry::Vacant(entry) => Ok(Arc::clone(entry.insert(handle).value())),
        }
    }

    pub fn contains(&self, store_name: &str, donor: NodeId) -> bool {
        self.handles.contains_key(&(store_name.to_string(), donor))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl std::fmt::Debug for RemoteStoreCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStoreCache")
            .field("handles", &self.handles.len())
            .finish_non_exhaustive()
    }
}
