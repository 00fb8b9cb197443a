//! Proxy calls against donor nodes.
//!
//! Every call is gated by the failure detector and timed; the outcome is fed
//! back to the detector. A donor that is marked down, or whose transport
//! fails, surfaces as `ProxyUnreachable`: there is no local fallback, since
//! answering without the donor's data could serve or acknowledge against a
//! stale value.

use crate::error::{Result, StoreError};
use crate::failure_detector::FailureDetector;
use crate::metadata::MetadataStore;
use crate::remote::RemoteStoreCache;
use crate::store::{key_hex, Key, Store, Transforms, Value};
use bytes::Bytes;
use corelib::{Node, NodeId};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

/// Issues reads and writes for one store against donor nodes.
pub struct DonorProxy {
    store_name: String,
    metadata: Arc<dyn MetadataStore>,
    failure_detector: Arc<dyn FailureDetector>,
    remote_stores: Arc<RemoteStoreCache>,
}

impl DonorProxy {
    pub fn new(
        store_name: impl Into<String>,
        metadata: Arc<dyn MetadataStore>,
        failure_detector: Arc<dyn FailureDetector>,
        remote_stores: Arc<RemoteStoreCache>,
    ) -> Self {
        Self {
            store_name: store_name.into(),
            metadata,
            failure_detector,
            remote_stores,
        }
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    /// Fetch all versions of `key` from `donor`.
    pub fn proxy_get(&self, key: &Key, donor: NodeId, transforms: Option<&Bytes>) -> Result<Vec<Value>> {
        let node = self.donor_node(donor)?;
        self.check_available(&node)?;
        trace!(store = %self.store_name, donor = %donor, key = %key_hex(key), "proxy get");
        self.call(&node, |remote| remote.get(key, transforms))
    }

    /// Fetch many keys, one batched call per donor.
    ///
    /// Every donor is checked before any call is issued; one unreachable donor
    /// fails the whole batch.
    pub fn proxy_get_all(
        &self,
        key_to_donor: &HashMap<Key, NodeId>,
        transforms: Option<&Transforms>,
    ) -> Result<HashMap<Key, Vec<Value>>> {
        let mut donor_to_keys: BTreeMap<NodeId, Vec<Key>> = BTreeMap::new();
        for (key, donor) in key_to_donor {
            donor_to_keys.entry(*donor).or_default().push(key.clone());
        }

        let mut donors = Vec::with_capacity(donor_to_keys.len());
        for (donor, keys) in donor_to_keys {
            let node = self.donor_node(donor)?;
            self.check_available(&node)?;
            donors.push((node, keys));
        }

        let mut gathered = HashMap::with_capacity(key_to_donor.len());
        for (node, keys) in donors {
            trace!(store = %self.store_name, donor = %node.id, keys = keys.len(), "proxy get_all");
            let fetched = self.call(&node, |remote| remote.get_all(&keys, transforms))?;
            gathered.extend(fetched);
        }
        Ok(gathered)
    }

    /// Write `value` to `donor`.
    pub fn proxy_put(&self, key: &Key, value: Value, transforms: Option<&Bytes>, donor: NodeId) -> Result<()> {
        let node = self.donor_node(donor)?;
        self.check_available(&node)?;
        trace!(store = %self.store_name, donor = %donor, key = %key_hex(key), "proxy put");
        self.call(&node, |remote| remote.put(key, value, transforms))
    }

    /// Address of `donor`: current topology first, then the source topology
    /// for donors that are leaving the cluster.
    fn donor_node(&self, donor: NodeId) -> Result<Node> {
        if let Some(node) = self.metadata.current_topology().node(donor) {
            return Ok(node.clone());
        }
        if let Some(source) = self.metadata.source_topology() {
            if let Some(node) = source.node(donor) {
                return Ok(node.clone());
            }
        }
        Err(StoreError::Metadata(corelib::Error::UnknownNode(donor)))
    }

    fn check_available(&self, node: &Node) -> Result<()> {
        if self.failure_detector.is_available(node) {
            Ok(())
        } else {
            Err(StoreError::ProxyUnreachable {
                node: node.id,
                reason: "marked down by failure detector".into(),
            })
        }
    }

    fn call<T>(&self, node: &Node, op: impl FnOnce(&dyn Store) -> Result<T>) -> Result<T> {
        let start = Instant::now();
        let outcome = self
            .remote_stores
            .get_or_create(&self.store_name, node)
            .and_then(|remote| op(remote.as_ref()));
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        match outcome {
            Ok(value) => {
                self.failure_detector.record_success(node, elapsed_ms);
                Ok(value)
            }
            Err(err @ StoreError::Unreachable(_)) => {
                self.failure_detector.record_exception(node, elapsed_ms, &err);
                Err(StoreError::ProxyUnreachable {
                    node: node.id,
                    reason: err.to_string(),
                })
            }
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for DonorProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DonorProxy")
            .field("store_name", &self.store_name)
            .field("remote_stores", &self.remote_stores)
            .finish_non_exhaustive()
    }
}
