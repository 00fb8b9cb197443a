//! `RedirectingStore`: the decorator a stealer node puts in front of its local
//! storage while it is rebalancing.
//!
//! For each key the store redirects, reads and writes first fetch the key from
//! the donor and merge it locally, then continue against local storage. Writes
//! additionally schedule a forward of the committed value back to the donor.

use crate::config::RedirectConfig;
use crate::error::{Result, StoreError};
use crate::failure_detector::FailureDetector;
use crate::forward::{BoundedWorkerPool, ProxyPutTask, WorkerPool};
use crate::merge::{merge_all_locally, merge_locally};
use crate::metadata::MetadataStore;
use crate::proxy::DonorProxy;
use crate::remote::RemoteStoreCache;
use crate::resolver::RedirectResolver;
use crate::stats::{ProxyPutStats, RedirectFlags, RedirectStatus};
use crate::store::{key_hex, Key, Store, Transforms, Value};
use bytes::Bytes;
use corelib::{NodeId, VectorClock};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct RedirectingStore<S: Store> {
    inner: S,
    metadata: Arc<dyn MetadataStore>,
    resolver: RedirectResolver,
    proxy: Arc<DonorProxy>,
    worker_pool: Arc<dyn WorkerPool>,
    stats: Arc<ProxyPutStats>,
    flags: RedirectFlags,
}

impl<S: Store> RedirectingStore<S> {
    pub fn new(
        inner: S,
        metadata: Arc<dyn MetadataStore>,
        failure_detector: Arc<dyn FailureDetector>,
        remote_stores: Arc<RemoteStoreCache>,
        worker_pool: Arc<dyn WorkerPool>,
        stats: Arc<ProxyPutStats>,
        config: &RedirectConfig,
    ) -> Self {
        let proxy = Arc::new(DonorProxy::new(
            inner.name(),
            Arc::clone(&metadata),
            failure_detector,
            remote_stores,
        ));
        Self {
            resolver: RedirectResolver::new(Arc::clone(&metadata)),
            inner,
            metadata,
            proxy,
            worker_pool,
            stats,
            flags: RedirectFlags::new(config.redirecting_enabled, config.proxy_put_enabled),
        }
    }

    /// Build with a `BoundedWorkerPool` sized from `config`.
    pub fn from_config(
        inner: S,
        metadata: Arc<dyn MetadataStore>,
        failure_detector: Arc<dyn FailureDetector>,
        remote_stores: Arc<RemoteStoreCache>,
        stats: Arc<ProxyPutStats>,
        config: &RedirectConfig,
    ) -> io::Result<Self> {
        let worker_pool = Arc::new(BoundedWorkerPool::from_config(config)?);
        Ok(Self::new(
            inner,
            metadata,
            failure_detector,
            remote_stores,
            worker_pool,
            stats,
            config,
        ))
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn set_redirecting_enabled(&self, enabled: bool) {
        info!(store = self.inner.name(), enabled, "redirection toggled");
        self.flags.set_redirecting(enabled);
    }

    pub fn is_redirecting_enabled(&self) -> bool {
        self.flags.redirecting()
    }

    pub fn set_proxy_put_enabled(&self, enabled: bool) {
        info!(store = self.inner.name(), enabled, "proxy put toggled");
        self.flags.set_proxy_put(enabled);
    }

    pub fn is_proxy_put_enabled(&self) -> bool {
        self.flags.proxy_put()
    }

    pub fn proxy_put_stats(&self) -> &Arc<ProxyPutStats> {
        &self.stats
    }

    pub fn status(&self) -> RedirectStatus {
        let flags = self.flags.snapshot();
        RedirectStatus {
            store: self.inner.name().to_string(),
            redirecting_enabled: flags.redirecting,
            proxy_put_enabled: flags.proxy_put,
            proxy_puts: self.stats.counts(),
        }
    }

    /// Donor for `key` under the flag value read once by the caller.
    fn donor_for(&self, key: &Key, redirecting: bool) -> Result<Option<NodeId>> {
        self.resolver.resolve(self.inner.name(), key, redirecting)
    }

    /// Proxy `key` from `donor` and merge whatever it holds.
    ///
    /// Fetched without the client's transforms: the values are merged into
    /// local storage, which must hold them untransformed.
    fn catch_up(&self, key: &Key, donor: NodeId) -> Result<()> {
        let proxied = self.proxy.proxy_get(key, donor, None)?;
        debug!(
            store = self.inner.name(),
            donor = %donor,
            key = %key_hex(key),
            versions = proxied.len(),
            "merging proxied versions"
        );
        merge_locally(&self.inner, key, &proxied)
    }

    fn schedule_forward(&self, key: &Key, value: Value, transforms: Option<&Bytes>, donor: NodeId) {
        let task = ProxyPutTask::new(
            key.clone(),
            value,
            transforms.cloned(),
            donor,
            Arc::clone(&self.proxy),
            Arc::clone(&self.stats),
        );
        self.stats.report_submission();
        if let Err(err) = self.worker_pool.submit(Box::new(move || task.run())) {
            warn!(
                store = self.inner.name(),
                donor = %donor,
                key = %key_hex(key),
                error = %err,
                "proxy put rejected by worker pool"
            );
            self.stats.report_failure();
        }
    }
}

impl<S: Store> Store for RedirectingStore<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn get(&self, key: &Key, transforms: Option<&Bytes>) -> Result<Vec<Value>> {
        if let Some(donor) = self.donor_for(key, self.flags.redirecting())? {
            self.catch_up(key, donor)?;
        }
        self.inner.get(key, transforms)
    }

    fn get_versions(&self, key: &Key) -> Result<Vec<VectorClock>> {
        if let Some(donor) = self.donor_for(key, self.flags.redirecting())? {
            self.catch_up(key, donor)?;
        }
        self.inner.get_versions(key)
    }

    fn get_all(&self, keys: &[Key], transforms: Option<&Transforms>) -> Result<HashMap<Key, Vec<Value>>> {
        if let Some(plan) = self.resolver.plan(self.inner.name(), self.flags.redirecting())? {
            let key_to_donor: HashMap<Key, NodeId> = keys
                .iter()
                .filter_map(|key| plan.donor_for(key).map(|donor| (key.clone(), donor)))
                .collect();
            if !key_to_donor.is_empty() {
                let proxied = self.proxy.proxy_get_all(&key_to_donor, None)?;
                merge_all_locally(&self.inner, &proxied)?;
            }
        }
        self.inner.get_all(keys, transforms)
    }

    fn put(&self, key: &Key, value: Value, transforms: Option<&Bytes>) -> Result<()> {
        let store_def = self.metadata.store_definition(self.inner.name())?;
        if store_def.is_read_only() {
            return Err(StoreError::Unsupported(format!(
                "put is not supported on read-only store {}",
                store_def.name
            )));
        }

        let flags = self.flags.snapshot();
        let plan = self.resolver.plan_for(store_def, flags.redirecting);
        let donor = plan.as_ref().and_then(|plan| plan.donor_for(key));
        if let Some(donor) = donor {
            self.catch_up(key, donor)?;
        }

        // The local commit must succeed before anything is forwarded.
        self.inner.put(key, value.clone(), transforms)?;

        if let (Some(plan), Some(donor)) = (plan, donor) {
            if !flags.proxy_put {
                return Ok(());
            }
            if plan.current().replicas_for_key(key).contains(&donor) {
                debug!(
                    store = self.inner.name(),
                    donor = %donor,
                    key = %key_hex(key),
                    "donor is a live replica, not forwarding"
                );
                return Ok(());
            }
            self.schedule_forward(key, value, transforms, donor);
        }
        Ok(())
    }

    /// Deletes are not redirected.
    fn delete(&self, key: &Key, version: &VectorClock) -> Result<bool> {
        self.inner.delete(key, version)
    }
}

impl<S: Store> std::fmt::Debug for RedirectingStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectingStore")
            .field("store", &self.inner.name())
            .field("resolver", &self.resolver)
            .field("flags", &self.flags)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
