//! Shared fixtures: an in-process cluster network and a manually driven
//! worker pool.

#![allow(dead_code)]

use bytes::Bytes;
use corelib::{Node, NodeId, Topology, VectorClock, Versioned, ZoneId};
use dashmap::{DashMap, DashSet};
use parking_lot::Mutex;
use rebalancing::{
    InMemoryMetadata, InMemoryStore, Job, Key, PoolError, ProxyPutStats, RedirectConfig,
    RedirectingStore, RemoteStoreCache, RemoteStoreFactory, Result, StaticFailureDetector, Store,
    StoreError, Transforms, Value, WorkerPool,
};
use replication::StoreDefinition;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const STORE: &str = "users";
pub const LOCAL: NodeId = NodeId(1);

pub fn node(id: u32, zone: u32) -> Node {
    Node::with_topology(NodeId(id), format!("host{id}"), 6666, ZoneId(zone))
}

/// Topology from `(node id, zone)` pairs.
pub fn topology(nodes: &[(u32, u32)]) -> Arc<Topology> {
    Arc::new(Topology::with_vnodes(nodes.iter().map(|(id, zone)| node(*id, *zone)), 16).unwrap())
}

pub fn key(name: &str) -> Key {
    Key::copy_from_slice(name.as_bytes())
}

pub fn versioned(payload: &'static str, version: VectorClock) -> Value {
    Versioned::new(Bytes::from_static(payload.as_bytes()), version)
}

/// First `key-{i}` satisfying `pred`.
pub fn find_key(pred: impl Fn(&Key) -> bool) -> Key {
    (0..10_000)
        .map(|i| key(&format!("key-{i}")))
        .find(|key| pred(key))
        .expect("no key satisfies the predicate")
}

/// Stores of every remote node, addressed by host.
#[derive(Default)]
pub struct Network {
    stores: DashMap<String, Arc<InMemoryStore>>,
    down: DashSet<String>,
    calls: DashMap<String, usize>,
    batch_calls: DashMap<String, usize>,
}

impl Network {
    pub fn add_host(&self, host: &str) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new(STORE));
        self.stores.insert(host.to_string(), Arc::clone(&store));
        store
    }

    pub fn store(&self, id: NodeId) -> Arc<InMemoryStore> {
        Arc::clone(self.stores.get(&format!("host{}", id.0)).unwrap().value())
    }

    /// Fail every request to `id` at the transport level.
    pub fn partition(&self, id: NodeId) {
        self.down.insert(format!("host{}", id.0));
    }

    pub fn heal(&self, id: NodeId) {
        self.down.remove(&format!("host{}", id.0));
    }

    pub fn calls(&self, id: NodeId) -> usize {
        self.calls.get(&format!("host{}", id.0)).map(|c| *c).unwrap_or(0)
    }

    pub fn batch_calls(&self, id: NodeId) -> usize {
        self.batch_calls.get(&format!("host{}", id.0)).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }
}

pub struct NetworkFactory(pub Arc<Network>);

impl RemoteStoreFactory for NetworkFactory {
    fn connect(&self, _store_name: &str, host: &str, _port: u16) -> Result<Arc<dyn Store>> {
        if !self.0.stores.contains_key(host) {
            return Err(StoreError::Unreachable(format!("no route to {host}")));
        }
        Ok(Arc::new(RemoteHandle {
            host: host.to_string(),
            network: Arc::clone(&self.0),
        }))
    }
}

struct RemoteHandle {
    host: String,
    network: Arc<Network>,
}

impl RemoteHandle {
    fn target(&self) -> Result<Arc<InMemoryStore>> {
        *self.network.calls.entry(self.host.clone()).or_insert(0) += 1;
        if self.network.down.contains(&self.host) {
            return Err(StoreError::Unreachable(format!("connection to {} reset", self.host)));
        }
        self.network
            .stores
            .get(&self.host)
            .map(|store| Arc::clone(store.value()))
            .ok_or_else(|| StoreError::Unreachable(format!("no route to {}", self.host)))
    }
}

impl Store for RemoteHandle {
    fn name(&self) -> &str {
        STORE
    }

    fn get(&self, key: &Key, transforms: Option<&Bytes>) -> Result<Vec<Value>> {
        self.target()?.get(key, transforms)
    }

    fn get_versions(&self, key: &Key) -> Result<Vec<VectorClock>> {
        self.target()?.get_versions(key)
    }

    fn get_all(&self, keys: &[Key], transforms: Option<&Transforms>) -> Result<HashMap<Key, Vec<Value>>> {
        *self.network.batch_calls.entry(self.host.clone()).or_insert(0) += 1;
        self.target()?.get_all(keys, transforms)
    }

    fn put(&self, key: &Key, value: Value, transforms: Option<&Bytes>) -> Result<()> {
        self.target()?.put(key, value, transforms)
    }

    fn delete(&self, key: &Key, version: &VectorClock) -> Result<bool> {
        self.target()?.delete(key, version)
    }
}

/// Worker pool that queues jobs until the test runs them.
#[derive(Default)]
pub struct RecordingPool {
    jobs: Mutex<Vec<Job>>,
    reject: AtomicBool,
    on_submit: Mutex<Option<Box<dyn FnMut() + Send>>>,
}

impl RecordingPool {
    pub fn reject(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Run `hook` every time a job is submitted.
    pub fn on_submit(&self, hook: impl FnMut() + Send + 'static) {
        *self.on_submit.lock() = Some(Box::new(hook));
    }

    pub fn pending(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Run queued jobs; returns how many ran.
    pub fn run_all(&self) -> usize {
        let jobs: Vec<Job> = self.jobs.lock().drain(..).collect();
        let count = jobs.len();
        for job in jobs {
            job();
        }
        count
    }
}

impl WorkerPool for RecordingPool {
    fn submit(&self, job: Job) -> std::result::Result<(), PoolError> {
        if let Some(hook) = self.on_submit.lock().as_mut() {
            hook();
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(PoolError::Saturated);
        }
        self.jobs.lock().push(job);
        Ok(())
    }
}

/// A stealer node (`LOCAL`) mid-rebalance, with every other node reachable
/// over the in-process network.
pub struct Harness {
    pub metadata: Arc<InMemoryMetadata>,
    pub network: Arc<Network>,
    pub detector: Arc<StaticFailureDetector>,
    pub pool: Arc<RecordingPool>,
    pub stats: Arc<ProxyPutStats>,
    pub local: Arc<InMemoryStore>,
    pub store: RedirectingStore<Arc<InMemoryStore>>,
}

impl Harness {
    pub fn new(source: &[(u32, u32)], current: &[(u32, u32)], store_def: StoreDefinition) -> Self {
        let metadata = Arc::new(InMemoryMetadata::new(LOCAL, topology(source)));
        metadata.add_store_definition(store_def);
        metadata.begin_rebalancing(topology(current));

        let network = Arc::new(Network::default());
        for (id, _) in source.iter().chain(current) {
            if NodeId(*id) != LOCAL && !network.stores.contains_key(&format!("host{id}")) {
                network.add_host(&format!("host{id}"));
            }
        }

        let detector = Arc::new(StaticFailureDetector::new());
        let pool = Arc::new(RecordingPool::default());
        let stats = Arc::new(ProxyPutStats::new(STORE));
        let local = Arc::new(InMemoryStore::new(STORE));
        let store = RedirectingStore::new(
            Arc::clone(&local),
            metadata.clone(),
            detector.clone(),
            Arc::new(RemoteStoreCache::new(Arc::new(NetworkFactory(Arc::clone(&network))))),
            pool.clone(),
            Arc::clone(&stats),
            &RedirectConfig::default(),
        );

        Self {
            metadata,
            network,
            detector,
            pool,
            stats,
            local,
            store,
        }
    }

    /// Node 1 joins a cluster that held only node 2; one replica per key.
    pub fn single_donor() -> Self {
        Self::new(&[(2, 0)], &[(1, 0), (2, 0)], StoreDefinition::consistent(STORE, 1))
    }

    /// Replicas of `key` under the current topology.
    pub fn current_replicas(&self, key: &Key) -> Vec<NodeId> {
        use rebalancing::MetadataStore;
        let store_def = self.metadata.store_definition(STORE).unwrap();
        store_def
            .strategy()
            .replicas_for_key(self.metadata.current_topology().ring(), key)
    }
}
