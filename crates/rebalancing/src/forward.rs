//! Asynchronous forward-on-write.
//!
//! After a write commits locally on a stealer, the value is pushed to the donor
//! so the donor converges if it resumes serving the partition. Forwards run on
//! a bounded worker pool, are submitted at most once per write, are never
//! retried and report their outcome only to `ProxyPutStats`.

use crate::config::RedirectConfig;
use crate::error::{Result, StoreError};
use crate::proxy::DonorProxy;
use crate::stats::ProxyPutStats;
use crate::store::{key_hex, Key, Value};
use bytes::Bytes;
use corelib::NodeId;
use crossbeam::channel::{self, Sender, TrySendError};
use parking_lot::{Mutex, RwLock};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tracing::debug;

/// Unit of work accepted by a `WorkerPool`.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("worker pool queue is full")]
    Saturated,
    #[error("worker pool is shut down")]
    ShutDown,
}

/// Bounded asynchronous executor. No ordering or completion guarantee.
pub trait WorkerPool: Send + Sync {
    fn submit(&self, job: Job) -> std::result::Result<(), PoolError>;
}

/// Fixed set of threads draining a bounded queue.
///
/// `submit` never blocks: a full queue rejects the job with `Saturated`.
pub struct BoundedWorkerPool {
    sender: RwLock<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl BoundedWorkerPool {
    pub fn new(threads: usize, capacity: usize) -> io::Result<Self> {
        let (sender, receiver) = channel::bounded::<Job>(capacity.max(1));
        let mut workers = Vec::with_capacity(threads.max(1));
        for index in 0..threads.max(1) {
            let receiver = receiver.clone();
            let worker = thread::Builder::new()
                .name(format!("proxy-put-{index}"))
                .spawn(move || {
                    for job in receiver.iter() {
                        job();
                    }
                })?;
            workers.push(worker);
        }

        Ok(Self {
            sender: RwLock::new(Some(sender)),
            workers: Mutex::new(workers),
        })
    }

    /// Pool sized by `proxy_put_threads` with a queue of `proxy_put_queue_capacity`.
    pub fn from_config(config: &RedirectConfig) -> io::Result<Self> {
        Self::new(config.proxy_put_threads, config.proxy_put_queue_capacity)
    }

    /// Stop accepting jobs, let queued jobs finish and join the workers.
    pub fn shutdown(&self) {
        self.sender.write().take();
        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for worker in workers {
            if worker.join().is_err() {
                debug!("proxy put worker panicked");
            }
        }
    }
}

impl WorkerPool for BoundedWorkerPool {
    fn submit(&self, job: Job) -> std::result::Result<(), PoolError> {
        let sender = self.sender.read();
        let Some(sender) = sender.as_ref() else {
            return Err(PoolError::ShutDown);
        };
        sender.try_send(job).map_err(|err| match err {
            TrySendError::Full(_) => PoolError::Saturated,
            TrySendError::Disconnected(_) => PoolError::ShutDown,
        })
    }
}

impl Drop for BoundedWorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for BoundedWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedWorkerPool")
            .field("workers", &self.workers.lock().len())
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForwardOutcome {
    Written,
    /// The donor already holds this version or a newer one.
    AlreadyCurrent,
}

/// One forward of a locally committed write to its donor.
#[derive(Debug)]
pub struct ProxyPutTask {
    key: Key,
    value: Value,
    transforms: Option<Bytes>,
    donor: NodeId,
    proxy: Arc<DonorProxy>,
    stats: Arc<ProxyPutStats>,
}

impl ProxyPutTask {
    pub fn new(
        key: Key,
        value: Value,
        transforms: Option<Bytes>,
        donor: NodeId,
        proxy: Arc<DonorProxy>,
        stats: Arc<ProxyPutStats>,
    ) -> Self {
        Self {
            key,
            value,
            transforms,
            donor,
            proxy,
            stats,
        }
    }

    pub fn donor(&self) -> NodeId {
        self.donor
    }

    pub fn key(&self) -> &Key {
        &self.key
    }

    /// Execute the forward, absorbing any error into the stats.
    pub fn run(self) {
        match self.forward() {
            Ok(outcome) => {
                debug!(
                    store = self.proxy.store_name(),
                    donor = %self.donor,
                    key = %key_hex(&self.key),
                    ?outcome,
                    "proxy put completed"
                );
                self.stats.report_completion();
            }
            Err(err) => {
                debug!(
                    store = self.proxy.store_name(),
                    donor = %self.donor,
                    key = %key_hex(&self.key),
                    error = %err,
                    "proxy put failed"
                );
                self.stats.report_failure();
            }
        }
    }

    fn forward(&self) -> Result<ForwardOutcome> {
        let on_donor = self.proxy.proxy_get(&self.key, self.donor, None)?;
        if on_donor
            .iter()
            .any(|existing| self.value.version.is_obsoleted_by(&existing.version))
        {
            return Ok(ForwardOutcome::AlreadyCurrent);
        }

        match self.proxy.proxy_put(
            &self.key,
            self.value.clone(),
            self.transforms.as_ref(),
            self.donor,
        ) {
            Ok(()) => Ok(ForwardOutcome::Written),
            Err(StoreError::ObsoleteVersion(_)) => Ok(ForwardOutcome::AlreadyCurrent),
            Err(err) => Err(err),
        }
    }
}
