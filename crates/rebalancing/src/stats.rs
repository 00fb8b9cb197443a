//! Forward statistics and administrative toggles.

use metrics::counter;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Point-in-time copy of the forward counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProxyPutCounts {
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
}

/// Counters for asynchronous proxy puts.
///
/// Monotonic and read for observability only. A per-store instance may roll
/// up into a node-wide parent.
#[derive(Debug)]
pub struct ProxyPutStats {
    scope: String,
    submitted: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    parent: Option<Arc<ProxyPutStats>>,
}

impl ProxyPutStats {
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            parent: None,
        }
    }

    /// Counters that also increment `parent`.
    pub fn with_parent(scope: impl Into<String>, parent: Arc<ProxyPutStats>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::new(scope)
        }
    }

    pub fn report_submission(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
        if let Some(parent) = &self.parent {
            parent.submitted.fetch_add(1, Ordering::Relaxed);
        }
        counter!("redirect.proxy_put.submitted", "store" => self.scope.clone()).increment(1);
    }

    pub fn report_completion(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        if let Some(parent) = &self.parent {
            parent.completed.fetch_add(1, Ordering::Relaxed);
        }
        counter!("redirect.proxy_put.completed", "store" => self.scope.clone()).increment(1);
    }

    pub fn report_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        if let Some(parent) = &self.parent {
            parent.failed.fetch_add(1, Ordering::Relaxed);
        }
        counter!("redirect.proxy_put.failed", "store" => self.scope.clone()).increment(1);
    }

    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn counts(&self) -> ProxyPutCounts {
        ProxyPutCounts {
            submitted: self.submitted(),
            completed: self.completed(),
            failed: self.failed(),
        }
    }
}

/// Flag values captured once at the start of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSnapshot {
    pub redirecting: bool,
    pub proxy_put: bool,
}

/// Runtime toggles, flippable while operations are in flight.
#[derive(Debug)]
pub struct RedirectFlags {
    redirecting: AtomicBool,
    proxy_put: AtomicBool,
}

impl RedirectFlags {
    pub fn new(redirecting: bool, proxy_put: bool) -> Self {
        Self {
            redirecting: AtomicBool::new(redirecting),
            proxy_put: AtomicBool::new(proxy_put),
        }
    }

    pub fn snapshot(&self) -> FlagSnapshot {
        FlagSnapshot {
            redirecting: self.redirecting(),
            proxy_put: self.proxy_put(),
        }
    }

    pub fn redirecting(&self) -> bool {
        self.redirecting.load(Ordering::Acquire)
    }

    pub fn proxy_put(&self) -> bool {
        self.proxy_put.load(Ordering::Acquire)
    }

    pub fn set_redirecting(&self, enabled: bool) {
        self.redirecting.store(enabled, Ordering::Release);
    }

    pub fn set_proxy_put(&self, enabled: bool) {
        self.proxy_put.store(enabled, Ordering::Release);
    }
}

/// Monitoring view of one redirecting store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedirectStatus {
    pub store: String,
    pub redirecting_enabled: bool,
    pub proxy_put_enabled: bool,
    pub proxy_puts: ProxyPutCounts,
}
