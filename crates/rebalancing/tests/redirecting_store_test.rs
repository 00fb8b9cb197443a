// Integration tests for the redirecting store.
//
// Every scenario runs node 1 as the stealer. Test categories:
// 1. Read path: proxy fetch and merge-on-read
// 2. Write path: catch-up, local commit and forward scheduling
// 3. Conditions under which nothing is redirected
// 4. Forward execution and its accounting

mod common;

use common::*;
use corelib::{NodeId, VectorClock};
use rebalancing::{
    InMemoryStore, MetadataStore, ProxyPutCounts, ProxyPutStats, RedirectConfig,
    RedirectResolver, RedirectingStore, RemoteStoreCache, ServerState, Store, StoreError,
};
use replication::{StoreDefinition, StoreKind};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// A key node 1 owns now and node 2 owned before.
fn stolen_key(harness: &Harness) -> rebalancing::Key {
    find_key(|key| harness.current_replicas(key) == vec![LOCAL])
}

fn v1() -> VectorClock {
    VectorClock::new().incremented(NodeId(2))
}

// 1. Read path

#[test]
fn test_get_proxies_from_donor() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();

    let values = harness.store.get(&key, None).unwrap();

    assert_eq!(values, vec![versioned("v1", v1())]);
    assert_eq!(harness.local.get(&key, None).unwrap(), vec![versioned("v1", v1())]);
    assert_eq!(harness.detector.successes(NodeId(2)), 1);
}

#[test]
fn test_get_versions_proxies_from_donor() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();

    assert_eq!(harness.store.get_versions(&key).unwrap(), vec![v1()]);
    assert_eq!(harness.local.get_versions(&key).unwrap(), vec![v1()]);
}

#[test]
fn test_local_newer_version_survives_proxy() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    let v2 = v1().incremented(LOCAL);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();
    harness.local.put(&key, versioned("v2", v2.clone()), None).unwrap();

    assert_eq!(harness.store.get(&key, None).unwrap(), vec![versioned("v2", v2)]);
}

#[test]
fn test_donor_marked_down_fails_the_read() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();
    harness.detector.mark_down(NodeId(2));

    let err = harness.store.get(&key, None).unwrap_err();

    assert!(matches!(err, StoreError::ProxyUnreachable { node: NodeId(2), .. }));
    assert!(harness.local.is_empty());
    assert_eq!(harness.network.total_calls(), 0);
}

#[test]
fn test_transport_failure_is_recorded_and_surfaced() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness.network.partition(NodeId(2));

    let err = harness.store.get(&key, None).unwrap_err();

    assert!(matches!(err, StoreError::ProxyUnreachable { node: NodeId(2), .. }));
    assert_eq!(harness.detector.failures(NodeId(2)), 1);
    assert!(harness.local.is_empty());
}

#[test]
fn test_get_all_batches_per_donor() {
    let harness = Harness::new(
        &[(2, 0), (3, 0)],
        &[(1, 0), (2, 0), (3, 0)],
        StoreDefinition::consistent(STORE, 1),
    );
    let resolver = RedirectResolver::new(harness.metadata.clone());
    let donor_of = |key: &rebalancing::Key| resolver.resolve(STORE, key, true).unwrap();

    let first = find_key(|key| donor_of(key) == Some(NodeId(2)));
    let second = find_key(|key| donor_of(key) == Some(NodeId(2)) && *key != first);
    let from_two = [first, second];
    let from_three = find_key(|key| donor_of(key) == Some(NodeId(3)));
    let not_stolen = find_key(|key| donor_of(key).is_none());

    let mut keys = vec![from_three.clone(), not_stolen.clone()];
    keys.extend(from_two.iter().cloned());
    for key in &keys {
        let owner = harness.current_replicas(key)[0];
        let holder = if owner == LOCAL { donor_of(key).unwrap() } else { owner };
        harness
            .network
            .store(holder)
            .put(key, versioned("v1", v1()), None)
            .unwrap();
    }

    let found = harness.store.get_all(&keys, None).unwrap();

    assert_eq!(harness.network.batch_calls(NodeId(2)), 1);
    assert_eq!(harness.network.batch_calls(NodeId(3)), 1);
    assert!(found.contains_key(&from_three));
    for key in &from_two {
        assert!(found.contains_key(key));
    }
    // Keys this node does not own are neither proxied nor present locally.
    assert!(!found.contains_key(&not_stolen));
}

#[test]
fn test_get_all_fails_when_any_donor_is_down() {
    let harness = Harness::new(
        &[(2, 0), (3, 0)],
        &[(1, 0), (2, 0), (3, 0)],
        StoreDefinition::consistent(STORE, 1),
    );
    let resolver = RedirectResolver::new(harness.metadata.clone());
    let donor_of = |key: &rebalancing::Key| resolver.resolve(STORE, key, true).unwrap();
    let keys = vec![
        find_key(|key| donor_of(key) == Some(NodeId(2))),
        find_key(|key| donor_of(key) == Some(NodeId(3))),
    ];
    harness.detector.mark_down(NodeId(3));

    let err = harness.store.get_all(&keys, None).unwrap_err();

    assert!(matches!(err, StoreError::ProxyUnreachable { node: NodeId(3), .. }));
    assert_eq!(harness.network.total_calls(), 0);
}

// 2. Write path

#[test]
fn test_put_catches_up_and_schedules_forward() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    let v2 = v1().incremented(LOCAL);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();

    harness.store.put(&key, versioned("v2", v2.clone()), None).unwrap();

    assert_eq!(harness.local.get(&key, None).unwrap(), vec![versioned("v2", v2.clone())]);
    assert_eq!(harness.pool.pending(), 1);
    assert_eq!(harness.stats.submitted(), 1);
    assert_eq!(harness.stats.completed(), 0);
    // Nothing reaches the donor until the forward runs.
    assert_eq!(
        harness.network.store(NodeId(2)).get(&key, None).unwrap(),
        vec![versioned("v1", v1())]
    );

    assert_eq!(harness.pool.run_all(), 1);

    assert_eq!(
        harness.network.store(NodeId(2)).get(&key, None).unwrap(),
        vec![versioned("v2", v2)]
    );
    assert_eq!(
        harness.stats.counts(),
        ProxyPutCounts {
            submitted: 1,
            completed: 1,
            failed: 0
        }
    );
}

#[test]
fn test_local_commit_precedes_forward_submission() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    let v2 = v1().incremented(LOCAL);

    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    {
        let seen = Arc::clone(&seen);
        let local = Arc::clone(&harness.local);
        let key = key.clone();
        harness.pool.on_submit(move || {
            seen.lock().extend(local.get_versions(&key).unwrap());
        });
    }

    harness.store.put(&key, versioned("v2", v2.clone()), None).unwrap();

    assert_eq!(*seen.lock(), vec![v2]);
}

#[test]
fn test_obsolete_put_is_rejected_without_forward() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    let v2 = v1().incremented(NodeId(2));
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v2", v2), None)
        .unwrap();

    let err = harness.store.put(&key, versioned("stale", v1()), None).unwrap_err();

    assert!(err.is_obsolete_version());
    assert_eq!(harness.pool.pending(), 0);
    assert_eq!(harness.stats.submitted(), 0);
}

#[test]
fn test_put_fails_when_donor_is_unreachable() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness.detector.mark_down(NodeId(2));

    let err = harness.store.put(&key, versioned("v1", v1()), None).unwrap_err();

    assert!(matches!(err, StoreError::ProxyUnreachable { node: NodeId(2), .. }));
    assert!(harness.local.is_empty());
    assert_eq!(harness.pool.pending(), 0);
}

#[test]
fn test_no_forward_to_live_replica() {
    // Two replicas per key: node 1 at rank 0 inherits the role of node 2,
    // which stays a replica of the key.
    let harness = Harness::new(
        &[(2, 0)],
        &[(1, 0), (2, 0)],
        StoreDefinition::consistent(STORE, 2),
    );
    let key = find_key(|key| harness.current_replicas(key).first() == Some(&LOCAL));
    let resolver = RedirectResolver::new(harness.metadata.clone());
    assert_eq!(resolver.resolve(STORE, &key, true).unwrap(), Some(NodeId(2)));

    harness.store.put(&key, versioned("v1", v1()), None).unwrap();

    assert_eq!(harness.local.get_versions(&key).unwrap(), vec![v1()]);
    assert_eq!(harness.pool.pending(), 0);
    assert_eq!(harness.stats.submitted(), 0);
}

#[test]
fn test_no_forward_when_proxy_put_disabled() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    let v2 = v1().incremented(LOCAL);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();
    harness.store.set_proxy_put_enabled(false);

    harness.store.put(&key, versioned("v2", v2.clone()), None).unwrap();

    // Catch-up still happens; only the forward is suppressed.
    assert_eq!(harness.network.calls(NodeId(2)), 1);
    assert_eq!(harness.local.get_versions(&key).unwrap(), vec![v2]);
    assert_eq!(harness.pool.pending(), 0);
    assert_eq!(harness.stats.submitted(), 0);
}

#[test]
fn test_rejected_submission_counts_as_failure() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness.pool.reject(true);

    harness.store.put(&key, versioned("v1", v1()), None).unwrap();

    assert_eq!(harness.local.get_versions(&key).unwrap(), vec![v1()]);
    assert_eq!(
        harness.stats.counts(),
        ProxyPutCounts {
            submitted: 1,
            completed: 0,
            failed: 1
        }
    );
}

#[test]
fn test_read_only_store_rejects_put() {
    let harness = Harness::new(
        &[(2, 0)],
        &[(1, 0), (2, 0)],
        StoreDefinition::consistent(STORE, 1).with_kind(StoreKind::ReadOnly),
    );
    let key = stolen_key(&harness);

    let err = harness.store.put(&key, versioned("v1", v1()), None).unwrap_err();

    assert!(matches!(err, StoreError::Unsupported(_)));
    assert!(harness.local.is_empty());
    assert_eq!(harness.network.total_calls(), 0);
}

#[test]
fn test_delete_is_not_redirected() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness.local.put(&key, versioned("v1", v1()), None).unwrap();

    assert!(harness.store.delete(&key, &v1()).unwrap());
    assert!(harness.local.is_empty());
    assert_eq!(harness.network.total_calls(), 0);
}

// 3. No redirection

#[test]
fn test_normal_state_ignores_stale_source() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();
    harness.metadata.set_server_state(ServerState::Normal);
    assert!(harness.metadata.source_topology().is_some());

    assert!(harness.store.get(&key, None).unwrap().is_empty());
    harness.store.put(&key, versioned("v2", v1().incremented(LOCAL)), None).unwrap();

    assert_eq!(harness.network.total_calls(), 0);
    assert_eq!(harness.pool.pending(), 0);
}

#[test]
fn test_redirection_toggle() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();

    harness.store.set_redirecting_enabled(false);
    assert!(!harness.store.is_redirecting_enabled());
    assert!(harness.store.get(&key, None).unwrap().is_empty());
    assert_eq!(harness.network.total_calls(), 0);

    harness.store.set_redirecting_enabled(true);
    assert_eq!(harness.store.get(&key, None).unwrap(), vec![versioned("v1", v1())]);
}

#[test]
fn test_keys_not_owned_locally_are_served_locally() {
    let harness = Harness::single_donor();
    let key = find_key(|key| harness.current_replicas(key) == vec![NodeId(2)]);
    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v1", v1()), None)
        .unwrap();

    assert!(harness.store.get(&key, None).unwrap().is_empty());
    assert_eq!(harness.network.total_calls(), 0);
}

#[test]
fn test_zone_expansion_is_not_redirected() {
    // Node 1 is the first node of a new zone.
    let harness = Harness::new(
        &[(2, 0)],
        &[(1, 1), (2, 0)],
        StoreDefinition::zone_aware(STORE, [(corelib::ZoneId(0), 1), (corelib::ZoneId(1), 1)]),
    );
    let key = key("key-0");

    assert!(harness.store.get(&key, None).unwrap().is_empty());
    harness.store.put(&key, versioned("v1", v1()), None).unwrap();

    assert_eq!(harness.network.total_calls(), 0);
    assert_eq!(harness.pool.pending(), 0);
}

// 4. Forward execution

#[test]
fn test_forward_skips_when_donor_already_newer() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    let v2 = v1().incremented(LOCAL);
    let v3 = v2.incremented(NodeId(2));
    harness.store.put(&key, versioned("v2", v2), None).unwrap();

    harness
        .network
        .store(NodeId(2))
        .put(&key, versioned("v3", v3.clone()), None)
        .unwrap();
    harness.pool.run_all();

    assert_eq!(
        harness.network.store(NodeId(2)).get(&key, None).unwrap(),
        vec![versioned("v3", v3)]
    );
    assert_eq!(harness.stats.completed(), 1);
    assert_eq!(harness.stats.failed(), 0);
}

#[test]
fn test_forward_failure_is_absorbed() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness.store.put(&key, versioned("v1", v1()), None).unwrap();

    harness.network.partition(NodeId(2));
    harness.pool.run_all();

    assert_eq!(
        harness.stats.counts(),
        ProxyPutCounts {
            submitted: 1,
            completed: 0,
            failed: 1
        }
    );
    assert_eq!(harness.local.get_versions(&key).unwrap(), vec![v1()]);
}

#[test]
fn test_configured_pool_forwards_writes() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    let stats = Arc::new(ProxyPutStats::new(STORE));
    let config = RedirectConfig {
        proxy_put_threads: 2,
        proxy_put_queue_capacity: 4,
        ..RedirectConfig::default()
    };
    let store = RedirectingStore::from_config(
        Arc::new(InMemoryStore::new(STORE)),
        harness.metadata.clone(),
        harness.detector.clone(),
        Arc::new(RemoteStoreCache::new(Arc::new(NetworkFactory(Arc::clone(&harness.network))))),
        Arc::clone(&stats),
        &config,
    )
    .unwrap();

    store.put(&key, versioned("v1", v1()), None).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while stats.completed() == 0 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(stats.completed(), 1);
    assert_eq!(
        harness.network.store(NodeId(2)).get(&key, None).unwrap(),
        vec![versioned("v1", v1())]
    );
}

#[test]
fn test_status_reports_flags_and_counts() {
    let harness = Harness::single_donor();
    let key = stolen_key(&harness);
    harness.store.put(&key, versioned("v1", v1()), None).unwrap();
    harness.pool.run_all();
    harness.store.set_proxy_put_enabled(false);

    let status = harness.store.status();
    assert_eq!(status.store, STORE);
    assert!(status.redirecting_enabled);
    assert!(!status.proxy_put_enabled);
    assert_eq!(status.proxy_puts.completed, 1);

    let json = serde_json::to_value(&status).unwrap();
    assert_eq!(json["proxy_puts"]["submitted"], 1);
}
