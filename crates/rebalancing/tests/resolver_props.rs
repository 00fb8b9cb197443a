//! Property tests for redirect resolution.

mod common;

use common::{topology, STORE};
use corelib::{NodeId, ZoneId};
use proptest::prelude::*;
use rebalancing::{InMemoryMetadata, RedirectResolver};
use replication::{RoutingSnapshot, StoreDefinition};
use std::sync::Arc;

const STEALER: NodeId = NodeId(4);

fn source() -> Arc<corelib::Topology> {
    topology(&[(1, 0), (2, 0), (3, 0)])
}

fn resolver() -> RedirectResolver {
    let metadata = Arc::new(InMemoryMetadata::new(STEALER, source()));
    metadata.add_store_definition(StoreDefinition::consistent(STORE, 2));
    metadata.begin_rebalancing(topology(&[(1, 0), (2, 0), (3, 0), (4, 0)]));
    RedirectResolver::new(metadata)
}

proptest! {
    #[test]
    fn donor_plays_the_same_role_in_source(key in proptest::collection::vec(any::<u8>(), 1..32)) {
        let resolver = resolver();
        let plan = resolver.plan(STORE, true).unwrap().unwrap();
        let source = RoutingSnapshot::new(source(), Arc::new(StoreDefinition::consistent(STORE, 2)));

        match plan.donor_for(&key) {
            Some(donor) => {
                prop_assert_ne!(donor, STEALER);
                let rank = plan.current().replica_rank(ZoneId(0), STEALER, &key).unwrap();
                prop_assert_eq!(source.node_for_rank(ZoneId(0), rank, &key).unwrap(), donor);
            }
            None => {
                // Every source rank is filled, so only non-replicas go unredirected.
                prop_assert!(!plan.current().replicas_for_key(&key).contains(&STEALER));
            }
        }
    }

    #[test]
    fn disabled_resolver_never_redirects(key in proptest::collection::vec(any::<u8>(), 1..32)) {
        prop_assert_eq!(resolver().resolve(STORE, &key, false).unwrap(), None);
    }
}
