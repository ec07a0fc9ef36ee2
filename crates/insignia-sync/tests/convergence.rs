//! Hidden-Set Convergence Tests
//!
//! Validates the publish/apply cycle across participants sharing a loopback
//! transport: round-trip fidelity, late-joiner catch-up, and the accepted
//! last-writer-wins clobber.

use insignia_core::{EntityId, ReplicationError};
use insignia_sync::{HiddenSetReplicator, HiddenSetWireMessage, serialize_message};
use insignia_testkit::LoopbackNetwork;
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

fn deliver(network: &LoopbackNetwork, replicator: &mut HiddenSetReplicator) -> usize {
    let payloads = network.drain_inbox(replicator.local());
    let count = payloads.len();
    for payload in payloads {
        replicator
            .apply_remote(&payload)
            .expect("loopback payloads decode");
    }
    count
}

// ============================================================================
// Convergence
// ============================================================================

#[test]
fn all_participants_converge_after_delivery() {
    let network = Arc::new(LoopbackNetwork::new());
    let mut replicas: Vec<HiddenSetReplicator> = (1..=4)
        .map(|id| {
            network.connect(EntityId(id));
            HiddenSetReplicator::new(EntityId(id))
        })
        .collect();

    // Sequential toggles, each delivered before the next
    for idx in [0usize, 2] {
        let local = replicas[idx].local();
        replicas[idx]
            .request_hide(local, &network.endpoint(local))
            .unwrap();
        for replica in replicas.iter_mut() {
            deliver(&network, replica);
        }
    }

    for replica in &replicas {
        assert_eq!(
            replica.hidden_set().to_entries(),
            vec![EntityId(1), EntityId(3)],
            "replica {} diverged",
            replica.local()
        );
    }
}

#[test]
fn late_joiner_receives_last_snapshot() {
    let network = Arc::new(LoopbackNetwork::new());
    network.connect(EntityId(1));
    let mut a = HiddenSetReplicator::new(EntityId(1));
    a.request_hide(EntityId(1), &network.endpoint(EntityId(1)))
        .unwrap();

    network.connect(EntityId(2));
    let mut late = HiddenSetReplicator::new(EntityId(2));
    assert_eq!(deliver(&network, &mut late), 1);
    assert!(late.is_hidden(EntityId(1)));
}

#[test]
fn concurrent_toggles_last_writer_wins() {
    let network = Arc::new(LoopbackNetwork::new());
    let mut a = HiddenSetReplicator::new(EntityId(1));
    let mut b = HiddenSetReplicator::new(EntityId(2));
    let mut observer = HiddenSetReplicator::new(EntityId(3));
    for id in 1..=3 {
        network.connect(EntityId(id));
    }

    // Both toggle inside the same window, before either sees the other
    a.request_hide(EntityId(1), &network.endpoint(EntityId(1)))
        .unwrap();
    b.request_hide(EntityId(2), &network.endpoint(EntityId(2)))
        .unwrap();

    deliver(&network, &mut observer);
    deliver(&network, &mut a);

    // b's whole-set snapshot clobbered a's entry
    assert_eq!(observer.hidden_set().to_entries(), vec![EntityId(2)]);
    assert_eq!(a.hidden_set().to_entries(), vec![EntityId(2)]);
}

#[test]
fn stale_lease_publish_is_rejected() {
    let network = Arc::new(LoopbackNetwork::new());
    network.connect(EntityId(1));
    network.connect(EntityId(2));

    let stale = network.acquire(EntityId(1)).unwrap();
    let _current = network.acquire(EntityId(2)).unwrap();

    let result = network.publish(&stale, vec![]);
    assert!(matches!(
        result,
        Err(ReplicationError::StaleLease { .. }) | Err(ReplicationError::NotWriter { .. })
    ));
}

#[test]
fn consumer_deduplicates_wire_entries() {
    let msg = HiddenSetWireMessage {
        schema_version: insignia_sync::HIDDEN_SET_WIRE_SCHEMA_VERSION,
        writer: EntityId(7),
        entities: vec![EntityId(7), EntityId(7), EntityId(8)],
    };
    let mut replica = HiddenSetReplicator::new(EntityId(1));
    let update = replica
        .apply_remote(&serialize_message(&msg).unwrap())
        .unwrap();
    assert_eq!(update.duplicates_dropped, 1);
    assert_eq!(replica.hidden_set().len(), 2);
    assert_eq!(replica.stats().duplicates_dropped, 1);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Broadcasting a set and applying it to a fresh participant yields the same membership.
    #[test]
    fn broadcast_round_trip_preserves_membership(raw in proptest::collection::vec(0u32..64, 0..32)) {
        let writer = EntityId(1000);
        let set = raw.iter().copied().map(EntityId).collect();
        let msg = HiddenSetWireMessage::snapshot(writer, &set);

        let mut fresh = HiddenSetReplicator::new(EntityId(2000));
        fresh.apply_remote(&serialize_message(&msg).unwrap()).unwrap();

        prop_assert_eq!(fresh.hidden_set(), &set);
    }
}
