//! Loopback replication network
//!
//! A single shared bus for every participant in a test session. Publishing
//! requires the lease currently in force; payloads are queued in every other
//! connected participant's inbox and delivered when the test drains it. The
//! most recent payload is replayed to participants that connect later, the
//! way a late joiner receives the owner's state.

use insignia_core::{EntityId, ReplicationEffects, ReplicationError, WriterLease};
use parking_lot::Mutex;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

#[derive(Debug, Default)]
struct NetworkState {
    writer: Option<EntityId>,
    epoch: u64,
    inboxes: BTreeMap<EntityId, VecDeque<Vec<u8>>>,
    last_payload: Option<Vec<u8>>,
    publishes: u64,
}

/// Shared in-memory replication bus.
#[derive(Debug, Default)]
pub struct LoopbackNetwork {
    state: Mutex<NetworkState>,
}

impl LoopbackNetwork {
    /// Network with no participants and no writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect `participant`, replaying the last published payload to it.
    pub fn connect(&self, participant: EntityId) {
        let mut state = self.state.lock();
        let replay = state.last_payload.clone();
        let inbox = state.inboxes.entry(participant).or_default();
        if let Some(payload) = replay {
            inbox.push_back(payload);
        }
    }

    /// Disconnect `participant`, dropping its inbox. A departing writer
    /// leaves the writer slot empty.
    pub fn disconnect(&self, participant: EntityId) {
        let mut state = self.state.lock();
        state.inboxes.remove(&participant);
        if state.writer == Some(participant) {
            state.writer = None;
        }
    }

    /// Whether `participant` has an inbox.
    pub fn is_connected(&self, participant: EntityId) -> bool {
        self.state.lock().inboxes.contains_key(&participant)
    }

    /// Transfer the writer role to `participant`.
    pub fn acquire(&self, participant: EntityId) -> Result<WriterLease, ReplicationError> {
        let mut state = self.state.lock();
        if !state.inboxes.contains_key(&participant) {
            return Err(ReplicationError::Disconnected(participant));
        }
        state.epoch += 1;
        state.writer = Some(participant);
        tracing::trace!(writer = %participant, epoch = state.epoch, "Writer lease transferred");
        Ok(WriterLease::new(participant, state.epoch))
    }

    /// Queue `payload` for every connected participant except the publisher.
    pub fn publish(&self, lease: &WriterLease, payload: Vec<u8>) -> Result<(), ReplicationError> {
        let mut state = self.state.lock();
        if lease.epoch != state.epoch {
            return Err(ReplicationError::StaleLease {
                held: lease.epoch,
                current: state.epoch,
            });
        }
        if state.writer != Some(lease.holder) {
            return Err(ReplicationError::NotWriter {
                participant: lease.holder,
            });
        }

        for (participant, inbox) in state.inboxes.iter_mut() {
            if *participant != lease.holder {
                inbox.push_back(payload.clone());
            }
        }
        state.last_payload = Some(payload);
        state.publishes += 1;
        Ok(())
    }

    /// Current writer, if any.
    pub fn writer(&self) -> Option<EntityId> {
        self.state.lock().writer
    }

    /// Take every payload waiting for `participant`, oldest first.
    pub fn drain_inbox(&self, participant: EntityId) -> Vec<Vec<u8>> {
        self.state
            .lock()
            .inboxes
            .get_mut(&participant)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }

    /// Payloads waiting for `participant`.
    pub fn pending(&self, participant: EntityId) -> usize {
        self.state
            .lock()
            .inboxes
            .get(&participant)
            .map_or(0, VecDeque::len)
    }

    /// Payloads waiting across all inboxes.
    pub fn total_pending(&self) -> usize {
        self.state.lock().inboxes.values().map(VecDeque::len).sum()
    }

    /// Successful publishes so far.
    pub fn publish_count(&self) -> u64 {
        self.state.lock().publishes
    }

    /// A participant-bound handle implementing `ReplicationEffects`.
    pub fn endpoint(self: &Arc<Self>, participant: EntityId) -> NetworkEndpoint {
        NetworkEndpoint {
            network: Arc::clone(self),
            participant,
        }
    }
}

/// One participant's view of the loopback network.
#[derive(Debug, Clone)]
pub struct NetworkEndpoint {
    network: Arc<LoopbackNetwork>,
    participant: EntityId,
}

impl NetworkEndpoint {
    /// Participant this endpoint publishes as.
    pub fn participant(&self) -> EntityId {
        self.participant
    }

    /// Shared network behind the endpoint.
    pub fn network(&self) -> &Arc<LoopbackNetwork> {
        &self.network
    }
}

impl ReplicationEffects for NetworkEndpoint {
    fn current_writer(&self) -> Option<EntityId> {
        self.network.writer()
    }

    fn acquire_writer(&self, participant: EntityId) -> Result<WriterLease, ReplicationError> {
        self.network.acquire(participant)
    }

    fn publish(&self, lease: &WriterLease, payload: Vec<u8>) -> Result<(), ReplicationError> {
        self.network.publish(lease, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_skips_publisher() {
        let network = LoopbackNetwork::new();
        network.connect(EntityId(1));
        network.connect(EntityId(2));

        let lease = network.acquire(EntityId(1)).unwrap();
        network.publish(&lease, vec![7]).unwrap();

        assert_eq!(network.pending(EntityId(1)), 0);
        assert_eq!(network.drain_inbox(EntityId(2)), vec![vec![7]]);
        assert_eq!(network.total_pending(), 0);
    }

    #[test]
    fn test_acquire_supersedes_previous_lease() {
        let network = LoopbackNetwork::new();
        network.connect(EntityId(1));
        network.connect(EntityId(2));

        let first = network.acquire(EntityId(1)).unwrap();
        let second = network.acquire(EntityId(2)).unwrap();
        assert!(second.epoch > first.epoch);
        assert!(matches!(
            network.publish(&first, vec![]),
            Err(ReplicationError::StaleLease { .. })
        ));
        assert!(network.publish(&second, vec![]).is_ok());
    }

    #[test]
    fn test_late_connect_replays_last_payload() {
        let network = LoopbackNetwork::new();
        network.connect(EntityId(1));
        let lease = network.acquire(EntityId(1)).unwrap();
        network.publish(&lease, vec![1]).unwrap();
        network.publish(&lease, vec![2]).unwrap();

        network.connect(EntityId(9));
        assert_eq!(network.drain_inbox(EntityId(9)), vec![vec![2]]);
    }

    #[test]
    fn test_writer_disconnect_clears_slot() {
        let network = LoopbackNetwork::new();
        network.connect(EntityId(1));
        let lease = network.acquire(EntityId(1)).unwrap();
        network.disconnect(EntityId(1));
        assert_eq!(network.writer(), None);
        assert!(network.publish(&lease, vec![]).is_err());
        assert!(network.acquire(EntityId(1)).is_err());
    }
}
