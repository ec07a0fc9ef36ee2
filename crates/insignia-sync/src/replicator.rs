//! Hidden-set replicator
//!
//! Owns this participant's authoritative copy of the hidden set. Local
//! changes go through the writer lease: acquire, mutate, publish. Remote
//! snapshots overwrite the local copy wholesale.

use crate::hidden_set::HiddenSet;
use crate::wire::{deserialize_message, serialize_message, HiddenSetWireMessage};
use insignia_core::{BadgeError, BadgeResult, EntityId, ReplicationEffects, WriterLease};
use serde::{Deserialize, Serialize};

/// Counters for monitoring replication health.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationStats {
    /// Snapshots this participant published
    pub published: u64,
    /// Remote snapshots applied
    pub applied: u64,
    /// Remote payloads that failed to decode
    pub rejected: u64,
    /// Duplicate identifiers dropped while decoding
    pub duplicates_dropped: u64,
}

/// Outcome of applying a remote snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    /// Participant that published the snapshot
    pub writer: EntityId,
    /// Whether the local set differs from before
    pub changed: bool,
    /// Duplicate identifiers dropped from the payload
    pub duplicates_dropped: usize,
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Hide,
    Show,
}

/// Local authoritative copy of the replicated hidden set.
#[derive(Debug, Clone)]
pub struct HiddenSetReplicator {
    local: EntityId,
    set: HiddenSet,
    /// Lease from our most recent acquisition, cleared when someone else writes
    lease: Option<WriterLease>,
    last_writer: Option<EntityId>,
    stats: ReplicationStats,
}

impl HiddenSetReplicator {
    /// Replicator for `local` with an empty set and no lease.
    pub fn new(local: EntityId) -> Self {
        Self {
            local,
            set: HiddenSet::new(),
            lease: None,
            last_writer: None,
            stats: ReplicationStats::default(),
        }
    }

    /// Participant this replicator publishes for.
    pub fn local(&self) -> EntityId {
        self.local
    }

    /// Current replicated set.
    pub fn hidden_set(&self) -> &HiddenSet {
        &self.set
    }

    /// Whether `entity` is in the hidden set.
    pub fn is_hidden(&self, entity: EntityId) -> bool {
        self.set.contains(entity)
    }

    /// Participant whose snapshot the local set currently reflects.
    pub fn last_writer(&self) -> Option<EntityId> {
        self.last_writer
    }

    /// Lease held from the last successful acquire, if any.
    pub fn lease(&self) -> Option<WriterLease> {
        self.lease
    }

    /// Publish and apply counters.
    pub fn stats(&self) -> &ReplicationStats {
        &self.stats
    }

    /// Add `entity` to the hidden set and publish.
    ///
    /// Only the local participant may hide itself. Returns whether the set changed.
    pub fn request_hide<R>(&mut self, entity: EntityId, transport: &R) -> BadgeResult<bool>
    where
        R: ReplicationEffects + ?Sized,
    {
        self.mutate_and_publish(entity, Mutation::Hide, transport)
    }

    /// Remove `entity` from the hidden set and publish.
    pub fn request_show<R>(&mut self, entity: EntityId, transport: &R) -> BadgeResult<bool>
    where
        R: ReplicationEffects + ?Sized,
    {
        self.mutate_and_publish(entity, Mutation::Show, transport)
    }

    fn mutate_and_publish<R>(
        &mut self,
        entity: EntityId,
        mutation: Mutation,
        transport: &R,
    ) -> BadgeResult<bool>
    where
        R: ReplicationEffects + ?Sized,
    {
        if entity != self.local {
            tracing::warn!(
                local = %self.local,
                target = %entity,
                "Refusing to change another participant's hidden state"
            );
            return Err(BadgeError::NotAuthorized(entity));
        }

        // Nothing changes until the lease is ours
        let lease = transport.acquire_writer(self.local)?;
        self.lease = Some(lease);

        let changed = match mutation {
            Mutation::Hide => self.set.insert(entity),
            Mutation::Show => self.set.remove(entity),
        };
        self.last_writer = Some(self.local);

        tracing::debug!(
            entity = %entity,
            ?mutation,
            changed,
            epoch = lease.epoch,
            "Hidden set mutated under writer lease"
        );

        self.publish_with(lease, transport)?;
        Ok(changed)
    }

    /// Re-publish the current set if this participant still holds the lease.
    ///
    /// Returns whether a publish happened.
    pub fn resync<R>(&mut self, transport: &R) -> BadgeResult<bool>
    where
        R: ReplicationEffects + ?Sized,
    {
        let Some(lease) = self.lease else {
            tracing::debug!(local = %self.local, "Skipping resync: no writer lease held");
            return Ok(false);
        };
        if transport.current_writer() != Some(self.local) {
            tracing::debug!(local = %self.local, "Skipping resync: lease was transferred");
            self.lease = None;
            return Ok(false);
        }

        match self.publish_with(lease, transport) {
            Ok(()) => Ok(true),
            Err(e) => {
                self.lease = None;
                Err(e)
            }
        }
    }

    fn publish_with<R>(&mut self, lease: WriterLease, transport: &R) -> BadgeResult<()>
    where
        R: ReplicationEffects + ?Sized,
    {
        let msg = HiddenSetWireMessage::snapshot(self.local, &self.set);
        let payload = serialize_message(&msg)?;
        transport.publish(&lease, payload).map_err(|e| {
            tracing::warn!(
                local = %self.local,
                error = %e,
                "Failed to publish hidden set; local change kept for next publish"
            );
            BadgeError::from(e)
        })?;
        self.stats.published += 1;
        Ok(())
    }

    /// Overwrite the local set with a snapshot received from the transport.
    pub fn apply_remote(&mut self, payload: &[u8]) -> BadgeResult<AppliedUpdate> {
        let msg = match deserialize_message(payload) {
            Ok(msg) => msg,
            Err(e) => {
                self.stats.rejected += 1;
                tracing::warn!(error = %e, "Rejected hidden set payload");
                return Err(e.into());
            }
        };
        Ok(self.apply_snapshot(msg))
    }

    /// Overwrite the local set with an already-decoded snapshot.
    pub fn apply_snapshot(&mut self, msg: HiddenSetWireMessage) -> AppliedUpdate {
        let writer = msg.writer;
        let (incoming, duplicates_dropped) = msg.into_hidden_set();
        if duplicates_dropped > 0 {
            tracing::warn!(
                writer = %writer,
                duplicates_dropped,
                "Hidden set snapshot carried duplicate identifiers"
            );
        }

        let changed = incoming != self.set;
        self.set = incoming;
        self.last_writer = Some(writer);
        if writer != self.local {
            self.lease = None;
        }
        self.stats.applied += 1;
        self.stats.duplicates_dropped += duplicates_dropped as u64;

        tracing::debug!(
            writer = %writer,
            changed,
            hidden = self.set.len(),
            "Applied remote hidden set"
        );

        AppliedUpdate {
            writer,
            changed,
            duplicates_dropped,
        }
    }

    /// Current set as it would be published.
    pub fn snapshot(&self) -> HiddenSetWireMessage {
        HiddenSetWireMessage::snapshot(self.local, &self.set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use insignia_core::ReplicationError;
    use insignia_testkit::LoopbackNetwork;
    use std::sync::Arc;

    fn network_with(participants: &[u32]) -> Arc<LoopbackNetwork> {
        let network = Arc::new(LoopbackNetwork::new());
        for p in participants {
            network.connect(EntityId(*p));
        }
        network
    }

    #[test]
    fn test_hide_acquires_lease_and_publishes() {
        let network = network_with(&[1, 2]);
        let endpoint = network.endpoint(EntityId(1));
        let mut replicator = HiddenSetReplicator::new(EntityId(1));

        assert!(replicator.request_hide(EntityId(1), &endpoint).unwrap());
        assert!(replicator.is_hidden(EntityId(1)));
        assert_eq!(network.writer(), Some(EntityId(1)));
        assert_eq!(network.pending(EntityId(2)), 1);
        assert_eq!(network.pending(EntityId(1)), 0);
        assert_eq!(replicator.stats().published, 1);
    }

    #[test]
    fn test_duplicate_hide_and_absent_show_are_noops() {
        let network = network_with(&[1]);
        let endpoint = network.endpoint(EntityId(1));
        let mut replicator = HiddenSetReplicator::new(EntityId(1));

        assert!(replicator.request_hide(EntityId(1), &endpoint).unwrap());
        assert!(!replicator.request_hide(EntityId(1), &endpoint).unwrap());
        assert_eq!(replicator.hidden_set().len(), 1);

        assert!(replicator.request_show(EntityId(1), &endpoint).unwrap());
        assert!(!replicator.request_show(EntityId(1), &endpoint).unwrap());
        assert!(replicator.hidden_set().is_empty());
    }

    #[test]
    fn test_cannot_hide_someone_else() {
        let network = network_with(&[1, 2]);
        let endpoint = network.endpoint(EntityId(1));
        let mut replicator = HiddenSetReplicator::new(EntityId(1));

        assert_matches!(
            replicator.request_hide(EntityId(2), &endpoint),
            Err(BadgeError::NotAuthorized(EntityId(2)))
        );
        assert!(replicator.hidden_set().is_empty());
        assert_eq!(network.writer(), None);
    }

    #[test]
    fn test_failed_acquire_leaves_set_untouched() {
        // Participant 1 never connected, so the transport refuses the lease
        let network = network_with(&[2]);
        let endpoint = network.endpoint(EntityId(1));
        let mut replicator = HiddenSetReplicator::new(EntityId(1));

        assert_matches!(
            replicator.request_hide(EntityId(1), &endpoint),
            Err(BadgeError::Replication(ReplicationError::Disconnected(_)))
        );
        assert!(replicator.hidden_set().is_empty());
    }

    #[test]
    fn test_remote_snapshot_overwrites_wholesale() {
        let network = network_with(&[1, 2]);
        let mut a = HiddenSetReplicator::new(EntityId(1));
        let mut b = HiddenSetReplicator::new(EntityId(2));

        b.request_hide(EntityId(2), &network.endpoint(EntityId(2)))
            .unwrap();
        a.request_hide(EntityId(1), &network.endpoint(EntityId(1)))
            .unwrap();

        // a published last, but its snapshot did not include b's change
        for payload in network.drain_inbox(EntityId(2)) {
            b.apply_remote(&payload).unwrap();
        }
        assert!(b.is_hidden(EntityId(1)));
        assert!(!b.is_hidden(EntityId(2)));
        assert_eq!(b.last_writer(), Some(EntityId(1)));
        assert!(b.lease().is_none());
    }

    #[test]
    fn test_resync_requires_current_lease() {
        let network = network_with(&[1, 2]);
        let mut a = HiddenSetReplicator::new(EntityId(1));
        let mut b = HiddenSetReplicator::new(EntityId(2));

        assert!(!a.resync(&network.endpoint(EntityId(1))).unwrap());

        a.request_hide(EntityId(1), &network.endpoint(EntityId(1)))
            .unwrap();
        assert!(a.resync(&network.endpoint(EntityId(1))).unwrap());

        b.request_hide(EntityId(2), &network.endpoint(EntityId(2)))
            .unwrap();
        assert!(!a.resync(&network.endpoint(EntityId(1))).unwrap());
        assert!(a.lease().is_none());
    }

    #[test]
    fn test_garbage_payload_counted() {
        let mut replicator = HiddenSetReplicator::new(EntityId(1));
        assert!(replicator.apply_remote(&[1, 2, 3]).is_err());
        assert_eq!(replicator.stats().rejected, 1);
        assert!(replicator.hidden_set().is_empty());
    }
}
