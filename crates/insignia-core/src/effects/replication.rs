//! Replication transport effects
//!
//! The transport carries exactly one replicated field, the encoded hidden
//! set. Writing it is gated by a single-writer lease: a participant must
//! acquire the lease before publishing, and each acquisition supersedes the
//! previous one.

use crate::errors::ReplicationError;
use crate::identifiers::EntityId;
use serde::{Deserialize, Serialize};

/// Proof that `holder` was the designated writer as of `epoch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterLease {
    /// Participant the lease was granted to
    pub holder: EntityId,
    /// Monotonic acquisition counter on the transport
    pub epoch: u64,
}

impl WriterLease {
    /// Lease for `holder` at transport epoch `epoch`.
    pub fn new(holder: EntityId, epoch: u64) -> Self {
        Self { holder, epoch }
    }
}

/// Transport for the replicated hidden set.
pub trait ReplicationEffects: Send + Sync {
    /// Participant currently allowed to publish, if any.
    fn current_writer(&self) -> Option<EntityId>;

    /// Transfer the writer role to `participant` and return its lease.
    fn acquire_writer(&self, participant: EntityId) -> Result<WriterLease, ReplicationError>;

    /// Broadcast `payload` to every other participant.
    ///
    /// Fails if `lease` is no longer the one in force.
    fn publish(&self, lease: &WriterLease, payload: Vec<u8>) -> Result<(), ReplicationError>;
}
