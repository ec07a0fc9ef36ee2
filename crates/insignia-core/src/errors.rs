//! Error taxonomy for the badge engine
//!
//! Every error here is absorbed inside the session: the engine degrades by
//! not showing or not hiding a badge, never by faulting the host. Typed
//! operations still return these so callers and tests can tell refusals
//! apart.

use crate::identifiers::{EntityId, VisualHandle};
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the engine.
pub type BadgeResult<T> = Result<T, BadgeError>;

/// Errors from replication transport operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// A publish was attempted by a participant that does not hold the writer lease.
    #[error("participant {participant} is not the current writer")]
    NotWriter {
        /// The participant that attempted to publish
        participant: EntityId,
    },

    /// The lease was superseded by a later acquisition.
    #[error("writer lease epoch {held} is stale (current epoch {current})")]
    StaleLease {
        /// Epoch carried by the presented lease
        held: u64,
        /// Epoch currently in force
        current: u64,
    },

    /// The participant is not connected to the transport.
    #[error("participant {0} is not connected")]
    Disconnected(EntityId),

    /// Transport-specific failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Errors from the visual host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisualError {
    /// The visual was destroyed or never existed.
    #[error("visual {0} no longer exists")]
    Gone(VisualHandle),

    /// The host has no template with this name.
    #[error("unknown badge template {0}")]
    UnknownTemplate(String),

    /// Host-specific instantiation failure.
    #[error("failed to instantiate visual: {0}")]
    Instantiate(String),
}

/// Errors from encoding or decoding the replicated field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Serialization failed
    #[error("failed to encode hidden set: {0}")]
    Encode(String),

    /// Payload could not be decoded
    #[error("failed to decode hidden set: {0}")]
    Decode(String),

    /// Payload was written by an incompatible schema
    #[error("unsupported wire schema version {found} (expected {expected})")]
    UnsupportedSchema {
        /// Version carried by the payload
        found: u16,
        /// Version this build speaks
        expected: u16,
    },
}

/// Errors from badge engine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadgeError {
    /// Attempted double registration of an entity.
    #[error("entity {0} already has a badge")]
    DuplicateEntity(EntityId),

    /// Lookup or removal of an entity that has no badge.
    #[error("entity {0} has no badge")]
    NotFound(EntityId),

    /// Toggle attempted by an entity that is not on the roster.
    #[error("entity {0} is not authorized to toggle badges")]
    NotAuthorized(EntityId),

    /// Toggle spam refused by the rate limiter.
    #[error("badge toggle rate limit exceeded ({attempts} attempts within {window:?})")]
    RateLimitExceeded {
        /// Attempts counted in the current window, including the refused one
        attempts: u32,
        /// Length of the sliding window
        window: Duration,
    },

    /// Event arrived before the roster was ready; deferred until replay.
    #[error("roster is not ready; event deferred")]
    StaleOracle,

    /// Derived state disagrees with the registry after a rebuild.
    #[error("integrity violation in {context}: expected {expected} entries, found {actual}")]
    IntegrityViolation {
        /// Which rebuild failed
        context: &'static str,
        /// Expected entry count
        expected: usize,
        /// Observed entry count
        actual: usize,
    },

    /// Transport refused a lease or publish.
    #[error(transparent)]
    Replication(#[from] ReplicationError),

    /// Host could not create or update a visual.
    #[error(transparent)]
    Visual(#[from] VisualError),

    /// Replicated payload was malformed.
    #[error(transparent)]
    Wire(#[from] WireError),
}

impl BadgeError {
    /// Stable short code for logs and metrics labels.
    pub fn code(&self) -> &'static str {
        match self {
            BadgeError::DuplicateEntity(_) => "duplicate_entity",
            BadgeError::NotFound(_) => "not_found",
            BadgeError::NotAuthorized(_) => "not_authorized",
            BadgeError::RateLimitExceeded { .. } => "rate_limited",
            BadgeError::StaleOracle => "stale_oracle",
            BadgeError::IntegrityViolation { .. } => "integrity_violation",
            BadgeError::Replication(_) => "replication",
            BadgeError::Visual(_) => "visual",
            BadgeError::Wire(_) => "wire",
        }
    }

    /// Benign outcomes are expected during normal operation and are logged at debug.
    pub fn is_benign(&self) -> bool {
        matches!(self, BadgeError::NotFound(_) | BadgeError::StaleOracle)
    }

    /// Self-consistency failures; these indicate a bug rather than user behavior.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, BadgeError::IntegrityViolation { .. })
    }
}
