//! # Insignia Sync - Layer 2: Hidden-Set Replication
//!
//! The hidden set is the only replicated state in a badge session: the set of
//! entities that asked for their own badge to be hidden from everyone.
//!
//! - **Single writer**: a participant acquires the writer lease before it
//!   mutates and publishes; acquisition transfers the lease away from
//!   whoever held it.
//! - **Whole-set publish**: every publish carries the full set, never a delta.
//! - **Last writer wins**: an inbound publish overwrites the local set
//!   wholesale. Two participants toggling inside one replication window can
//!   clobber each other; no merge is attempted.
//! - **Defensive decode**: duplicate identifiers on the wire are dropped.

pub mod hidden_set;
pub mod prelude;
pub mod replicator;
pub mod wire;

pub use hidden_set::HiddenSet;
pub use replicator::{AppliedUpdate, HiddenSetReplicator, ReplicationStats};
pub use wire::{
    deserialize_message, serialize_message, HiddenSetWireMessage, HIDDEN_SET_WIRE_SCHEMA_VERSION,
};
