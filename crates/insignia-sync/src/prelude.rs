//! Insignia sync prelude.
//!
//! Curated re-exports for session orchestration.

pub use crate::{AppliedUpdate, HiddenSet, HiddenSetReplicator, HiddenSetWireMessage};
pub use insignia_core::{ReplicationEffects, ReplicationError, WriterLease};
