//! Effect traits for the badge engine's external collaborators
//!
//! # Effect Classification
//!
//! - **Category**: Host Effects
//! - **Implementation**: the host runtime in production, `insignia-testkit` in tests
//! - **Usage**: `insignia-sync` (replication) and `insignia-session` (everything else)
//!
//! All traits are synchronous. The engine is driven by a single-threaded host
//! and no entry point suspends; the only asynchronous surface is the roster
//! readiness latch.

pub mod pose;
pub mod replication;
pub mod roster;
pub mod supertraits;
pub mod time;
pub mod ui;
pub mod visual;

pub use pose::PoseEffects;
pub use replication::{ReplicationEffects, WriterLease};
pub use roster::RosterEffects;
pub use supertraits::BadgeEffects;
pub use time::ClockEffects;
pub use ui::{BadgeToggleKind, UiEffects};
pub use visual::VisualEffects;
