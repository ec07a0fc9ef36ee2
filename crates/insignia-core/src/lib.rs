//! # Insignia Core - Layer 1: Foundation
//!
//! Shared vocabulary for the Insignia badge engine:
//!
//! - Identifiers: `EntityId`, `Entity`, `RoleName`, `TemplateId`, `VisualHandle`
//! - Geometry: `Vec3`, `Placement`
//! - Errors: `BadgeError` and the per-collaborator error types
//! - Configuration: `BadgeConfig` with TOML/JSON loading and validation
//! - Effects: traits for every external collaborator (roster, replication
//!   transport, visual host, poses, clock, UI)
//! - Readiness: the latch the roster uses to signal it can answer queries
//!
//! Nothing in this crate holds session state. State lives in
//! `insignia-sync` (the replicated hidden set) and `insignia-session`
//! (registry, reconciliation, toggles).

pub mod config;
pub mod effects;
pub mod errors;
pub mod geometry;
pub mod identifiers;
pub mod readiness;

pub use config::{BadgeConfig, ConfigError, RoleBadge, ToggleRateLimitConfig};
pub use effects::{
    BadgeEffects, BadgeToggleKind, ClockEffects, PoseEffects, ReplicationEffects, RosterEffects,
    UiEffects, VisualEffects, WriterLease,
};
pub use errors::{BadgeError, BadgeResult, ReplicationError, VisualError, WireError};
pub use geometry::{Placement, Vec3};
pub use identifiers::{Entity, EntityId, RoleName, TemplateId, VisualHandle};
pub use readiness::{Readiness, ReadinessHandle};
