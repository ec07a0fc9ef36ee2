//! Insignia Session - Badge Session Layer
//!
//! This crate drives one participant's view of a badge session. It builds on
//! the replicated hidden set from `insignia-sync` to provide:
//!
//! - `BadgeRegistry`: which connected entity owns which badge canvas
//! - Role resolution: exclusive tiers (first match wins), additive roles,
//!   toggleable roles
//! - `reconcile`: full recomputation of per-entity visibility from the
//!   registry and the hidden set
//! - Toggle control: own-badge toggle behind a sliding-window rate limiter,
//!   group toggle for toggleable badges debounced per frame, and a local
//!   umbrella toggle for the whole badge layer
//! - `BadgeSession`: the orchestrator the host feeds with `HostEvent`s
//!
//! # Lifecycle
//!
//! A session is constructed pending. Joins that arrive before the roster is
//! ready are recorded but not evaluated; when the roster signals readiness
//! every connected entity is replayed once, and the hidden set is
//! re-published if this participant holds the writer lease.
//!
//! # Example
//!
//! ```ignore
//! use insignia_session::{BadgeSession, HostEvent};
//!
//! let mut session = BadgeSession::new(config, local, effects);
//! session.dispatch(HostEvent::Joined(entity));
//! session.dispatch(HostEvent::RosterReady);
//! session.dispatch(HostEvent::ToggleRequested(BadgeToggleKind::ShowMyBadge));
//! ```

pub mod debounce;
pub mod join;
pub mod placement;
pub mod rate_limit;
pub mod reconcile;
pub mod registry;
pub mod roles;
pub mod session;
pub mod toggle;
pub mod toggleable;

pub use debounce::FrameDebounce;
pub use join::{JoinOutcome, ReplayReport};
pub use placement::{compute_placements, placement_for, BadgePlacement};
pub use rate_limit::{RateLimiterStats, ToggleRateLimiter};
pub use reconcile::{reconcile, VisibilityIndex};
pub use registry::{AttachedBadge, BadgeRecord, BadgeRegistry, BadgeSlot};
pub use roles::{resolve_badges, BadgePlan};
pub use session::{BadgeSession, HostEvent, SessionPhase, SessionState};
pub use toggleable::ToggleableBadgeSet;
