//! Roster oracle effects.

use crate::identifiers::RoleName;
use crate::readiness::Readiness;

/// Answers role-membership questions about entities by display name.
///
/// Queries made before `is_ready()` returns true may answer `false` for
/// everyone; the session never asks before readiness.
pub trait RosterEffects: Send + Sync {
    /// True once the roster can answer queries.
    fn is_ready(&self) -> bool;

    /// Latch that resolves when the roster becomes ready.
    fn readiness(&self) -> Readiness;

    /// Whether `display_name` holds `role`.
    fn has_role(&self, display_name: &str, role: &RoleName) -> bool;

    /// Whether `display_name` is on the roster at all (officer or member).
    fn is_roster_member(&self, display_name: &str) -> bool;
}
