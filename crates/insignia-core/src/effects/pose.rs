//! Avatar pose effects.

use crate::geometry::Vec3;
use crate::identifiers::EntityId;

/// Read-only access to tracked avatar poses.
pub trait PoseEffects: Send + Sync {
    /// World-space head position, or `None` if the entity has no tracked pose.
    fn head_position(&self, entity: EntityId) -> Option<Vec3>;
}
