//! Per-frame badge placement.

use crate::registry::BadgeRegistry;
use insignia_core::{EntityId, Placement, PoseEffects, Vec3, VisualHandle};
use serde::{Deserialize, Serialize};

/// Where one entity's canvas goes this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BadgePlacement {
    /// Entity the badge belongs to
    pub entity: EntityId,
    /// Canvas that was moved
    pub canvas: VisualHandle,
    /// Where the canvas now sits
    pub placement: Placement,
}

/// Anchor above `head` by `offset`, facing `viewer_head`.
pub fn placement_for(head: Vec3, viewer_head: Vec3, offset: Vec3) -> Placement {
    Placement::above(head, offset, viewer_head)
}

/// Placements for every registered entity that has a pose.
///
/// Empty when the viewer has no pose, since there is nothing to face.
pub fn compute_placements<P>(
    registry: &BadgeRegistry,
    poses: &P,
    viewer: EntityId,
    offset: Vec3,
) -> Vec<BadgePlacement>
where
    P: PoseEffects + ?Sized,
{
    let Some(viewer_head) = poses.head_position(viewer) else {
        tracing::trace!(viewer = %viewer, "No viewer pose; skipping placement");
        return Vec::new();
    };

    registry
        .iter()
        .filter_map(|record| {
            let head = poses.head_position(record.entity)?;
            Some(BadgePlacement {
                entity: record.entity,
                canvas: record.canvas,
                placement: placement_for(head, viewer_head, offset),
            })
        })
        .collect()
}
