//! Static head poses.

use insignia_core::{EntityId, PoseEffects, Vec3};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Head positions set directly by the test.
#[derive(Debug, Default)]
pub struct StaticPoses {
    heads: Mutex<BTreeMap<EntityId, Vec3>>,
}

impl StaticPoses {
    /// No poses known.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `entity`'s head position.
    pub fn set_head(&self, entity: EntityId, position: Vec3) {
        self.heads.lock().insert(entity, position);
    }

    /// Forget `entity`'s pose.
    pub fn clear(&self, entity: EntityId) {
        self.heads.lock().remove(&entity);
    }
}

impl PoseEffects for StaticPoses {
    fn head_position(&self, entity: EntityId) -> Option<Vec3> {
        self.heads.lock().get(&entity).copied()
    }
}
