//! Badge registry
//!
//! Maps each connected entity that passed the role check to the canvas it
//! owns. Cardinality is bounded by session size (tens of entities), so
//! lookups are linear scans over a vector; visual instantiation dominates
//! the cost of a join, not lookup.

use insignia_core::{
    BadgeError, BadgeResult, EntityId, RoleName, TemplateId, VisualEffects, VisualHandle,
};
use serde::{Deserialize, Serialize};

/// Which role list a badge came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BadgeSlot {
    /// Highest matching ranked tier
    Exclusive,
    /// Stacks with every other badge
    Additive,
    /// Stacks, and follows the group toggle
    Toggleable,
}

/// A role badge instantiated beneath an entity's canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedBadge {
    /// Role list the badge came from
    pub slot: BadgeSlot,
    /// Role that matched
    pub role: RoleName,
    /// Template that was instantiated
    pub template: TemplateId,
    /// Handle of the instantiated badge
    pub visual: VisualHandle,
}

/// One entity's badge canvas and everything attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRecord {
    /// Owning entity
    pub entity: EntityId,
    /// Root visual, exclusively owned by the registry
    pub canvas: VisualHandle,
    /// Badges attached beneath the canvas, in attach order
    pub badges: Vec<AttachedBadge>,
}

impl BadgeRecord {
    /// Record with no badges attached yet.
    pub fn new(entity: EntityId, canvas: VisualHandle) -> Self {
        Self {
            entity,
            canvas,
            badges: Vec::new(),
        }
    }

    /// Visuals that follow the group show/hide toggle.
    pub fn toggleable_visuals(&self) -> Vec<VisualHandle> {
        self.badges
            .iter()
            .filter(|b| b.slot == BadgeSlot::Toggleable)
            .map(|b| b.visual)
            .collect()
    }

    /// Whether a badge from `template` is attached.
    pub fn has_template(&self, template: &TemplateId) -> bool {
        self.badges.iter().any(|b| &b.template == template)
    }
}

/// Registry of badge records, at most one per entity.
#[derive(Debug, Clone, Default)]
pub struct BadgeRegistry {
    records: Vec<BadgeRecord>,
}

impl BadgeRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Fails if the entity already has one; existing state is untouched.
    pub fn register(&mut self, record: BadgeRecord) -> BadgeResult<()> {
        if self.contains(record.entity) {
            tracing::error!(entity = %record.entity, "Refusing duplicate badge registration");
            return Err(BadgeError::DuplicateEntity(record.entity));
        }

        let before = self.records.len();
        self.records.push(record);
        ensure_len("registry.register", before + 1, self.records.len())
    }

    /// Remove `entity`'s record and destroy its canvas.
    ///
    /// Returns the removed record, or `None` if the entity had none.
    pub fn unregister<V>(&mut self, entity: EntityId, visuals: &V) -> Option<BadgeRecord>
    where
        V: VisualEffects + ?Sized,
    {
        let index = self.records.iter().position(|r| r.entity == entity)?;
        let before = self.records.len();
        let record = self.records.remove(index);
        visuals.destroy(record.canvas);

        // Logged and asserted inside; the removal itself already happened
        let _ = ensure_len("registry.unregister", before - 1, self.records.len());
        Some(record)
    }

    /// Canvas owned by `entity`.
    pub fn find(&self, entity: EntityId) -> Option<VisualHandle> {
        self.get(entity).map(|r| r.canvas)
    }

    /// Full record for `entity`.
    pub fn get(&self, entity: EntityId) -> Option<&BadgeRecord> {
        self.records.iter().find(|r| r.entity == entity)
    }

    /// Whether `entity` has a badge.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.records.iter().any(|r| r.entity == entity)
    }

    /// Snapshot of `(entity, canvas)` pairs in registration order.
    pub fn all(&self) -> Vec<(EntityId, VisualHandle)> {
        self.records.iter().map(|r| (r.entity, r.canvas)).collect()
    }

    /// Records in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &BadgeRecord> {
        self.records.iter()
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no entity has a badge.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Check a rebuilt collection's length.
///
/// A mismatch is a self-consistency bug: it is logged as an error, trips a
/// debug assertion under test, and is returned so callers can surface it.
pub(crate) fn ensure_len(context: &'static str, expected: usize, actual: usize) -> BadgeResult<()> {
    if expected == actual {
        return Ok(());
    }
    tracing::error!(context, expected, actual, "Structural integrity check failed");
    debug_assert_eq!(expected, actual, "integrity violation in {context}");
    Err(BadgeError::IntegrityViolation {
        context,
        expected,
        actual,
    })
}
