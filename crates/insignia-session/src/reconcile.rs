//! Visibility reconciliation
//!
//! Derives per-entity "is hidden" from the registry and the hidden set, and
//! applies the negation to each canvas. Always a full recompute; there is no
//! incremental diffing and the index is never patched in place.

use crate::registry::{ensure_len, BadgeRegistry};
use insignia_core::{BadgeResult, EntityId, VisualEffects};
use insignia_sync::HiddenSet;
use serde::{Deserialize, Serialize};

/// Derived, non-authoritative hidden flag per registered entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilityIndex {
    entries: Vec<(EntityId, bool)>,
}

impl VisibilityIndex {
    /// Compute the index for the current registry and hidden set.
    pub fn compute(registry: &BadgeRegistry, hidden: &HiddenSet) -> Self {
        Self {
            entries: registry
                .iter()
                .map(|record| (record.entity, hidden.contains(record.entity)))
                .collect(),
        }
    }

    /// Whether `entity`'s badge is hidden; `None` if it has no badge.
    pub fn is_hidden(&self, entity: EntityId) -> Option<bool> {
        self.entries
            .iter()
            .find(|(id, _)| *id == entity)
            .map(|(_, hidden)| *hidden)
    }

    /// `(entity, hidden)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, bool)> + '_ {
        self.entries.iter().copied()
    }

    /// Number of registered entities that are hidden.
    pub fn hidden_count(&self) -> usize {
        self.entries.iter().filter(|(_, hidden)| *hidden).count()
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Recompute visibility for every registered entity and apply it.
///
/// A canvas that fails to update is logged and skipped; the rest are still
/// applied.
pub fn reconcile<V>(
    registry: &BadgeRegistry,
    hidden: &HiddenSet,
    visuals: &V,
) -> BadgeResult<VisibilityIndex>
where
    V: VisualEffects + ?Sized,
{
    let index = VisibilityIndex::compute(registry, hidden);
    ensure_len("reconcile.index", registry.len(), index.len())?;

    for (record, (_, is_hidden)) in registry.iter().zip(index.iter()) {
        if let Err(e) = visuals.set_visible(record.canvas, !is_hidden) {
            tracing::warn!(
                entity = %record.entity,
                error = %e,
                "Failed to apply badge visibility"
            );
        }
    }

    tracing::trace!(
        registered = index.len(),
        hidden = index.hidden_count(),
        "Reconciled badge visibility"
    );
    Ok(index)
}
