//! The hidden set container.

use insignia_core::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Entities that asked for their own badge to be hidden from everyone.
///
/// Each identifier appears at most once. Ordering is an artifact of the
/// container and carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiddenSet {
    entries: BTreeSet<EntityId>,
}

impl HiddenSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from wire entries, returning how many duplicates were dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = EntityId>) -> (Self, usize) {
        let mut set = BTreeSet::new();
        let mut duplicates = 0;
        for entity in entries {
            if !set.insert(entity) {
                duplicates += 1;
            }
        }
        (Self { entries: set }, duplicates)
    }

    /// Add `entity`. Returns false if it was already present.
    pub fn insert(&mut self, entity: EntityId) -> bool {
        self.entries.insert(entity)
    }

    /// Remove `entity`. Returns false if it was absent.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        self.entries.remove(&entity)
    }

    /// Whether `entity` asked to hide its badge.
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains(&entity)
    }

    /// Number of hidden entities.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when every badge is shown.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hidden entities in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entries.iter().copied()
    }

    /// Entries in wire order (sorted, no duplicates).
    pub fn to_entries(&self) -> Vec<EntityId> {
        self.entries.iter().copied().collect()
    }
}

impl FromIterator<EntityId> for HiddenSet {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self::from_entries(iter).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut set = HiddenSet::new();
        assert!(set.insert(EntityId(4)));
        assert!(!set.insert(EntityId(4)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut set: HiddenSet = [EntityId(1)].into_iter().collect();
        assert!(!set.remove(EntityId(2)));
        assert_eq!(set.to_entries(), vec![EntityId(1)]);
    }

    #[test]
    fn test_from_entries_counts_duplicates() {
        let (set, duplicates) =
            HiddenSet::from_entries([EntityId(3), EntityId(1), EntityId(3), EntityId(3)]);
        assert_eq!(duplicates, 2);
        assert_eq!(set.to_entries(), vec![EntityId(1), EntityId(3)]);
    }

    proptest! {
        #[test]
        fn prop_entries_are_unique(raw in proptest::collection::vec(0u32..16, 0..40)) {
            let (set, duplicates) = HiddenSet::from_entries(raw.iter().copied().map(EntityId));
            let entries = set.to_entries();
            let mut deduped = entries.clone();
            deduped.dedup();
            prop_assert_eq!(&entries, &deduped);
            prop_assert_eq!(entries.len() + duplicates, raw.len());
        }

        #[test]
        fn prop_double_insert_equals_single(raw in proptest::collection::vec(0u32..16, 0..20), x in 0u32..16) {
            let base: HiddenSet = raw.into_iter().map(EntityId).collect();
            let mut once = base.clone();
            once.insert(EntityId(x));
            let mut twice = once.clone();
            twice.insert(EntityId(x));
            prop_assert_eq!(once, twice);
        }
    }
}
