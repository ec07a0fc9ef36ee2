//! Toggleable badge group
//!
//! Role badges that also follow one process-wide show/hide flag. Visuals can
//! be destroyed by the host behind our back, so the set prunes dead handles
//! before applying the flag.

use insignia_core::{VisualEffects, VisualHandle};

/// Toggleable badge visuals and the group flag that drives them.
#[derive(Debug, Clone, Default)]
pub struct ToggleableBadgeSet {
    badges: Vec<VisualHandle>,
    shown: bool,
}

impl ToggleableBadgeSet {
    /// Empty group with the given initial flag.
    pub fn new(shown: bool) -> Self {
        Self {
            badges: Vec::new(),
            shown,
        }
    }

    /// Current group flag.
    pub fn shown(&self) -> bool {
        self.shown
    }

    /// Tracked visuals, including any the host destroyed since the last prune.
    pub fn len(&self) -> usize {
        self.badges.len()
    }

    /// True when no visual is tracked.
    pub fn is_empty(&self) -> bool {
        self.badges.is_empty()
    }

    /// Whether `visual` is tracked.
    pub fn contains(&self, visual: VisualHandle) -> bool {
        self.badges.contains(&visual)
    }

    /// Track `visual`; adding it twice is a no-op.
    pub fn add(&mut self, visual: VisualHandle) {
        if !self.badges.contains(&visual) {
            self.badges.push(visual);
        }
    }

    /// Drop `visuals` from the group. Returns how many were present.
    pub fn remove_all(&mut self, visuals: &[VisualHandle]) -> usize {
        let before = self.badges.len();
        self.badges.retain(|b| !visuals.contains(b));
        before - self.badges.len()
    }

    /// Drop handles whose visual no longer exists. Returns how many were pruned.
    pub fn prune_invalid<V>(&mut self, visuals: &V) -> usize
    where
        V: VisualEffects + ?Sized,
    {
        let before = self.badges.len();
        self.badges.retain(|b| visuals.is_alive(*b));
        let pruned = before - self.badges.len();
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.badges.len(), "Pruned dead toggleable badges");
        }
        pruned
    }

    /// Apply the current flag to every live badge in the group.
    pub fn apply<V>(&mut self, visuals: &V)
    where
        V: VisualEffects + ?Sized,
    {
        self.prune_invalid(visuals);
        for badge in &self.badges {
            if let Err(e) = visuals.set_visible(*badge, self.shown) {
                tracing::warn!(visual = ?badge, error = %e, "Failed to apply toggleable state");
            }
        }
    }

    /// Set the flag and apply it.
    pub fn set_shown<V>(&mut self, shown: bool, visuals: &V)
    where
        V: VisualEffects + ?Sized,
    {
        self.shown = shown;
        self.apply(visuals);
    }

    /// Flip the flag, apply it, and return the new state.
    pub fn flip<V>(&mut self, visuals: &V) -> bool
    where
        V: VisualEffects + ?Sized,
    {
        self.set_shown(!self.shown, visuals);
        self.shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insignia_core::{Entity, TemplateId, Vec3};
    use insignia_testkit::RecordingVisuals;

    fn badge(visuals: &RecordingVisuals) -> (VisualHandle, VisualHandle) {
        let canvas = visuals
            .spawn_canvas(&Entity::new(1, "alice"), Vec3::ZERO)
            .unwrap();
        let info = visuals
            .attach_badge(canvas, &TemplateId::from("badge_info"))
            .unwrap();
        (canvas, info)
    }

    #[test]
    fn test_flip_applies_to_all() {
        let visuals = RecordingVisuals::new();
        let (_, info) = badge(&visuals);
        let mut set = ToggleableBadgeSet::new(false);
        set.add(info);
        set.apply(&visuals);
        assert!(!visuals.is_visible(info));

        assert!(set.flip(&visuals));
        assert!(visuals.is_visible(info));
    }

    #[test]
    fn test_prune_drops_destroyed_visuals() {
        let visuals = RecordingVisuals::new();
        let (canvas, info) = badge(&visuals);
        let (_, other) = badge(&visuals);
        let mut set = ToggleableBadgeSet::new(true);
        set.add(info);
        set.add(other);

        visuals.destroy_externally(canvas);
        assert_eq!(set.prune_invalid(&visuals), 1);
        assert!(!set.contains(info));
        assert!(set.contains(other));

        // Applying after an external destroy does not touch dead handles
        set.set_shown(false, &visuals);
        assert!(!visuals.is_visible(other));
    }

    #[test]
    fn test_add_is_idempotent_and_remove_all() {
        let visuals = RecordingVisuals::new();
        let (_, info) = badge(&visuals);
        let mut set = ToggleableBadgeSet::default();
        set.add(info);
        set.add(info);
        assert_eq!(set.len(), 1);
        assert_eq!(set.remove_all(&[info, VisualHandle(999)]), 1);
        assert!(set.is_empty());
    }
}
