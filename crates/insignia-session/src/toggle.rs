//! Toggle controller
//!
//! User-facing toggles. The own-badge toggle is replicated through the
//! hidden set and rate limited; the toggleable-group toggle and the umbrella
//! toggle only change what this participant sees.

use crate::session::{BadgeSession, SessionPhase};
use insignia_core::{BadgeEffects, BadgeError, BadgeResult, BadgeToggleKind};

impl<E: BadgeEffects> BadgeSession<E> {
    /// Route a widget toggle. Returns the resulting shown state, or `None`
    /// when the toggle was debounced.
    pub fn toggle(&mut self, kind: BadgeToggleKind) -> BadgeResult<Option<bool>> {
        match kind {
            BadgeToggleKind::ShowMyBadge => self.toggle_own_badge().map(Some),
            BadgeToggleKind::ShowToggleableBadges => Ok(self.toggle_toggleable_badges()),
            BadgeToggleKind::ShowAllBadges => Ok(Some(self.toggle_all_badges())),
        }
    }

    /// Hide or show the local participant's own badge for everyone.
    ///
    /// Returns whether the badge is shown afterwards. Visibility is
    /// reconciled locally right away rather than after the broadcast comes
    /// back. If publishing fails the local change is kept and the
    /// replication error is returned.
    pub fn toggle_own_badge(&mut self) -> BadgeResult<bool> {
        let local = self.local.id;
        if self.state.phase == SessionPhase::Pending {
            return Err(BadgeError::StaleOracle);
        }
        if !self.effects.is_roster_member(&self.local.display_name) {
            self.effects
                .set_toggle_interactable(BadgeToggleKind::ShowMyBadge, false);
            return Err(BadgeError::NotAuthorized(local));
        }

        let now = self.effects.now_instant();
        let attempt = self.state.rate_limiter.check(now)?;

        let result = if self.state.replicator.is_hidden(local) {
            self.state.replicator.request_show(local, &self.effects)
        } else {
            self.state.replicator.request_hide(local, &self.effects)
        };

        self.refresh_visibility()?;
        let shown = self.echo_own_state();
        result?;

        tracing::info!(local = %local, shown, attempt, "Own badge toggled");
        Ok(shown)
    }

    /// Flip the toggleable badge group. At most once per frame; a repeat
    /// within the same frame returns `None` and changes nothing.
    pub fn toggle_toggleable_badges(&mut self) -> Option<bool> {
        let frame = self.effects.frame_count();
        if !self.state.toggleable_debounce.try_enter(frame) {
            return None;
        }

        let shown = self.state.toggleable.flip(&self.effects);
        self.effects
            .echo_toggle(BadgeToggleKind::ShowToggleableBadges, shown);
        tracing::info!(shown, badges = self.state.toggleable.len(), "Toggleable badges toggled");
        Some(shown)
    }

    /// Flip the local umbrella flag over the whole badge layer.
    pub fn toggle_all_badges(&mut self) -> bool {
        let shown = !self.state.all_badges_shown;
        self.state.all_badges_shown = shown;
        self.effects.set_layer_visible(shown);
        self.effects.echo_toggle(BadgeToggleKind::ShowAllBadges, shown);
        tracing::info!(shown, "All badges toggled");
        shown
    }

    /// Drop toggleable badges whose visuals are gone. Returns how many.
    pub fn prune_toggleable(&mut self) -> usize {
        self.state.toggleable.prune_invalid(&self.effects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use insignia_core::EntityId;
    use insignia_testkit::fixtures::*;
    use insignia_testkit::{MockRoster, TestEffects};

    fn active_session(local_roles: &[&str]) -> BadgeSession<TestEffects> {
        let roster = MockRoster::ready();
        roster.add_member("alice", local_roles.iter().copied());
        let effects = TestEffects::standalone(EntityId(1), roster);
        let local = effects.local_entity("alice");
        let mut session = BadgeSession::new(standard_config(), local.clone(), effects);
        session.on_roster_ready().unwrap();
        session.on_joined(local).unwrap();
        session
    }

    #[test]
    fn test_own_toggle_hides_and_shows() {
        let mut session = active_session(&[ROLE_OFFICER]);
        assert_eq!(session.is_badge_visible(EntityId(1)), Some(true));

        assert!(!session.toggle_own_badge().unwrap());
        assert!(session.hidden_set().contains(EntityId(1)));
        assert_eq!(session.is_badge_visible(EntityId(1)), Some(false));
        assert_eq!(session.effects().visuals.canvas_visible(EntityId(1)), Some(false));
        assert_eq!(
            session.effects().ui.shown(BadgeToggleKind::ShowMyBadge),
            Some(false)
        );

        session.effects().clock.advance_ms(100);
        assert!(session.toggle_own_badge().unwrap());
        assert!(session.hidden_set().is_empty());
    }

    #[test]
    fn test_non_member_refused_and_widget_disabled() {
        let roster = MockRoster::ready();
        let effects = TestEffects::standalone(EntityId(5), roster);
        let local = effects.local_entity("stranger");
        let mut session = BadgeSession::new(standard_config(), local, effects);
        session.on_roster_ready().unwrap();

        assert_matches!(
            session.toggle_own_badge(),
            Err(BadgeError::NotAuthorized(EntityId(5)))
        );
        assert!(session.hidden_set().is_empty());
        assert!(!session.effects().ui.interactable(BadgeToggleKind::ShowMyBadge));
    }

    #[test]
    fn test_fourth_toggle_in_window_blocked() {
        let mut session = active_session(&[ROLE_CHIEF]);
        for _ in 0..3 {
            session.toggle_own_badge().unwrap();
            session.effects().clock.advance_ms(500);
        }
        let after_third = session.hidden_set().clone();

        assert_matches!(
            session.toggle_own_badge(),
            Err(BadgeError::RateLimitExceeded { attempts: 4, .. })
        );
        assert_eq!(session.hidden_set(), &after_third);
    }

    #[test]
    fn test_gap_after_window_allows_toggle() {
        let mut session = active_session(&[ROLE_CHIEF]);
        for _ in 0..3 {
            session.toggle_own_badge().unwrap();
        }
        session.effects().clock.advance_ms(5_001);
        session.toggle_own_badge().unwrap();
        assert_eq!(session.state().rate_limiter().count(), 1);
    }

    #[test]
    fn test_own_toggle_works_without_own_badge() {
        // Member with no badge roles still gets a (badge-less) canvas and can hide it
        let mut session = active_session(&[]);
        assert!(!session.toggle_own_badge().unwrap());
        assert!(session.hidden_set().contains(EntityId(1)));
    }

    #[test]
    fn test_toggleable_toggle_debounced_per_frame() {
        let mut session = active_session(&[ROLE_INFO]);
        let info = template_for(ROLE_INFO);
        assert!(!session.effects().visuals.badge_rendered(EntityId(1), &info));

        assert_eq!(session.toggle_toggleable_badges(), Some(true));
        assert_eq!(session.toggle_toggleable_badges(), None);
        assert!(session.effects().visuals.badge_rendered(EntityId(1), &info));

        session.effects().clock.next_frame();
        assert_eq!(session.toggle_toggleable_badges(), Some(false));
        assert_eq!(
            session.effects().ui.shown(BadgeToggleKind::ShowToggleableBadges),
            Some(false)
        );
    }

    #[test]
    fn test_toggle_all_is_local_only() {
        let mut session = active_session(&[ROLE_CHIEF]);
        let published = session.effects().network.network().publish_count();

        assert!(!session.toggle_all_badges());
        assert!(!session.effects().visuals.layer_visible());
        assert_eq!(session.is_badge_visible(EntityId(1)), Some(false));
        assert!(session.hidden_set().is_empty());
        assert_eq!(session.effects().network.network().publish_count(), published);

        assert!(session.toggle_all_badges());
        assert_eq!(session.is_badge_visible(EntityId(1)), Some(true));
    }

    #[test]
    fn test_toggle_routes_by_kind() {
        let mut session = active_session(&[ROLE_CHIEF]);
        assert_eq!(
            session.toggle(BadgeToggleKind::ShowAllBadges).unwrap(),
            Some(false)
        );
        assert_eq!(
            session.toggle(BadgeToggleKind::ShowMyBadge).unwrap(),
            Some(false)
        );
    }
}
