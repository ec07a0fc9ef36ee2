//! Badge session orchestrator
//!
//! `BadgeSession` owns all per-participant badge state in one explicit
//! `SessionState` and is driven by the host, either through the typed entry
//! points or through `dispatch`. Every entry point runs to completion before
//! the next; nothing here suspends except `activate`, which waits for the
//! roster.

use crate::debounce::FrameDebounce;
use crate::placement::{compute_placements, BadgePlacement};
use crate::rate_limit::ToggleRateLimiter;
use crate::reconcile::{reconcile, VisibilityIndex};
use crate::registry::BadgeRegistry;
use crate::toggleable::ToggleableBadgeSet;
use insignia_core::{
    BadgeConfig, BadgeEffects, BadgeError, BadgeResult, BadgeToggleKind, Entity, EntityId,
};
use insignia_sync::{AppliedUpdate, HiddenSet, HiddenSetReplicator};
use serde::{Deserialize, Serialize};

/// Two-phase initialization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Constructed; waiting for the roster. Joins are recorded, not evaluated.
    Pending,
    /// Roster ready and deferred joins replayed.
    Active,
}

/// Everything a participant knows about the badge session.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub(crate) phase: SessionPhase,
    /// Connected entities in arrival order, badge or not
    pub(crate) connected: Vec<Entity>,
    pub(crate) registry: BadgeRegistry,
    pub(crate) replicator: HiddenSetReplicator,
    pub(crate) toggleable: ToggleableBadgeSet,
    pub(crate) visibility: VisibilityIndex,
    /// Local umbrella flag over the whole badge layer; never replicated
    pub(crate) all_badges_shown: bool,
    pub(crate) rate_limiter: ToggleRateLimiter,
    pub(crate) toggleable_debounce: FrameDebounce,
}

impl SessionState {
    fn new(config: &BadgeConfig, local: EntityId) -> Self {
        Self {
            phase: SessionPhase::Pending,
            connected: Vec::new(),
            registry: BadgeRegistry::new(),
            replicator: HiddenSetReplicator::new(local),
            toggleable: ToggleableBadgeSet::new(config.toggleable_shown_by_default),
            visibility: VisibilityIndex::default(),
            all_badges_shown: config.all_badges_shown_by_default,
            rate_limiter: ToggleRateLimiter::new(&config.toggle_rate_limit),
            toggleable_debounce: FrameDebounce::new(),
        }
    }

    /// Current initialization phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Connected entities in arrival order.
    pub fn connected(&self) -> &[Entity] {
        &self.connected
    }

    /// Badge records for registered entities.
    pub fn registry(&self) -> &BadgeRegistry {
        &self.registry
    }

    /// Hidden-set replicator.
    pub fn replicator(&self) -> &HiddenSetReplicator {
        &self.replicator
    }

    /// Toggleable badge group.
    pub fn toggleable(&self) -> &ToggleableBadgeSet {
        &self.toggleable
    }

    /// Own-badge toggle limiter.
    pub fn rate_limiter(&self) -> &ToggleRateLimiter {
        &self.rate_limiter
    }
}

/// Every way the host drives a session.
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// An entity connected
    Joined(Entity),
    /// An entity disconnected
    Left(EntityId),
    /// The roster signalled readiness
    RosterReady,
    /// A hidden-set payload received from the transport
    Replicated(Vec<u8>),
    /// A local toggle widget was pressed
    ToggleRequested(BadgeToggleKind),
    /// Per-frame placement pass
    LateUpdate,
}

impl HostEvent {
    /// Stable name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            HostEvent::Joined(_) => "joined",
            HostEvent::Left(_) => "left",
            HostEvent::RosterReady => "roster_ready",
            HostEvent::Replicated(_) => "replicated",
            HostEvent::ToggleRequested(_) => "toggle_requested",
            HostEvent::LateUpdate => "late_update",
        }
    }
}

/// One participant's badge session.
pub struct BadgeSession<E: BadgeEffects> {
    pub(crate) config: BadgeConfig,
    pub(crate) local: Entity,
    pub(crate) effects: E,
    pub(crate) state: SessionState,
}

impl<E: BadgeEffects> BadgeSession<E> {
    /// Construct a pending session and push initial toggle state to the host.
    pub fn new(config: BadgeConfig, local: Entity, effects: E) -> Self {
        let state = SessionState::new(&config, local.id);

        effects.set_layer_visible(state.all_badges_shown);
        effects.echo_toggle(BadgeToggleKind::ShowAllBadges, state.all_badges_shown);
        effects.echo_toggle(
            BadgeToggleKind::ShowToggleableBadges,
            state.toggleable.shown(),
        );
        effects.echo_toggle(BadgeToggleKind::ShowMyBadge, true);

        tracing::info!(
            local = %local.id,
            exclusive_tiers = config.exclusive_tiers.len(),
            additive_roles = config.additive_roles.len(),
            toggleable_roles = config.toggleable_roles.len(),
            "Badge session created; waiting for roster"
        );

        Self {
            config,
            local,
            effects,
            state,
        }
    }

    /// Current initialization phase.
    pub fn phase(&self) -> SessionPhase {
        self.state.phase
    }

    /// Whether the roster replay has run.
    pub fn is_active(&self) -> bool {
        self.state.phase == SessionPhase::Active
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &BadgeConfig {
        &self.config
    }

    /// The participant this session renders for.
    pub fn local(&self) -> &Entity {
        &self.local
    }

    /// Host effects this session drives.
    pub fn effects(&self) -> &E {
        &self.effects
    }

    /// Read-only view of all session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Badge records for registered entities.
    pub fn registry(&self) -> &BadgeRegistry {
        &self.state.registry
    }

    /// Replicated set of entities that hid their own badge.
    pub fn hidden_set(&self) -> &HiddenSet {
        self.state.replicator.hidden_set()
    }

    /// The derived hidden flag per registered entity, as of the last reconcile.
    pub fn visibility_index(&self) -> &VisibilityIndex {
        &self.state.visibility
    }

    /// Whether `entity`'s badge is on screen for this participant.
    ///
    /// Combines the local umbrella flag with the replicated hidden state.
    /// `None` if the entity has no badge.
    pub fn is_badge_visible(&self, entity: EntityId) -> Option<bool> {
        let hidden = self.state.visibility.is_hidden(entity)?;
        Some(self.state.all_badges_shown && !hidden)
    }

    /// Local umbrella flag over the badge layer.
    pub fn all_badges_shown(&self) -> bool {
        self.state.all_badges_shown
    }

    /// Whether the toggleable group is shown.
    pub fn toggleable_shown(&self) -> bool {
        self.state.toggleable.shown()
    }

    /// Apply a hidden-set payload from the transport and reconcile.
    pub fn on_replicated(&mut self, payload: &[u8]) -> BadgeResult<AppliedUpdate> {
        let update = self.state.replicator.apply_remote(payload)?;
        self.refresh_visibility()?;
        self.echo_own_state();
        Ok(update)
    }

    /// Recompute and apply visibility for every registered entity.
    pub fn reconcile(&mut self) -> BadgeResult<()> {
        self.refresh_visibility()
    }

    pub(crate) fn refresh_visibility(&mut self) -> BadgeResult<()> {
        self.state.visibility = reconcile(
            &self.state.registry,
            self.state.replicator.hidden_set(),
            &self.effects,
        )?;
        Ok(())
    }

    /// Echo the local participant's own-badge state to its widget.
    pub(crate) fn echo_own_state(&self) -> bool {
        let shown = !self.state.replicator.is_hidden(self.local.id);
        self.effects.echo_toggle(BadgeToggleKind::ShowMyBadge, shown);
        shown
    }

    /// Place every registered badge above its entity, facing the local viewer.
    pub fn late_update(&self) -> Vec<BadgePlacement> {
        let placements = compute_placements(
            &self.state.registry,
            &self.effects,
            self.local.id,
            self.config.badge_offset,
        );
        for badge in &placements {
            if let Err(e) = self.effects.place(badge.canvas, badge.placement) {
                tracing::trace!(entity = %badge.entity, error = %e, "Skipped placing badge");
            }
        }
        placements
    }

    /// Route a host event to its operation, absorbing any error.
    pub fn dispatch(&mut self, event: HostEvent) {
        let name = event.name();
        let result = match event {
            HostEvent::Joined(entity) => self.on_joined(entity).map(drop),
            HostEvent::Left(entity) => self.on_left(entity),
            HostEvent::RosterReady => self.on_roster_ready().map(drop),
            HostEvent::Replicated(payload) => self.on_replicated(&payload).map(drop),
            HostEvent::ToggleRequested(kind) => self.toggle(kind).map(drop),
            HostEvent::LateUpdate => {
                self.late_update();
                Ok(())
            }
        };

        if let Err(e) = result {
            absorb(name, &e);
        }
    }
}

impl<E: BadgeEffects + std::fmt::Debug> std::fmt::Debug for BadgeSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeSession")
            .field("local", &self.local)
            .field("phase", &self.state.phase)
            .field("registered", &self.state.registry.len())
            .field("hidden", &self.state.replicator.hidden_set().len())
            .field("effects", &self.effects)
            .finish()
    }
}

/// Log an error the host will never see, at a severity matching its kind.
fn absorb(event: &'static str, err: &BadgeError) {
    let code = err.code();
    match err {
        e if e.is_benign() => {
            tracing::debug!(event, code, error = %e, "Host event was a no-op");
        }
        e if e.is_integrity_failure() => {
            tracing::error!(event, code, error = %e, "Badge state integrity failure");
        }
        BadgeError::NotAuthorized(_) => {
            tracing::info!(event, code, error = %err, "Badge toggle refused");
        }
        BadgeError::RateLimitExceeded { .. } => {
            tracing::warn!(event, code, error = %err, "Badge toggle spam detected, action blocked");
        }
        _ => {
            tracing::warn!(event, code, error = %err, "Host event failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insignia_core::EntityId;
    use insignia_testkit::fixtures::*;
    use insignia_testkit::{MockRoster, TestEffects};

    #[test]
    fn test_new_session_is_pending_and_echoes_defaults() {
        let effects = TestEffects::standalone(EntityId(1), MockRoster::new());
        let local = effects.local_entity("alice");
        let session = BadgeSession::new(standard_config(), local, effects);

        assert_eq!(session.phase(), SessionPhase::Pending);
        let ui = &session.effects().ui;
        assert_eq!(ui.shown(BadgeToggleKind::ShowAllBadges), Some(true));
        assert_eq!(ui.shown(BadgeToggleKind::ShowToggleableBadges), Some(false));
        assert_eq!(ui.shown(BadgeToggleKind::ShowMyBadge), Some(true));
        assert!(session.effects().visuals.layer_visible());
    }

    #[test]
    fn test_dispatch_absorbs_errors() {
        let effects = TestEffects::standalone(EntityId(1), MockRoster::new());
        let local = effects.local_entity("alice");
        let mut session = BadgeSession::new(standard_config(), local, effects);

        session.dispatch(HostEvent::Left(EntityId(42)));
        session.dispatch(HostEvent::Replicated(vec![0xff, 0x00]));
        session.dispatch(HostEvent::ToggleRequested(BadgeToggleKind::ShowMyBadge));
        assert_eq!(session.phase(), SessionPhase::Pending);
        assert_eq!(session.state().replicator().stats().rejected, 1);
    }

    #[test]
    fn test_event_names_are_stable() {
        assert_eq!(HostEvent::RosterReady.name(), "roster_ready");
        assert_eq!(
            HostEvent::ToggleRequested(BadgeToggleKind::ShowAllBadges).name(),
            "toggle_requested"
        );
    }
}
