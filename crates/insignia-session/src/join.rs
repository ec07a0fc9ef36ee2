//! Join, leave and roster readiness
//!
//! Joins are evaluated only once the session is active. Before that they are
//! recorded in the connected list and replayed in arrival order when the
//! roster signals readiness, followed by one self-sync of the hidden set.

use crate::registry::{AttachedBadge, BadgeRecord, BadgeSlot};
use crate::roles::{resolve_badges, BadgePlan};
use crate::session::{BadgeSession, SessionPhase};
use insignia_core::{BadgeEffects, BadgeError, BadgeResult, BadgeToggleKind, Entity, EntityId, Vec3};
use serde::{Deserialize, Serialize};

/// What evaluating one join did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOutcome {
    /// A canvas was created and registered
    Registered { entity: EntityId, badges: usize },
    /// The entity already had a badge; nothing changed
    AlreadyRegistered,
    /// The entity is not on the roster; no badge
    NotOnRoster,
}

/// Summary of the deferred-join replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayReport {
    /// Connected entities evaluated by the replay
    pub replayed: usize,
    /// Entities that got a badge
    pub registered: usize,
    /// Evaluations that returned an error
    pub failed: usize,
    /// Whether the self-sync re-published the hidden set
    pub resynced: bool,
    /// Readiness had already been handled; nothing was replayed
    pub already_active: bool,
}

impl<E: BadgeEffects> BadgeSession<E> {
    /// Handle an entity joining the session.
    ///
    /// While the session is pending this records the entity and returns
    /// `StaleOracle`; the join is evaluated by the readiness replay.
    pub fn on_joined(&mut self, entity: Entity) -> BadgeResult<JoinOutcome> {
        if !self.state.connected.iter().any(|e| e.id == entity.id) {
            self.state.connected.push(entity.clone());
        }

        if self.state.phase == SessionPhase::Pending {
            tracing::debug!(entity = %entity.id, "Join deferred until roster is ready");
            return Err(BadgeError::StaleOracle);
        }

        self.evaluate_join(&entity)
    }

    /// Handle an entity leaving: destroy its canvas and drop its toggleables.
    pub fn on_left(&mut self, entity: EntityId) -> BadgeResult<()> {
        self.state.connected.retain(|e| e.id != entity);

        let Some(record) = self.state.registry.unregister(entity, &self.effects) else {
            return Err(BadgeError::NotFound(entity));
        };
        self.state.toggleable.remove_all(&record.toggleable_visuals());
        self.refresh_visibility()?;

        tracing::info!(entity = %entity, remaining = self.state.registry.len(), "Badge removed");
        Ok(())
    }

    /// Transition to active, replay deferred joins and self-sync.
    ///
    /// Runs once; later calls are no-ops. A signal that arrives while the
    /// roster still cannot answer returns `StaleOracle` and leaves the
    /// session pending, so the replay happens on the next signal.
    pub fn on_roster_ready(&mut self) -> BadgeResult<ReplayReport> {
        if self.state.phase == SessionPhase::Active {
            tracing::debug!(local = %self.local.id, "Roster readiness already handled");
            return Ok(ReplayReport {
                already_active: true,
                ..ReplayReport::default()
            });
        }
        if !self.effects.is_ready() {
            tracing::warn!(local = %self.local.id, "Readiness signalled before roster can answer");
            return Err(BadgeError::StaleOracle);
        }
        self.state.phase = SessionPhase::Active;

        let pending = self.state.connected.clone();
        let mut report = ReplayReport {
            replayed: pending.len(),
            ..ReplayReport::default()
        };

        for entity in &pending {
            match self.evaluate_join(entity) {
                Ok(JoinOutcome::Registered { .. }) => report.registered += 1,
                Ok(_) => {}
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(entity = %entity.id, error = %e, "Replayed join failed");
                }
            }
        }

        report.resynced = match self.state.replicator.resync(&self.effects) {
            Ok(published) => published,
            Err(e) => {
                tracing::warn!(local = %self.local.id, error = %e, "Self-sync after replay failed");
                false
            }
        };
        self.refresh_visibility()?;

        let member = self.effects.is_roster_member(&self.local.display_name);
        self.effects
            .set_toggle_interactable(BadgeToggleKind::ShowMyBadge, member);
        self.echo_own_state();

        tracing::info!(
            local = %self.local.id,
            replayed = report.replayed,
            registered = report.registered,
            resynced = report.resynced,
            "Roster ready; deferred joins replayed"
        );
        Ok(report)
    }

    /// Wait for the roster to become ready, then run `on_roster_ready`.
    pub async fn activate(&mut self) -> BadgeResult<ReplayReport> {
        let readiness = self.effects.readiness();
        if !readiness.wait().await {
            tracing::warn!(local = %self.local.id, "Roster went away before becoming ready");
            return Err(BadgeError::StaleOracle);
        }
        self.on_roster_ready()
    }

    fn evaluate_join(&mut self, entity: &Entity) -> BadgeResult<JoinOutcome> {
        if self.state.registry.contains(entity.id) {
            tracing::debug!(entity = %entity.id, "Entity already has a badge");
            return Ok(JoinOutcome::AlreadyRegistered);
        }

        let Some(plan) = resolve_badges(&self.config, &self.effects, &entity.display_name) else {
            return Ok(JoinOutcome::NotOnRoster);
        };

        let record = self.instantiate(entity, &plan)?;
        let canvas = record.canvas;
        let toggleables = record.toggleable_visuals();
        let badges = record.badges.len();

        if let Err(e) = self.state.registry.register(record) {
            self.effects.destroy(canvas);
            return Err(e);
        }
        for visual in toggleables {
            self.state.toggleable.add(visual);
        }

        // Match converged state before the first frame shows the canvas
        self.refresh_visibility()?;
        self.state.toggleable.apply(&self.effects);

        tracing::info!(
            entity = %entity.id,
            display_name = %entity.display_name,
            badges,
            "Badge registered"
        );
        Ok(JoinOutcome::Registered {
            entity: entity.id,
            badges,
        })
    }

    fn instantiate(&self, entity: &Entity, plan: &BadgePlan) -> BadgeResult<BadgeRecord> {
        let at = self
            .effects
            .head_position(entity.id)
            .map_or(Vec3::ZERO, |head| head + self.config.badge_offset);
        let canvas = self.effects.spawn_canvas(entity, at)?;
        let mut record = BadgeRecord::new(entity.id, canvas);

        let slots = plan
            .exclusive
            .iter()
            .map(|badge| (BadgeSlot::Exclusive, badge))
            .chain(plan.additive.iter().map(|badge| (BadgeSlot::Additive, badge)))
            .chain(plan.toggleable.iter().map(|badge| (BadgeSlot::Toggleable, badge)));

        for (slot, badge) in slots {
            match self.effects.attach_badge(canvas, &badge.template) {
                Ok(visual) => record.badges.push(AttachedBadge {
                    slot,
                    role: badge.role.clone(),
                    template: badge.template.clone(),
                    visual,
                }),
                Err(e) => tracing::warn!(
                    entity = %entity.id,
                    role = %badge.role.as_str(),
                    error = %e,
                    "Failed to attach badge; skipping"
                ),
            }
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use insignia_testkit::fixtures::*;
    use insignia_testkit::{MockRoster, TestEffects};

    fn session(roster: MockRoster) -> BadgeSession<TestEffects> {
        let effects = TestEffects::standalone(EntityId(100), roster);
        let local = effects.local_entity("viewer");
        BadgeSession::new(standard_config(), local, effects)
    }

    #[test]
    fn test_join_before_ready_is_deferred() {
        let roster = MockRoster::new();
        roster.add_member("alice", [ROLE_CHIEF]);
        let mut session = session(roster);

        assert_matches!(
            session.on_joined(entity(1, "alice")),
            Err(BadgeError::StaleOracle)
        );
        assert!(session.registry().is_empty());
        assert_eq!(session.state().connected().len(), 1);
    }

    #[test]
    fn test_replay_registers_deferred_joins_once() {
        let roster = MockRoster::new();
        roster.add_member("alice", [ROLE_CHIEF, ROLE_OFFICER]);
        let mut session = session(roster);
        session.on_joined(entity(1, "alice")).ok();
        session.on_joined(entity(2, "mallory")).ok();

        session.effects().roster.mark_ready();
        let report = session.on_roster_ready().unwrap();
        assert_eq!(report.replayed, 2);
        assert_eq!(report.registered, 1);
        assert!(!report.resynced);

        let again = session.on_roster_ready().unwrap();
        assert!(again.already_active);
        assert_eq!(session.registry().len(), 1);

        let visuals = &session.effects().visuals;
        assert_eq!(
            visuals.templates_of(EntityId(1)),
            vec![template_for(ROLE_CHIEF)]
        );
    }

    #[test]
    fn test_early_readiness_signal_keeps_joins_deferred() {
        let roster = MockRoster::new();
        roster.add_member("alice", [ROLE_CHIEF]);
        let mut session = session(roster);
        session.on_joined(entity(1, "alice")).ok();

        assert_matches!(session.on_roster_ready(), Err(BadgeError::StaleOracle));
        assert_eq!(session.phase(), SessionPhase::Pending);
        assert!(session.registry().is_empty());

        session.effects().roster.mark_ready();
        let report = session.on_roster_ready().unwrap();
        assert!(!report.already_active);
        assert_eq!(report.replayed, 1);
        assert_eq!(report.registered, 1);
        assert!(session.registry().contains(EntityId(1)));
    }

    #[test]
    fn test_idempotent_join() {
        let roster = MockRoster::ready();
        roster.add_member("alice", [ROLE_CADET]);
        let mut session = session(roster);
        session.on_roster_ready().unwrap();

        assert_matches!(
            session.on_joined(entity(1, "alice")),
            Ok(JoinOutcome::Registered { badges: 1, .. })
        );
        assert_matches!(
            session.on_joined(entity(1, "alice")),
            Ok(JoinOutcome::AlreadyRegistered)
        );
        assert_eq!(session.effects().visuals.canvas_count(), 1);
        assert_eq!(session.state().connected().len(), 1);
    }

    #[test]
    fn test_leave_destroys_canvas_and_toggleables() {
        let roster = MockRoster::ready();
        roster.add_member("alice", [ROLE_INFO]);
        let mut session = session(roster);
        session.on_roster_ready().unwrap();
        session.on_joined(entity(1, "alice")).unwrap();
        assert_eq!(session.state().toggleable().len(), 1);

        session.on_left(EntityId(1)).unwrap();
        assert!(session.registry().is_empty());
        assert!(session.state().toggleable().is_empty());
        assert_eq!(session.effects().visuals.live_count(), 0);
        assert!(session.visibility_index().is_empty());

        assert_matches!(
            session.on_left(EntityId(1)),
            Err(BadgeError::NotFound(EntityId(1)))
        );
    }

    #[test]
    fn test_failed_attach_still_registers_remaining_badges() {
        let roster = MockRoster::ready();
        roster.add_member("bob", [ROLE_EVENT_STAFF, ROLE_MODERATOR]);
        let mut session = session(roster);
        session
            .effects()
            .visuals
            .reject_template(template_for(ROLE_MODERATOR));
        session.on_roster_ready().unwrap();

        assert_matches!(
            session.on_joined(entity(2, "bob")),
            Ok(JoinOutcome::Registered { badges: 1, .. })
        );
    }

    #[test]
    fn test_canvas_spawns_above_head() {
        let roster = MockRoster::ready();
        roster.add_member("alice", [ROLE_CHIEF]);
        let mut session = session(roster);
        session
            .effects()
            .poses
            .set_head(EntityId(1), Vec3::new(1.0, 1.5, 0.0));
        session.on_roster_ready().unwrap();
        session.on_joined(entity(1, "alice")).unwrap();

        let visuals = &session.effects().visuals;
        let canvas = visuals.canvas_of(EntityId(1)).unwrap();
        let placed = visuals.get(canvas).unwrap().placement.unwrap();
        assert_eq!(placed.anchor, Vec3::new(1.0, 2.0, 0.0));
    }
}
