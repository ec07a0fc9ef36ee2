//! Composite per-participant effects
//!
//! Roster, network, clock and poses are shared across participants of one
//! test session; visuals and UI are per participant, since each participant
//! renders its own view.

use crate::network::{LoopbackNetwork, NetworkEndpoint};
use crate::pose::StaticPoses;
use crate::roster::MockRoster;
use crate::time::ManualClock;
use crate::ui::RecordingUi;
use crate::visual::RecordingVisuals;
use insignia_core::{
    BadgeToggleKind, ClockEffects, Entity, EntityId, Placement, PoseEffects, Readiness,
    ReplicationEffects, ReplicationError, RoleName, RosterEffects, TemplateId, UiEffects, Vec3,
    VisualEffects, VisualError, VisualHandle, WriterLease,
};
use std::sync::Arc;
use std::time::Instant;

/// All effects one participant's session needs, backed by the testkit mocks.
#[derive(Debug, Clone)]
pub struct TestEffects {
    /// Participant these effects belong to
    pub local: EntityId,
    /// Roster shared by the whole test session
    pub roster: Arc<MockRoster>,
    /// Endpoint on the shared loopback network
    pub network: NetworkEndpoint,
    /// Visuals private to this participant
    pub visuals: Arc<RecordingVisuals>,
    /// Poses shared by the whole test session
    pub poses: Arc<StaticPoses>,
    /// Clock shared by the whole test session
    pub clock: Arc<ManualClock>,
    /// Widgets private to this participant
    pub ui: Arc<RecordingUi>,
}

impl TestEffects {
    /// Effects for `local` sharing roster, network, clock and poses with others.
    ///
    /// Connects `local` to the network.
    pub fn shared(
        local: EntityId,
        roster: Arc<MockRoster>,
        network: &Arc<LoopbackNetwork>,
        clock: Arc<ManualClock>,
        poses: Arc<StaticPoses>,
    ) -> Self {
        network.connect(local);
        Self {
            local,
            roster,
            network: network.endpoint(local),
            visuals: Arc::new(RecordingVisuals::new()),
            poses,
            clock,
            ui: Arc::new(RecordingUi::new()),
        }
    }

    /// Effects for a participant alone in its own session.
    pub fn standalone(local: EntityId, roster: MockRoster) -> Self {
        Self::shared(
            local,
            Arc::new(roster),
            &Arc::new(LoopbackNetwork::new()),
            Arc::new(ManualClock::new()),
            Arc::new(StaticPoses::new()),
        )
    }

    /// Shortcut for the local entity with a display name.
    pub fn local_entity(&self, display_name: &str) -> Entity {
        Entity::new(self.local, display_name)
    }
}

impl RosterEffects for TestEffects {
    fn is_ready(&self) -> bool {
        self.roster.is_ready()
    }

    fn readiness(&self) -> Readiness {
        self.roster.readiness()
    }

    fn has_role(&self, display_name: &str, role: &RoleName) -> bool {
        self.roster.has_role(display_name, role)
    }

    fn is_roster_member(&self, display_name: &str) -> bool {
        self.roster.is_roster_member(display_name)
    }
}

impl ReplicationEffects for TestEffects {
    fn current_writer(&self) -> Option<EntityId> {
        self.network.current_writer()
    }

    fn acquire_writer(&self, participant: EntityId) -> Result<WriterLease, ReplicationError> {
        self.network.acquire_writer(participant)
    }

    fn publish(&self, lease: &WriterLease, payload: Vec<u8>) -> Result<(), ReplicationError> {
        self.network.publish(lease, payload)
    }
}

impl VisualEffects for TestEffects {
    fn spawn_canvas(&self, entity: &Entity, at: Vec3) -> Result<VisualHandle, VisualError> {
        self.visuals.spawn_canvas(entity, at)
    }

    fn attach_badge(
        &self,
        canvas: VisualHandle,
        template: &TemplateId,
    ) -> Result<VisualHandle, VisualError> {
        self.visuals.attach_badge(canvas, template)
    }

    fn set_visible(&self, visual: VisualHandle, visible: bool) -> Result<(), VisualError> {
        self.visuals.set_visible(visual, visible)
    }

    fn is_visible(&self, visual: VisualHandle) -> bool {
        self.visuals.is_visible(visual)
    }

    fn is_alive(&self, visual: VisualHandle) -> bool {
        self.visuals.is_alive(visual)
    }

    fn destroy(&self, visual: VisualHandle) {
        self.visuals.destroy(visual);
    }

    fn place(&self, visual: VisualHandle, placement: Placement) -> Result<(), VisualError> {
        self.visuals.place(visual, placement)
    }

    fn set_layer_visible(&self, visible: bool) {
        self.visuals.set_layer_visible(visible);
    }
}

impl PoseEffects for TestEffects {
    fn head_position(&self, entity: EntityId) -> Option<Vec3> {
        self.poses.head_position(entity)
    }
}

impl ClockEffects for TestEffects {
    fn now_instant(&self) -> Instant {
        self.clock.now_instant()
    }

    fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }
}

impl UiEffects for TestEffects {
    fn echo_toggle(&self, kind: BadgeToggleKind, shown: bool) {
        self.ui.echo_toggle(kind, shown);
    }

    fn set_toggle_interactable(&self, kind: BadgeToggleKind, interactable: bool) {
        self.ui.set_toggle_interactable(kind, interactable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insignia_core::BadgeEffects;

    fn assert_badge_effects<E: BadgeEffects>(_: &E) {}

    #[test]
    fn test_effects_satisfy_session_bound() {
        let effects = TestEffects::standalone(EntityId(1), MockRoster::ready());
        assert_badge_effects(&effects);
        assert!(effects.network.network().is_connected(EntityId(1)));
    }
}
