//! Shared multi-participant harness for session integration tests.

#![allow(dead_code)]

use insignia_core::{BadgeConfig, Entity, EntityId, RosterEffects};
use insignia_session::BadgeSession;
use insignia_testkit::{LoopbackNetwork, ManualClock, MockRoster, StaticPoses, TestEffects};
use std::sync::Arc;

/// Several participants sharing one roster, network and clock.
pub struct Room {
    pub roster: Arc<MockRoster>,
    pub network: Arc<LoopbackNetwork>,
    pub clock: Arc<ManualClock>,
    pub poses: Arc<StaticPoses>,
    pub config: BadgeConfig,
    pub sessions: Vec<BadgeSession<TestEffects>>,
}

impl Room {
    pub fn new(config: BadgeConfig) -> Self {
        Self {
            roster: Arc::new(MockRoster::new()),
            network: Arc::new(LoopbackNetwork::new()),
            clock: Arc::new(ManualClock::new()),
            poses: Arc::new(StaticPoses::new()),
            config,
            sessions: Vec::new(),
        }
    }

    /// Add a participant and announce it to everyone already present.
    ///
    /// The newcomer hears about everyone present, itself included, and is
    /// activated right away if the roster is already ready. Returns its index.
    pub fn join(&mut self, id: u32, display_name: &str) -> usize {
        let entity = Entity::new(EntityId(id), display_name);
        let effects = TestEffects::shared(
            entity.id,
            Arc::clone(&self.roster),
            &self.network,
            Arc::clone(&self.clock),
            Arc::clone(&self.poses),
        );
        let mut session = BadgeSession::new(self.config.clone(), entity.clone(), effects);

        let present: Vec<Entity> = self.sessions.iter().map(|s| s.local().clone()).collect();
        for other in present {
            session.on_joined(other).ok();
        }
        session.on_joined(entity.clone()).ok();
        if self.roster.is_ready() {
            session.on_roster_ready().ok();
        }

        for existing in &mut self.sessions {
            existing.on_joined(entity.clone()).ok();
        }
        self.sessions.push(session);
        self.sessions.len() - 1
    }

    /// Remove a participant and announce the departure.
    pub fn leave(&mut self, index: usize) {
        let session = self.sessions.remove(index);
        let id = session.local().id;
        self.network.disconnect(id);
        for other in &mut self.sessions {
            other.on_left(id).ok();
        }
    }

    /// Signal roster readiness to every participant.
    pub fn roster_ready(&mut self) {
        self.roster.mark_ready();
        for session in &mut self.sessions {
            session.on_roster_ready().ok();
        }
    }

    /// Deliver every payload queued for one participant, oldest first.
    pub fn deliver_to(&mut self, index: usize) -> usize {
        let session = &mut self.sessions[index];
        let payloads = self.network.drain_inbox(session.local().id);
        let delivered = payloads.len();
        for payload in payloads {
            session.on_replicated(&payload).ok();
        }
        delivered
    }

    /// Deliver queued payloads until every inbox is empty.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        while self.network.total_pending() > 0 {
            for index in 0..self.sessions.len() {
                delivered += self.deliver_to(index);
            }
        }
        delivered
    }

    pub fn session(&self, index: usize) -> &BadgeSession<TestEffects> {
        &self.sessions[index]
    }

    pub fn session_mut(&mut self, index: usize) -> &mut BadgeSession<TestEffects> {
        &mut self.sessions[index]
    }
}
