//! Multi-participant world
//!
//! Every participant runs its own `BadgeSession` over testkit effects. The
//! roster, the loopback replication network, the clock and head poses are
//! shared. Host events go through `BadgeSession::dispatch` exactly as a host
//! would deliver them; toggles use the typed entry points so their outcomes
//! can be tallied.

use crate::report::{ExpectationResult, ParticipantReport, SimulationReport, ToggleTally};
use crate::scenario::{Expectation, ScenarioError, ScenarioFile, ScenarioStep};
use insignia_core::{BadgeConfig, BadgeToggleKind, Entity, EntityId, RosterEffects, Vec3};
use insignia_session::{BadgeSession, HostEvent};
use insignia_testkit::{LoopbackNetwork, ManualClock, MockRoster, StaticPoses, TestEffects};
use std::sync::Arc;

struct Participant {
    name: String,
    session: BadgeSession<TestEffects>,
}

/// A running scenario: one badge session per joined participant.
pub struct World {
    scenario: ScenarioFile,
    config: BadgeConfig,
    roster: Arc<MockRoster>,
    network: Arc<LoopbackNetwork>,
    clock: Arc<ManualClock>,
    poses: Arc<StaticPoses>,
    /// Connected participants in join order
    participants: Vec<Participant>,
    tally: ToggleTally,
    delivered: u64,
    steps_run: usize,
}

impl World {
    /// Build a world for `scenario`, seeding the roster from its participants.
    pub fn new(scenario: ScenarioFile, config: BadgeConfig) -> Self {
        let roster = Arc::new(MockRoster::new());
        for spec in scenario.participants.iter().filter(|p| p.on_roster) {
            roster.add_member(&spec.name, spec.roles.iter().map(String::as_str));
        }

        Self {
            scenario,
            config,
            roster,
            network: Arc::new(LoopbackNetwork::new()),
            clock: Arc::new(ManualClock::new()),
            poses: Arc::new(StaticPoses::new()),
            participants: Vec::new(),
            tally: ToggleTally::default(),
            delivered: 0,
            steps_run: 0,
        }
    }

    /// Run every step, deliver what is still queued, and check expectations.
    pub fn run(mut self) -> Result<SimulationReport, ScenarioError> {
        let steps = self.scenario.steps.clone();
        for step in &steps {
            self.step(step)?;
        }
        self.deliver();
        Ok(self.report())
    }

    /// Execute one step.
    pub fn step(&mut self, step: &ScenarioStep) -> Result<(), ScenarioError> {
        tracing::debug!(?step, "Running scenario step");
        match step {
            ScenarioStep::Join { participant } => self.join(participant)?,
            ScenarioStep::Leave { participant } => self.leave(participant)?,
            ScenarioStep::RosterReady => {
                self.roster.mark_ready();
                self.broadcast(&HostEvent::RosterReady);
            }
            ScenarioStep::Toggle {
                participant,
                toggle,
            } => self.toggle(participant, *toggle)?,
            ScenarioStep::Advance { ms } => self.clock.advance_ms(*ms),
            ScenarioStep::NextFrame => {
                self.clock.next_frame();
            }
            ScenarioStep::Deliver => {
                self.deliver();
            }
            ScenarioStep::SetHead {
                participant,
                position,
            } => {
                let id = self.entity_id(participant)?;
                let [x, y, z] = *position;
                self.poses.set_head(id, Vec3::new(x, y, z));
            }
            ScenarioStep::LateUpdate => self.broadcast(&HostEvent::LateUpdate),
        }
        self.steps_run += 1;
        Ok(())
    }

    fn entity(&self, name: &str) -> Result<Entity, ScenarioError> {
        self.scenario
            .participant(name)
            .map(|spec| Entity::new(spec.id, spec.name.clone()))
            .ok_or_else(|| ScenarioError::UnknownParticipant(name.to_string()))
    }

    fn entity_id(&self, name: &str) -> Result<EntityId, ScenarioError> {
        self.entity(name).map(|e| e.id)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.name == name)
    }

    fn join(&mut self, name: &str) -> Result<(), ScenarioError> {
        if self.position(name).is_some() {
            tracing::warn!(participant = name, "Participant already connected");
            return Ok(());
        }
        let entity = self.entity(name)?;

        let effects = TestEffects::shared(
            entity.id,
            Arc::clone(&self.roster),
            &self.network,
            Arc::clone(&self.clock),
            Arc::clone(&self.poses),
        );
        let mut session = BadgeSession::new(self.config.clone(), entity.clone(), effects);

        for present in &self.participants {
            session.dispatch(HostEvent::Joined(present.session.local().clone()));
        }
        session.dispatch(HostEvent::Joined(entity.clone()));
        if self.roster.is_ready() {
            session.dispatch(HostEvent::RosterReady);
        }

        self.broadcast(&HostEvent::Joined(entity));
        self.participants.push(Participant {
            name: name.to_string(),
            session,
        });
        tracing::info!(participant = name, connected = self.participants.len(), "Participant joined");
        Ok(())
    }

    fn leave(&mut self, name: &str) -> Result<(), ScenarioError> {
        let index = self
            .position(name)
            .ok_or_else(|| ScenarioError::NotConnected(name.to_string()))?;
        let departed = self.participants.remove(index);
        let id = departed.session.local().id;
        self.network.disconnect(id);
        self.broadcast(&HostEvent::Left(id));
        tracing::info!(participant = name, connected = self.participants.len(), "Participant left");
        Ok(())
    }

    fn toggle(&mut self, name: &str, kind: BadgeToggleKind) -> Result<(), ScenarioError> {
        let index = self
            .position(name)
            .ok_or_else(|| ScenarioError::NotConnected(name.to_string()))?;
        match self.participants[index].session.toggle(kind) {
            Ok(Some(shown)) => {
                self.tally.accepted += 1;
                tracing::debug!(participant = name, toggle = %kind, shown, "Toggle accepted");
            }
            Ok(None) => self.tally.debounced += 1,
            Err(e) => {
                self.tally.refused += 1;
                tracing::info!(participant = name, toggle = %kind, error = %e, "Toggle refused");
            }
        }
        Ok(())
    }

    fn broadcast(&mut self, event: &HostEvent) {
        for participant in &mut self.participants {
            participant.session.dispatch(event.clone());
        }
    }

    /// Deliver queued payloads until every inbox is empty.
    pub fn deliver(&mut self) -> u64 {
        let mut delivered = 0;
        while self.network.total_pending() > 0 {
            for participant in &mut self.participants {
                let id = participant.session.local().id;
                for payload in self.network.drain_inbox(id) {
                    participant.session.dispatch(HostEvent::Replicated(payload));
                    delivered += 1;
                }
            }
        }
        self.delivered += delivered;
        delivered
    }

    /// Session of the participant named `name`.
    pub fn session(&self, name: &str) -> Option<&BadgeSession<TestEffects>> {
        self.participants
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.session)
    }

    /// Toggle outcomes so far.
    pub fn tally(&self) -> ToggleTally {
        self.tally
    }

    /// Whether every connected participant holds the same hidden set.
    pub fn converged(&self) -> bool {
        let mut sets = self.participants.iter().map(|p| p.session.hidden_set());
        match sets.next() {
            Some(first) => sets.all(|set| set == first),
            None => true,
        }
    }

    /// Snapshot every participant's view and evaluate expectations.
    pub fn report(&self) -> SimulationReport {
        let participants = self
            .participants
            .iter()
            .map(|p| {
                let session = &p.session;
                let registered: Vec<EntityId> =
                    session.registry().all().into_iter().map(|(id, _)| id).collect();
                let visible = registered
                    .iter()
                    .filter_map(|id| session.is_badge_visible(*id).map(|v| (*id, v)))
                    .collect();
                ParticipantReport {
                    name: p.name.clone(),
                    id: session.local().id,
                    phase: session.phase(),
                    registered,
                    hidden: session.hidden_set().to_entries(),
                    visible,
                    all_badges_shown: session.all_badges_shown(),
                    toggleable_shown: session.toggleable_shown(),
                }
            })
            .collect();

        let expectations = self
            .scenario
            .expect
            .iter()
            .map(|e| self.evaluate(e))
            .collect();

        SimulationReport {
            scenario: self.scenario.metadata.name.clone(),
            steps_run: self.steps_run,
            delivered: self.delivered,
            toggles: self.tally,
            converged: self.converged(),
            participants,
            expectations,
        }
    }

    fn evaluate(&self, expectation: &Expectation) -> ExpectationResult {
        match expectation {
            Expectation::Hidden {
                participant,
                hidden,
            } => {
                let description = format!("{participant} hidden = {hidden}");
                let Ok(id) = self.entity_id(participant) else {
                    return ExpectationResult::fail(description, "unknown participant");
                };
                let disagreeing: Vec<&str> = self
                    .participants
                    .iter()
                    .filter(|p| p.session.hidden_set().contains(id) != *hidden)
                    .map(|p| p.name.as_str())
                    .collect();
                if disagreeing.is_empty() {
                    ExpectationResult::pass(description)
                } else {
                    ExpectationResult::fail(description, format!("disagreeing: {}", disagreeing.join(", ")))
                }
            }
            Expectation::BadgeVisible {
                observer,
                subject,
                visible,
            } => {
                let description = format!("{observer} sees {subject}'s badge = {visible}");
                let (Some(session), Ok(id)) = (self.session(observer), self.entity_id(subject)) else {
                    return ExpectationResult::fail(description, format!("{observer} is not connected"));
                };
                let actual = session.is_badge_visible(id).unwrap_or(false);
                if actual == *visible {
                    ExpectationResult::pass(description)
                } else {
                    ExpectationResult::fail(description, format!("observed {actual}"))
                }
            }
            Expectation::Templates {
                observer,
                subject,
                templates,
            } => {
                let description = format!("{observer} sees {subject} with {templates:?}");
                let (Some(session), Ok(id)) = (self.session(observer), self.entity_id(subject)) else {
                    return ExpectationResult::fail(description, format!("{observer} is not connected"));
                };
                let actual: Vec<String> = session
                    .effects()
                    .visuals
                    .templates_of(id)
                    .iter()
                    .map(|t| t.as_str().to_string())
                    .collect();
                if &actual == templates {
                    ExpectationResult::pass(description)
                } else {
                    ExpectationResult::fail(description, format!("observed {actual:?}"))
                }
            }
            Expectation::Registered { observer, count } => {
                let description = format!("{observer} has {count} badges registered");
                let Some(session) = self.session(observer) else {
                    return ExpectationResult::fail(description, format!("{observer} is not connected"));
                };
                let actual = session.registry().len();
                if actual == *count {
                    ExpectationResult::pass(description)
                } else {
                    ExpectationResult::fail(description, format!("observed {actual}"))
                }
            }
            Expectation::Converged => {
                if self.converged() {
                    ExpectationResult::pass("hidden sets converged")
                } else {
                    ExpectationResult::fail("hidden sets converged", "participants disagree")
                }
            }
            Expectation::RefusedToggles { count } => {
                let description = format!("{count} toggles refused");
                if self.tally.refused == *count {
                    ExpectationResult::pass(description)
                } else {
                    ExpectationResult::fail(description, format!("observed {}", self.tally.refused))
                }
            }
        }
    }
}
