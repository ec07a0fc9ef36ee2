//! Simulation reports.

use insignia_core::EntityId;
use insignia_session::SessionPhase;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Outcomes of every toggle request in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleTally {
    /// Toggles that changed state
    pub accepted: u64,
    /// Toggles refused by roster or rate limit
    pub refused: u64,
    /// Group toggles dropped by the frame debounce
    pub debounced: u64,
}

/// What one participant ended up seeing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantReport {
    /// Display name
    pub name: String,
    /// Host entity id
    pub id: EntityId,
    /// Phase at the end of the run
    pub phase: SessionPhase,
    /// Entities with a badge, in registration order
    pub registered: Vec<EntityId>,
    /// Entities in the hidden set
    pub hidden: Vec<EntityId>,
    /// Effective visibility of each registered badge
    pub visible: BTreeMap<EntityId, bool>,
    /// Umbrella flag at the end of the run
    pub all_badges_shown: bool,
    /// Toggleable group flag at the end of the run
    pub toggleable_shown: bool,
}

/// Result of one expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationResult {
    /// What was checked
    pub description: String,
    /// Whether it held
    pub passed: bool,
    /// Why it failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExpectationResult {
    /// A passing check.
    pub fn pass(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            passed: true,
            detail: None,
        }
    }

    /// A failing check with its reason.
    pub fn fail(description: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}

/// Everything a scenario run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Scenario name from its metadata
    pub scenario: String,
    /// Steps executed
    pub steps_run: usize,
    /// Replication payloads delivered
    pub delivered: u64,
    /// Toggle outcomes
    pub toggles: ToggleTally,
    /// Whether every connected participant holds the same hidden set
    pub converged: bool,
    /// Final state per participant
    pub participants: Vec<ParticipantReport>,
    /// Outcome of each expectation, in file order
    pub expectations: Vec<ExpectationResult>,
}

impl SimulationReport {
    /// Whether every expectation held.
    pub fn passed(&self) -> bool {
        self.expectations.iter().all(|e| e.passed)
    }

    /// Number of failed expectations.
    pub fn failed_count(&self) -> usize {
        self.expectations.iter().filter(|e| !e.passed).count()
    }

    /// Final state of the participant named `name`.
    pub fn participant(&self, name: &str) -> Option<&ParticipantReport> {
        self.participants.iter().find(|p| p.name == name)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn ids(list: &[EntityId]) -> String {
    let parts: Vec<String> = list.iter().map(|id| id.get().to_string()).collect();
    format!("[{}]", parts.join(", "))
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "scenario: {}", self.scenario)?;
        writeln!(
            f,
            "steps: {}  delivered: {}  toggles: {} accepted, {} refused, {} debounced",
            self.steps_run,
            self.delivered,
            self.toggles.accepted,
            self.toggles.refused,
            self.toggles.debounced
        )?;
        writeln!(f, "converged: {}", self.converged)?;

        for p in &self.participants {
            let shown: Vec<EntityId> = p
                .visible
                .iter()
                .filter(|(_, visible)| **visible)
                .map(|(id, _)| *id)
                .collect();
            writeln!(
                f,
                "  {} ({}) {:?}: registered {} hidden {} visible {}{}",
                p.name,
                p.id,
                p.phase,
                ids(&p.registered),
                ids(&p.hidden),
                ids(&shown),
                if p.all_badges_shown { "" } else { " (layer off)" }
            )?;
        }

        for e in &self.expectations {
            let mark = if e.passed { "ok  " } else { "FAIL" };
            match &e.detail {
                Some(detail) => writeln!(f, "  [{mark}] {}: {detail}", e.description)?,
                None => writeln!(f, "  [{mark}] {}", e.description)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SimulationReport {
        SimulationReport {
            scenario: "demo".into(),
            steps_run: 3,
            delivered: 2,
            toggles: ToggleTally::default(),
            converged: true,
            participants: vec![ParticipantReport {
                name: "alpha".into(),
                id: EntityId(1),
                phase: SessionPhase::Active,
                registered: vec![EntityId(1)],
                hidden: vec![EntityId(1)],
                visible: BTreeMap::from([(EntityId(1), false)]),
                all_badges_shown: true,
                toggleable_shown: false,
            }],
            expectations: vec![
                ExpectationResult::pass("converged"),
                ExpectationResult::fail("alpha hidden", "bravo disagrees"),
            ],
        }
    }

    #[test]
    fn test_pass_and_fail_counts() {
        let report = report();
        assert!(!report.passed());
        assert_eq!(report.failed_count(), 1);
    }

    #[test]
    fn test_text_rendering() {
        let text = report().to_string();
        assert!(text.contains("scenario: demo"));
        assert!(text.contains("alpha (entity-1) Active: registered [1] hidden [1] visible []"));
        assert!(text.contains("[FAIL] alpha hidden: bravo disagrees"));
    }

    #[test]
    fn test_json_rendering() {
        let json = report().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["participants"][0]["hidden"][0], 1);
        assert_eq!(value["participants"][0]["visible"]["1"], false);
        assert!(value["expectations"][0].get("detail").is_none());
    }
}
