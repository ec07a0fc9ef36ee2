//! Scenario files
//!
//! A scenario names its participants and their roster roles, an ordered list
//! of steps, and expectations checked once all steps have run and every
//! queued payload has been delivered.
//!
//! ```toml
//! [metadata]
//! name = "officer hides badge"
//!
//! [[participants]]
//! name = "alpha"
//! id = 1
//! roles = ["Chief"]
//!
//! [[steps]]
//! action = "join"
//! participant = "alpha"
//!
//! [[steps]]
//! action = "roster_ready"
//!
//! [[expect]]
//! check = "hidden"
//! participant = "alpha"
//! hidden = false
//! ```

use insignia_core::{BadgeConfig, BadgeToggleKind, ConfigError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors loading or validating a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// Scenario file could not be read
    #[error("failed to read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("failed to parse scenario: {0}")]
    Parse(String),

    /// A step or check names a participant that is not declared
    #[error("scenario references unknown participant '{0}'")]
    UnknownParticipant(String),

    /// Two participants share a name
    #[error("participant '{0}' is declared more than once")]
    DuplicateParticipant(String),

    /// Two participants share an entity id
    #[error("participant id {0} is used more than once")]
    DuplicateId(u32),

    /// A step targets a participant that has not joined
    #[error("participant '{0}' is not connected")]
    NotConnected(String),

    /// Inline badge configuration is invalid
    #[error("invalid badge configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Scenario header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioMetadata {
    /// Short scenario name
    pub name: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Labels for filtering
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One participant and its roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantSpec {
    /// Display name, also the roster key
    pub name: String,
    /// Host entity id
    pub id: u32,
    /// Roles held on the roster
    #[serde(default)]
    pub roles: Vec<String>,
    /// Whether the participant is on the roster at all
    #[serde(default = "default_on_roster")]
    pub on_roster: bool,
}

fn default_on_roster() -> bool {
    true
}

/// A single scenario action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Connect a participant
    Join { participant: String },
    /// Disconnect a participant
    Leave { participant: String },
    /// Mark the roster ready and notify every session
    RosterReady,
    /// Press one of a participant's toggle widgets
    Toggle {
        participant: String,
        toggle: BadgeToggleKind,
    },
    /// Advance the shared wall clock
    Advance { ms: u64 },
    /// Advance the frame counter
    NextFrame,
    /// Deliver every queued replication payload
    Deliver,
    /// Set a participant's head position
    SetHead {
        participant: String,
        position: [f32; 3],
    },
    /// Run the placement pass on every session
    LateUpdate,
}

impl ScenarioStep {
    /// Participant the step refers to, if any.
    pub fn participant(&self) -> Option<&str> {
        match self {
            ScenarioStep::Join { participant }
            | ScenarioStep::Leave { participant }
            | ScenarioStep::Toggle { participant, .. }
            | ScenarioStep::SetHead { participant, .. } => Some(participant.as_str()),
            _ => None,
        }
    }
}

/// A check against the final state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum Expectation {
    /// Every remaining participant agrees on `participant`'s hidden flag
    Hidden { participant: String, hidden: bool },
    /// What `observer` sees of `subject`'s badge
    BadgeVisible {
        observer: String,
        subject: String,
        visible: bool,
    },
    /// Templates attached to `subject`'s canvas as seen by `observer`
    Templates {
        observer: String,
        subject: String,
        templates: Vec<String>,
    },
    /// Number of badges `observer` has registered
    Registered { observer: String, count: usize },
    /// All participants hold identical hidden sets
    Converged,
    /// Toggle refusals over the whole run
    RefusedToggles { count: u64 },
}

impl Expectation {
    fn participants(&self) -> Vec<&str> {
        match self {
            Expectation::Hidden { participant, .. } => vec![participant.as_str()],
            Expectation::BadgeVisible {
                observer, subject, ..
            }
            | Expectation::Templates {
                observer, subject, ..
            } => vec![observer.as_str(), subject.as_str()],
            Expectation::Registered { observer, .. } => vec![observer.as_str()],
            Expectation::Converged | Expectation::RefusedToggles { .. } => Vec::new(),
        }
    }
}

/// A parsed scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioFile {
    /// Header
    pub metadata: ScenarioMetadata,
    /// Inline badge configuration; overridden by `--config`
    #[serde(default)]
    pub config: Option<BadgeConfig>,
    /// Declared participants
    pub participants: Vec<ParticipantSpec>,
    /// Actions, run in order
    pub steps: Vec<ScenarioStep>,
    /// Checks evaluated after the last step
    #[serde(default)]
    pub expect: Vec<Expectation>,
}

impl ScenarioFile {
    /// Parse and validate a scenario document.
    pub fn from_toml_str(content: &str) -> Result<Self, ScenarioError> {
        let scenario: ScenarioFile =
            toml::from_str(content).map_err(|e| ScenarioError::Parse(e.to_string()))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check that every referenced participant is declared exactly once.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut names = BTreeSet::new();
        let mut ids = BTreeSet::new();
        for participant in &self.participants {
            if !names.insert(participant.name.as_str()) {
                return Err(ScenarioError::DuplicateParticipant(participant.name.clone()));
            }
            if !ids.insert(participant.id) {
                return Err(ScenarioError::DuplicateId(participant.id));
            }
        }

        let referenced = self
            .steps
            .iter()
            .filter_map(ScenarioStep::participant)
            .chain(self.expect.iter().flat_map(Expectation::participants));
        for name in referenced {
            if !names.contains(name) {
                return Err(ScenarioError::UnknownParticipant(name.to_string()));
            }
        }

        if let Some(config) = &self.config {
            config.validate()?;
        }
        Ok(())
    }

    /// Declaration for `name`.
    pub fn participant(&self, name: &str) -> Option<&ParticipantSpec> {
        self.participants.iter().find(|p| p.name == name)
    }
}

/// Load and validate a scenario from disk.
pub fn load_scenario(path: &Path) -> Result<ScenarioFile, ScenarioError> {
    let content = fs::read_to_string(path)?;
    let scenario = ScenarioFile::from_toml_str(&content)?;
    tracing::debug!(
        path = %path.display(),
        name = %scenario.metadata.name,
        steps = scenario.steps.len(),
        "Loaded scenario"
    );
    Ok(scenario)
}
