//! Insignia Simulator
//!
//! Runs declarative badge-session scenarios with several participants in one
//! process. Each participant gets its own `BadgeSession` backed by the
//! testkit effects; roster, replication network, clock and head poses are
//! shared, so the run shows exactly what each participant would see and
//! whether their hidden sets converged.
//!
//! Scenarios are TOML files (see `scenario`); `World::run` executes one and
//! produces a `SimulationReport`.

pub mod report;
pub mod scenario;
pub mod world;

pub use report::{ExpectationResult, ParticipantReport, SimulationReport, ToggleTally};
pub use scenario::{
    load_scenario, Expectation, ParticipantSpec, ScenarioError, ScenarioFile, ScenarioMetadata,
    ScenarioStep,
};
pub use world::World;
