//! # Insignia Testkit
//!
//! Deterministic, in-memory implementations of every effect trait in
//! `insignia-core`, for unit tests, integration tests and the simulator.
//!
//! - `ManualClock`: frame counter and monotonic instant advanced by hand
//! - `MockRoster`: role table plus a readiness latch
//! - `RecordingVisuals`: visual host that records canvases, badges and state
//! - `LoopbackNetwork`: shared replication bus with per-participant inboxes
//! - `RecordingUi`: remembers the last echoed state per toggle
//! - `StaticPoses`: settable head positions
//! - `TestEffects`: one participant's composite of all of the above

pub mod effects;
pub mod fixtures;
pub mod network;
pub mod pose;
pub mod roster;
pub mod time;
pub mod ui;
pub mod visual;

pub use effects::TestEffects;
pub use network::{LoopbackNetwork, NetworkEndpoint};
pub use pose::StaticPoses;
pub use roster::MockRoster;
pub use time::ManualClock;
pub use ui::RecordingUi;
pub use visual::{RecordedVisual, RecordingVisuals, VisualKind};
