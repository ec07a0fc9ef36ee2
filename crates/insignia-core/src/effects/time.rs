//! Clock effects.

use std::time::Instant;

/// Monotonic wall clock and render-frame counter.
pub trait ClockEffects: Send + Sync {
    /// Monotonic instant, used for rate-limit windows.
    fn now_instant(&self) -> Instant;

    /// Index of the frame currently being processed.
    fn frame_count(&self) -> u64;
}
