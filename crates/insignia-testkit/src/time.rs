//! Time control utilities for deterministic testing
//!
//! The clock never moves on its own: tests advance wall time and frames
//! explicitly, so rate-limit windows and frame debouncing are reproducible.

use insignia_core::ClockEffects;
use parking_lot::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct ClockState {
    now: Instant,
    frame: u64,
}

/// Manually driven clock.
#[derive(Debug)]
pub struct ManualClock {
    state: Mutex<ClockState>,
}

impl ManualClock {
    /// Start at an arbitrary fixed instant, frame 1.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClockState {
                now: Instant::now(),
                frame: 1,
            }),
        }
    }

    /// Advance wall time by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.state.lock().now += duration;
    }

    /// Move wall time forward.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    /// Move to the next render frame.
    pub fn next_frame(&self) -> u64 {
        let mut state = self.state.lock();
        state.frame += 1;
        state.frame
    }

    /// Current frame number.
    pub fn frame(&self) -> u64 {
        self.state.lock().frame
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockEffects for ManualClock {
    fn now_instant(&self) -> Instant {
        self.state.lock().now
    }

    fn frame_count(&self) -> u64 {
        self.state.lock().frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_only_moves_when_told() {
        let clock = ManualClock::new();
        let start = clock.now_instant();
        assert_eq!(clock.now_instant(), start);

        clock.advance_ms(1500);
        assert_eq!(clock.now_instant() - start, Duration::from_millis(1500));

        assert_eq!(clock.frame_count(), 1);
        assert_eq!(clock.next_frame(), 2);
    }
}
