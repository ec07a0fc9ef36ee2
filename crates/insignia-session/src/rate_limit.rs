//! Own-badge toggle rate limiting
//!
//! A sliding window keyed on the caller's own invocation history. The first
//! call after the window has lapsed starts a new window with a count of one;
//! every later call inside the window increments the count, including
//! refused ones, and the window is never restarted early. Callers supply a
//! monotonic `Instant` from their clock effects.

use insignia_core::{BadgeError, ToggleRateLimitConfig};
use std::time::{Duration, Instant};

/// Counters for observability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimiterStats {
    /// Toggles let through
    pub allowed: u64,
    /// Toggles refused
    pub blocked: u64,
    /// Windows opened, including the first
    pub windows_started: u64,
}

/// Sliding-window limiter for own-badge toggles.
#[derive(Debug, Clone)]
pub struct ToggleRateLimiter {
    window: Duration,
    max_toggles: u32,
    window_start: Option<Instant>,
    count: u32,
    stats: RateLimiterStats,
}

impl ToggleRateLimiter {
    /// Limiter with no window open yet.
    pub fn new(config: &ToggleRateLimitConfig) -> Self {
        Self {
            window: config.window(),
            max_toggles: config.max_toggles,
            window_start: None,
            count: 0,
            stats: RateLimiterStats::default(),
        }
    }

    /// Count one attempt at `now`.
    ///
    /// Returns the attempt number within the current window, or
    /// `RateLimitExceeded` once the window's allowance is spent.
    pub fn check(&mut self, now: Instant) -> Result<u32, BadgeError> {
        match self.window_start {
            Some(start) if now.saturating_duration_since(start) < self.window => {
                self.count = self.count.saturating_add(1);
            }
            _ => {
                self.window_start = Some(now);
                self.count = 1;
                self.stats.windows_started += 1;
            }
        }

        if self.count > self.max_toggles {
            self.stats.blocked += 1;
            return Err(BadgeError::RateLimitExceeded {
                attempts: self.count,
                window: self.window,
            });
        }

        self.stats.allowed += 1;
        Ok(self.count)
    }

    /// Attempts counted in the current window.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Start of the current window, if one was ever opened.
    pub fn window_start(&self) -> Option<Instant> {
        self.window_start
    }

    /// Counters since construction.
    pub fn stats(&self) -> RateLimiterStats {
        self.stats
    }
}
