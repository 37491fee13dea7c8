//! Rate Limit Window Module
//!
//! Per-key request counter for one fixed window.

use std::time::Duration;

use tokio::time::Instant;

// == Rate Limit Window ==
/// Requests admitted for a key in its current window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitWindow {
    /// Requests admitted so far in this window
    pub count: u32,
    /// When the window resets
    pub window_end: Instant,
}

impl RateLimitWindow {
    /// Opens a window at `now` with its first request counted.
    pub fn open(now: Instant, length: Duration) -> Self {
        Self {
            count: 1,
            window_end: now + length,
        }
    }

    /// True once `now` is strictly past the window end.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.window_end
    }

    /// Time left until the window resets, zero if already past.
    pub fn time_until_reset(&self, now: Instant) -> Duration {
        self.window_end.saturating_duration_since(now)
    }
}
