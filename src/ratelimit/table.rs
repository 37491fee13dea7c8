//! Window Table Module
//!
//! The limiter's in-memory key to window table. All operations take `now`
//! explicitly so the admission rules can be exercised without a clock.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::ratelimit::{RateLimitRule, RateLimitWindow};

// == Decision ==
/// Outcome of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitDecision {
    /// Whether the guarded operation may proceed
    pub allowed: bool,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the current window resets
    pub reset_at: Instant,
    /// Human-readable rejection message
    pub error: Option<String>,
}

impl RateLimitDecision {
    /// Whole seconds until the window resets, rounded up.
    pub fn retry_after_secs(&self, now: Instant) -> u64 {
        ceil_secs(self.reset_at.saturating_duration_since(now))
    }
}

/// Snapshot of the table for reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RateLimitStats {
    /// Keys with a window currently tracked
    pub tracked_keys: usize,
    /// Requests rejected since startup
    pub rejected: u64,
}

fn ceil_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

// == Window Table ==
#[derive(Debug, Default)]
pub struct WindowTable {
    windows: HashMap<String, RateLimitWindow>,
    rejected: u64,
}

impl WindowTable {
    pub fn new() -> Self {
        Self::default()
    }

    // == Check ==
    /// Admits or rejects one request for `key` under `rule` at `now`.
    ///
    /// A missing or expired window is replaced by a fresh one. A rejection
    /// leaves the count untouched.
    pub fn check(&mut self, key: &str, rule: &RateLimitRule, now: Instant) -> RateLimitDecision {
        match self.windows.get_mut(key) {
            Some(window) if !window.is_expired(now) => {
                if window.count < rule.max_requests {
                    window.count += 1;
                    return RateLimitDecision {
                        allowed: true,
                        remaining: rule.max_requests - window.count,
                        reset_at: window.window_end,
                        error: None,
                    };
                }

                let wait = ceil_secs(window.time_until_reset(now));
                self.rejected += 1;
                return RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    reset_at: window.window_end,
                    error: Some(format!("Rate limit exceeded. Try again in {wait} seconds.")),
                };
            }
            _ => {}
        }

        let window = RateLimitWindow::open(now, rule.window);
        self.windows.insert(key.to_owned(), window);
        RateLimitDecision {
            allowed: true,
            remaining: rule.max_requests.saturating_sub(1),
            reset_at: window.window_end,
            error: None,
        }
    }

    // == Sweep ==
    /// Drops every window that ended before `now`. Returns how many were removed.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.is_expired(now));
        before - self.windows.len()
    }

    /// Removes the window for `key`. Returns whether one existed.
    pub fn remove(&mut self, key: &str) -> bool {
        self.windows.remove(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&RateLimitWindow> {
        self.windows.get(key)
    }

    pub fn clear(&mut self) {
        self.windows.clear();
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            tracked_keys: self.windows.len(),
            rejected: self.rejected,
        }
    }
}
