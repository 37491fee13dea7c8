//! Cache Options Module
//!
//! Freshness settings applied per cache instance or per call.

use std::time::Duration;

/// Default freshness window for cached values.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

// == Cache Options ==
/// Freshness configuration for a [`RequestCache`](super::RequestCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// How long a fetched value is considered fresh
    pub ttl: Duration,
    /// Serve stale values immediately and refresh them in the background
    pub stale_while_revalidate: bool,
}

impl CacheOptions {
    /// Creates options with the given TTL and stale-while-revalidate enabled.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    /// Returns a copy with stale-while-revalidate switched on or off.
    pub fn stale_while_revalidate(mut self, enabled: bool) -> Self {
        self.stale_while_revalidate = enabled;
        self
    }
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            stale_while_revalidate: true,
        }
    }
}
