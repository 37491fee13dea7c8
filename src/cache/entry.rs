//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

/// Numerator and denominator of the fraction of TTL after which an entry is stale.
const STALE_FRACTION: (u32, u32) = (4, 5);

// == Cache Entry ==
/// Represents a single cached fetch result with its freshness window.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was stored
    pub cached_at: Instant,
    /// `cached_at + ttl`
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new cache entry stored now.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - How long the value is considered fresh
    pub fn new(value: V, ttl: Duration) -> Self {
        Self::stored_at(value, Instant::now(), ttl)
    }

    /// Creates a cache entry stored at an explicit instant.
    pub fn stored_at(value: V, cached_at: Instant, ttl: Duration) -> Self {
        Self {
            value,
            cached_at,
            expires_at: cached_at + ttl,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// Boundary condition: an entry read at exactly `expires_at` is still valid.
    /// It expires strictly after that instant.
    pub fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    // == Is Stale ==
    /// Checks if the entry has passed 80% of its TTL at `now`.
    ///
    /// A stale entry is still served, but callers with stale-while-revalidate
    /// enabled should refresh it in the background.
    pub fn is_stale(&self, now: Instant) -> bool {
        let (num, den) = STALE_FRACTION;
        let threshold = self.ttl() * num / den;
        now > self.cached_at + threshold
    }

    /// Returns the TTL the entry was stored with.
    pub fn ttl(&self) -> Duration {
        self.expires_at - self.cached_at
    }

    // == Time To Live ==
    /// Returns remaining freshness, saturating at zero once expired.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_entry_fresh_on_creation() {
        let entry = CacheEntry::new("test_value", Duration::from_secs(60));

        assert_eq!(entry.value, "test_value");
        assert_eq!(entry.ttl(), Duration::from_secs(60));
        assert!(!entry.is_expired(Instant::now()));
        assert!(!entry.is_stale(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_expiration() {
        let entry = CacheEntry::new("test_value", Duration::from_millis(1000));

        tokio::time::advance(Duration::from_millis(1001)).await;

        assert!(entry.is_expired(Instant::now()));
        assert_eq!(entry.ttl_remaining(Instant::now()), Duration::ZERO);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let now = Instant::now();
        let entry = CacheEntry::stored_at("test", now, Duration::from_millis(500));

        // Valid at exactly expires_at, expired one tick later
        assert!(!entry.is_expired(entry.expires_at));
        assert!(entry.is_expired(entry.expires_at + Duration::from_nanos(1)));
    }

    #[test]
    fn test_stale_threshold_is_eighty_percent() {
        let now = Instant::now();
        let entry = CacheEntry::stored_at((), now, Duration::from_millis(1000));

        assert!(!entry.is_stale(now + Duration::from_millis(800)));
        assert!(entry.is_stale(now + Duration::from_millis(801)));
        assert!(entry.is_stale(now + Duration::from_millis(850)));
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Instant::now();
        let entry = CacheEntry::stored_at(1u8, now, Duration::from_secs(10));

        assert_eq!(
            entry.ttl_remaining(now + Duration::from_secs(4)),
            Duration::from_secs(6)
        );
    }
}
