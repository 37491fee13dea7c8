//! Cache Statistics Module
//!
//! Tracks request cache behaviour: hits, misses, fetches and de-duplicated joins.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Reads answered from a fresh entry
    pub hits: u64,
    /// Reads answered from a stale entry while a refresh was started
    pub stale_hits: u64,
    /// Reads that found no usable entry
    pub misses: u64,
    /// Producer invocations
    pub fetches: u64,
    /// Callers that joined an already running fetch instead of starting one
    pub deduplicated: u64,
    /// Fetches whose producer rejected
    pub failures: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate, counting stale hits as hits.
    ///
    /// Returns 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let served = self.hits + self.stale_hits;
        let total = served + self.misses;
        if total == 0 {
            0.0
        } else {
            served as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_stale_hit(&mut self) {
        self.stale_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_fetch(&mut self) {
        self.fetches += 1;
    }

    pub fn record_join(&mut self) {
        self.deduplicated += 1;
    }

    pub fn record_failure(&mut self) {
        self.failures += 1;
    }

    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.fetches, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(CacheStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_counts_stale_hits() {
        let mut stats = CacheStats::new();
        stats.record_hit();
        stats.record_stale_hit();
        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_fetch_counters() {
        let mut stats = CacheStats::new();
        stats.record_fetch();
        stats.record_join();
        stats.record_join();
        stats.record_failure();
        assert_eq!(stats.fetches, 1);
        assert_eq!(stats.deduplicated, 2);
        assert_eq!(stats.failures, 1);
    }
}
