//! Rate Limiter Module
//!
//! Owns the window table, the preset rules and the background sweep task.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::ratelimit::{RateLimitDecision, RateLimitRule, RateLimitRules, RateLimitStats, WindowTable};
use crate::tasks::spawn_sweep_task;

/// Default interval between sweeps of ended windows.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

// == Rate Limiter ==
/// Fixed-window rate limiter.
///
/// `check` never fails: a rejected request is reported through
/// [`RateLimitDecision::allowed`] and the caller decides what to do with it.
#[derive(Debug)]
pub struct RateLimiter {
    table: Arc<Mutex<WindowTable>>,
    rules: RateLimitRules,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl RateLimiter {
    // == Constructor ==
    /// Creates a limiter and starts its sweep task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(rules: RateLimitRules, sweep_interval: Duration) -> Self {
        let table = Arc::new(Mutex::new(WindowTable::new()));
        let sweeper = spawn_sweep_task(Arc::clone(&table), sweep_interval);

        Self {
            table,
            rules,
            sweeper: Mutex::new(Some(sweeper)),
        }
    }

    // == Check ==
    /// Admits or rejects one request for the key `rule` derives from `context`.
    pub fn check(&self, rule: &RateLimitRule, context: Option<&str>) -> RateLimitDecision {
        let key = rule.key_for(context);
        let decision = self.table.lock().check(&key, rule, Instant::now());

        if !decision.allowed {
            debug!(key = %key, reset_in = ?decision.reset_at.saturating_duration_since(Instant::now()), "Rate limit exceeded");
        }
        decision
    }

    pub fn check_auth(&self, email: &str) -> RateLimitDecision {
        self.check(&self.rules.auth, Some(email))
    }

    pub fn check_transaction_create(&self, user_id: &str) -> RateLimitDecision {
        self.check(&self.rules.transaction_create, Some(user_id))
    }

    pub fn check_category_create(&self, user_id: &str) -> RateLimitDecision {
        self.check(&self.rules.category_create, Some(user_id))
    }

    pub fn check_profile_update(&self, user_id: &str) -> RateLimitDecision {
        self.check(&self.rules.profile_update, Some(user_id))
    }

    pub fn check_data_fetch(&self, user_id: &str) -> RateLimitDecision {
        self.check(&self.rules.data_fetch, Some(user_id))
    }

    // == Reset ==
    /// Removes the window of every preset rule for `identity`.
    ///
    /// Returns the number of windows removed.
    pub fn reset(&self, identity: &str) -> usize {
        let mut table = self.table.lock();
        let mut removed = 0;
        for rule in self.rules.all() {
            if rule.key_generator.is_some() && table.remove(&rule.key_for(Some(identity))) {
                removed += 1;
            }
        }
        drop(table);

        info!(identity, removed, "Rate limits reset");
        removed
    }

    /// Removes the window for a single key.
    pub fn reset_key(&self, key: &str) -> bool {
        self.table.lock().remove(key)
    }

    // == Destroy ==
    /// Stops the sweep task and clears all windows.
    ///
    /// The limiter keeps admitting requests afterwards, but ended windows are
    /// only replaced lazily.
    pub fn destroy(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            info!("Rate limit sweep task stopped");
        }
        self.table.lock().clear();
    }

    /// True while the sweep task is scheduled.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn stats(&self) -> RateLimitStats {
        self.table.lock().stats()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::KeyGenerator;

    fn limiter() -> RateLimiter {
        RateLimiter::new(RateLimitRules::default(), DEFAULT_SWEEP_INTERVAL)
    }

    #[tokio::test(start_paused = true)]
    async fn test_admission_counts_down() {
        let limiter = limiter();
        let rule = RateLimitRule::new(5, Duration::from_secs(60))
            .with_key_generator(KeyGenerator::custom(|_| "test-key".to_string()));

        for expected in [4, 3, 2, 1, 0] {
            let decision = limiter.check(&rule, None);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected);
        }

        let decision = limiter.check(&rule, None);
        assert!(!decision.allowed);
        assert!(decision.error.unwrap().contains("Rate limit exceeded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_reset_after_time_passes() {
        let limiter = limiter();
        let rule = RateLimitRule::prefixed("test", 1, Duration::from_millis(1000));

        assert!(limiter.check(&rule, Some("k")).allowed);
        assert!(!limiter.check(&rule, Some("k")).allowed);

        tokio::time::advance(Duration::from_millis(1001)).await;

        let decision = limiter.check(&rule, Some("k"));
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_limited_per_email() {
        let limiter = limiter();

        for _ in 0..5 {
            assert!(limiter.check_auth("user1@example.com").allowed);
        }
        let blocked = limiter.check_auth("user1@example.com");
        assert!(!blocked.allowed);
        assert_eq!(
            blocked.error.as_deref(),
            Some("Rate limit exceeded. Try again in 900 seconds.")
        );

        assert!(limiter.check_auth("user2@example.com").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transaction_create_limit() {
        let limiter = limiter();

        for _ in 0..50 {
            assert!(limiter.check_transaction_create("user-123").allowed);
        }
        assert!(!limiter.check_transaction_create("user-123").allowed);
        assert!(limiter.check_category_create("user-123").allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_restores_every_rule_for_user() {
        let limiter = limiter();

        for _ in 0..50 {
            limiter.check_transaction_create("user-123");
        }
        for _ in 0..10 {
            limiter.check_profile_update("user-123");
        }
        limiter.check_data_fetch("user-456");
        assert!(!limiter.check_transaction_create("user-123").allowed);
        assert!(!limiter.check_profile_update("user-123").allowed);

        assert_eq!(limiter.reset("user-123"), 2);

        assert!(limiter.check_transaction_create("user-123").allowed);
        assert!(limiter.check_profile_update("user-123").allowed);
        assert_eq!(limiter.stats().tracked_keys, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_key() {
        let limiter = limiter();
        limiter.check_auth("a@example.com");

        assert!(limiter.reset_key("auth:a@example.com"));
        assert!(!limiter.reset_key("auth:a@example.com"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_runs_periodically() {
        let limiter = RateLimiter::new(RateLimitRules::default(), Duration::from_secs(60));

        limiter.check_data_fetch("u1");
        limiter.check_auth("a@example.com");
        assert_eq!(limiter.stats().tracked_keys, 2);

        // data_fetch window ends at 60s; the sweep at 120s removes it
        tokio::time::sleep(Duration::from_secs(121)).await;

        assert_eq!(limiter.stats().tracked_keys, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_stops_sweep_and_clears() {
        let limiter = limiter();
        limiter.check_auth("a@example.com");
        assert!(limiter.is_sweeping());

        limiter.destroy();
        tokio::task::yield_now().await;

        assert!(!limiter.is_sweeping());
        assert_eq!(limiter.stats().tracked_keys, 0);
        // Idempotent
        limiter.destroy();
    }
}
