//! Rate Limit Sweep Task
//!
//! Background task that periodically removes ended rate limit windows, so the
//! table grows with the number of active callers rather than with history.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::ratelimit::WindowTable;

/// Spawns a background task that periodically sweeps ended windows.
///
/// The task sleeps for `interval` between runs and holds the table lock only
/// for the duration of one sweep. It performs no I/O.
///
/// # Returns
/// A JoinHandle for the spawned task; aborting it stops the sweep.
///
/// # Example
/// ```ignore
/// let table = Arc::new(Mutex::new(WindowTable::new()));
/// let sweep_handle = spawn_sweep_task(table.clone(), Duration::from_secs(60));
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(table: Arc<Mutex<WindowTable>>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting rate limit sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut table = table.lock();
                let removed = table.sweep(Instant::now());
                (removed, table.len())
            };

            if removed > 0 {
                info!(
                    "Rate limit sweep: removed {} ended windows, {} still tracked",
                    removed, remaining
                );
            } else {
                debug!("Rate limit sweep: no ended windows found");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratelimit::RateLimitRule;

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_removes_ended_windows() {
        let table = Arc::new(Mutex::new(WindowTable::new()));
        let rule = RateLimitRule::prefixed("auth", 5, Duration::from_secs(1));
        table.lock().check("auth:a@example.com", &rule, Instant::now());

        let handle = spawn_sweep_task(table.clone(), Duration::from_secs(1));

        // Window ends at 1s; the sweep at 2s removes it
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert!(table.lock().is_empty(), "Ended window should have been swept");
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_task_preserves_live_windows() {
        let table = Arc::new(Mutex::new(WindowTable::new()));
        let rule = RateLimitRule::prefixed("auth", 5, Duration::from_secs(3600));
        table.lock().check("auth:a@example.com", &rule, Instant::now());

        let handle = spawn_sweep_task(table.clone(), Duration::from_secs(1));
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(table.lock().len(), 1, "Live window should not be removed");
        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let table = Arc::new(Mutex::new(WindowTable::new()));

        let handle = spawn_sweep_task(table, Duration::from_secs(1));
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
