//! Request Cache Module
//!
//! Keyed TTL cache over asynchronous fetches. Concurrent requests for the same
//! key share one producer call, and stale values are served while a refresh
//! runs in the background.

use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheOptions, CacheStats};
use crate::error::CacheError;

type PendingFetch<V> = Shared<BoxFuture<'static, Result<V, CacheError>>>;

/// A fetch currently running for one key.
struct InFlight<V> {
    pending: PendingFetch<V>,
    /// A caller is waiting on this fetch (as opposed to a background refresh)
    foreground: bool,
    /// The entry was written or removed after this fetch started
    superseded: bool,
}

/// Outcome of looking up a key without fetching.
enum Lookup<V> {
    Fresh(V),
    Stale(V),
    Miss,
}

struct State<V> {
    entries: HashMap<String, CacheEntry<V>>,
    in_flight: HashMap<String, InFlight<V>>,
    stats: CacheStats,
}

impl<V: Clone> State<V> {
    /// Reads `key` at `now`, dropping it if expired.
    fn lookup(&mut self, key: &str, now: Instant) -> Lookup<V> {
        let Some(entry) = self.entries.get(key) else {
            self.stats.record_miss();
            return Lookup::Miss;
        };

        if entry.is_expired(now) {
            self.entries.remove(key);
            self.stats.record_miss();
            return Lookup::Miss;
        }

        if entry.is_stale(now) {
            Lookup::Stale(entry.value.clone())
        } else {
            self.stats.record_hit();
            Lookup::Fresh(entry.value.clone())
        }
    }

    fn store(&mut self, key: &str, value: V, ttl: Duration) {
        self.entries
            .insert(key.to_owned(), CacheEntry::new(value, ttl));
    }

    /// Prevents a running fetch for `key` from overwriting the entry.
    fn supersede(&mut self, key: &str) {
        if let Some(flight) = self.in_flight.get_mut(key) {
            flight.superseded = true;
        }
    }
}

struct Inner<V> {
    options: CacheOptions,
    state: Mutex<State<V>>,
}

impl<V: Clone> Inner<V> {
    /// Finishes a fetch: clears the in-flight record and stores a success.
    fn settle(&self, key: &str, ttl: Duration, outcome: anyhow::Result<V>) -> Result<V, CacheError> {
        let mut state = self.state.lock();
        let superseded = state
            .in_flight
            .remove(key)
            .is_some_and(|flight| flight.superseded);

        match outcome {
            Ok(value) => {
                if superseded {
                    debug!(key, "Discarding fetch result for superseded entry");
                } else {
                    state.store(key, value.clone(), ttl);
                }
                Ok(value)
            }
            Err(reason) => {
                state.stats.record_failure();
                warn!(key, error = %reason, "Cache fetch failed");
                Err(CacheError::fetch(key, reason))
            }
        }
    }
}

// == Request Cache ==
/// TTL cache with in-flight de-duplication and stale-while-revalidate.
///
/// Cloning is cheap and every clone shares the same tables.
///
/// # Example
/// ```ignore
/// let cache: RequestCache<Vec<Category>> = RequestCache::new(CacheOptions::default());
/// let categories = cache
///     .get("categories:u1", move || async move { ledger.list_categories(user_id).await })
///     .await?;
/// ```
pub struct RequestCache<V> {
    inner: Arc<Inner<V>>,
}

impl<V> Clone for RequestCache<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<V> RequestCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty cache with the given default options.
    pub fn new(options: CacheOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                options,
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    in_flight: HashMap::new(),
                    stats: CacheStats::new(),
                }),
            }),
        }
    }

    // == Get ==
    /// Returns the value for `key`, fetching it with `producer` when needed.
    ///
    /// A fresh entry is returned without suspending. A stale entry (older than
    /// 80% of its TTL) is returned as well, and a background refresh is started
    /// when stale-while-revalidate is on. Missing or expired entries are
    /// fetched in the foreground; concurrent callers share one fetch.
    pub async fn get<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let options = self.inner.options;
        self.get_with(key, options, producer).await
    }

    /// Same as [`get`](Self::get) with per-call options.
    pub async fn get_with<F, Fut, E>(
        &self,
        key: &str,
        options: CacheOptions,
        producer: F,
    ) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let lookup = self.inner.state.lock().lookup(key, Instant::now());

        match lookup {
            Lookup::Fresh(value) => Ok(value),
            Lookup::Stale(value) => {
                let mut state = self.inner.state.lock();
                if options.stale_while_revalidate {
                    state.stats.record_stale_hit();
                    drop(state);
                    debug!(key, "Serving stale entry, revalidating in background");
                    // The fetch runs on its own task; nothing needs to await it.
                    drop(self.begin_fetch(key, options.ttl, false, producer));
                } else {
                    state.stats.record_hit();
                }
                Ok(value)
            }
            Lookup::Miss => self.begin_fetch(key, options.ttl, true, producer).await,
        }
    }

    // == Refetch ==
    /// Forces a foreground fetch for `key`, ignoring any cached entry.
    ///
    /// Joins a fetch already running for the key instead of starting another.
    pub async fn refetch<F, Fut, E>(&self, key: &str, producer: F) -> Result<V, CacheError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let ttl = self.inner.options.ttl;
        self.begin_fetch(key, ttl, true, producer).await
    }

    // == Set ==
    /// Overwrites the entry for `key` without fetching.
    pub fn set(&self, key: &str, value: V) {
        let mut state = self.inner.state.lock();
        state.supersede(key);
        state.store(key, value, self.inner.options.ttl);
    }

    // == Update ==
    /// Replaces the entry for `key` with `f(current)`.
    ///
    /// `current` is the non-expired cached value, or `None`. Returns the stored value.
    pub fn update<F>(&self, key: &str, f: F) -> V
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let now = Instant::now();
        let mut state = self.inner.state.lock();
        let current = state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| &entry.value);
        let updated = f(current);

        state.supersede(key);
        state.store(key, updated.clone(), self.inner.options.ttl);
        updated
    }

    // == Invalidate ==
    /// Removes the entry for `key`. Returns whether one was present.
    ///
    /// A fetch already running for the key still completes and is delivered
    /// to its callers, but its result is not stored.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut state = self.inner.state.lock();
        state.supersede(key);
        state.entries.remove(key).is_some()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        let mut state = self.inner.state.lock();
        for flight in state.in_flight.values_mut() {
            flight.superseded = true;
        }
        state.entries.clear();
    }

    // == Peek ==
    /// Returns the cached value for `key` if it has not expired, without fetching.
    pub fn peek(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let state = self.inner.state.lock();
        state
            .entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// True while a foreground fetch for `key` is running.
    pub fn is_loading(&self, key: &str) -> bool {
        self.inner
            .state
            .lock()
            .in_flight
            .get(key)
            .is_some_and(|flight| flight.foreground)
    }

    /// True while any fetch for `key` is running, including background refreshes.
    pub fn is_fetching(&self, key: &str) -> bool {
        self.inner.state.lock().in_flight.contains_key(key)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let state = self.inner.state.lock();
        let mut stats = state.stats.clone();
        stats.set_total_entries(state.entries.len());
        stats
    }

    /// Returns the number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.inner.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state.lock().entries.is_empty()
    }

    // == Fetch ==
    /// Joins the running fetch for `key`, or starts one.
    ///
    /// The producer runs on a spawned task so it completes even if every
    /// caller stops waiting.
    fn begin_fetch<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        foreground: bool,
        producer: F,
    ) -> PendingFetch<V>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<V, E>> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let mut state = self.inner.state.lock();

        if let Some(flight) = state.in_flight.get_mut(key) {
            flight.foreground |= foreground;
            let pending = flight.pending.clone();
            state.stats.record_join();
            return pending;
        }

        state.stats.record_fetch();

        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_owned();
        let task = tokio::spawn(async move {
            let outcome = match AssertUnwindSafe(async move { producer().await })
                .catch_unwind()
                .await
            {
                Ok(result) => result.map_err(Into::into),
                Err(_) => Err(anyhow::anyhow!("producer panicked")),
            };
            inner.settle(&owned_key, ttl, outcome)
        });

        let task_key = key.to_owned();
        let pending = async move {
            match task.await {
                Ok(result) => result,
                Err(join_error) => Err(CacheError::fetch(
                    task_key,
                    anyhow::anyhow!("fetch task aborted: {join_error}"),
                )),
            }
        }
        .boxed()
        .shared();

        state.in_flight.insert(
            key.to_owned(),
            InFlight {
                pending: pending.clone(),
                foreground,
                superseded: false,
            },
        );
        pending
    }
}
