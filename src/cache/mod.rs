//! Cache Module
//!
//! Provides an in-memory request cache with TTL expiration, stale-while-revalidate
//! refreshes and de-duplication of concurrent fetches.

mod entry;
mod options;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use options::{CacheOptions, DEFAULT_TTL};
pub use stats::CacheStats;
pub use store::RequestCache;
