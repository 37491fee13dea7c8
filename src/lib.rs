//! Expense Tracker - per-user ledger service
//!
//! Serves users' categories and transactions through a TTL request cache with
//! in-flight de-duplication and stale-while-revalidate, and guards writes and
//! reads with a fixed-window rate limiter.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod ledger;
pub mod models;
pub mod ratelimit;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheOptions, RequestCache};
pub use config::Config;
pub use ratelimit::{RateLimitRules, RateLimiter};
