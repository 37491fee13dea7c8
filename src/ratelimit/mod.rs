//! Rate Limit Module
//!
//! Fixed-window rate limiting keyed per caller, with preset rules for the
//! service's guarded operations and a periodic sweep of ended windows.

mod limiter;
mod rule;
mod table;
mod window;


pub use limiter::{RateLimiter, DEFAULT_SWEEP_INTERVAL};
pub use rule::{KeyGenerator, RateLimitRule, RateLimitRules, DEFAULT_KEY, UNKNOWN_CONTEXT};
pub use table::{RateLimitDecision, RateLimitStats, WindowTable};
pub use window::RateLimitWindow;
