//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Rate limit sweep: Removes ended rate limit windows at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
