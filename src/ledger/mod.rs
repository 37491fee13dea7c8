//! Ledger Module
//!
//! The data store behind the caches: users, categories and transactions,
//! plus the period summary computed from them.

pub mod store;
pub mod summary;

pub use store::{Ledger, LedgerError};
pub use summary::{summarize, CategoryShare, DailyTotals, PeriodSummary};
