//! Response DTOs for the expense tracker API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::cache::CacheStats;
use crate::ledger::PeriodSummary;
use crate::models::{Category, Transaction, User};
use crate::ratelimit::RateLimitStats;

/// Response body for sign-up and sign-in
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: User,
    /// Auth attempts left for this email in the current window
    pub remaining_attempts: u32,
}

/// Response body for category listings
#[derive(Debug, Clone, Serialize)]
pub struct CategoriesResponse {
    pub user_id: Uuid,
    pub categories: Vec<Category>,
}

/// Response body for transaction listings
#[derive(Debug, Clone, Serialize)]
pub struct TransactionsResponse {
    pub user_id: Uuid,
    pub count: usize,
    pub transactions: Vec<Transaction>,
}

impl TransactionsResponse {
    pub fn new(user_id: Uuid, transactions: Vec<Transaction>) -> Self {
        Self {
            user_id,
            count: transactions.len(),
            transactions,
        }
    }
}

/// Response body for a created record, with the rate limit budget left
#[derive(Debug, Clone, Serialize)]
pub struct CreatedResponse<T> {
    #[serde(flatten)]
    pub record: T,
    pub remaining: u32,
}

/// Response body for the summary endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SummaryResponse {
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(flatten)]
    pub summary: PeriodSummary,
}

/// Response body for the refresh endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub user_id: Uuid,
    pub categories: usize,
    pub transactions: usize,
}

/// Response body for DELETE operations
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    pub id: Uuid,
}

impl DeleteResponse {
    pub fn new(kind: &str, id: Uuid) -> Self {
        Self {
            message: format!("{kind} '{id}' deleted successfully"),
            id,
        }
    }
}

/// Response body for DELETE /users/:user_id/rate-limits
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub user_id: String,
    pub windows_removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub transactions: CacheStatsBody,
    pub categories: CacheStatsBody,
    pub rate_limits: RateLimitStats,
}

/// One cache's statistics plus its hit rate
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatsBody {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate ((hits + stale hits) / reads)
    pub hit_rate: f64,
}

impl From<CacheStats> for CacheStatsBody {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
