//! Error types for the expense tracker
//!
//! Provides unified error handling using thiserror.

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ledger::LedgerError;

// == Cache Error Enum ==
/// Failure surfaced by the request cache.
///
/// Clonable so that a single failed fetch can be delivered to every caller
/// that was waiting on it.
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// The producer behind a fetch rejected
    #[error("Fetch for '{key}' failed: {reason}")]
    Fetch {
        key: String,
        reason: Arc<anyhow::Error>,
    },
}

impl CacheError {
    /// Wraps a producer failure for `key`.
    pub fn fetch(key: impl Into<String>, reason: anyhow::Error) -> Self {
        CacheError::Fetch {
            key: key.into(),
            reason: Arc::new(reason),
        }
    }
}

// == App Error Enum ==
/// Unified error type for the HTTP service.
#[derive(Error, Debug)]
pub enum AppError {
    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Caller exceeded a rate limit rule
    #[error("{message}")]
    RateLimited {
        message: String,
        retry_after_secs: u64,
    },

    /// Bad credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Record already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The data store could not serve a cached read
    #[error(transparent)]
    Upstream(CacheError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CacheError> for AppError {
    /// A fetch that failed because the record is missing stays a 404.
    fn from(err: CacheError) -> Self {
        let CacheError::Fetch { reason, .. } = &err;
        match reason.downcast_ref::<LedgerError>() {
            Some(missing @ LedgerError::NotFound(_)) => AppError::NotFound(missing.to_string()),
            _ => AppError::Upstream(err),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::NotFound(_) => AppError::NotFound(err.to_string()),
            LedgerError::Conflict(msg) => AppError::Conflict(msg.clone()),
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let retry_after = match &self {
            AppError::RateLimited {
                retry_after_secs, ..
            } => Some(*retry_after_secs),
            _ => None,
        };

        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::RateLimited { message, .. } => (StatusCode::TOO_MANY_REQUESTS, message),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Upstream(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "error": message
        }));

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

// == Result Type Alias ==
/// Convenience Result type for the HTTP service.
pub type Result<T> = std::result::Result<T, AppError>;
