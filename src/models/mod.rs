//! Domain records and request/response models for the expense tracker API
//!
//! This module defines the records kept in the ledger and the DTOs used for
//! serializing/deserializing HTTP request and response bodies.

pub mod domain;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use domain::{
    Category, Importance, NewCategory, NewTransaction, Transaction, TransactionType, User,
    UserRecord, DEFAULT_CATEGORIES, DEFAULT_CATEGORY_COLOR,
};
pub use requests::{
    normalize_email, validate_request, CreateCategoryRequest, CreateTransactionRequest,
    SignInRequest, SignUpRequest, SummaryQuery, TransactionFilter, UpdateProfileRequest,
};
pub use responses::{
    AuthResponse, CacheStatsBody, CategoriesResponse, CreatedResponse, DeleteResponse,
    HealthResponse, RefreshResponse, ResetResponse, StatsResponse, SummaryResponse,
    TransactionsResponse,
};
