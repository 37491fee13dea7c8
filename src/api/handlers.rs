//! API Handlers
//!
//! HTTP request handlers for the expense tracker endpoints. Reads of the
//! per-user lists go through the request caches; writes go to the ledger and
//! then update or invalidate the cached list.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password, INVALID_CREDENTIALS};
use crate::cache::{CacheOptions, RequestCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::ledger::{summarize, Ledger};
use crate::models::{
    validate_request, AuthResponse, CacheStatsBody, CategoriesResponse, Category,
    CreateCategoryRequest, CreateTransactionRequest, CreatedResponse, DeleteResponse,
    HealthResponse, RefreshResponse, ResetResponse, SignInRequest, SignUpRequest, StatsResponse,
    SummaryQuery, SummaryResponse, Transaction, TransactionFilter, TransactionsResponse,
    UpdateProfileRequest, User,
};
use crate::ratelimit::{RateLimitDecision, RateLimitRules, RateLimiter};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Ledger,
    /// Per-user transaction lists, keyed `transactions:<user_id>`
    pub transactions: RequestCache<Arc<Vec<Transaction>>>,
    /// Per-user category lists, keyed `categories:<user_id>`
    pub categories: RequestCache<Arc<Vec<Category>>>,
    pub limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Creates a new AppState around an existing ledger and limiter.
    pub fn new(ledger: Ledger, options: CacheOptions, limiter: RateLimiter) -> Self {
        Self {
            ledger,
            transactions: RequestCache::new(options),
            categories: RequestCache::new(options),
            limiter: Arc::new(limiter),
        }
    }

    /// Creates a new AppState from configuration with an empty ledger.
    ///
    /// Starts the limiter's sweep task, so it must run inside a tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        let limiter = RateLimiter::new(RateLimitRules::default(), config.sweep_interval());
        Self::new(Ledger::new(), config.cache_options(), limiter)
    }

    async fn load_categories(&self, user_id: Uuid) -> Result<Arc<Vec<Category>>> {
        let ledger = self.ledger.clone();
        let categories = self
            .categories
            .get(&categories_key(user_id), move || async move {
                ledger.list_categories(user_id).await.map(Arc::new)
            })
            .await?;
        Ok(categories)
    }

    async fn load_transactions(&self, user_id: Uuid) -> Result<Arc<Vec<Transaction>>> {
        let ledger = self.ledger.clone();
        let transactions = self
            .transactions
            .get(&transactions_key(user_id), move || async move {
                ledger.list_transactions(user_id).await.map(Arc::new)
            })
            .await?;
        Ok(transactions)
    }
}

fn categories_key(user_id: Uuid) -> String {
    format!("categories:{user_id}")
}

fn transactions_key(user_id: Uuid) -> String {
    format!("transactions:{user_id}")
}

/// Turns a rejected decision into a 429. Returns the remaining budget otherwise.
fn enforce(decision: RateLimitDecision) -> Result<u32> {
    if decision.allowed {
        return Ok(decision.remaining);
    }

    let retry_after_secs = decision.retry_after_secs(Instant::now());
    Err(AppError::RateLimited {
        message: decision.error.unwrap_or_else(|| {
            format!("Rate limit exceeded. Try again in {retry_after_secs} seconds.")
        }),
        retry_after_secs,
    })
}

// == Auth ==
/// Handler for POST /auth/sign-up
///
/// Creates the account, seeds its default categories and primes the
/// category cache with them.
pub async fn sign_up_handler(
    State(state): State<AppState>,
    Json(req): Json<SignUpRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let req = req.normalized();
    let remaining_attempts = enforce(state.limiter.check_auth(&req.email))?;
    validate_request(&req)?;

    if state.ledger.find_user_by_email(&req.email).await.is_some() {
        return Err(AppError::Conflict("User already registered".to_string()));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("Password hashing task failed: {e}")))??;

    let user = state
        .ledger
        .create_user(&req.email, &req.nickname, password_hash)
        .await?;
    let categories = state.ledger.seed_default_categories(user.id).await?;
    state
        .categories
        .set(&categories_key(user.id), Arc::new(categories));

    info!(user_id = %user.id, "User signed up");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: User::from(&user),
            remaining_attempts,
        }),
    ))
}

/// Handler for POST /auth/sign-in
pub async fn sign_in_handler(
    State(state): State<AppState>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<AuthResponse>> {
    let req = req.normalized();
    let remaining_attempts = enforce(state.limiter.check_auth(&req.email))?;
    validate_request(&req)?;

    let user = state
        .ledger
        .find_user_by_email(&req.email)
        .await
        .ok_or_else(|| AppError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    let password = req.password;
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Password verification task failed: {e}")))??;
    if !verified {
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(Json(AuthResponse {
        user: User::from(&user),
        remaining_attempts,
    }))
}

/// Handler for PATCH /users/:user_id/profile
pub async fn update_profile_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    enforce(state.limiter.check_profile_update(&user_id.to_string()))?;
    let req = UpdateProfileRequest {
        nickname: req.nickname.trim().to_string(),
    };
    validate_request(&req)?;

    let user = state.ledger.update_nickname(user_id, &req.nickname).await?;
    Ok(Json(User::from(&user)))
}

// == Categories ==
/// Handler for GET /users/:user_id/categories
pub async fn list_categories_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<CategoriesResponse>> {
    enforce(state.limiter.check_data_fetch(&user_id.to_string()))?;
    let categories = state.load_categories(user_id).await?;

    Ok(Json(CategoriesResponse {
        user_id,
        categories: categories.as_ref().clone(),
    }))
}

/// Handler for POST /users/:user_id/categories
///
/// Appends the new category to the cached list when one is present. Otherwise
/// the key is invalidated so a list fetch already running is not stored.
pub async fn create_category_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CreatedResponse<Category>>)> {
    let remaining = enforce(state.limiter.check_category_create(&user_id.to_string()))?;
    let new = req.into_new_category()?;
    let category = state.ledger.create_category(user_id, new).await?;

    let key = categories_key(user_id);
    if state.categories.peek(&key).is_some() {
        state.categories.update(&key, |current| {
            let mut list = current.map(|c| c.as_ref().clone()).unwrap_or_default();
            list.push(category.clone());
            list.sort_by(|a, b| a.name.cmp(&b.name));
            Arc::new(list)
        });
    } else {
        state.categories.invalidate(&key);
    }

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            record: category,
            remaining,
        }),
    ))
}

/// Handler for DELETE /users/:user_id/categories/:category_id
///
/// Deleting a category also removes its transactions, so both lists are
/// invalidated.
pub async fn delete_category_handler(
    State(state): State<AppState>,
    Path((user_id, category_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeleteResponse>> {
    state.ledger.delete_category(user_id, category_id).await?;
    state.categories.invalidate(&categories_key(user_id));
    state.transactions.invalidate(&transactions_key(user_id));

    Ok(Json(DeleteResponse::new("Category", category_id)))
}

// == Transactions ==
/// Handler for GET /users/:user_id/transactions
///
/// Filters are applied to the cached list, so every filter combination
/// shares one cache entry.
pub async fn list_transactions_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<TransactionsResponse>> {
    enforce(state.limiter.check_data_fetch(&user_id.to_string()))?;
    let transactions = state.load_transactions(user_id).await?;

    let matching = transactions
        .iter()
        .filter(|t| filter.matches(t))
        .cloned()
        .collect();
    Ok(Json(TransactionsResponse::new(user_id, matching)))
}

/// Handler for POST /users/:user_id/transactions
pub async fn create_transaction_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<CreatedResponse<Transaction>>)> {
    let remaining = enforce(state.limiter.check_transaction_create(&user_id.to_string()))?;
    let new = req.into_new_transaction()?;
    let transaction = state.ledger.create_transaction(user_id, new).await?;
    state.transactions.invalidate(&transactions_key(user_id));

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            record: transaction,
            remaining,
        }),
    ))
}

/// Handler for DELETE /users/:user_id/transactions/:transaction_id
pub async fn delete_transaction_handler(
    State(state): State<AppState>,
    Path((user_id, transaction_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<DeleteResponse>> {
    state
        .ledger
        .delete_transaction(user_id, transaction_id)
        .await?;
    state.transactions.invalidate(&transactions_key(user_id));

    Ok(Json(DeleteResponse::new("Transaction", transaction_id)))
}

// == Summary ==
/// Handler for GET /users/:user_id/summary?start_date=..&end_date=..
pub async fn summary_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>> {
    enforce(state.limiter.check_data_fetch(&user_id.to_string()))?;
    if query.start_date > query.end_date {
        return Err(AppError::InvalidRequest(
            "start_date must not be after end_date".to_string(),
        ));
    }

    let (transactions, categories) =
        tokio::try_join!(state.load_transactions(user_id), state.load_categories(user_id))?;

    Ok(Json(SummaryResponse {
        user_id,
        start_date: query.start_date,
        end_date: query.end_date,
        summary: summarize(&transactions, &categories, query.start_date, query.end_date),
    }))
}

/// Handler for POST /users/:user_id/refresh
///
/// Refetches both cached lists in the foreground.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RefreshResponse>> {
    let transactions_ledger = state.ledger.clone();
    let categories_ledger = state.ledger.clone();
    let transactions_key = transactions_key(user_id);
    let categories_key = categories_key(user_id);

    let (transactions, categories) = tokio::try_join!(
        state
            .transactions
            .refetch(&transactions_key, move || async move {
                transactions_ledger.list_transactions(user_id).await.map(Arc::new)
            }),
        state
            .categories
            .refetch(&categories_key, move || async move {
                categories_ledger.list_categories(user_id).await.map(Arc::new)
            }),
    )?;

    Ok(Json(RefreshResponse {
        user_id,
        categories: categories.len(),
        transactions: transactions.len(),
    }))
}

/// Handler for DELETE /users/:user_id/rate-limits
pub async fn reset_rate_limits_handler(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Json<ResetResponse> {
    let windows_removed = state.limiter.reset(&user_id);
    Json(ResetResponse {
        user_id,
        windows_removed,
    })
}

// == Service ==
/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        transactions: CacheStatsBody::from(state.transactions.stats()),
        categories: CacheStatsBody::from(state.categories.stats()),
        rate_limits: state.limiter.stats(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
