//! API Routes
//!
//! Configures the Axum router with all expense tracker endpoints.

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_category_handler, create_transaction_handler, delete_category_handler,
    delete_transaction_handler, health_handler, list_categories_handler,
    list_transactions_handler, refresh_handler, reset_rate_limits_handler, sign_in_handler,
    sign_up_handler, stats_handler, summary_handler, update_profile_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/auth/sign-up", post(sign_up_handler))
        .route("/auth/sign-in", post(sign_in_handler))
        .route("/users/:user_id/profile", patch(update_profile_handler))
        .route(
            "/users/:user_id/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/users/:user_id/categories/:category_id",
            delete(delete_category_handler),
        )
        .route(
            "/users/:user_id/transactions",
            get(list_transactions_handler).post(create_transaction_handler),
        )
        .route(
            "/users/:user_id/transactions/:transaction_id",
            delete(delete_transaction_handler),
        )
        .route("/users/:user_id/summary", get(summary_handler))
        .route("/users/:user_id/refresh", post(refresh_handler))
        .route("/users/:user_id/rate-limits", delete(reset_rate_limits_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
