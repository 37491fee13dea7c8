//! API Module
//!
//! HTTP handlers and routing for the expense tracker REST API.
//!
//! # Endpoints
//! - `POST /auth/sign-up`, `POST /auth/sign-in` - Account access
//! - `PATCH /users/:user_id/profile` - Change nickname
//! - `GET|POST /users/:user_id/categories`, `DELETE .../categories/:id`
//! - `GET|POST /users/:user_id/transactions`, `DELETE .../transactions/:id`
//! - `GET /users/:user_id/summary` - Totals for a period
//! - `POST /users/:user_id/refresh` - Refetch cached lists
//! - `DELETE /users/:user_id/rate-limits` - Clear a user's rate limit windows
//! - `GET /stats` - Cache and rate limiter statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
