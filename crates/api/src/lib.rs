//! HTTP API layer for warden.
//!
//! - **Endpoints**: auth, admin moderation and self-service user routes
//! - **Middleware**: request admission and the admin role gate
//! - **Extractors**: the admitted caller
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Router, routing::get};

pub use endpoints::router;
pub use middleware::AppState;

/// Build the full application: `/health` plus every API route under `/api`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(endpoints::health))
        .nest("/api", router(&state))
        .with_state(state)
}
