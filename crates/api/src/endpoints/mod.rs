//! API endpoints.

mod admin;
mod auth;
mod users;

use axum::{Json, Router, middleware};
use serde_json::{Value, json};

use crate::middleware::{AppState, auth_middleware, require_admin};

pub use users::UserResponse;

/// Create the API router.
///
/// Routes are relative to `/api`. Layers that need the gate are bound to
/// `state` here; the router itself still expects the state via `with_state`.
pub fn router(state: &AppState) -> Router<AppState> {
    let authenticated = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let admin = admin::router()
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(authenticated.clone());

    Router::new()
        .nest(
            "/auth",
            auth::public_router().merge(auth::router().route_layer(authenticated.clone())),
        )
        .nest("/admin", admin)
        .nest("/users", users::router().route_layer(authenticated))
}

/// Liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
