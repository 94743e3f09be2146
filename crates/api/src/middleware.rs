//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use warden_common::{AppError, AppResult};
use warden_core::{
    AuthService, Caller, ModerationService, RequestGate, UserRole, UserService, require_role,
};

/// Roles allowed through the admin gate.
pub const ADMIN_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::SuperAdmin];

/// Application state.
#[derive(Clone)]
pub struct AppState {
    /// Resolves callers from bearer credentials.
    pub gate: RequestGate,
    /// Login, registration and password flows.
    pub auth_service: AuthService,
    /// Role, ban, status and freeze transitions.
    pub moderation_service: ModerationService,
    /// Profile and account management.
    pub user_service: UserService,
}

/// Authentication middleware.
///
/// Admits the request or rejects it; an admitted [`Caller`] is stored in the
/// request extensions for handlers and later layers.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> AppResult<Response> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|value| value.to_str().unwrap_or_default().to_owned());

    let caller = state.gate.admit(header.as_deref()).await?;
    tracing::debug!(user_id = %caller.id, role = caller.role.as_str(), "Request admitted");

    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}

/// Role gate for admin routes. Must run after [`auth_middleware`].
pub async fn require_admin(req: Request<Body>, next: Next) -> AppResult<Response> {
    let caller = req
        .extensions()
        .get::<Caller>()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    require_role(caller, ADMIN_ROLES)?;
    Ok(next.run(req).await)
}
