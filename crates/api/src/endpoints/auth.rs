//! Authentication endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::Serialize;
use warden_common::AppResult;
use warden_core::{
    AuthSession, ChangePasswordInput, LoginInput, RegisterInput, ResetRequestInput,
    UpdatePasswordInput,
};

use super::users::UserResponse;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Session response: a credential plus the user it was issued for.
#[derive(Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            token: session.token,
            user: session.user.into(),
        }
    }
}

/// Sign in with an email or username.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.auth_service.login(req).await?;
    Ok(ApiResponse::ok(session.into()))
}

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.auth_service.register(req).await?;
    Ok(ApiResponse::created(session.into()))
}

/// Request a password reset token by email.
async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetRequestInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    let message = state.auth_service.request_password_reset(req).await?;
    Ok(ApiResponse::ok(MessageResponse::new(message)))
}

/// Set a new password with a reset token.
async fn update_password(
    State(state): State<AppState>,
    Json(req): Json<UpdatePasswordInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.auth_service.update_password(req).await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Password has been updated successfully",
    )))
}

/// Change the caller's password.
async fn change_password(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.auth_service.change_password(&caller, req).await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Password changed successfully",
    )))
}

/// Routes that need no credential.
pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route("/reset-password", post(reset_password))
        .route("/update-password", post(update_password))
}

/// Routes behind the auth middleware.
pub fn router() -> Router<AppState> {
    Router::new().route("/change-password", post(change_password))
}
