//! User self-service endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use warden_common::AppResult;
use warden_core::{
    FreezeInput, UpdateProfileInput, UpdateStatusInput, UserRole, UserStatus,
};
use warden_db::entities::{freeze_history, user};

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Public view of a user.
#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub email: String,
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub email_verified_at: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            name: user.name,
            bio: user.bio,
            avatar_url: user.avatar_url,
            role: user.role,
            status: user.status,
            email_verified_at: user.email_verified_at.map(|t| t.to_rfc3339()),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Freeze record response.
#[derive(Serialize)]
pub struct FreezeResponse {
    pub id: String,
    pub user_id: String,
    pub reason: String,
    pub duration_days: i32,
    pub start_date: String,
    pub end_date: String,
    pub is_active: bool,
    pub unfrozen_at: Option<String>,
    pub created_at: String,
}

impl From<freeze_history::Model> for FreezeResponse {
    fn from(freeze: freeze_history::Model) -> Self {
        Self {
            id: freeze.id,
            user_id: freeze.user_id,
            reason: freeze.reason,
            duration_days: freeze.duration_days,
            start_date: freeze.start_date.to_rfc3339(),
            end_date: freeze.end_date.to_rfc3339(),
            is_active: freeze.is_active,
            unfrozen_at: freeze.unfrozen_at.map(|t| t.to_rfc3339()),
            created_at: freeze.created_at.to_rfc3339(),
        }
    }
}

/// Status update request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub user_id: String,
    pub status: String,
}

/// Set a user's status.
async fn update_status(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    let input = UpdateStatusInput {
        user_id: req.user_id,
        status: UserStatus::parse(&req.status)?,
    };

    let user = state.moderation_service.update_status(&caller, input).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Update the caller's profile.
async fn update_profile(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.update_profile(&caller, req).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Account deletion request.
#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

/// Soft-delete the caller's account.
async fn delete_account(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<DeleteAccountRequest>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state
        .user_service
        .delete_account(&caller, &req.password)
        .await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Account deleted successfully",
    )))
}

/// Freeze request.
#[derive(Debug, Deserialize)]
pub struct FreezeRequest {
    #[serde(alias = "duration")]
    pub duration_days: i32,
    pub reason: String,
}

/// Freeze response: the updated user and the new freeze record.
#[derive(Serialize)]
pub struct FreezeOutcomeResponse {
    pub user: UserResponse,
    pub freeze: FreezeResponse,
}

/// Freeze the caller's own account.
async fn freeze(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<FreezeRequest>,
) -> AppResult<ApiResponse<FreezeOutcomeResponse>> {
    let outcome = state
        .moderation_service
        .freeze(
            &caller,
            FreezeInput {
                duration_days: req.duration_days,
                reason: req.reason,
            },
        )
        .await?;

    Ok(ApiResponse::ok(FreezeOutcomeResponse {
        user: outcome.user.into(),
        freeze: outcome.freeze.into(),
    }))
}

/// The caller's freeze history, newest first.
async fn freeze_history(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<FreezeResponse>>> {
    let rows = state.moderation_service.freeze_history(&caller).await?;
    Ok(ApiResponse::ok(rows.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", put(update_status))
        .route("/profile", put(update_profile))
        .route("/account", delete(delete_account))
        .route("/freeze", post(freeze))
        .route("/freeze/history", get(freeze_history))
}
