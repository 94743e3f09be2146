//! Admin moderation endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use warden_common::{AppError, AppResult, PageQuery, Paginated};
use warden_core::{
    BanDurationKind, BanHistoryEntry, BanInput, RoleHistoryEntry, UpdateRoleInput, UserRole,
};
use warden_db::{
    entities::{ban_history, role_history},
    repositories::BanHistoryFilter,
};

use super::users::UserResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Role change request.
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub user_id: String,
    pub role: String,
    #[serde(default)]
    pub reason: Option<String>,
}

/// Role change response.
#[derive(Serialize)]
pub struct RoleChangeResponse {
    pub user: UserResponse,
    pub history: role_history::Model,
}

/// Change a user's role.
async fn update_role(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateRoleRequest>,
) -> AppResult<ApiResponse<RoleChangeResponse>> {
    let input = UpdateRoleInput {
        user_id: req.user_id,
        role: UserRole::parse(&req.role)?,
        reason: req.reason,
    };

    let change = state.moderation_service.update_role(&caller, input).await?;
    Ok(ApiResponse::ok(RoleChangeResponse {
        user: change.user.into(),
        history: change.history,
    }))
}

/// Ban request. `duration` is `"permanent"` or a number of days.
#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub user_id: String,
    pub reason: String,
    pub duration: String,
}

/// Ban response.
#[derive(Serialize)]
pub struct BanResponse {
    pub user: UserResponse,
    pub ban: ban_history::Model,
}

/// Ban a user.
async fn ban_user(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<BanRequest>,
) -> AppResult<ApiResponse<BanResponse>> {
    let input = BanInput {
        user_id: req.user_id,
        reason: req.reason,
        duration: req.duration,
    };

    let outcome = state.moderation_service.ban(&caller, input).await?;
    Ok(ApiResponse::ok(BanResponse {
        user: outcome.user.into(),
        ban: outcome.ban,
    }))
}

/// Unban request.
#[derive(Debug, Deserialize)]
pub struct UnbanRequest {
    pub reason: String,
}

/// Unban response.
#[derive(Serialize)]
pub struct UnbanResponse {
    pub user: UserResponse,
    /// The lifted ban, now closed.
    pub lifted_ban: ban_history::Model,
    /// The appended unban record.
    pub unban_record: ban_history::Model,
}

/// Lift a user's active ban.
async fn unban_user(
    AuthUser(caller): AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(req): Json<UnbanRequest>,
) -> AppResult<ApiResponse<UnbanResponse>> {
    let outcome = state
        .moderation_service
        .unban(&caller, &user_id, &req.reason)
        .await?;

    Ok(ApiResponse::ok(UnbanResponse {
        user: outcome.user.into(),
        lifted_ban: outcome.closed,
        unban_record: outcome.record,
    }))
}

/// Role history of one user.
async fn user_role_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<RoleHistoryEntry>>> {
    let rows = state.moderation_service.role_history(&user_id).await?;
    Ok(ApiResponse::ok(rows))
}

/// All role history, paginated.
async fn role_histories(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<ApiResponse<Paginated<RoleHistoryEntry>>> {
    let rows = state.moderation_service.list_role_history(&page).await?;
    Ok(ApiResponse::ok(rows))
}

/// Ban history of one user.
async fn user_ban_history(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<ApiResponse<Vec<BanHistoryEntry>>> {
    let rows = state.moderation_service.ban_history(&user_id).await?;
    Ok(ApiResponse::ok(rows))
}

/// Query for the ban history list.
#[derive(Debug, Default, Deserialize)]
pub struct BanHistoryQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    /// `active` or `inactive`.
    pub status: Option<String>,
    /// `permanent` or `temporary`.
    pub duration: Option<String>,
}

impl BanHistoryQuery {
    fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }

    fn filter(&self) -> AppResult<BanHistoryFilter> {
        let active = match self.status.as_deref() {
            None | Some("") => None,
            Some("active") => Some(true),
            Some("inactive") => Some(false),
            Some(other) => {
                return Err(AppError::Validation(format!("Invalid status filter: {other}")));
            }
        };

        let kind = match self.duration.as_deref() {
            None | Some("") => None,
            Some("permanent") => Some(BanDurationKind::Permanent),
            Some("temporary") => Some(BanDurationKind::Days),
            Some(other) => {
                return Err(AppError::Validation(format!(
                    "Invalid duration filter: {other}"
                )));
            }
        };

        Ok(BanHistoryFilter { active, kind })
    }
}

/// All ban history, filtered and paginated.
async fn ban_histories(
    State(state): State<AppState>,
    Query(query): Query<BanHistoryQuery>,
) -> AppResult<ApiResponse<Paginated<BanHistoryEntry>>> {
    let filter = query.filter()?;
    let rows = state
        .moderation_service
        .list_ban_history(filter, &query.page())
        .await?;
    Ok(ApiResponse::ok(rows))
}

pub fn router() -> Router<AppState> {
    Router::new()
        // Roles
        .route("/users/role", put(update_role))
        .route("/users/{user_id}/role-history", get(user_role_history))
        .route("/role-histories", get(role_histories))
        // Bans
        .route("/users/ban", post(ban_user))
        .route("/users/{user_id}/unban", post(unban_user))
        .route("/users/{user_id}/ban-history", get(user_ban_history))
        .route("/ban-histories", get(ban_histories))
}
