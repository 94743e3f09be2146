//! Moderation repository for the history ledger (role, ban and freeze rows).

use std::sync::Arc;

use crate::{
    entities::{
        BanHistory, FreezeHistory, RoleHistory,
        ban_history::{self, BanDurationKind},
        freeze_history, role_history,
    },
    map_db_err,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
};
use warden_common::AppResult;

/// Filters for listing ban history across all users.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BanHistoryFilter {
    /// Only rows with this active flag.
    pub active: Option<bool>,
    /// Only rows of this duration kind.
    pub kind: Option<BanDurationKind>,
}

impl BanHistoryFilter {
    fn apply(self, mut query: Select<BanHistory>) -> Select<BanHistory> {
        if let Some(active) = self.active {
            query = query.filter(ban_history::Column::IsActive.eq(active));
        }
        if let Some(kind) = self.kind {
            query = query.filter(ban_history::Column::DurationKind.eq(kind));
        }
        query
    }
}

/// Moderation repository for database operations.
#[derive(Clone)]
pub struct ModerationRepository {
    db: Arc<DatabaseConnection>,
}

impl ModerationRepository {
    /// Create a new moderation repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    // ========== Role History ==========

    /// Append a role history row.
    pub async fn insert_role_history<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: role_history::ActiveModel,
    ) -> AppResult<role_history::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Role history of one user, newest first.
    pub async fn role_history_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<role_history::Model>> {
        RoleHistory::find()
            .filter(role_history::Column::UserId.eq(user_id))
            .order_by_desc(role_history::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// One page of role history across all users, newest first.
    pub async fn list_role_history(
        &self,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<role_history::Model>> {
        RoleHistory::find()
            .order_by_desc(role_history::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count role history rows.
    pub async fn count_role_history(&self) -> AppResult<u64> {
        RoleHistory::find()
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    // ========== Ban History ==========

    /// Append a ban history row.
    pub async fn insert_ban<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ban_history::ActiveModel,
    ) -> AppResult<ban_history::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Update the unban fields of a ban row.
    pub async fn update_ban<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: ban_history::ActiveModel,
    ) -> AppResult<ban_history::Model> {
        model.update(conn).await.map_err(map_db_err)
    }

    /// The active ban of a user, locked for the rest of the transaction.
    pub async fn find_active_ban<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<Option<ban_history::Model>> {
        BanHistory::find()
            .filter(ban_history::Column::UserId.eq(user_id))
            .filter(ban_history::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Ban history of one user, newest first.
    pub async fn ban_history_for_user(&self, user_id: &str) -> AppResult<Vec<ban_history::Model>> {
        BanHistory::find()
            .filter(ban_history::Column::UserId.eq(user_id))
            .order_by_desc(ban_history::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// One page of ban history across all users, newest first.
    pub async fn list_ban_history(
        &self,
        filter: BanHistoryFilter,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<ban_history::Model>> {
        filter
            .apply(BanHistory::find())
            .order_by_desc(ban_history::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Count ban history rows matching `filter`.
    pub async fn count_ban_history(&self, filter: BanHistoryFilter) -> AppResult<u64> {
        filter
            .apply(BanHistory::find())
            .count(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    // ========== Freeze History ==========

    /// Append a freeze row.
    pub async fn insert_freeze<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: freeze_history::ActiveModel,
    ) -> AppResult<freeze_history::Model> {
        model.insert(conn).await.map_err(map_db_err)
    }

    /// Update a freeze row.
    pub async fn update_freeze<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: freeze_history::ActiveModel,
    ) -> AppResult<freeze_history::Model> {
        model.update(conn).await.map_err(map_db_err)
    }

    /// The active freeze of a user, expired or not, locked for the rest of the transaction.
    pub async fn find_active_freeze<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: &str,
    ) -> AppResult<Option<freeze_history::Model>> {
        FreezeHistory::find()
            .filter(freeze_history::Column::UserId.eq(user_id))
            .filter(freeze_history::Column::IsActive.eq(true))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Freeze history of one user, newest first.
    pub async fn freeze_history_for_user(
        &self,
        user_id: &str,
    ) -> AppResult<Vec<freeze_history::Model>> {
        FreezeHistory::find()
            .filter(freeze_history::Column::UserId.eq(user_id))
            .order_by_desc(freeze_history::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }
}
