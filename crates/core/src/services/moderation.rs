//! Moderation workflow: role changes, bans, status updates and freezes.
//!
//! Each transition runs in one database transaction: the target row is
//! locked, the policy is consulted, then the ledger row(s) and the user
//! update are written together. Any error drops the transaction, which
//! rolls it back.

use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, Utc};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Serialize;
use warden_common::{AppError, AppResult, IdGenerator, PageMeta, PageQuery, Paginated};
use warden_db::{
    entities::{
        ban_history::{self, BanDurationKind},
        freeze_history, role_history,
        user::{self, UserRole, UserStatus},
    },
    map_db_err,
    repositories::{BanHistoryFilter, ModerationRepository, UserRepository},
};

use crate::services::{
    gate::Caller,
    policy::{
        BanDuration, Party, check_reason, decide_ban, decide_role_change, decide_status_change,
        decide_unban,
    },
};

/// Longest self-service freeze, in days.
pub const MAX_FREEZE_DAYS: i32 = 365;

/// Longest freeze reason, in characters.
pub const MAX_FREEZE_REASON_CHARS: usize = 500;

/// Input for a role change.
#[derive(Debug, Clone)]
pub struct UpdateRoleInput {
    pub user_id: String,
    pub role: UserRole,
    pub reason: Option<String>,
}

/// Input for a ban.
#[derive(Debug, Clone)]
pub struct BanInput {
    pub user_id: String,
    pub reason: String,
    /// `"permanent"` or a number of days.
    pub duration: String,
}

/// Input for a status update.
#[derive(Debug, Clone)]
pub struct UpdateStatusInput {
    pub user_id: String,
    pub status: UserStatus,
}

/// Input for a self-service freeze.
#[derive(Debug, Clone)]
pub struct FreezeInput {
    pub duration_days: i32,
    pub reason: String,
}

/// Result of a role change.
#[derive(Debug, Clone)]
pub struct RoleChange {
    pub user: user::Model,
    pub history: role_history::Model,
}

/// Result of a ban.
#[derive(Debug, Clone)]
pub struct BanOutcome {
    pub user: user::Model,
    pub ban: ban_history::Model,
}

/// Result of an unban.
#[derive(Debug, Clone)]
pub struct UnbanOutcome {
    pub user: user::Model,
    /// The ban that was lifted, now closed.
    pub closed: ban_history::Model,
    /// The appended unban record.
    pub record: ban_history::Model,
}

/// Result of a freeze.
#[derive(Debug, Clone)]
pub struct FreezeOutcome {
    pub user: user::Model,
    pub freeze: freeze_history::Model,
}

/// A role history row with usernames resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub username: Option<String>,
    pub changed_by_id: String,
    pub changed_by: Option<String>,
    pub old_role: UserRole,
    pub new_role: UserRole,
    pub reason: Option<String>,
    pub created_at: String,
}

/// A ban history row with usernames resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BanHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub username: Option<String>,
    pub banned_by_id: String,
    pub banned_by: Option<String>,
    pub reason: String,
    pub duration: BanDurationKind,
    pub duration_days: Option<i32>,
    pub start_date: String,
    pub end_date: Option<String>,
    pub is_active: bool,
    pub unbanned_at: Option<String>,
    pub unbanned_by: Option<String>,
    pub created_at: String,
}

/// Moderation service.
#[derive(Clone)]
pub struct ModerationService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    moderation_repo: ModerationRepository,
    id_gen: IdGenerator,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        moderation_repo: ModerationRepository,
    ) -> Self {
        Self {
            db,
            user_repo,
            moderation_repo,
            id_gen: IdGenerator::new(),
        }
    }

    // ========== Transitions ==========

    /// Change a user's role and record it.
    pub async fn update_role(&self, actor: &Caller, input: UpdateRoleInput) -> AppResult<RoleChange> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let target = self.user_repo.lock_by_id(&txn, &input.user_id).await?;
        let first = self.user_repo.find_first_super_admin(&txn).await?;

        decide_role_change(
            actor.party(),
            Party::new(&target.id, target.role),
            first.as_ref().map(|u| u.id.as_str()),
            input.role,
            input.reason.as_deref(),
        )
        .into_result()?;

        let now = Utc::now();
        let old_role = target.role;
        let reason = input
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let history = self
            .moderation_repo
            .insert_role_history(
                &txn,
                role_history::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(target.id.clone()),
                    changed_by_id: Set(actor.id.clone()),
                    old_role: Set(old_role),
                    new_role: Set(input.role),
                    reason: Set(reason),
                    created_at: Set(now.into()),
                },
            )
            .await?;

        let mut active: user::ActiveModel = target.into();
        active.role = Set(input.role);
        active.updated_at = Set(Some(now.into()));
        let user = self.user_repo.update_in(&txn, active).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(
            actor_id = %actor.id,
            user_id = %user.id,
            old_role = old_role.as_str(),
            new_role = input.role.as_str(),
            "User role updated"
        );
        Ok(RoleChange { user, history })
    }

    /// Ban a user.
    pub async fn ban(&self, actor: &Caller, input: BanInput) -> AppResult<BanOutcome> {
        check_reason(&input.reason).into_result()?;

        let txn = self.db.begin().await.map_err(map_db_err)?;

        let target = self.user_repo.lock_by_id(&txn, &input.user_id).await?;
        let first = self.user_repo.find_first_super_admin(&txn).await?;

        decide_ban(
            actor.party(),
            Party::new(&target.id, target.role),
            first.as_ref().map(|u| u.id.as_str()),
        )
        .into_result()?;

        let duration = BanDuration::parse(&input.duration)?;

        if self
            .moderation_repo
            .find_active_ban(&txn, &target.id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("User is already banned".to_string()));
        }

        let now = Utc::now();
        let (kind, days, end_date) = match duration {
            BanDuration::Permanent => (BanDurationKind::Permanent, None, None),
            BanDuration::Days(days) => (
                BanDurationKind::Days,
                i32::try_from(days).ok(),
                Some((now + Duration::days(i64::from(days))).fixed_offset()),
            ),
        };

        let ban = self
            .moderation_repo
            .insert_ban(
                &txn,
                ban_history::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(target.id.clone()),
                    banned_by_id: Set(actor.id.clone()),
                    reason: Set(input.reason.trim().to_string()),
                    duration_kind: Set(kind),
                    duration_days: Set(days),
                    start_date: Set(now.into()),
                    end_date: Set(end_date),
                    is_active: Set(true),
                    unbanned_at: Set(None),
                    unbanned_by: Set(None),
                    created_at: Set(now.into()),
                },
            )
            .await?;

        let mut active: user::ActiveModel = target.into();
        active.status = Set(UserStatus::Banned);
        active.updated_at = Set(Some(now.into()));
        let user = self.user_repo.update_in(&txn, active).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(
            actor_id = %actor.id,
            user_id = %user.id,
            duration = kind.as_str(),
            duration_days = ?days,
            "User banned"
        );
        Ok(BanOutcome { user, ban })
    }

    /// Lift the active ban of a user.
    ///
    /// The active row is closed and a separate `unban` row is appended.
    pub async fn unban(&self, actor: &Caller, user_id: &str, reason: &str) -> AppResult<UnbanOutcome> {
        check_reason(reason).into_result()?;

        let txn = self.db.begin().await.map_err(map_db_err)?;

        let target = self.user_repo.lock_by_id(&txn, user_id).await?;
        let ban = self
            .moderation_repo
            .find_active_ban(&txn, &target.id)
            .await?
            .ok_or_else(|| AppError::NotFound("No active ban found".to_string()))?;

        let issuer_role = self
            .user_repo
            .find_any_by_id(&ban.banned_by_id)
            .await?
            .map(|issuer| issuer.role);
        decide_unban(actor.party(), issuer_role).into_result()?;

        let now = Utc::now();

        let mut closing: ban_history::ActiveModel = ban.into();
        closing.is_active = Set(false);
        closing.unbanned_at = Set(Some(now.into()));
        closing.unbanned_by = Set(Some(actor.id.clone()));
        let closed = self.moderation_repo.update_ban(&txn, closing).await?;

        let record = self
            .moderation_repo
            .insert_ban(
                &txn,
                ban_history::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(target.id.clone()),
                    banned_by_id: Set(actor.id.clone()),
                    reason: Set(reason.trim().to_string()),
                    duration_kind: Set(BanDurationKind::Unban),
                    duration_days: Set(None),
                    start_date: Set(now.into()),
                    end_date: Set(Some(now.into())),
                    is_active: Set(false),
                    unbanned_at: Set(Some(now.into())),
                    unbanned_by: Set(Some(actor.id.clone())),
                    created_at: Set(now.into()),
                },
            )
            .await?;

        let mut active: user::ActiveModel = target.into();
        active.status = Set(UserStatus::Active);
        active.updated_at = Set(Some(now.into()));
        let user = self.user_repo.update_in(&txn, active).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(actor_id = %actor.id, user_id = %user.id, "User unbanned");
        Ok(UnbanOutcome {
            user,
            closed,
            record,
        })
    }

    /// Set a user's status.
    pub async fn update_status(
        &self,
        actor: &Caller,
        input: UpdateStatusInput,
    ) -> AppResult<user::Model> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let target = self.user_repo.lock_by_id(&txn, &input.user_id).await?;
        decide_status_change(
            actor.party(),
            Party::new(&target.id, target.role),
            input.status,
        )
        .into_result()?;

        let old_status = target.status;
        let mut active: user::ActiveModel = target.into();
        active.status = Set(input.status);
        active.updated_at = Set(Some(Utc::now().into()));
        let user = self.user_repo.update_in(&txn, active).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(
            actor_id = %actor.id,
            user_id = %user.id,
            old_status = old_status.as_str(),
            new_status = input.status.as_str(),
            "User status updated"
        );
        Ok(user)
    }

    /// Freeze the caller's own account for a number of days.
    pub async fn freeze(&self, caller: &Caller, input: FreezeInput) -> AppResult<FreezeOutcome> {
        if !(1..=MAX_FREEZE_DAYS).contains(&input.duration_days) {
            return Err(AppError::Validation(format!(
                "Duration must be between 1 and {MAX_FREEZE_DAYS} days"
            )));
        }
        let reason = input.reason.trim();
        let reason_len = reason.chars().count();
        if reason_len == 0 || reason_len > MAX_FREEZE_REASON_CHARS {
            return Err(AppError::Validation(format!(
                "Reason must be between 1 and {MAX_FREEZE_REASON_CHARS} characters"
            )));
        }

        let txn = self.db.begin().await.map_err(map_db_err)?;

        let target = self.user_repo.lock_by_id(&txn, &caller.id).await?;
        let now = Utc::now();

        if let Some(current) = self.moderation_repo.find_active_freeze(&txn, &target.id).await? {
            if !current.is_expired_at(now) {
                return Err(AppError::Conflict(
                    "Account already has an active freeze".to_string(),
                ));
            }
            let mut expired: freeze_history::ActiveModel = current.into();
            expired.is_active = Set(false);
            expired.unfrozen_at = Set(Some(now.into()));
            self.moderation_repo.update_freeze(&txn, expired).await?;
        }

        let freeze = self
            .moderation_repo
            .insert_freeze(
                &txn,
                freeze_history::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(target.id.clone()),
                    reason: Set(reason.to_string()),
                    duration_days: Set(input.duration_days),
                    start_date: Set(now.into()),
                    end_date: Set((now + Duration::days(i64::from(input.duration_days))).into()),
                    is_active: Set(true),
                    unfrozen_at: Set(None),
                    created_at: Set(now.into()),
                },
            )
            .await?;

        let mut active: user::ActiveModel = target.into();
        active.status = Set(UserStatus::Frozen);
        active.updated_at = Set(Some(now.into()));
        let user = self.user_repo.update_in(&txn, active).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(
            user_id = %user.id,
            duration_days = input.duration_days,
            "Account frozen"
        );
        Ok(FreezeOutcome { user, freeze })
    }

    /// Lift an expired freeze so the account can sign in again.
    ///
    /// Returns the user unchanged unless it is frozen by an active freeze
    /// whose end date has passed.
    pub async fn thaw_if_expired(&self, user: user::Model) -> AppResult<user::Model> {
        if user.status != UserStatus::Frozen {
            return Ok(user);
        }

        let txn = self.db.begin().await.map_err(map_db_err)?;
        let now = Utc::now();

        let Some(current) = self.moderation_repo.find_active_freeze(&txn, &user.id).await? else {
            return Ok(user);
        };
        if !current.is_expired_at(now) {
            return Ok(user);
        }

        let target = self.user_repo.lock_by_id(&txn, &user.id).await?;
        // Status may have moved on (banned, already thawed) since the snapshot.
        if target.status != UserStatus::Frozen {
            return Ok(target);
        }

        let mut expired: freeze_history::ActiveModel = current.into();
        expired.is_active = Set(false);
        expired.unfrozen_at = Set(Some(now.into()));
        self.moderation_repo.update_freeze(&txn, expired).await?;

        let mut active: user::ActiveModel = target.into();
        active.status = Set(UserStatus::Active);
        active.updated_at = Set(Some(now.into()));
        let thawed = self.user_repo.update_in(&txn, active).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(user_id = %thawed.id, "Expired freeze lifted");
        Ok(thawed)
    }

    // ========== History ==========

    /// Role history of one user, newest first.
    pub async fn role_history(&self, user_id: &str) -> AppResult<Vec<RoleHistoryEntry>> {
        self.ensure_user_exists(user_id).await?;
        let rows = self.moderation_repo.role_history_for_user(user_id).await?;
        self.resolve_role_rows(rows).await
    }

    /// All role history, newest first, one page at a time.
    pub async fn list_role_history(
        &self,
        page: &PageQuery,
    ) -> AppResult<Paginated<RoleHistoryEntry>> {
        let total = self.moderation_repo.count_role_history().await?;
        let rows = self
            .moderation_repo
            .list_role_history(page.limit(), page.offset())
            .await?;

        Ok(Paginated {
            items: self.resolve_role_rows(rows).await?,
            pagination: PageMeta::new(page, total),
        })
    }

    /// Ban history of one user, newest first.
    pub async fn ban_history(&self, user_id: &str) -> AppResult<Vec<BanHistoryEntry>> {
        self.ensure_user_exists(user_id).await?;
        let rows = self.moderation_repo.ban_history_for_user(user_id).await?;
        self.resolve_ban_rows(rows).await
    }

    /// All ban history matching `filter`, newest first, one page at a time.
    pub async fn list_ban_history(
        &self,
        filter: BanHistoryFilter,
        page: &PageQuery,
    ) -> AppResult<Paginated<BanHistoryEntry>> {
        let total = self.moderation_repo.count_ban_history(filter).await?;
        let rows = self
            .moderation_repo
            .list_ban_history(filter, page.limit(), page.offset())
            .await?;

        Ok(Paginated {
            items: self.resolve_ban_rows(rows).await?,
            pagination: PageMeta::new(page, total),
        })
    }

    /// The caller's own freeze history, newest first.
    pub async fn freeze_history(&self, caller: &Caller) -> AppResult<Vec<freeze_history::Model>> {
        self.moderation_repo.freeze_history_for_user(&caller.id).await
    }

    async fn ensure_user_exists(&self, user_id: &str) -> AppResult<()> {
        self.user_repo
            .find_any_by_id(user_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }

    async fn usernames(&self, mut ids: Vec<String>) -> AppResult<HashMap<String, String>> {
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let users = self.user_repo.find_by_ids(&ids).await?;
        Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
    }

    async fn resolve_role_rows(
        &self,
        rows: Vec<role_history::Model>,
    ) -> AppResult<Vec<RoleHistoryEntry>> {
        let names = self
            .usernames(
                rows.iter()
                    .flat_map(|r| [r.user_id.clone(), r.changed_by_id.clone()])
                    .collect(),
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| RoleHistoryEntry {
                username: names.get(&r.user_id).cloned(),
                changed_by: names.get(&r.changed_by_id).cloned(),
                id: r.id,
                user_id: r.user_id,
                changed_by_id: r.changed_by_id,
                old_role: r.old_role,
                new_role: r.new_role,
                reason: r.reason,
                created_at: r.created_at.to_rfc3339(),
            })
            .collect())
    }

    async fn resolve_ban_rows(
        &self,
        rows: Vec<ban_history::Model>,
    ) -> AppResult<Vec<BanHistoryEntry>> {
        let names = self
            .usernames(
                rows.iter()
                    .flat_map(|r| [r.user_id.clone(), r.banned_by_id.clone()])
                    .collect(),
            )
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| BanHistoryEntry {
                username: names.get(&r.user_id).cloned(),
                banned_by: names.get(&r.banned_by_id).cloned(),
                id: r.id,
                user_id: r.user_id,
                banned_by_id: r.banned_by_id,
                reason: r.reason,
                duration: r.duration_kind,
                duration_days: r.duration_days,
                start_date: r.start_date.to_rfc3339(),
                end_date: r.end_date.map(|t| t.to_rfc3339()),
                is_active: r.is_active,
                unbanned_at: r.unbanned_at.map(|t| t.to_rfc3339()),
                unbanned_by: r.unbanned_by,
                created_at: r.created_at.to_rfc3339(),
            })
            .collect())
    }
}
