//! User service: profile updates and account deletion.

use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;
use warden_common::{AppError, AppResult};
use warden_db::{entities::user, repositories::UserRepository};

use crate::services::{gate::Caller, password::verify_password};

/// Input for updating the caller's profile. Absent fields are left alone.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,

    #[validate(email)]
    pub email: Option<String>,

    #[serde(alias = "full_name")]
    #[validate(length(max = 100))]
    pub name: Option<String>,

    #[validate(length(max = 500))]
    pub bio: Option<String>,

    #[validate(url)]
    pub avatar_url: Option<String>,
}

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(user_repo: UserRepository) -> Self {
        Self { user_repo }
    }

    /// Update the caller's profile.
    ///
    /// Username and email uniqueness is checked again whenever either changes.
    pub async fn update_profile(
        &self,
        caller: &Caller,
        mut input: UpdateProfileInput,
    ) -> AppResult<user::Model> {
        input.username = input.username.map(|u| u.trim().to_string());
        input.email = input.email.map(|e| e.trim().to_string());
        input.validate()?;

        let current = self.user_repo.get_by_id(&caller.id).await?;
        let mut active: user::ActiveModel = current.clone().into();

        if let Some(username) = input.username.as_deref() {
            if username != current.username {
                if self
                    .user_repo
                    .username_taken(username, Some(&current.id))
                    .await?
                {
                    return Err(AppError::Conflict("Username already exists".to_string()));
                }
                active.username = Set(username.to_string());
            }
        }

        if let Some(email) = input.email.as_deref() {
            if email != current.email {
                if self.user_repo.email_taken(email, Some(&current.id)).await? {
                    return Err(AppError::Conflict("Email already exists".to_string()));
                }
                active.email = Set(email.to_string());
            }
        }

        if let Some(name) = input.name {
            active.name = Set(Some(name));
        }
        if let Some(bio) = input.bio {
            active.bio = Set(Some(bio));
        }
        if let Some(avatar_url) = input.avatar_url {
            active.avatar_url = Set(Some(avatar_url));
        }

        active.updated_at = Set(Some(Utc::now().into()));
        let user = self.user_repo.update(active).await?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Soft-delete the caller's account after checking the password.
    ///
    /// Ledger rows are kept and every access credential is invalidated.
    pub async fn delete_account(&self, caller: &Caller, password: &str) -> AppResult<()> {
        let current = self.user_repo.get_by_id(&caller.id).await?;
        if !verify_password(password, &current.password_hash) {
            return Err(AppError::Unauthorized("Invalid password".to_string()));
        }

        let now = Utc::now();
        let next_version = current.token_version + 1;
        let mut active: user::ActiveModel = current.into();
        active.deleted_at = Set(Some(now.into()));
        active.token_version = Set(next_version);
        active.updated_at = Set(Some(now.into()));
        self.user_repo.update(active).await?;

        tracing::info!(user_id = %caller.id, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::password::hash_password;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use warden_db::entities::user::{UserRole, UserStatus};

    fn test_user() -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            name: None,
            bio: None,
            avatar_url: None,
            password_hash: hash_password("hunter22").unwrap(),
            role: UserRole::User,
            status: UserStatus::Active,
            token_version: 0,
            email_verified_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    fn service(db: MockDatabase) -> UserService {
        UserService::new(UserRepository::new(Arc::new(db.into_connection())))
    }

    #[tokio::test]
    async fn test_update_profile_bio() {
        let user = test_user();
        let caller = Caller::from(&user);
        let mut updated = user.clone();
        updated.bio = Some("Hello".to_string());

        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[updated]]),
        );

        let result = svc
            .update_profile(
                &caller,
                UpdateProfileInput {
                    bio: Some("Hello".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(result.bio.as_deref(), Some("Hello"));
    }

    #[tokio::test]
    async fn test_update_profile_username_taken() {
        let user = test_user();
        let caller = Caller::from(&user);

        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]]),
        );

        let err = svc
            .update_profile(
                &caller,
                UpdateProfileInput {
                    username: Some("bob".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Conflict(ref m) if m == "Username already exists"));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_bad_avatar() {
        let caller = Caller::from(&test_user());
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = svc
            .update_profile(
                &caller,
                UpdateProfileInput {
                    avatar_url: Some("not a url".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_profile_measures_trimmed_username() {
        let caller = Caller::from(&test_user());
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        let err = svc
            .update_profile(
                &caller,
                UpdateProfileInput {
                    username: Some("  ab  ".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_delete_account_wrong_password() {
        let user = test_user();
        let caller = Caller::from(&user);
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user]]));

        let err = svc.delete_account(&caller, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(ref m) if m == "Invalid password"));
    }

    #[tokio::test]
    async fn test_delete_account_soft_deletes() {
        let user = test_user();
        let caller = Caller::from(&user);
        let mut deleted = user.clone();
        deleted.deleted_at = Some(Utc::now().into());
        deleted.token_version = 1;

        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .append_query_results([[deleted]]),
        );

        svc.delete_account(&caller, "hunter22").await.unwrap();
    }
}
