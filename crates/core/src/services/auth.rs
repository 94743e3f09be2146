//! Authentication flows: login, registration and password management.

use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;
use warden_common::{AppError, AppResult, Config, IdGenerator};
use warden_db::{
    entities::{
        password_reset_token,
        user::{self, UserRole, UserStatus},
    },
    map_db_err,
    repositories::{PasswordResetRepository, UserRepository},
};

use crate::services::{
    email::MailerService,
    gate::Caller,
    moderation::ModerationService,
    password::{hash_password, verify_password},
    token::TokenService,
};

/// Response to every password reset request, whether or not the email is known.
pub const RESET_REQUESTED_MESSAGE: &str =
    "If your email is registered, you will receive a password reset link";

/// Login input. `identifier` is an email or a username.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginInput {
    #[validate(length(min = 3))]
    pub identifier: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

/// Registration input.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

/// Password reset request input.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequestInput {
    #[validate(email)]
    pub email: String,
}

/// Password update with a reset token.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordInput {
    #[validate(length(min = 1))]
    pub reset_token: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

/// Password change by an authenticated user.
#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordInput {
    #[validate(length(min = 1))]
    pub old_password: String,
    #[validate(length(min = 6, max = 128))]
    pub new_password: String,
}

/// A credential and the user it was issued for.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: user::Model,
}

fn invalid_credentials() -> AppError {
    AppError::Unauthorized("Invalid credentials".to_string())
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    db: Arc<DatabaseConnection>,
    user_repo: UserRepository,
    reset_repo: PasswordResetRepository,
    moderation: ModerationService,
    tokens: TokenService,
    mailer: MailerService,
    id_gen: IdGenerator,
    reset_ttl: Duration,
}

impl AuthService {
    /// Create a new auth service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        user_repo: UserRepository,
        reset_repo: PasswordResetRepository,
        moderation: ModerationService,
        tokens: TokenService,
        mailer: MailerService,
        config: &Config,
    ) -> Self {
        Self {
            db,
            user_repo,
            reset_repo,
            moderation,
            tokens,
            mailer,
            id_gen: IdGenerator::new(),
            reset_ttl: Duration::minutes(config.auth.reset_token_ttl_minutes),
        }
    }

    /// Verify credentials and issue an access credential.
    pub async fn login(&self, input: LoginInput) -> AppResult<AuthSession> {
        input.validate()?;

        let user = self
            .user_repo
            .find_by_identifier(input.identifier.trim())
            .await?
            .ok_or_else(invalid_credentials)?;

        if user.password_hash.is_empty() || !verify_password(&input.password, &user.password_hash) {
            tracing::debug!(user_id = %user.id, "Login with wrong password");
            return Err(invalid_credentials());
        }

        let user = self.moderation.thaw_if_expired(user).await?;

        match user.status {
            UserStatus::Banned => {
                return Err(AppError::Forbidden("Account is banned".to_string()));
            }
            UserStatus::Frozen => {
                return Err(AppError::Forbidden("Account is frozen".to_string()));
            }
            UserStatus::Passive => {
                return Err(AppError::Forbidden(
                    "Account is passive. Please contact support to reactivate your account."
                        .to_string(),
                ));
            }
            UserStatus::Active => {}
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(AuthSession { token, user })
    }

    /// Create an account with role `USER` and issue a credential.
    pub async fn register(&self, mut input: RegisterInput) -> AppResult<AuthSession> {
        input.username = input.username.trim().to_string();
        input.email = input.email.trim().to_string();
        input.validate()?;

        let username = input.username.as_str();
        let email = input.email.as_str();

        if self.user_repo.email_taken(email, None).await? {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }
        if self.user_repo.username_taken(username, None).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let now = Utc::now();
        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            name: Set(None),
            bio: Set(None),
            avatar_url: Set(None),
            password_hash: Set(hash_password(&input.password)?),
            role: Set(UserRole::User),
            status: Set(UserStatus::Active),
            token_version: Set(0),
            email_verified_at: Set(Some(now.into())),
            created_at: Set(now.into()),
            updated_at: Set(None),
            deleted_at: Set(None),
        };

        let user = self.user_repo.create(model).await?;
        let token = self.tokens.issue(&user)?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(AuthSession { token, user })
    }

    /// Issue a reset token and hand it to the mailer.
    ///
    /// The answer is the same whether or not the email is registered or
    /// delivery succeeded.
    pub async fn request_password_reset(&self, mut input: ResetRequestInput) -> AppResult<&'static str> {
        input.email = input.email.trim().to_string();
        input.validate()?;

        let Some(user) = self.user_repo.find_by_email(&input.email).await? else {
            return Ok(RESET_REQUESTED_MESSAGE);
        };

        let now = Utc::now();
        let token = self.id_gen.generate_token();
        self.reset_repo
            .create(password_reset_token::ActiveModel {
                token: Set(token.clone()),
                email: Set(user.email.clone()),
                expires_at: Set((now + self.reset_ttl).into()),
                created_at: Set(now.into()),
            })
            .await?;

        if let Err(e) = self.mailer.send_password_reset(&user.email, &token).await {
            tracing::error!(user_id = %user.id, error = %e, "Failed to send password reset email");
            if let Err(e) = self.reset_repo.delete_by_token(self.db.as_ref(), &token).await {
                tracing::error!(error = %e, "Failed to discard undelivered reset token");
            }
        }

        Ok(RESET_REQUESTED_MESSAGE)
    }

    /// Set a new password with a reset token.
    ///
    /// Consumes the token and every other outstanding token for the account,
    /// and invalidates its access credentials.
    pub async fn update_password(&self, input: UpdatePasswordInput) -> AppResult<()> {
        input.validate()?;

        let invalid = || AppError::Validation("Invalid or expired reset token".to_string());
        let record = self
            .reset_repo
            .find_by_token(&input.reset_token)
            .await?
            .ok_or_else(invalid)?;
        if record.expires_at <= Utc::now() {
            return Err(invalid());
        }

        let user = self
            .user_repo
            .find_by_email(&record.email)
            .await?
            .ok_or_else(|| AppError::UserNotFound(record.email.clone()))?;
        let password_hash = hash_password(&input.new_password)?;

        let txn = self.db.begin().await.map_err(map_db_err)?;

        // Single use: of two concurrent redemptions only one deletes the row.
        if self.reset_repo.delete_by_token(&txn, &record.token).await? != 1 {
            return Err(invalid());
        }

        let target = self.user_repo.lock_by_id(&txn, &user.id).await?;
        let next_version = target.token_version + 1;
        let mut active: user::ActiveModel = target.into();
        active.password_hash = Set(password_hash);
        active.token_version = Set(next_version);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update_in(&txn, active).await?;

        self.reset_repo.delete_by_email(&txn, &record.email).await?;

        txn.commit().await.map_err(map_db_err)?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    /// Change the caller's password after checking the old one.
    pub async fn change_password(&self, caller: &Caller, input: ChangePasswordInput) -> AppResult<()> {
        input.validate()?;

        let user = self.user_repo.get_by_id(&caller.id).await?;
        if !verify_password(&input.old_password, &user.password_hash) {
            return Err(AppError::Unauthorized("Invalid old password".to_string()));
        }

        let mut active: user::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&input.new_password)?);
        active.updated_at = Set(Some(Utc::now().into()));
        self.user_repo.update(active).await?;

        tracing::info!(user_id = %caller.id, "Password changed");
        Ok(())
    }
}
