//! Default account seeding.

use chrono::Utc;
use sea_orm::Set;
use warden_common::{AppResult, IdGenerator, config::SeedConfig};
use warden_db::{
    entities::user::{self, UserRole, UserStatus},
    repositories::UserRepository,
};

use crate::services::password::hash_password;

/// Create the configured default account unless its email is already taken.
///
/// Returns the created user, or `None` when nothing was done.
pub async fn seed_default_user(
    user_repo: &UserRepository,
    seed: &SeedConfig,
) -> AppResult<Option<user::Model>> {
    if user_repo.email_taken(&seed.email, None).await? {
        tracing::info!(email = %seed.email, "Default user already exists");
        return Ok(None);
    }

    let role = UserRole::parse(&seed.role)?;
    let now = Utc::now();
    let model = user::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        username: Set(seed.username.clone()),
        email: Set(seed.email.clone()),
        name: Set(None),
        bio: Set(None),
        avatar_url: Set(None),
        password_hash: Set(hash_password(&seed.password)?),
        role: Set(role),
        status: Set(UserStatus::Active),
        token_version: Set(0),
        email_verified_at: Set(Some(now.into())),
        created_at: Set(now.into()),
        updated_at: Set(None),
        deleted_at: Set(None),
    };

    let user = user_repo.create(model).await?;
    tracing::info!(email = %user.email, role = role.as_str(), "Default user created");
    Ok(Some(user))
}
