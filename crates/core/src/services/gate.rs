//! Request admission: credential to caller.

use serde::Serialize;
use warden_common::{AppError, AppResult};
use warden_db::{
    entities::user::{self, UserRole, UserStatus},
    repositories::UserRepository,
};

use crate::services::{policy::Party, token::TokenService};

/// The authenticated caller of a request.
///
/// Built once per request by the gate and passed explicitly to every
/// operation that needs to know who is acting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caller {
    /// User id.
    pub id: String,
    /// Username.
    pub username: String,
    /// Email.
    pub email: String,
    /// Current role.
    pub role: UserRole,
    /// Current status.
    pub status: UserStatus,
}

impl Caller {
    /// The caller as a policy party.
    #[must_use]
    pub fn party(&self) -> Party<'_> {
        Party::new(&self.id, self.role)
    }

    /// Whether the caller holds an administrative role.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&user::Model> for Caller {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            status: user.status,
        }
    }
}

/// Reject banned and frozen accounts.
pub fn check_admission(status: UserStatus) -> AppResult<()> {
    match status {
        UserStatus::Banned => Err(AppError::Forbidden("Account is banned".to_string())),
        UserStatus::Frozen => Err(AppError::Forbidden("Account is frozen".to_string())),
        UserStatus::Active | UserStatus::Passive => Ok(()),
    }
}

/// Reject callers whose role is not in `allowed`.
pub fn require_role(caller: &Caller, allowed: &[UserRole]) -> AppResult<()> {
    if allowed.contains(&caller.role) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Insufficient permissions".to_string()))
    }
}

/// Extract the token from an `Authorization` header value.
pub fn bearer_token(header: Option<&str>) -> AppResult<&str> {
    let header = header
        .ok_or_else(|| AppError::Unauthorized("Authorization header is required".to_string()))?;

    match header.split_once(' ') {
        Some((scheme, token)) if scheme == "Bearer" && !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AppError::Unauthorized(
            "Invalid authorization header format".to_string(),
        )),
    }
}

/// Resolves callers from access credentials.
#[derive(Clone)]
pub struct RequestGate {
    user_repo: UserRepository,
    tokens: TokenService,
}

impl RequestGate {
    /// Create a new gate.
    #[must_use]
    pub const fn new(user_repo: UserRepository, tokens: TokenService) -> Self {
        Self { user_repo, tokens }
    }

    /// Admit a request carrying `authorization`, or say why not.
    ///
    /// Missing, malformed, invalid or outdated credentials and unknown users
    /// are `Unauthorized`; banned and frozen accounts are `Forbidden`.
    pub async fn admit(&self, authorization: Option<&str>) -> AppResult<Caller> {
        let token = bearer_token(authorization)?;
        let claims = self.tokens.verify(token)?;

        let user = self
            .user_repo
            .find_by_id(&claims.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        if user.token_version != claims.ver {
            tracing::debug!(user_id = %user.id, "Rejected revoked access token");
            return Err(AppError::Unauthorized("Invalid token".to_string()));
        }

        check_admission(user.status)?;
        Ok(Caller::from(&user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;
    use warden_common::config::AuthConfig;

    fn tokens() -> TokenService {
        TokenService::new(&AuthConfig {
            jwt_secret: "gate-secret".to_string(),
            token_ttl_hours: 24,
            reset_token_ttl_minutes: 60,
        })
        .unwrap()
    }

    fn test_user(status: UserStatus, token_version: i32) -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            name: None,
            bio: None,
            avatar_url: None,
            password_hash: String::new(),
            role: UserRole::User,
            status,
            token_version,
            email_verified_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    fn gate_with(rows: Vec<user::Model>) -> RequestGate {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([rows])
                .into_connection(),
        );
        RequestGate::new(UserRepository::new(db), tokens())
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc")).unwrap(), "abc");
        assert!(matches!(
            bearer_token(None),
            Err(AppError::Unauthorized(ref m)) if m == "Authorization header is required"
        ));
        for bad in ["abc", "Basic abc", "Bearer ", "bearer abc"] {
            assert!(matches!(
                bearer_token(Some(bad)),
                Err(AppError::Unauthorized(ref m)) if m == "Invalid authorization header format"
            ));
        }
    }

    #[test]
    fn test_check_admission() {
        assert!(check_admission(UserStatus::Active).is_ok());
        assert!(check_admission(UserStatus::Passive).is_ok());
        assert!(matches!(
            check_admission(UserStatus::Banned),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            check_admission(UserStatus::Frozen),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_require_role() {
        let caller = Caller::from(&test_user(UserStatus::Active, 0));
        assert!(require_role(&caller, &[UserRole::User]).is_ok());
        assert!(matches!(
            require_role(&caller, &[UserRole::Admin, UserRole::SuperAdmin]),
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_admit_active_user() {
        let user = test_user(UserStatus::Active, 0);
        let token = tokens().issue(&user).unwrap();
        let gate = gate_with(vec![user]);

        let caller = gate.admit(Some(&format!("Bearer {token}"))).await.unwrap();
        assert_eq!(caller.id, "user1");
        assert_eq!(caller.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_admit_rejects_frozen_user() {
        let user = test_user(UserStatus::Frozen, 0);
        let token = tokens().issue(&user).unwrap();
        let gate = gate_with(vec![user]);

        let result = gate.admit(Some(&format!("Bearer {token}"))).await;
        assert!(matches!(result, Err(AppError::Forbidden(ref m)) if m == "Account is frozen"));
    }

    #[tokio::test]
    async fn test_admit_rejects_unknown_user() {
        let token = tokens().issue(&test_user(UserStatus::Active, 0)).unwrap();
        let gate = gate_with(Vec::new());

        let result = gate.admit(Some(&format!("Bearer {token}"))).await;
        assert!(matches!(result, Err(AppError::Unauthorized(ref m)) if m == "User not found"));
    }

    #[tokio::test]
    async fn test_admit_rejects_revoked_token() {
        let token = tokens().issue(&test_user(UserStatus::Active, 0)).unwrap();
        let gate = gate_with(vec![test_user(UserStatus::Active, 1)]);

        let result = gate.admit(Some(&format!("Bearer {token}"))).await;
        assert!(matches!(result, Err(AppError::Unauthorized(ref m)) if m == "Invalid token"));
    }
}
