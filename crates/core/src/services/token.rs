//! Access credential issuing and verification.

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use warden_common::{AppError, AppResult, config::AuthConfig};
use warden_db::entities::user::{self, UserRole};

/// Claims carried by an access credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub user_id: String,
    /// Username at issue time.
    pub username: String,
    /// Email at issue time.
    pub email: String,
    /// Role at issue time. Informational; the gate reloads the user.
    pub role: UserRole,
    /// The user's `token_version` at issue time.
    pub ver: i32,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Not before (unix seconds).
    pub nbf: i64,
    /// Expiry (unix seconds).
    pub exp: i64,
}

/// Issues and verifies HS256 access credentials.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service from the auth configuration.
    pub fn new(config: &AuthConfig) -> AppResult<Self> {
        if config.jwt_secret.is_empty() {
            return Err(AppError::Config("auth.jwt_secret must not be empty".to_string()));
        }
        if config.token_ttl_hours <= 0 {
            return Err(AppError::Config(
                "auth.token_ttl_hours must be positive".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl: Duration::hours(config.token_ttl_hours),
        })
    }

    /// Mint a credential for `user`.
    pub fn issue(&self, user: &user::Model) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            user_id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            ver: user.token_version,
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
    }

    /// Check the signature and time window of a credential.
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::default();
        validation.validate_nbf = true;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "Rejected access token");
                AppError::Unauthorized("Invalid token".to_string())
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use warden_db::entities::user::UserStatus;

    fn config(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.to_string(),
            token_ttl_hours: 24,
            reset_token_ttl_minutes: 60,
        }
    }

    fn test_user() -> user::Model {
        user::Model {
            id: "user1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            name: None,
            bio: None,
            avatar_url: None,
            password_hash: String::new(),
            role: UserRole::Editor,
            status: UserStatus::Active,
            token_version: 3,
            email_verified_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let service = TokenService::new(&config("secret")).unwrap();
        let token = service.issue(&test_user()).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.user_id, "user1");
        assert_eq!(claims.role, UserRole::Editor);
        assert_eq!(claims.ver, 3);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let issuer = TokenService::new(&config("secret")).unwrap();
        let other = TokenService::new(&config("another")).unwrap();
        let token = issuer.issue(&test_user()).unwrap();

        assert!(matches!(
            other.verify(&token),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = TokenService::new(&config("secret")).unwrap();
        let past = Utc::now() - Duration::hours(48);
        let claims = Claims {
            user_id: "user1".to_string(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            role: UserRole::User,
            ver: 0,
            iat: past.timestamp(),
            nbf: past.timestamp(),
            exp: (past + Duration::hours(24)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &service.encoding_key).unwrap();

        assert!(service.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_is_rejected() {
        let service = TokenService::new(&config("secret")).unwrap();
        assert!(service.verify("not.a.jwt").is_err());
    }

    #[test]
    fn test_empty_secret_is_config_error() {
        assert!(matches!(
            TokenService::new(&config("")),
            Err(AppError::Config(_))
        ));
    }
}
