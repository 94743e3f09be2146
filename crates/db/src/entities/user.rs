//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use warden_common::{AppError, AppResult};

/// Authorization role. A user holds exactly one at any time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "EDITOR")]
    Editor,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "SUPER_ADMIN")]
    SuperAdmin,
}

impl UserRole {
    /// Wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Editor => "EDITOR",
            Self::Admin => "ADMIN",
            Self::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Parse a wire name. Unknown names are a validation error.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value {
            "USER" => Ok(Self::User),
            "EDITOR" => Ok(Self::Editor),
            "ADMIN" => Ok(Self::Admin),
            "SUPER_ADMIN" => Ok(Self::SuperAdmin),
            other => Err(AppError::Validation(format!("Invalid role: {other}"))),
        }
    }

    /// Whether the role may use the moderation endpoints.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

/// Account status. Independent of the role axis.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "passive")]
    Passive,
    #[sea_orm(string_value = "frozen")]
    Frozen,
    #[sea_orm(string_value = "banned")]
    Banned,
}

impl UserStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passive => "passive",
            Self::Frozen => "frozen",
            Self::Banned => "banned",
        }
    }

    /// Parse a wire name, case-insensitively. Unknown names are a validation error.
    pub fn parse(value: &str) -> AppResult<Self> {
        match value.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "passive" => Ok(Self::Passive),
            "frozen" => Ok(Self::Frozen),
            "banned" => Ok(Self::Banned),
            _ => Err(AppError::Validation(format!("Invalid status: {value}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Display name
    #[sea_orm(nullable)]
    pub name: Option<String>,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    #[sea_orm(nullable)]
    pub avatar_url: Option<String>,

    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    pub status: UserStatus,

    /// Session generation. Credentials minted for an older value are rejected.
    pub token_version: i32,

    #[sea_orm(nullable)]
    pub email_verified_at: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,

    /// Soft-delete marker. Deleted users keep their ledger rows.
    #[sea_orm(nullable)]
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// Whether the account has been soft-deleted.
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in [
            UserRole::User,
            UserRole::Editor,
            UserRole::Admin,
            UserRole::SuperAdmin,
        ] {
            assert_eq!(UserRole::parse(role.as_str()).ok(), Some(role));
        }
    }

    #[test]
    fn test_role_unknown_is_validation_error() {
        assert!(matches!(
            UserRole::parse("MODERATOR"),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(UserRole::parse("admin"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(UserStatus::parse("FROZEN").ok(), Some(UserStatus::Frozen));
        assert_eq!(UserStatus::parse("passive").ok(), Some(UserStatus::Passive));
        assert!(matches!(
            UserStatus::parse("deleted"),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(UserRole::SuperAdmin.is_admin());
        assert!(!UserRole::Editor.is_admin());
        assert!(!UserRole::User.is_admin());
    }
}
