//! Database layer for warden.
//!
//! Entities, migrations and repositories for users and the moderation ledger
//! (role, ban and freeze history).

pub mod entities;
pub mod migrations;
pub mod repositories;
pub mod test_utils;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::time::Duration;
use tracing::log::LevelFilter;
use warden_common::{AppError, Config};

/// Initialize database connection.
pub async fn init(config: &Config) -> Result<DatabaseConnection, AppError> {
    let mut opt = ConnectOptions::new(&config.database.url);

    opt.max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .connect_timeout(Duration::from_secs(10))
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(config.database.max_lifetime_secs))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug);

    Database::connect(opt)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Run pending migrations.
pub async fn migrate(db: &DatabaseConnection) -> Result<(), AppError> {
    use sea_orm_migration::MigratorTrait;
    migrations::Migrator::up(db, None)
        .await
        .map_err(|e| AppError::Database(e.to_string()))
}

/// Map a storage error into the application error taxonomy.
///
/// Unique violations become [`AppError::Conflict`] so that a lost race on a
/// unique index reads the same as the pre-check that would have caught it.
#[must_use]
pub fn map_db_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            AppError::Conflict(conflict_message(&detail).to_string())
        }
        _ => AppError::Database(err.to_string()),
    }
}

fn conflict_message(detail: &str) -> &'static str {
    if detail.contains("idx_user_email") {
        "Email already exists"
    } else if detail.contains("idx_user_username") {
        "Username already exists"
    } else if detail.contains("idx_ban_history_one_active") {
        "User is already banned"
    } else if detail.contains("idx_freeze_history_one_active") {
        "Account already has an active freeze"
    } else {
        "Resource already exists"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_by_index() {
        assert_eq!(
            conflict_message("duplicate key value violates unique constraint \"idx_user_email\""),
            "Email already exists"
        );
        assert_eq!(
            conflict_message("unique constraint \"idx_ban_history_one_active\""),
            "User is already banned"
        );
        assert_eq!(conflict_message("something else"), "Resource already exists");
    }

    #[test]
    fn test_plain_error_maps_to_database() {
        let err = map_db_err(DbErr::Custom("connection reset".to_string()));
        assert!(matches!(err, AppError::Database(_)));
    }
}
