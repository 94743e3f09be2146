//! Database integration tests.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `warden_test`)
//!   `TEST_DB_PASSWORD` (default: `warden_test`)
//!   `TEST_DB_NAME` (default: `warden_test`)

#![allow(clippy::unwrap_used, clippy::expect_used)]

use chrono::Utc;
use sea_orm::{ConnectionTrait, Set, TransactionTrait};
use warden_common::{AppError, IdGenerator};
use warden_db::{
    entities::{
        ban_history::{self, BanDurationKind},
        user::{self, UserRole, UserStatus},
    },
    repositories::{ModerationRepository, UserRepository},
    test_utils::{TestDatabase, TestDbConfig},
};

fn new_user(ids: &IdGenerator, username: &str, role: UserRole) -> user::ActiveModel {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(ids.generate()),
        username: Set(username.to_string()),
        email: Set(format!("{username}@example.com")),
        name: Set(None),
        bio: Set(None),
        avatar_url: Set(None),
        password_hash: Set("not-a-real-hash".to_string()),
        role: Set(role),
        status: Set(UserStatus::Active),
        token_version: Set(0),
        email_verified_at: Set(Some(now.into())),
        created_at: Set(now.into()),
        updated_at: Set(None),
        deleted_at: Set(None),
    }
}

fn permanent_ban(ids: &IdGenerator, user_id: &str, issuer: &str) -> ban_history::ActiveModel {
    let now = Utc::now();
    ban_history::ActiveModel {
        id: Set(ids.generate()),
        user_id: Set(user_id.to_string()),
        banned_by_id: Set(issuer.to_string()),
        reason: Set("repeated harassment of other users".to_string()),
        duration_kind: Set(BanDurationKind::Permanent),
        duration_days: Set(None),
        start_date: Set(now.into()),
        end_date: Set(None),
        is_active: Set(true),
        unbanned_at: Set(None),
        unbanned_by: Set(None),
        created_at: Set(now.into()),
    }
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_database_connection() {
    let config = TestDbConfig::default();
    let result = TestDatabase::with_config(config).await;
    assert!(result.is_ok(), "Failed to connect: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_execute_query() {
    let db = TestDatabase::new().await.expect("Failed to connect");

    let result = db
        .connection()
        .execute(sea_orm::Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await;

    assert!(result.is_ok(), "Query failed: {:?}", result.err());
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_duplicate_email_is_conflict() {
    let db = TestDatabase::create_unique().await.expect("Failed to create");
    let conn = db.connection();
    let ids = IdGenerator::new();
    let users = UserRepository::new(conn);

    users
        .create(new_user(&ids, "alice", UserRole::User))
        .await
        .unwrap();

    let mut dup = new_user(&ids, "alice2", UserRole::User);
    dup.email = Set("alice@example.com".to_string());
    let err = users.create(dup).await.unwrap_err();

    assert!(matches!(err, AppError::Conflict(ref msg) if msg == "Email already exists"));
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_second_active_ban_is_rejected() {
    let db = TestDatabase::create_unique().await.expect("Failed to create");
    let conn = db.connection();
    let ids = IdGenerator::new();
    let users = UserRepository::new(conn.clone());
    let moderation = ModerationRepository::new(conn.clone());

    let admin = users
        .create(new_user(&ids, "admin", UserRole::Admin))
        .await
        .unwrap();
    let target = users
        .create(new_user(&ids, "target", UserRole::User))
        .await
        .unwrap();

    let txn = conn.begin().await.unwrap();
    moderation
        .insert_ban(&txn, permanent_ban(&ids, &target.id, &admin.id))
        .await
        .unwrap();
    txn.commit().await.unwrap();

    let err = moderation
        .insert_ban(conn.as_ref(), permanent_ban(&ids, &target.id, &admin.id))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(ref msg) if msg == "User is already banned"));

    let active = moderation
        .find_active_ban(conn.as_ref(), &target.id)
        .await
        .unwrap();
    assert!(active.is_some());
    db.drop_database().await.unwrap();
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_first_super_admin_is_oldest() {
    let db = TestDatabase::create_unique().await.expect("Failed to create");
    let conn = db.connection();
    let ids = IdGenerator::new();
    let users = UserRepository::new(conn.clone());

    let first = users
        .create(new_user(&ids, "root", UserRole::SuperAdmin))
        .await
        .unwrap();
    users
        .create(new_user(&ids, "second", UserRole::SuperAdmin))
        .await
        .unwrap();

    let found = users
        .find_first_super_admin(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, first.id);
    db.drop_database().await.unwrap();
}

#[test]
fn test_config_from_env() {
    let config = TestDbConfig::default();
    assert!(!config.host.is_empty());
    assert!(config.port > 0);
    assert!(!config.username.is_empty());
    assert!(!config.database.is_empty());
}

#[test]
fn test_database_url_format() {
    let config = TestDbConfig {
        host: "testhost".to_string(),
        port: 5432,
        username: "testuser".to_string(),
        password: "testpass".to_string(),
        database: "testdb".to_string(),
    };

    let url = config.database_url();
    assert!(url.starts_with("postgres://"));
    assert!(url.contains("testhost"));
    assert!(url.contains("5432"));
    assert!(url.contains("testuser"));
    assert!(url.contains("testdb"));
}
