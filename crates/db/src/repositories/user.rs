//! User repository.

use std::sync::Arc;

use crate::{
    entities::{
        User,
        user::{self, UserRole},
    },
    map_db_err,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use warden_common::{AppError, AppResult};

/// User repository for database operations.
///
/// Lookups skip soft-deleted accounts unless the method name says otherwise.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a live user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a live user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by ID, including soft-deleted accounts.
    pub async fn find_any_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find users by IDs, including soft-deleted accounts.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a live user by email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .filter(user::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Find a live user whose email or username equals `identifier`.
    pub async fn find_by_identifier(&self, identifier: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::Email.eq(identifier))
                    .add(user::Column::Username.eq(identifier)),
            )
            .filter(user::Column::DeletedAt.is_null())
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Whether any account, deleted or not, other than `except_id` uses `email`.
    pub async fn email_taken(&self, email: &str, except_id: Option<&str>) -> AppResult<bool> {
        let mut query = User::find().filter(user::Column::Email.eq(email));
        if let Some(id) = except_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        let count = query.count(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(count > 0)
    }

    /// Whether any account, deleted or not, other than `except_id` uses `username`.
    pub async fn username_taken(&self, username: &str, except_id: Option<&str>) -> AppResult<bool> {
        let mut query = User::find().filter(user::Column::Username.eq(username));
        if let Some(id) = except_id {
            query = query.filter(user::Column::Id.ne(id));
        }

        let count = query.count(self.db.as_ref()).await.map_err(map_db_err)?;
        Ok(count > 0)
    }

    /// The live `SUPER_ADMIN` with the earliest creation timestamp.
    ///
    /// Queried on every decision; never cached.
    pub async fn find_first_super_admin<C: ConnectionTrait>(
        &self,
        conn: &C,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Role.eq(UserRole::SuperAdmin))
            .filter(user::Column::DeletedAt.is_null())
            .order_by_asc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .one(conn)
            .await
            .map_err(map_db_err)
    }

    /// Re-read a live user with a row lock held until the transaction ends.
    pub async fn lock_by_id<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> AppResult<user::Model> {
        User::find_by_id(id)
            .filter(user::Column::DeletedAt.is_null())
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(map_db_err)?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        self.update_in(self.db.as_ref(), model).await
    }

    /// Update a user on the given connection or transaction.
    pub async fn update_in<C: ConnectionTrait>(
        &self,
        conn: &C,
        model: user::ActiveModel,
    ) -> AppResult<user::Model> {
        model.update(conn).await.map_err(map_db_err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::entities::user::UserStatus;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Set};

    fn create_test_user(id: &str, username: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            name: Some("Test User".to_string()),
            bio: None,
            avatar_url: None,
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            role,
            status: UserStatus::Active,
            token_version: 0,
            email_verified_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let user = create_test_user("user1", "testuser", UserRole::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.find_by_id("user1").await.unwrap();

        let found_user = result.unwrap();
        assert_eq!(found_user.id, "user1");
        assert_eq!(found_user.username, "testuser");
    }

    #[tokio::test]
    async fn test_find_by_id_skips_deleted() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db.clone());
        assert!(repo.find_by_id("gone").await.unwrap().is_none());

        drop(repo);
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let sql = format!("{:?}", conn.into_transaction_log());
        assert!(sql.contains("deleted_at"));
        assert!(sql.contains("IS NULL"));
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        let result = repo.get_by_id("nonexistent").await;

        match result {
            Err(AppError::UserNotFound(id)) => assert_eq!(id, "nonexistent"),
            _ => panic!("Expected UserNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_first_super_admin_orders_by_creation() {
        let mut anchor = create_test_user("sa1", "root", UserRole::SuperAdmin);
        anchor.created_at = (Utc::now() - Duration::days(365)).into();

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[anchor]])
                .into_connection(),
        );

        let repo = UserRepository::new(db.clone());
        let found = repo.find_first_super_admin(db.as_ref()).await.unwrap();
        assert_eq!(found.unwrap().id, "sa1");

        drop(repo);
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let sql = format!("{:?}", conn.into_transaction_log());
        assert!(sql.contains("ORDER BY"));
        assert!(sql.contains("created_at"));
    }

    #[tokio::test]
    async fn test_lock_by_id_uses_row_lock() {
        let user = create_test_user("user1", "target", UserRole::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user]])
                .into_connection(),
        );

        let repo = UserRepository::new(db.clone());
        repo.lock_by_id(db.as_ref(), "user1").await.unwrap();

        drop(repo);
        let Ok(conn) = Arc::try_unwrap(db) else {
            panic!("connection still shared");
        };
        let log = conn.into_transaction_log();
        assert_eq!(log.len(), 1);
        assert!(format!("{log:?}").contains("FOR UPDATE"));
    }

    #[tokio::test]
    async fn test_email_taken() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(1))
                }]])
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(0))
                }]])
                .into_connection(),
        );

        let repo = UserRepository::new(db);
        assert!(repo.email_taken("a@example.com", None).await.unwrap());
        assert!(
            !repo
                .username_taken("fresh", Some("user1"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_user() {
        let user = create_test_user("user1", "newuser", UserRole::User);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = UserRepository::new(db);

        let active = user::ActiveModel {
            id: Set("user1".to_string()),
            username: Set("newuser".to_string()),
            email: Set("newuser@example.com".to_string()),
            ..Default::default()
        };

        let result = repo.create(active).await.unwrap();
        assert_eq!(result.username, "newuser");
    }
}
