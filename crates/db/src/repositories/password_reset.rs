//! Password reset token repository.

use std::sync::Arc;

use crate::{
    entities::{PasswordResetToken, password_reset_token},
    map_db_err,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use warden_common::AppResult;

/// Password reset token repository.
#[derive(Clone)]
pub struct PasswordResetRepository {
    db: Arc<DatabaseConnection>,
}

impl PasswordResetRepository {
    /// Create a new password reset repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Store a token.
    pub async fn create(
        &self,
        model: password_reset_token::ActiveModel,
    ) -> AppResult<password_reset_token::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_db_err)
    }

    /// Find a token.
    pub async fn find_by_token(
        &self,
        token: &str,
    ) -> AppResult<Option<password_reset_token::Model>> {
        PasswordResetToken::find_by_id(token)
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)
    }

    /// Delete one token, returning how many rows went.
    ///
    /// Inside a transaction this claims the token: a concurrent delete of the
    /// same token waits on the row and then removes nothing.
    pub async fn delete_by_token<C: ConnectionTrait>(&self, conn: &C, token: &str) -> AppResult<u64> {
        let result = PasswordResetToken::delete_by_id(token)
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }

    /// Delete every token issued for `email`.
    pub async fn delete_by_email<C: ConnectionTrait>(&self, conn: &C, email: &str) -> AppResult<u64> {
        let result = PasswordResetToken::delete_many()
            .filter(password_reset_token::Column::Email.eq(email))
            .exec(conn)
            .await
            .map_err(map_db_err)?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn test_find_by_token() {
        let token = password_reset_token::Model {
            token: "abc".to_string(),
            email: "user@example.com".to_string(),
            expires_at: (Utc::now() + Duration::hours(1)).into(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[token]])
                .into_connection(),
        );

        let repo = PasswordResetRepository::new(db);
        let found = repo.find_by_token("abc").await.unwrap();

        assert_eq!(found.unwrap().email, "user@example.com");
    }

    #[tokio::test]
    async fn test_delete_by_token_reports_missing_row() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PasswordResetRepository::new(db.clone());
        let removed = repo.delete_by_token(db.as_ref(), "gone").await.unwrap();

        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_delete_by_email() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = PasswordResetRepository::new(db.clone());
        let removed = repo
            .delete_by_email(db.as_ref(), "user@example.com")
            .await
            .unwrap();

        assert_eq!(removed, 2);
    }
}
