use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::user::{NewUser, User};

/// Persistence for user rows as seen by the account workflow.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    /// Insert a new, not yet activated user. A taken email is `DatabaseError::Conflict`.
    async fn create(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn delete_by_email(&self, email: &str) -> Result<(), DatabaseError>;

    /// Mark the account activated and replace its token, only while the stored token is
    /// still `expected_token`. Returns whether a row changed.
    async fn activate(
        &self,
        id: i64,
        expected_token: &str,
        next_token: &str,
    ) -> Result<bool, DatabaseError>;

    /// Overwrite the stored token unconditionally (last writer wins)
    async fn replace_token(&self, id: i64, token: &str) -> Result<(), DatabaseError>;

    /// Store a new password hash and replace the token, only while the stored token is
    /// still `expected_token`. Returns whether a row changed.
    async fn reset_password(
        &self,
        id: i64,
        expected_token: &str,
        pass_hash: &str,
        next_token: &str,
    ) -> Result<bool, DatabaseError>;
}

const USER_COLUMNS: &str = "id, email, pass_hash, is_activated, is_admin, activation_token";

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, pass_hash, activation_token) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .bind(&user.pass_hash)
        .bind(&user.activation_token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_insert(e, format!("user '{}'", user.email)))?;

        tracing::info!(user_id = created.id, "Added new user {}", created.email);
        Ok(created)
    }

    async fn delete_by_email(&self, email: &str) -> Result<(), DatabaseError> {
        sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn activate(
        &self,
        id: i64,
        expected_token: &str,
        next_token: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET is_activated = TRUE, activation_token = $3 \
             WHERE id = $1 AND activation_token = $2",
        )
        .bind(id)
        .bind(expected_token)
        .bind(next_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn replace_token(&self, id: i64, token: &str) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE users SET activation_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        match result.rows_affected() {
            1 => Ok(()),
            0 => Err(DatabaseError::NotFound(format!("user {}", id))),
            n => Err(DatabaseError::QueryError(format!(
                "{} rows affected when replacing the token of user {}",
                n, id
            ))),
        }
    }

    async fn reset_password(
        &self,
        id: i64,
        expected_token: &str,
        pass_hash: &str,
        next_token: &str,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users SET pass_hash = $3, activation_token = $4 \
             WHERE id = $1 AND activation_token = $2",
        )
        .bind(id)
        .bind(expected_token)
        .bind(pass_hash)
        .bind(next_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
