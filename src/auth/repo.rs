use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::repo_types::{User, UserCredentials};
use crate::error::AppError;
use crate::sessions::{repo::insert_session, NewSession};

const EMAIL_TAKEN: &str = "Email already registered";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts the user and its first session atomically.
    async fn create_with_session(
        &self,
        email: &str,
        password_hash: &str,
        session: &NewSession,
    ) -> Result<Uuid, AppError>;
    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError>;
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError>;
    /// `false` when the user does not exist.
    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, AppError>;
    /// Removes sessions, recipes and the user in one transaction.
    /// `false` when the user was already gone.
    async fn delete_cascade(&self, user_id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_with_session(
        &self,
        email: &str,
        password_hash: &str,
        session: &NewSession,
    ) -> Result<Uuid, AppError> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::conflict_on_unique(EMAIL_TAKEN))?;

        insert_session(&mut *tx, user_id, session).await?;

        tx.commit().await.context("commit tx")?;
        Ok(user_id)
    }

    async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            r#"
            SELECT id, password_hash
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(creds)
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email FROM users WHERE id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn update_credentials(
        &self,
        user_id: Uuid,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, AppError> {
        let res = sqlx::query(
            r#"
            UPDATE users
               SET email = $2, password_hash = $3
             WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(email)
        .bind(password_hash)
        .execute(&self.db)
        .await
        .map_err(AppError::conflict_on_unique(EMAIL_TAKEN))?;
        Ok(res.rows_affected() == 1)
    }

    async fn delete_cascade(&self, user_id: Uuid) -> Result<bool, AppError> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        // Row lock serializes concurrent deletions of the same account.
        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            debug!(%user_id, "delete requested for missing user");
            return Ok(false);
        }

        let sessions = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let recipes = sqlx::query("DELETE FROM recipes WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.context("commit tx")?;
        info!(%user_id, sessions, recipes, "user deleted");
        Ok(true)
    }
}
