use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;

use super::NewSession;
use crate::error::AppError;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persists a fresh session for `user_id` and returns its id.
    async fn create(&self, user_id: Uuid) -> Result<String, AppError>;
    /// Owner of a live session; expired and unknown ids both resolve to `None`.
    async fn resolve_user(&self, session_id: &str) -> Result<Option<Uuid>, AppError>;
    /// No-op when the session does not exist.
    async fn revoke(&self, session_id: &str) -> Result<(), AppError>;
    async fn sweep_expired(&self) -> Result<u64, AppError>;
}

#[derive(Clone)]
pub struct PgSessionStore {
    db: PgPool,
    ttl: time::Duration,
}

impl PgSessionStore {
    pub fn new(db: PgPool, ttl: time::Duration) -> Self {
        Self { db, ttl }
    }
}

/// Insert a session row; works on the pool or inside a transaction.
pub async fn insert_session<'e, E>(
    executor: E,
    user_id: Uuid,
    session: &NewSession,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(&session.id)
    .bind(user_id)
    .bind(session.expires_at)
    .execute(executor)
    .await?;
    Ok(())
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, user_id: Uuid) -> Result<String, AppError> {
        let session = NewSession::issue(self.ttl, OffsetDateTime::now_utc());
        insert_session(&self.db, user_id, &session).await?;
        debug!(%user_id, expires_at = %session.expires_at, "session created");
        Ok(session.id)
    }

    async fn resolve_user(&self, session_id: &str) -> Result<Option<Uuid>, AppError> {
        let user_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT user_id
              FROM sessions
             WHERE id = $1 AND expires_at > now()
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user_id)
    }

    async fn revoke(&self, session_id: &str) -> Result<(), AppError> {
        let res = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.db)
            .await?;
        debug!(removed = res.rows_affected(), "session revoked");
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<u64, AppError> {
        let res = sqlx::query("DELETE FROM sessions WHERE expires_at < now()")
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected())
    }
}
