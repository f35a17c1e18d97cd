use std::sync::Arc;

use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::UserStore;
use crate::auth::repo_types::User;
use crate::error::AppError;
use crate::sessions::{NewSession, SessionStore};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn validate_credentials(email: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_email(email) {
        return Err(AppError::Validation("Invalid email".into()));
    }
    if password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// PBKDF2 is CPU-bound; keep it off the async workers.
async fn hash_off_worker(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .context("password hashing task")?;
    Ok(hash)
}

async fn verify_off_worker(password: &str, record: &str) -> Result<bool, AppError> {
    let (password, record) = (password.to_owned(), record.to_owned());
    let ok = tokio::task::spawn_blocking(move || verify_password(&password, &record))
        .await
        .context("password verification task")?;
    Ok(ok)
}

/// Registration, login and account lifecycle on top of the user and session stores.
pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: Arc<dyn SessionStore>,
    session_ttl: time::Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: Arc<dyn SessionStore>,
        session_ttl: time::Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    /// Creates the account and logs it in. Returns `(user_id, session_id)`.
    pub async fn register(&self, email: &str, password: &str) -> Result<(Uuid, String), AppError> {
        validate_credentials(email, password)?;

        let hash = hash_off_worker(password).await?;
        let session = NewSession::issue(self.session_ttl, OffsetDateTime::now_utc());
        let user_id = self
            .users
            .create_with_session(email, &hash, &session)
            .await?;

        info!(%user_id, "user registered");
        Ok((user_id, session.id))
    }

    /// `None` for an unknown email and for a wrong password alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<String>, AppError> {
        let Some(creds) = self.users.find_credentials(email).await? else {
            warn!("login for unknown email");
            return Ok(None);
        };

        if !verify_off_worker(password, &creds.password_hash).await? {
            warn!(user_id = %creds.id, "login with invalid password");
            return Ok(None);
        }

        let session_id = self.sessions.create(creds.id).await?;
        info!(user_id = %creds.id, "user logged in");
        Ok(Some(session_id))
    }

    pub async fn logout(&self, session_id: &str) -> Result<(), AppError> {
        self.sessions.revoke(session_id).await
    }

    /// Replaces email and password. The current password is not re-checked.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        email: &str,
        password: &str,
    ) -> Result<(), AppError> {
        validate_credentials(email, password)?;

        let hash = hash_off_worker(password).await?;
        if !self.users.update_credentials(user_id, email, &hash).await? {
            return Err(AppError::NotFound("User"));
        }
        info!(%user_id, "user updated");
        Ok(())
    }

    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), AppError> {
        if !self.users.delete_cascade(user_id).await? {
            return Err(AppError::NotFound("User"));
        }
        Ok(())
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::NotFound("User"))
    }
}
