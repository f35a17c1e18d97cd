use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Failure taxonomy shared by stores, services and handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid credentials")]
    Authentication,
    #[error("Not logged in")]
    Unauthorized,
    #[error("Access denied")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Authentication | AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Maps a unique-constraint violation to `Conflict` with the given message.
    pub fn conflict_on_unique(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
        move |e| match constraint_code(&e).as_deref() {
            Some(UNIQUE_VIOLATION) => AppError::Conflict(message.into()),
            _ => AppError::from(e),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match constraint_code(&e).as_deref() {
            Some(UNIQUE_VIOLATION) => AppError::Conflict("Resource already exists".into()),
            Some(FOREIGN_KEY_VIOLATION) => {
                AppError::Validation("Referenced resource does not exist".into())
            }
            _ => AppError::Storage(anyhow::Error::new(e)),
        }
    }
}

fn constraint_code(e: &sqlx::Error) -> Option<String> {
    match e {
        sqlx::Error::Database(db) => db.code().map(|c| c.into_owned()),
        _ => None,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Storage(e) => {
                error!(error = %format!("{e:#}"), "storage error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}
