//! Application-wide error types.
//!
//! The first four variants are the caller-facing taxonomy: every procedure
//! failure surfaces as one of them with a human-readable message. The rest are
//! infrastructure failures that map to a 500 without leaking detail.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("State parse error: {0}")]
    StateParse(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_)
            | ApiError::Migrate(_)
            | ApiError::Config(_)
            | ApiError::StateParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {self}");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!(ErrorResponse { error: body }))).into_response()
    }
}

/// True when `err` is a unique-constraint violation from the storage engine.
///
/// The schema encodes the single-active-ride and single-vote invariants as
/// unique indexes; callers translate the violation into `Conflict` or
/// `BadRequest` with a message naming the broken precondition.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
