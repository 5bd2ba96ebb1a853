//! Axum REST API handlers.
//!
//! Handlers stay thin: resolve the caller, validate the request shape, call
//! into the database layer, wrap the result. All precondition and ownership
//! failures arrive as [`crate::errors::ApiError`] and serialize to a JSON
//! error body with the matching status code.

pub mod governance;
pub mod insurance;
pub mod rides;
pub mod users;

use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
