//! Insurance procedures — pool aggregates and claims.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::auth::Caller;
use crate::db::{
    self,
    insurance::{ClaimRow, InsurancePoolRow},
};
use crate::errors::Result;
use crate::AppState;

#[derive(Deserialize)]
pub struct FileClaimBody {
    pub ride_id: i64,
    pub amount_requested: i64,
    pub description: String,
}

#[derive(Deserialize)]
pub struct ReviewClaimBody {
    /// `approved` or `rejected`.
    pub decision: String,
    /// Payout override; defaults to the requested amount on approval.
    pub approved_amount: Option<i64>,
}

/// `GET /insurance/pool`
pub async fn get_pool(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
) -> Result<Json<InsurancePoolRow>> {
    let pool = db::insurance::get_pool(&state.pool).await?;
    Ok(Json(pool))
}

/// `POST /insurance/claims`
pub async fn file_claim(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<FileClaimBody>,
) -> Result<Json<ClaimRow>> {
    let claim = db::insurance::file_claim(
        &state.pool,
        caller.id,
        body.ride_id,
        body.amount_requested,
        &body.description,
        db::now(),
    )
    .await?;
    Ok(Json(claim))
}

/// `POST /insurance/claims/:id/review`
pub async fn review_claim(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<ReviewClaimBody>,
) -> Result<Json<ClaimRow>> {
    caller.require_admin()?;

    let claim = db::insurance::review_claim(
        &state.pool,
        id,
        &body.decision,
        body.approved_amount,
        db::now(),
    )
    .await?;
    Ok(Json(claim))
}
