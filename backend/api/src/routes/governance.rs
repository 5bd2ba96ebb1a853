//! Governance procedures — proposals and voting.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rideshare_core::governance::{ProposalTier, VoteChoice};

use crate::auth::Caller;
use crate::db::{self, governance::ProposalRow};
use crate::errors::{ApiError, Result};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateProposalBody {
    pub title: String,
    pub description: String,
    pub tier: String,
}

#[derive(Deserialize)]
pub struct VoteBody {
    pub choice: String,
}

#[derive(Serialize)]
pub struct ProposalsResponse {
    pub count: usize,
    pub proposals: Vec<ProposalRow>,
}

/// `POST /governance/proposals`
pub async fn create_proposal(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<CreateProposalBody>,
) -> Result<Json<ProposalRow>> {
    let tier = ProposalTier::parse(&body.tier)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown tier: {}", body.tier)))?;

    let proposal = db::governance::create_proposal(
        &state.pool,
        caller.id,
        &body.title,
        &body.description,
        tier,
        db::now(),
    )
    .await?;

    Ok(Json(proposal))
}

/// `GET /governance/proposals`
pub async fn list_proposals(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
) -> Result<Json<ProposalsResponse>> {
    let proposals = db::governance::list_proposals(&state.pool).await?;
    Ok(Json(ProposalsResponse {
        count: proposals.len(),
        proposals,
    }))
}

/// `GET /governance/proposals/:id`
pub async fn get_proposal(
    State(state): State<Arc<AppState>>,
    _caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<ProposalRow>> {
    let proposal = db::governance::get_proposal(&state.pool, id).await?;
    Ok(Json(proposal))
}

/// `POST /governance/proposals/:id/vote`
pub async fn vote(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<VoteBody>,
) -> Result<Json<ProposalRow>> {
    let choice = VoteChoice::parse(&body.choice)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown choice: {}", body.choice)))?;

    let proposal = db::governance::cast_vote(&state.pool, id, caller.id, choice, db::now()).await?;
    Ok(Json(proposal))
}
