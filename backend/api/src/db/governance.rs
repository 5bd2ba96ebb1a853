//! Proposals and votes.
//!
//! Tallies accumulate additively on the proposal row while it is active; each
//! vote snapshots the voter's balance as its power at cast time. Resolution
//! happens after the deadline, re-reading the frozen tallies inside its own
//! transaction so a boundary-second vote cannot slip between read and write.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use rideshare_core::fees::MIN_TOKENS_FOR_PROPOSAL;
use rideshare_core::governance::{resolve, ProposalOutcome, ProposalStatus, ProposalTier, VoteChoice};

use crate::errors::{is_unique_violation, ApiError, Result};

use super::tokens;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProposalRow {
    pub id: i64,
    pub proposer_id: i64,
    pub title: String,
    pub description: String,
    pub tier: String,
    pub votes_for: i64,
    pub votes_against: i64,
    pub total_voting_power: i64,
    pub status: String,
    pub voting_ends_at: i64,
    pub created_at: i64,
}

impl ProposalRow {
    pub fn parsed_tier(&self) -> Result<ProposalTier> {
        ProposalTier::parse(&self.tier)
            .ok_or_else(|| ApiError::StateParse(format!("unknown proposal tier: {}", self.tier)))
    }

    pub fn parsed_status(&self) -> Result<ProposalStatus> {
        ProposalStatus::parse(&self.status)
            .ok_or_else(|| ApiError::StateParse(format!("unknown proposal status: {}", self.status)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct VoteRow {
    pub proposal_id: i64,
    pub voter_id: i64,
    pub choice: String,
    pub voting_power: i64,
    pub created_at: i64,
}

const PROPOSAL_COLUMNS: &str = r#"
    id, proposer_id, title, description, tier, votes_for, votes_against,
    total_voting_power, status, voting_ends_at, created_at
"#;

/// Open a proposal. The proposer must hold at least
/// [`MIN_TOKENS_FOR_PROPOSAL`] RIDE.
pub async fn create_proposal(
    pool: &SqlitePool,
    proposer_id: i64,
    title: &str,
    description: &str,
    tier: ProposalTier,
    now: i64,
) -> Result<ProposalRow> {
    if title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let proposer = super::users::get_user(pool, proposer_id).await?;
    if proposer.token_balance < MIN_TOKENS_FOR_PROPOSAL {
        return Err(ApiError::Forbidden(format!(
            "at least {MIN_TOKENS_FOR_PROPOSAL} RIDE required to open a proposal"
        )));
    }

    let voting_ends_at = now + tier.voting_period_hours() * 3_600;

    let result = sqlx::query(
        r#"
        INSERT INTO proposals (proposer_id, title, description, tier, status, voting_ends_at, created_at)
        VALUES (?1, ?2, ?3, ?4, 'active', ?5, ?6)
        "#,
    )
    .bind(proposer_id)
    .bind(title)
    .bind(description)
    .bind(tier.as_str())
    .bind(voting_ends_at)
    .bind(now)
    .execute(pool)
    .await?;

    get_proposal(pool, result.last_insert_rowid()).await
}

pub async fn get_proposal(pool: &SqlitePool, id: i64) -> Result<ProposalRow> {
    sqlx::query_as::<_, ProposalRow>(&format!(
        "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("proposal {id} not found")))
}

/// All proposals, newest first.
pub async fn list_proposals(pool: &SqlitePool) -> Result<Vec<ProposalRow>> {
    let rows = sqlx::query_as::<_, ProposalRow>(&format!(
        "SELECT {PROPOSAL_COLUMNS} FROM proposals ORDER BY created_at DESC, id DESC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Cast one weighted, immutable vote.
///
/// Voting power is the caller's balance at cast time — a snapshot, not a live
/// reference. The unique index on `(proposal_id, voter_id)` rejects a second
/// cast; the tally bump is CAS-guarded on the proposal still being active.
pub async fn cast_vote(
    pool: &SqlitePool,
    proposal_id: i64,
    voter_id: i64,
    choice: VoteChoice,
    now: i64,
) -> Result<ProposalRow> {
    let mut tx = pool.begin().await?;

    let proposal = sqlx::query_as::<_, ProposalRow>(&format!(
        "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = ?1"
    ))
    .bind(proposal_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("proposal {proposal_id} not found")))?;

    if proposal.parsed_status()? != ProposalStatus::Active {
        return Err(ApiError::BadRequest("proposal is not active".to_string()));
    }
    if now > proposal.voting_ends_at {
        return Err(ApiError::BadRequest("voting period has ended".to_string()));
    }

    let (voting_power,): (i64,) = sqlx::query_as("SELECT token_balance FROM users WHERE id = ?1")
        .bind(voter_id)
        .fetch_one(&mut *tx)
        .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO votes (proposal_id, voter_id, choice, voting_power, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(proposal_id)
    .bind(voter_id)
    .bind(choice.as_str())
    .bind(voting_power)
    .bind(now)
    .execute(&mut *tx)
    .await;

    match result {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::BadRequest(
                "user has already voted on this proposal".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let (for_delta, against_delta) = match choice {
        VoteChoice::For => (voting_power, 0),
        VoteChoice::Against => (0, voting_power),
    };

    let affected = sqlx::query(
        r#"
        UPDATE proposals
        SET    votes_for = votes_for + ?1, votes_against = votes_against + ?2,
               total_voting_power = total_voting_power + ?3
        WHERE  id = ?4 AND status = 'active'
        "#,
    )
    .bind(for_delta)
    .bind(against_delta)
    .bind(voting_power)
    .bind(proposal_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::BadRequest("proposal is not active".to_string()));
    }

    tx.commit().await?;

    get_proposal(pool, proposal_id).await
}

/// Resolve every active proposal whose voting window has closed.
///
/// Returns `(passed, rejected)` counts. Each proposal resolves in its own
/// transaction: the tallies are re-read inside it and the status write is a
/// CAS on `active`, so a concurrent resolver pass settles each proposal once.
pub async fn resolve_due(pool: &SqlitePool, now: i64) -> Result<(u64, u64)> {
    let due: Vec<(i64,)> = sqlx::query_as(
        "SELECT id FROM proposals WHERE status = 'active' AND voting_ends_at <= ?1",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;

    let mut passed = 0u64;
    let mut rejected = 0u64;

    for (id,) in due {
        let mut tx = pool.begin().await?;

        let proposal = sqlx::query_as::<_, ProposalRow>(&format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = ?1 AND status = 'active'"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(proposal) = proposal else {
            continue; // settled by a concurrent pass
        };

        let total_supply = tokens::total_supply(&mut tx).await?;
        let outcome = resolve(
            proposal.votes_for,
            proposal.votes_against,
            proposal.total_voting_power,
            total_supply,
            proposal.parsed_tier()?,
        );

        let new_status = match outcome {
            ProposalOutcome::Passed => ProposalStatus::Passed,
            ProposalOutcome::Rejected => ProposalStatus::Rejected,
        };

        let affected = sqlx::query("UPDATE proposals SET status = ?1 WHERE id = ?2 AND status = 'active'")
            .bind(new_status.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if affected == 1 {
            tx.commit().await?;
            match outcome {
                ProposalOutcome::Passed => passed += 1,
                ProposalOutcome::Rejected => rejected += 1,
            }
        }
    }

    Ok((passed, rejected))
}
