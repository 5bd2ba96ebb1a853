//! Insurance pool aggregates and claims.
//!
//! The pool row is a singleton that is only ever incremented or decremented,
//! never recomputed. Claim review is a `pending → approved/rejected` CAS;
//! approved payouts draw on reserves through a non-negativity-guarded update.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct InsurancePoolRow {
    pub id: i64,
    pub total_reserves: i64,
    pub total_claims_requested: i64,
    pub total_claims_paid: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClaimRow {
    pub id: i64,
    pub claimant_id: i64,
    pub ride_id: i64,
    pub amount_requested: i64,
    pub description: String,
    pub status: String,
    pub approved_amount: Option<i64>,
    pub created_at: i64,
    pub reviewed_at: Option<i64>,
}

const CLAIM_COLUMNS: &str = r#"
    id, claimant_id, ride_id, amount_requested, description, status,
    approved_amount, created_at, reviewed_at
"#;

pub async fn get_pool(pool: &SqlitePool) -> Result<InsurancePoolRow> {
    let row = sqlx::query_as::<_, InsurancePoolRow>(
        "SELECT id, total_reserves, total_claims_requested, total_claims_paid FROM insurance_pool WHERE id = 1",
    )
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_claim(pool: &SqlitePool, id: i64) -> Result<ClaimRow> {
    sqlx::query_as::<_, ClaimRow>(&format!(
        "SELECT {CLAIM_COLUMNS} FROM insurance_claims WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("claim {id} not found")))
}

/// File a claim against a ride the claimant took part in.
pub async fn file_claim(
    pool: &SqlitePool,
    claimant_id: i64,
    ride_id: i64,
    amount_requested: i64,
    description: &str,
    now: i64,
) -> Result<ClaimRow> {
    if amount_requested <= 0 {
        return Err(ApiError::BadRequest("amount_requested must be positive".to_string()));
    }

    let ride = super::rides::get_ride(pool, ride_id).await?;
    if claimant_id != ride.rider_id && Some(claimant_id) != ride.driver_id {
        return Err(ApiError::Forbidden(
            "only a party to the ride may file a claim against it".to_string(),
        ));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        INSERT INTO insurance_claims (claimant_id, ride_id, amount_requested, description, status, created_at)
        VALUES (?1, ?2, ?3, ?4, 'pending', ?5)
        "#,
    )
    .bind(claimant_id)
    .bind(ride_id)
    .bind(amount_requested)
    .bind(description)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "UPDATE insurance_pool SET total_claims_requested = total_claims_requested + ?1 WHERE id = 1",
    )
    .bind(amount_requested)
    .execute(&mut *tx)
    .await?;

    let claim_id = result.last_insert_rowid();
    tx.commit().await?;

    get_claim(pool, claim_id).await
}

/// Review a pending claim.
///
/// `decision` is `approved` or `rejected`. Approval pays
/// `approved_amount` (defaulting to the requested amount) out of pool
/// reserves; a payout the reserves cannot cover fails with `Conflict` and the
/// claim stays pending.
pub async fn review_claim(
    pool: &SqlitePool,
    claim_id: i64,
    decision: &str,
    approved_amount: Option<i64>,
    now: i64,
) -> Result<ClaimRow> {
    if decision != "approved" && decision != "rejected" {
        return Err(ApiError::BadRequest(format!("unknown decision: {decision}")));
    }

    let claim = get_claim(pool, claim_id).await?;

    let payout = if decision == "approved" {
        let amount = approved_amount.unwrap_or(claim.amount_requested);
        if amount <= 0 || amount > claim.amount_requested {
            return Err(ApiError::BadRequest(
                "approved_amount must be positive and at most the requested amount".to_string(),
            ));
        }
        Some(amount)
    } else {
        None
    };

    let mut tx = pool.begin().await?;

    let affected = sqlx::query(
        r#"
        UPDATE insurance_claims
        SET    status = ?1, approved_amount = ?2, reviewed_at = ?3
        WHERE  id = ?4 AND status = 'pending'
        "#,
    )
    .bind(decision)
    .bind(payout)
    .bind(now)
    .bind(claim_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::Conflict("claim has already been reviewed".to_string()));
    }

    if let Some(amount) = payout {
        let paid = sqlx::query(
            r#"
            UPDATE insurance_pool
            SET    total_reserves = total_reserves - ?1, total_claims_paid = total_claims_paid + ?1
            WHERE  id = 1 AND total_reserves >= ?1
            "#,
        )
        .bind(amount)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if paid == 0 {
            return Err(ApiError::Conflict(
                "insufficient insurance pool reserves for this payout".to_string(),
            ));
        }
    }

    tx.commit().await?;

    get_claim(pool, claim_id).await
}
