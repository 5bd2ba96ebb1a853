//! Ride lifecycle writes — request, accept, status transitions, settlement.
//!
//! Transition legality is decided once, against the central table in
//! `rideshare_core::ride`; the write then re-checks the observed prior status
//! atomically (`UPDATE ... WHERE status = ?`). Zero rows affected means a
//! concurrent caller won the transition, and the request fails with
//! `Conflict` instead of applying twice. Completion settlement rides on the
//! same guard: the status CAS is what makes the ledger credits exactly-once.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use rideshare_core::fees::{self, split_fare};
use rideshare_core::RideStatus;

use crate::config::FarePolicy;
use crate::errors::{is_unique_violation, ApiError, Result};

use super::tokens::{self, category};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RideRow {
    pub id: i64,
    pub rider_id: i64,
    pub driver_id: Option<i64>,
    pub status: String,
    pub pickup: String,
    pub dropoff: String,
    pub distance_m: i64,
    pub estimated_fare: i64,
    pub actual_fare: Option<i64>,
    pub insurance_fee: Option<i64>,
    pub developer_fee: Option<i64>,
    pub buyback_fee: Option<i64>,
    pub driver_earnings: Option<i64>,
    pub rating: Option<i64>,
    pub rating_comment: Option<String>,
    pub requested_at: i64,
    pub accepted_at: Option<i64>,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub cancel_reason: Option<String>,
}

impl RideRow {
    /// The stored status, decoded against the lifecycle table.
    pub fn parsed_status(&self) -> Result<RideStatus> {
        RideStatus::parse(&self.status)
            .ok_or_else(|| ApiError::StateParse(format!("unknown ride status: {}", self.status)))
    }
}

const RIDE_COLUMNS: &str = r#"
    id, rider_id, driver_id, status, pickup, dropoff, distance_m,
    estimated_fare, actual_fare, insurance_fee, developer_fee, buyback_fee,
    driver_earnings, rating, rating_comment, requested_at, accepted_at,
    started_at, completed_at, cancelled_at, cancel_reason
"#;

pub async fn get_ride(pool: &SqlitePool, id: i64) -> Result<RideRow> {
    sqlx::query_as::<_, RideRow>(&format!("SELECT {RIDE_COLUMNS} FROM rides WHERE id = ?1"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("ride {id} not found")))
}

/// Open (not yet accepted) rides, oldest first — the feed drivers poll.
pub async fn list_open(pool: &SqlitePool) -> Result<Vec<RideRow>> {
    let rows = sqlx::query_as::<_, RideRow>(&format!(
        "SELECT {RIDE_COLUMNS} FROM rides WHERE status = 'requested' ORDER BY requested_at ASC, id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Create a ride in `requested` status.
///
/// The partial unique index on active rides makes a second request by the
/// same rider fail atomically; no existence pre-check is needed.
pub async fn request_ride(
    pool: &SqlitePool,
    rider_id: i64,
    pickup: &str,
    dropoff: &str,
    distance_m: i64,
    estimated_fare: i64,
    now: i64,
) -> Result<RideRow> {
    let result = sqlx::query(
        r#"
        INSERT INTO rides (rider_id, status, pickup, dropoff, distance_m, estimated_fare, requested_at)
        VALUES (?1, 'requested', ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(rider_id)
    .bind(pickup)
    .bind(dropoff)
    .bind(distance_m)
    .bind(estimated_fare)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(done) => get_ride(pool, done.last_insert_rowid()).await,
        Err(e) if is_unique_violation(&e) => Err(ApiError::Conflict(
            "rider already has an active ride".to_string(),
        )),
        Err(e) => Err(e.into()),
    }
}

/// Claim an open ride for `driver_id`.
///
/// The `requested → accepted` CAS is the race guard against a second driver;
/// the partial unique index rejects a driver who already holds an active ride.
pub async fn accept_ride(pool: &SqlitePool, ride_id: i64, driver_id: i64, now: i64) -> Result<RideRow> {
    let profile = super::users::get_driver_profile(pool, driver_id)
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => {
                ApiError::Forbidden("caller is not an onboarded driver".to_string())
            }
            other => other,
        })?;

    if !profile.is_available {
        return Err(ApiError::Conflict("driver is not available".to_string()));
    }

    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE rides SET status = 'accepted', driver_id = ?1, accepted_at = ?2
        WHERE  id = ?3 AND status = 'requested'
        "#,
    )
    .bind(driver_id)
    .bind(now)
    .bind(ride_id)
    .execute(&mut *tx)
    .await;

    let affected = match result {
        Ok(done) => done.rows_affected(),
        Err(e) if is_unique_violation(&e) => {
            return Err(ApiError::Conflict(
                "driver already has an active ride".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if affected == 0 {
        drop(tx);
        // Distinguish a missing ride from one that was claimed first.
        get_ride(pool, ride_id).await?;
        return Err(ApiError::Conflict("ride is not open for acceptance".to_string()));
    }

    sqlx::query("UPDATE driver_profiles SET is_available = 0 WHERE user_id = ?1")
        .bind(driver_id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    get_ride(pool, ride_id).await
}

/// Apply a status-only lifecycle transition requested by one of the parties.
///
/// `completed` triggers fee settlement; `cancelled` records the reason and
/// settles nothing. `accepted` is not reachable here — acceptance assigns a
/// driver and has its own procedure.
#[allow(clippy::too_many_arguments)]
pub async fn update_status(
    pool: &SqlitePool,
    fare_policy: FarePolicy,
    ride_id: i64,
    caller_id: i64,
    new_status: RideStatus,
    cancel_reason: Option<&str>,
    final_fare: Option<i64>,
    now: i64,
) -> Result<RideRow> {
    let ride = get_ride(pool, ride_id).await?;

    if caller_id != ride.rider_id && Some(caller_id) != ride.driver_id {
        return Err(ApiError::Forbidden(
            "only the rider or the assigned driver may update this ride".to_string(),
        ));
    }

    if matches!(new_status, RideStatus::Requested | RideStatus::Accepted) {
        return Err(ApiError::BadRequest(format!(
            "status '{}' cannot be set through this procedure",
            new_status.as_str()
        )));
    }

    let observed = ride.parsed_status()?;
    if !observed.can_transition(new_status) {
        return Err(ApiError::Conflict(format!(
            "illegal transition from '{}' to '{}'",
            observed.as_str(),
            new_status.as_str()
        )));
    }

    match new_status {
        RideStatus::DriverArriving => {
            let affected = sqlx::query(
                "UPDATE rides SET status = 'driver_arriving' WHERE id = ?1 AND status = ?2",
            )
            .bind(ride_id)
            .bind(observed.as_str())
            .execute(pool)
            .await?
            .rows_affected();
            if affected == 0 {
                return Err(concurrent_transition(observed, new_status));
            }
        }
        RideStatus::InProgress => {
            let affected = sqlx::query(
                "UPDATE rides SET status = 'in_progress', started_at = ?1 WHERE id = ?2 AND status = ?3",
            )
            .bind(now)
            .bind(ride_id)
            .bind(observed.as_str())
            .execute(pool)
            .await?
            .rows_affected();
            if affected == 0 {
                return Err(concurrent_transition(observed, new_status));
            }
        }
        RideStatus::Completed => {
            let actual_fare = match (fare_policy, final_fare) {
                (FarePolicy::FixedQuote, None) => ride.estimated_fare,
                (FarePolicy::FixedQuote, Some(_)) => {
                    return Err(ApiError::BadRequest(
                        "final_fare is not accepted under the fixed-quote policy".to_string(),
                    ));
                }
                (FarePolicy::Metered, Some(fare)) if fare >= 0 => fare,
                (FarePolicy::Metered, Some(_)) => {
                    return Err(ApiError::BadRequest("final_fare must be non-negative".to_string()));
                }
                (FarePolicy::Metered, None) => ride.estimated_fare,
            };
            settle_completion(pool, &ride, actual_fare, now).await?;
        }
        RideStatus::Cancelled => {
            let affected = sqlx::query(
                "UPDATE rides SET status = 'cancelled', cancelled_at = ?1, cancel_reason = ?2 WHERE id = ?3 AND status = ?4",
            )
            .bind(now)
            .bind(cancel_reason)
            .bind(ride_id)
            .bind(observed.as_str())
            .execute(pool)
            .await?
            .rows_affected();
            if affected == 0 {
                return Err(concurrent_transition(observed, new_status));
            }
            if let Some(driver_id) = ride.driver_id {
                sqlx::query("UPDATE driver_profiles SET is_available = 1 WHERE user_id = ?1")
                    .bind(driver_id)
                    .execute(pool)
                    .await?;
            }
        }
        RideStatus::Requested | RideStatus::Accepted => unreachable!(),
    }

    get_ride(pool, ride_id).await
}

fn concurrent_transition(observed: RideStatus, wanted: RideStatus) -> ApiError {
    ApiError::Conflict(format!(
        "ride left status '{}' before it could move to '{}'",
        observed.as_str(),
        wanted.as_str()
    ))
}

/// Settle a completing ride: one transaction covering the status CAS, the fee
/// fields, the insurance-pool reserve, both token credits with their ledger
/// rows, and the driver's lifetime aggregates.
///
/// The `in_progress → completed` CAS in step one is the idempotency guard: a
/// second completion attempt affects zero rows, the transaction rolls back,
/// and no balance is credited twice.
async fn settle_completion(pool: &SqlitePool, ride: &RideRow, actual_fare: i64, now: i64) -> Result<()> {
    let driver_id = ride
        .driver_id
        .ok_or_else(|| ApiError::Conflict("ride has no assigned driver".to_string()))?;

    let split = split_fare(actual_fare);

    let mut tx = pool.begin().await?;

    let affected = sqlx::query(
        r#"
        UPDATE rides
        SET    status = 'completed', completed_at = ?1, actual_fare = ?2,
               insurance_fee = ?3, developer_fee = ?4, buyback_fee = ?5,
               driver_earnings = ?6
        WHERE  id = ?7 AND status = 'in_progress'
        "#,
    )
    .bind(now)
    .bind(actual_fare)
    .bind(split.insurance_fee)
    .bind(split.developer_fee)
    .bind(split.buyback_fee)
    .bind(split.driver_earnings)
    .bind(ride.id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::Conflict(
            "ride is not in progress; settlement already applied or ride cancelled".to_string(),
        ));
    }

    sqlx::query("UPDATE insurance_pool SET total_reserves = total_reserves + ?1 WHERE id = 1")
        .bind(split.insurance_fee)
        .execute(&mut *tx)
        .await?;

    tokens::apply_token_delta(
        &mut tx,
        driver_id,
        fees::DRIVER_RIDE_TOKENS,
        category::RIDE_REWARD,
        Some(ride.id),
        "driver reward for completed ride",
        now,
    )
    .await?;

    tokens::apply_token_delta(
        &mut tx,
        ride.rider_id,
        fees::RIDER_RIDE_TOKENS,
        category::RIDE_REWARD,
        Some(ride.id),
        "rider reward for completed ride",
        now,
    )
    .await?;

    sqlx::query(
        r#"
        UPDATE driver_profiles
        SET    total_rides = total_rides + 1, total_earnings = total_earnings + ?1,
               is_available = 1
        WHERE  user_id = ?2
        "#,
    )
    .bind(split.driver_earnings)
    .bind(driver_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Record the rider's rating of a completed ride, once.
pub async fn rate_ride(
    pool: &SqlitePool,
    ride_id: i64,
    caller_id: i64,
    rating: i64,
    comment: Option<&str>,
) -> Result<RideRow> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::BadRequest("rating must be between 1 and 5".to_string()));
    }

    let ride = get_ride(pool, ride_id).await?;

    if caller_id != ride.rider_id {
        return Err(ApiError::Forbidden("only the rider may rate this ride".to_string()));
    }

    if ride.parsed_status()? != RideStatus::Completed {
        return Err(ApiError::BadRequest("ride is not completed".to_string()));
    }

    let mut tx = pool.begin().await?;

    let affected = sqlx::query(
        r#"
        UPDATE rides SET rating = ?1, rating_comment = ?2
        WHERE  id = ?3 AND status = 'completed' AND rating IS NULL
        "#,
    )
    .bind(rating)
    .bind(comment)
    .bind(ride_id)
    .execute(&mut *tx)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(ApiError::BadRequest("ride has already been rated".to_string()));
    }

    if let Some(driver_id) = ride.driver_id {
        sqlx::query(
            "UPDATE driver_profiles SET rating_sum = rating_sum + ?1, rating_count = rating_count + 1 WHERE user_id = ?2",
        )
        .bind(rating)
        .bind(driver_id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    get_ride(pool, ride_id).await
}
