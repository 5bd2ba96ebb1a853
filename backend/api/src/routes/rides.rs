//! Ride procedures — request, driver feed, accept, status updates, rating.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rideshare_core::fees::quote_fare;
use rideshare_core::RideStatus;

use crate::auth::{Caller, UserRole};
use crate::db::{self, rides::RideRow};
use crate::errors::{ApiError, Result};
use crate::AppState;

#[derive(Deserialize)]
pub struct RequestRideBody {
    pub pickup: String,
    pub dropoff: String,
    pub distance_m: i64,
}

#[derive(Deserialize)]
pub struct UpdateStatusBody {
    pub status: String,
    /// Cancellation reason; only meaningful with `status = "cancelled"`.
    pub reason: Option<String>,
    /// Metered final fare; only accepted under the metered fare policy.
    pub final_fare: Option<i64>,
}

#[derive(Deserialize)]
pub struct RateBody {
    pub rating: i64,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct RidesResponse {
    pub count: usize,
    pub rides: Vec<RideRow>,
}

/// `POST /rides`
///
/// Quotes a fare from the trip distance and opens a `requested` ride.
pub async fn request_ride(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<RequestRideBody>,
) -> Result<Json<RideRow>> {
    if body.distance_m <= 0 {
        return Err(ApiError::BadRequest("distance_m must be positive".to_string()));
    }
    if body.pickup.trim().is_empty() || body.dropoff.trim().is_empty() {
        return Err(ApiError::BadRequest("pickup and dropoff must not be empty".to_string()));
    }

    let estimated_fare = quote_fare(body.distance_m);
    let ride = db::rides::request_ride(
        &state.pool,
        caller.id,
        &body.pickup,
        &body.dropoff,
        body.distance_m,
        estimated_fare,
        db::now(),
    )
    .await?;

    Ok(Json(ride))
}

/// `GET /rides/open`
///
/// The feed of unclaimed rides that drivers poll.
pub async fn list_open(
    State(state): State<Arc<AppState>>,
    caller: Caller,
) -> Result<Json<RidesResponse>> {
    if caller.role == UserRole::Rider {
        return Err(ApiError::Forbidden("driver role required".to_string()));
    }

    let rides = db::rides::list_open(&state.pool).await?;
    Ok(Json(RidesResponse {
        count: rides.len(),
        rides,
    }))
}

/// `GET /rides/:id`
pub async fn get_ride(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<RideRow>> {
    let ride = db::rides::get_ride(&state.pool, id).await?;

    let is_party = caller.id == ride.rider_id || Some(caller.id) == ride.driver_id;
    if !is_party && caller.role != UserRole::Admin {
        return Err(ApiError::Forbidden("not a party to this ride".to_string()));
    }

    Ok(Json(ride))
}

/// `POST /rides/:id/accept`
pub async fn accept_ride(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<RideRow>> {
    let ride = db::rides::accept_ride(&state.pool, id, caller.id, db::now()).await?;
    Ok(Json(ride))
}

/// `POST /rides/:id/status`
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<UpdateStatusBody>,
) -> Result<Json<RideRow>> {
    let new_status = RideStatus::parse(&body.status)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown status: {}", body.status)))?;

    let ride = db::rides::update_status(
        &state.pool,
        state.config.fare_policy,
        id,
        caller.id,
        new_status,
        body.reason.as_deref(),
        body.final_fare,
        db::now(),
    )
    .await?;

    Ok(Json(ride))
}

/// `POST /rides/:id/rate`
pub async fn rate_ride(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<RateBody>,
) -> Result<Json<RideRow>> {
    let ride =
        db::rides::rate_ride(&state.pool, id, caller.id, body.rating, body.comment.as_deref())
            .await?;
    Ok(Json(ride))
}
