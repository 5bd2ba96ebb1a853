//! Users and driver profiles.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::errors::{ApiError, Result};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub display_name: String,
    pub role: String,
    pub token_balance: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct DriverProfileRow {
    pub user_id: i64,
    pub vehicle: String,
    pub is_available: bool,
    pub total_rides: i64,
    pub total_earnings: i64,
    pub rating_sum: i64,
    pub rating_count: i64,
}

pub async fn create_user(
    pool: &SqlitePool,
    display_name: &str,
    role: &str,
    now: i64,
) -> Result<UserRow> {
    if display_name.trim().is_empty() {
        return Err(ApiError::BadRequest("display_name must not be empty".to_string()));
    }

    let result = sqlx::query(
        "INSERT INTO users (display_name, role, token_balance, created_at) VALUES (?1, ?2, 0, ?3)",
    )
    .bind(display_name)
    .bind(role)
    .bind(now)
    .execute(pool)
    .await?;

    get_user(pool, result.last_insert_rowid()).await
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> Result<UserRow> {
    sqlx::query_as::<_, UserRow>(
        "SELECT id, display_name, role, token_balance, created_at FROM users WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))
}

/// Register (or refresh) the caller as a driver.
///
/// Sets the user's role and upserts the vehicle onto the profile. Lifetime
/// aggregates survive a vehicle change.
pub async fn onboard_driver(pool: &SqlitePool, user_id: i64, vehicle: &str) -> Result<DriverProfileRow> {
    if vehicle.trim().is_empty() {
        return Err(ApiError::BadRequest("vehicle must not be empty".to_string()));
    }

    // Make sure the user exists before touching two tables.
    get_user(pool, user_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE users SET role = 'driver' WHERE id = ?1 AND role != 'admin'")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO driver_profiles (user_id, vehicle, is_available)
        VALUES (?1, ?2, 1)
        ON CONFLICT (user_id) DO UPDATE SET vehicle = excluded.vehicle, is_available = 1
        "#,
    )
    .bind(user_id)
    .bind(vehicle)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    get_driver_profile(pool, user_id).await
}

pub async fn get_driver_profile(pool: &SqlitePool, user_id: i64) -> Result<DriverProfileRow> {
    sqlx::query_as::<_, DriverProfileRow>(
        r#"
        SELECT user_id, vehicle, is_available, total_rides, total_earnings,
               rating_sum, rating_count
        FROM   driver_profiles
        WHERE  user_id = ?1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| ApiError::NotFound(format!("driver profile for user {user_id} not found")))
}
