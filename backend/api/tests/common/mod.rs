#![allow(dead_code)]

//! Shared fixtures for the integration tests.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use api::config::FarePolicy;
use api::db;
use api::db::rides::RideRow;
use rideshare_core::RideStatus;

/// Fresh in-memory database with migrations applied. A single connection
/// keeps every query on the same memory store.
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool
}

pub async fn create_rider(pool: &SqlitePool, name: &str) -> i64 {
    db::users::create_user(pool, name, "rider", 0).await.unwrap().id
}

pub async fn create_admin(pool: &SqlitePool, name: &str) -> i64 {
    db::users::create_user(pool, name, "admin", 0).await.unwrap().id
}

pub async fn create_driver(pool: &SqlitePool, name: &str, vehicle: &str) -> i64 {
    let id = db::users::create_user(pool, name, "rider", 0).await.unwrap().id;
    db::users::onboard_driver(pool, id, vehicle).await.unwrap();
    id
}

/// Seed a balance through the ledger so reconciliation holds in every test.
pub async fn grant_tokens(pool: &SqlitePool, user_id: i64, amount: i64) {
    db::tokens::admin_adjust(pool, user_id, amount, "seed grant", 0)
        .await
        .unwrap();
}

/// Drive a fresh ride through the full happy path and settle it at the quote.
pub async fn completed_ride(pool: &SqlitePool, rider: i64, driver: i64, fare: i64) -> RideRow {
    let ride = db::rides::request_ride(pool, rider, "Dock A", "Terminal B", 10_000, fare, 100)
        .await
        .unwrap();
    db::rides::accept_ride(pool, ride.id, driver, 110).await.unwrap();
    for (status, at) in [(RideStatus::DriverArriving, 120), (RideStatus::InProgress, 130)] {
        db::rides::update_status(
            pool,
            FarePolicy::FixedQuote,
            ride.id,
            driver,
            status,
            None,
            None,
            at,
        )
        .await
        .unwrap();
    }
    db::rides::update_status(
        pool,
        FarePolicy::FixedQuote,
        ride.id,
        rider,
        RideStatus::Completed,
        None,
        None,
        140,
    )
    .await
    .unwrap()
}
