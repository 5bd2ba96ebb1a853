//! Rideshare marketplace backend.
//!
//! An Axum REST service over a SQLite relational schema. The interesting
//! writes — ride acceptance, completion settlement, vote casting, claim
//! review — run as single transactions whose compare-and-set precondition is
//! the state transition itself, so concurrent callers lose cleanly instead of
//! racing. Pure business rules (fare split, lifecycle table, tally math) live
//! in the `rideshare_core` crate.

pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod resolver;
pub mod routes;

use sqlx::SqlitePool;

use config::Config;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
}
