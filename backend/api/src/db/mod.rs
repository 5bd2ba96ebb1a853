//! Database layer — migrations and transactional queries.
//!
//! Every multi-step mutation in the submodules runs inside a single
//! transaction with a compare-and-set precondition (`UPDATE ... WHERE status =
//! ...`, checked via `rows_affected`). The state transition is the concurrency
//! guard; no lock is taken beyond the storage engine's transaction isolation.

pub mod governance;
pub mod insurance;
pub mod rides;
pub mod tokens;
pub mod users;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use crate::errors::Result;

/// Open the SQLite pool and bring the schema up to date.
///
/// The schema leans on foreign keys and partial unique indexes, so FK
/// enforcement is switched on per connection; the database file is created on
/// first boot. A handful of connections is enough — SQLite serialises writers
/// anyway, and every marketplace mutation is a short transaction.
pub async fn init_pool(database_url: &str) -> Result<SqlitePool> {
    // DATABASE_URL may be a bare file path or a full `sqlite:` URL.
    let url = match database_url.strip_prefix("sqlite:") {
        Some(_) => database_url.to_string(),
        None => format!("sqlite:{database_url}"),
    };

    let options = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Schema migrations up to date");
    Ok(pool)
}

/// Current wall-clock time as unix seconds.
pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
