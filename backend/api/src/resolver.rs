//! Background task that resolves expired governance proposals.
//!
//! Resolution is deadline-driven data, not a scheduling primitive: the loop
//! just wakes up, settles every active proposal whose window has closed, and
//! sleeps. Errors are logged and retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;
use tracing::{error, info};

use crate::config::Config;
use crate::db;

pub struct ResolverState {
    pub pool: SqlitePool,
    pub config: Config,
}

/// Spawn the resolver loop as a background [`tokio`] task.
pub async fn run(state: Arc<ResolverState>) {
    info!(
        "Proposal resolver starting — interval {}s",
        state.config.resolve_interval_secs
    );

    loop {
        match db::governance::resolve_due(&state.pool, db::now()).await {
            Ok((0, 0)) => {}
            Ok((passed, rejected)) => {
                info!("Resolved {} proposals ({passed} passed, {rejected} rejected)", passed + rejected);
            }
            Err(e) => {
                error!("Proposal resolution error: {e}");
            }
        }

        tokio::time::sleep(Duration::from_secs(state.config.resolve_interval_secs)).await;
    }
}
