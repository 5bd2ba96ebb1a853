//! Rideshare marketplace API — entry point.
//!
//! Opens the SQLite pool, runs migrations, spawns the background proposal
//! resolver, and serves the Axum REST API for riders, drivers, and admins.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use api::config::Config;
use api::resolver::{self, ResolverState};
use api::routes;
use api::{db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    // Load config from environment.
    let config = Config::from_env().map_err(|e| anyhow::anyhow!("{e}"))?;

    // Set up the SQLite connection pool and run migrations.
    let pool = db::init_pool(&config.database_url).await?;

    // ─── Background proposal resolver ─────────────────────
    let resolver_state = Arc::new(ResolverState {
        pool: pool.clone(),
        config: config.clone(),
    });
    tokio::spawn(resolver::run(resolver_state));

    // ─── REST API ─────────────────────────────────────────
    let state = Arc::new(AppState {
        pool,
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(routes::health))
        .route("/users", post(routes::users::create_user))
        .route("/users/:id/balance", get(routes::users::get_balance))
        .route("/users/:id/transactions", get(routes::users::list_transactions))
        .route("/users/:id/reconcile", get(routes::users::reconcile))
        .route("/users/:id/tokens", post(routes::users::adjust_tokens))
        .route("/drivers/onboard", post(routes::users::onboard_driver))
        .route("/rides", post(routes::rides::request_ride))
        .route("/rides/open", get(routes::rides::list_open))
        .route("/rides/:id", get(routes::rides::get_ride))
        .route("/rides/:id/accept", post(routes::rides::accept_ride))
        .route("/rides/:id/status", post(routes::rides::update_status))
        .route("/rides/:id/rate", post(routes::rides::rate_ride))
        .route(
            "/governance/proposals",
            post(routes::governance::create_proposal).get(routes::governance::list_proposals),
        )
        .route("/governance/proposals/:id", get(routes::governance::get_proposal))
        .route("/governance/proposals/:id/vote", post(routes::governance::vote))
        .route("/insurance/pool", get(routes::insurance::get_pool))
        .route("/insurance/claims", post(routes::insurance::file_claim))
        .route("/insurance/claims/:id/review", post(routes::insurance::review_claim))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.api_port);
    info!("API listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
