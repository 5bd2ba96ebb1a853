//! User registration, driver onboarding, balances, and the token ledger.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{Caller, UserRole};
use crate::db::{
    self,
    tokens::{ReconciliationReport, TokenTransactionRow},
    users::{DriverProfileRow, UserRow},
};
use crate::errors::{ApiError, Result};
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateUserBody {
    pub display_name: String,
}

#[derive(Deserialize)]
pub struct OnboardDriverBody {
    pub vehicle: String,
}

#[derive(Deserialize)]
pub struct AdjustTokensBody {
    /// Signed RIDE amount: positive grants, negative burns.
    pub amount: i64,
    pub description: String,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub user: UserRow,
    pub driver_profile: Option<DriverProfileRow>,
}

#[derive(Serialize)]
pub struct TransactionsResponse {
    pub count: usize,
    pub transactions: Vec<TokenTransactionRow>,
}

/// `POST /users`
///
/// Open registration; everyone starts as a rider. Driver onboarding and admin
/// provisioning are separate paths.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateUserBody>,
) -> Result<Json<UserRow>> {
    let user = db::users::create_user(&state.pool, &body.display_name, "rider", db::now()).await?;
    Ok(Json(user))
}

/// `POST /drivers/onboard`
pub async fn onboard_driver(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Json(body): Json<OnboardDriverBody>,
) -> Result<Json<DriverProfileRow>> {
    let profile = db::users::onboard_driver(&state.pool, caller.id, &body.vehicle).await?;
    Ok(Json(profile))
}

/// `GET /users/:id/balance`
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<BalanceResponse>> {
    caller.require_self_or_admin(id)?;

    let user = db::users::get_user(&state.pool, id).await?;
    let driver_profile = if UserRole::parse(&user.role) == Some(UserRole::Driver) {
        db::users::get_driver_profile(&state.pool, id).await.ok()
    } else {
        None
    };

    Ok(Json(BalanceResponse {
        user,
        driver_profile,
    }))
}

/// `GET /users/:id/transactions`
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<TransactionsResponse>> {
    caller.require_self_or_admin(id)?;

    let transactions = db::tokens::list_transactions(&state.pool, id).await?;
    Ok(Json(TransactionsResponse {
        count: transactions.len(),
        transactions,
    }))
}

/// `GET /users/:id/reconcile`
///
/// Re-derives the balance from the transaction log; non-zero drift means a
/// settlement write was lost and needs operator attention.
pub async fn reconcile(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<ReconciliationReport>> {
    caller.require_self_or_admin(id)?;
    let report = db::tokens::reconcile(&state.pool, id).await?;
    Ok(Json(report))
}

/// `POST /users/:id/tokens`
///
/// Admin grant or burn. Burning more than the balance fails; balances never
/// go negative.
pub async fn adjust_tokens(
    State(state): State<Arc<AppState>>,
    caller: Caller,
    Path(id): Path<i64>,
    Json(body): Json<AdjustTokensBody>,
) -> Result<Json<UserRow>> {
    caller.require_admin()?;

    if body.description.trim().is_empty() {
        return Err(ApiError::BadRequest("description must not be empty".to_string()));
    }

    // Resolve first so a missing user reports NotFound, not a failed debit.
    db::users::get_user(&state.pool, id).await?;
    db::tokens::admin_adjust(&state.pool, id, body.amount, &body.description, db::now()).await?;

    let user = db::users::get_user(&state.pool, id).await?;
    Ok(Json(user))
}
