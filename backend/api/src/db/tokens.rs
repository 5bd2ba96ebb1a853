//! RIDE token ledger.
//!
//! The balance counter on `users` is only ever mutated through
//! [`apply_token_delta`], which pairs every balance change with an append-only
//! `token_transactions` row inside the caller's transaction. The CHECK-backed
//! CAS keeps balances non-negative without a read-then-write window.

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};

use crate::errors::{ApiError, Result};

/// Ledger entry categories stored in `token_transactions.category`.
pub mod category {
    pub const RIDE_REWARD: &str = "ride_reward";
    pub const ADMIN_GRANT: &str = "admin_grant";
    pub const BURN: &str = "burn";
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenTransactionRow {
    pub id: i64,
    pub user_id: i64,
    pub amount: i64,
    pub category: String,
    pub ride_id: Option<i64>,
    pub description: String,
    pub created_at: i64,
}

/// Ledger-vs-balance audit for one user.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub user_id: i64,
    pub token_balance: i64,
    pub ledger_total: i64,
    /// `token_balance - ledger_total`; zero when the ledger reconciles.
    pub drift: i64,
}

/// Apply a signed token delta to a user and append the matching ledger row.
///
/// Runs on the caller's connection so it composes into larger transactions
/// (ride settlement applies two of these plus the pool and profile writes
/// atomically). A debit that would take the balance below zero affects no
/// rows and fails with `BadRequest`.
pub async fn apply_token_delta(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: i64,
    category: &str,
    ride_id: Option<i64>,
    description: &str,
    now: i64,
) -> Result<()> {
    let affected = sqlx::query(
        "UPDATE users SET token_balance = token_balance + ?1 WHERE id = ?2 AND token_balance + ?1 >= 0",
    )
    .bind(amount)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if affected == 0 {
        // Either the user is missing or the debit exceeds the balance; the
        // caller has already resolved the user, so report the balance case.
        return Err(ApiError::BadRequest(format!(
            "token debit of {} exceeds balance of user {user_id}",
            -amount
        )));
    }

    sqlx::query(
        r#"
        INSERT INTO token_transactions (user_id, amount, category, ride_id, description, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(user_id)
    .bind(amount)
    .bind(category)
    .bind(ride_id)
    .bind(description)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Admin grant or burn: positive amounts credit, negative amounts debit.
pub async fn admin_adjust(
    pool: &SqlitePool,
    user_id: i64,
    amount: i64,
    description: &str,
    now: i64,
) -> Result<()> {
    if amount == 0 {
        return Err(ApiError::BadRequest("amount must be non-zero".to_string()));
    }

    let cat = if amount > 0 {
        category::ADMIN_GRANT
    } else {
        category::BURN
    };

    let mut tx = pool.begin().await?;
    apply_token_delta(&mut tx, user_id, amount, cat, None, description, now).await?;
    tx.commit().await?;
    Ok(())
}

/// Full ledger history for a user, newest first.
pub async fn list_transactions(pool: &SqlitePool, user_id: i64) -> Result<Vec<TokenTransactionRow>> {
    let rows = sqlx::query_as::<_, TokenTransactionRow>(
        r#"
        SELECT id, user_id, amount, category, ride_id, description, created_at
        FROM   token_transactions
        WHERE  user_id = ?1
        ORDER  BY id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Re-derive a user's balance from the transaction log and report drift.
pub async fn reconcile(pool: &SqlitePool, user_id: i64) -> Result<ReconciliationReport> {
    let user = super::users::get_user(pool, user_id).await?;

    let (ledger_total,): (i64,) =
        sqlx::query_as("SELECT COALESCE(SUM(amount), 0) FROM token_transactions WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(pool)
            .await?;

    Ok(ReconciliationReport {
        user_id,
        token_balance: user.token_balance,
        ledger_total,
        drift: user.token_balance - ledger_total,
    })
}

/// Total RIDE supply: the sum of every user balance. Read at proposal
/// resolution time to evaluate quorum.
pub async fn total_supply(conn: &mut SqliteConnection) -> Result<i64> {
    let (total,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(token_balance), 0) FROM users")
        .fetch_one(conn)
        .await?;
    Ok(total)
}
