//! Token ledger non-negativity and insurance claim flow.

mod common;

use api::db;
use api::errors::ApiError;

#[tokio::test]
async fn burning_past_zero_fails_and_changes_nothing() {
    let pool = common::test_pool().await;
    let user = common::create_rider(&pool, "Ada").await;
    common::grant_tokens(&pool, user, 100).await;

    let err = db::tokens::admin_adjust(&pool, user, -150, "penalty", 500)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)), "got {err:?}");

    let report = db::tokens::reconcile(&pool, user).await.unwrap();
    assert_eq!(report.token_balance, 100);
    assert_eq!(report.ledger_total, 100);
    assert_eq!(report.drift, 0);

    // The failed debit must not leave a ledger row behind.
    let history = db::tokens::list_transactions(&pool, user).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn grants_and_burns_keep_the_ledger_reconciled() {
    let pool = common::test_pool().await;
    let user = common::create_rider(&pool, "Ada").await;

    common::grant_tokens(&pool, user, 500).await;
    db::tokens::admin_adjust(&pool, user, -200, "buyback burn", 600)
        .await
        .unwrap();
    common::grant_tokens(&pool, user, 50).await;

    let report = db::tokens::reconcile(&pool, user).await.unwrap();
    assert_eq!(report.token_balance, 350);
    assert_eq!(report.drift, 0);

    let history = db::tokens::list_transactions(&pool, user).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history.iter().any(|t| t.category == "burn" && t.amount == -200));
}

#[tokio::test]
async fn claims_accumulate_and_payouts_draw_on_reserves() {
    let pool = common::test_pool().await;
    let rider = common::create_rider(&pool, "Ada").await;
    let driver = common::create_driver(&pool, "Grace", "Prius").await;

    // Settle one 2_500 ride so the pool holds 250 in reserves.
    let ride = common::completed_ride(&pool, rider, driver, 2_500).await;

    let claim = db::insurance::file_claim(&pool, rider, ride.id, 5_000, "cracked phone screen", 200)
        .await
        .unwrap();
    assert_eq!(claim.status, "pending");

    let pool_row = db::insurance::get_pool(&pool).await.unwrap();
    assert_eq!(pool_row.total_claims_requested, 5_000);
    assert_eq!(pool_row.total_reserves, 250);

    // Full payout exceeds reserves: the review fails and the claim stays pending.
    let err = db::insurance::review_claim(&pool, claim.id, "approved", None, 300)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)), "got {err:?}");
    assert_eq!(db::insurance::get_claim(&pool, claim.id).await.unwrap().status, "pending");

    // A partial payout within reserves settles the claim.
    let reviewed = db::insurance::review_claim(&pool, claim.id, "approved", Some(200), 400)
        .await
        .unwrap();
    assert_eq!(reviewed.status, "approved");
    assert_eq!(reviewed.approved_amount, Some(200));

    let pool_row = db::insurance::get_pool(&pool).await.unwrap();
    assert_eq!(pool_row.total_reserves, 50);
    assert_eq!(pool_row.total_claims_paid, 200);

    // Review is a one-shot transition.
    let err = db::insurance::review_claim(&pool, claim.id, "rejected", None, 500)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)), "got {err:?}");
}

#[tokio::test]
async fn only_ride_parties_may_file_claims() {
    let pool = common::test_pool().await;
    let rider = common::create_rider(&pool, "Ada").await;
    let outsider = common::create_rider(&pool, "Mallory").await;
    let driver = common::create_driver(&pool, "Grace", "Prius").await;

    let ride = common::completed_ride(&pool, rider, driver, 2_500).await;

    let err = db::insurance::file_claim(&pool, outsider, ride.id, 1_000, "not my ride", 200)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)), "got {err:?}");

    // The assigned driver is a party and may file.
    let claim = db::insurance::file_claim(&pool, driver, ride.id, 1_000, "scratched bumper", 210)
        .await
        .unwrap();
    assert_eq!(claim.claimant_id, driver);
}

#[tokio::test]
async fn rejected_claims_pay_nothing() {
    let pool = common::test_pool().await;
    let rider = common::create_rider(&pool, "Ada").await;
    let driver = common::create_driver(&pool, "Grace", "Prius").await;
    let ride = common::completed_ride(&pool, rider, driver, 2_500).await;

    let claim = db::insurance::file_claim(&pool, rider, ride.id, 100, "lost umbrella", 200)
        .await
        .unwrap();
    let reviewed = db::insurance::review_claim(&pool, claim.id, "rejected", None, 300)
        .await
        .unwrap();

    assert_eq!(reviewed.status, "rejected");
    assert_eq!(reviewed.approved_amount, None);

    let pool_row = db::insurance::get_pool(&pool).await.unwrap();
    assert_eq!(pool_row.total_reserves, 250);
    assert_eq!(pool_row.total_claims_paid, 0);
}
