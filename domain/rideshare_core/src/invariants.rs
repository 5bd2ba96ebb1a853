#![allow(dead_code)]

//! Test-only invariant assertions shared across the unit tests.

use crate::fees::FeeBreakdown;
use crate::ride::RideStatus;

/// INV-1: the four parts of a settled fare sum back to the fare exactly.
pub fn assert_fee_conservation(fare: i64, split: &FeeBreakdown) {
    assert_eq!(
        split.total(),
        fare,
        "INV-1 violated: split of fare {} sums to {}",
        fare,
        split.total()
    );
}

/// INV-2: no part of a fee split may be negative.
pub fn assert_fees_non_negative(split: &FeeBreakdown) {
    assert!(
        split.insurance_fee >= 0
            && split.developer_fee >= 0
            && split.buyback_fee >= 0
            && split.driver_earnings >= 0,
        "INV-2 violated: negative component in {split:?}"
    );
}

/// INV-3: terminal ride statuses admit no outgoing transitions.
pub fn assert_terminal_is_absorbing(status: RideStatus) {
    assert!(status.is_terminal());
    let all = [
        RideStatus::Requested,
        RideStatus::Accepted,
        RideStatus::DriverArriving,
        RideStatus::InProgress,
        RideStatus::Completed,
        RideStatus::Cancelled,
    ];
    for to in all {
        assert!(
            !status.can_transition(to),
            "INV-3 violated: terminal status {:?} allows transition to {:?}",
            status,
            to
        );
    }
}

/// INV-4: a token ledger reconciles — its entries sum to the tracked balance.
pub fn assert_ledger_reconciles(entries: &[i64], balance: i64) {
    let total: i64 = entries.iter().sum();
    assert_eq!(
        total, balance,
        "INV-4 violated: ledger sums to {total} but tracked balance is {balance}"
    );
}
