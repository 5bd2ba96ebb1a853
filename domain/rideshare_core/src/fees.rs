//! Fare arithmetic — quoting and the four-way completion fee split.
//!
//! All amounts are integer minor currency units. Percentage rates are carried
//! as basis points so the split stays in integer arithmetic; the driver share
//! is the remainder and absorbs every rounding loss, which makes the split
//! exactly conservative for any non-negative fare.

use serde::{Deserialize, Serialize};

/// Basis points of every fare reserved for the insurance pool (10%).
pub const INSURANCE_RATE_BPS: i64 = 1_000;
/// Basis points of every fare reserved for platform development (2.5%).
pub const DEVELOPER_RATE_BPS: i64 = 250;
/// Basis points of every fare reserved for the quarterly token buyback (0.5%).
pub const BUYBACK_RATE_BPS: i64 = 50;

/// RIDE tokens credited to the driver on every completed ride.
pub const DRIVER_RIDE_TOKENS: i64 = 10;
/// RIDE tokens credited to the rider on every completed ride.
pub const RIDER_RIDE_TOKENS: i64 = 1;
/// Minimum RIDE balance required to open a governance proposal.
pub const MIN_TOKENS_FOR_PROPOSAL: i64 = 10_000;

/// Flat component of a fare quote.
pub const QUOTE_BASE: i64 = 500;
/// Per-kilometre component of a fare quote.
pub const QUOTE_PER_KM: i64 = 120;

/// The four-way decomposition of a settled fare.
///
/// Produced by [`split_fare`]. The parts always sum back to the input fare;
/// see the invariant tests at the bottom of this module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub insurance_fee: i64,
    pub developer_fee: i64,
    pub buyback_fee: i64,
    pub driver_earnings: i64,
}

impl FeeBreakdown {
    /// Sum of all four parts.
    pub fn total(&self) -> i64 {
        self.insurance_fee + self.developer_fee + self.buyback_fee + self.driver_earnings
    }
}

/// Split `fare` into insurance / developer / buyback / driver portions.
///
/// Each percentage fee is floored; the driver share is the remainder, so the
/// four parts sum to `fare` exactly. Total for any `fare >= 0` — negative
/// fares are a caller error and must be rejected at the API boundary.
pub fn split_fare(fare: i64) -> FeeBreakdown {
    debug_assert!(fare >= 0, "fare must be non-negative, got {fare}");

    let insurance_fee = fare * INSURANCE_RATE_BPS / 10_000;
    let developer_fee = fare * DEVELOPER_RATE_BPS / 10_000;
    let buyback_fee = fare * BUYBACK_RATE_BPS / 10_000;
    let driver_earnings = fare - insurance_fee - developer_fee - buyback_fee;

    FeeBreakdown {
        insurance_fee,
        developer_fee,
        buyback_fee,
        driver_earnings,
    }
}

/// Quote a fare from the trip distance in metres.
///
/// A fixed-rate quote: flat base plus a per-kilometre charge, floored to the
/// minor unit. Whether the quote is also the settled fare is a service-level
/// policy (`FARE_POLICY`); the arithmetic here does not change with it.
pub fn quote_fare(distance_m: i64) -> i64 {
    debug_assert!(distance_m >= 0, "distance must be non-negative");
    QUOTE_BASE + distance_m * QUOTE_PER_KM / 1_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invariants;
    use proptest::prelude::*;

    #[test]
    fn split_is_exact_for_reference_fare() {
        let split = split_fare(2_500);
        assert_eq!(split.insurance_fee, 250);
        assert_eq!(split.developer_fee, 62);
        assert_eq!(split.buyback_fee, 12);
        assert_eq!(split.driver_earnings, 2_176);
        invariants::assert_fee_conservation(2_500, &split);
    }

    #[test]
    fn split_of_zero_fare_is_all_zero() {
        let split = split_fare(0);
        assert_eq!(split.total(), 0);
        invariants::assert_fees_non_negative(&split);
    }

    #[test]
    fn tiny_fares_floor_fees_to_zero_and_pay_the_driver() {
        // Below 1/BUYBACK_RATE_BPS of a unit every percentage fee floors away.
        for fare in 1..=9 {
            let split = split_fare(fare);
            assert_eq!(split.insurance_fee, 0);
            assert_eq!(split.developer_fee, 0);
            assert_eq!(split.buyback_fee, 0);
            assert_eq!(split.driver_earnings, fare);
        }
    }

    #[test]
    fn quote_scales_with_distance() {
        assert_eq!(quote_fare(0), QUOTE_BASE);
        assert_eq!(quote_fare(1_000), QUOTE_BASE + QUOTE_PER_KM);
        // 7.5 km floors the fractional kilometre charge.
        assert_eq!(quote_fare(7_500), QUOTE_BASE + 900);
    }

    proptest! {
        #[test]
        fn split_conserves_and_never_goes_negative(fare in 0i64..1_000_000_000) {
            let split = split_fare(fare);
            invariants::assert_fee_conservation(fare, &split);
            invariants::assert_fees_non_negative(&split);
        }
    }
}
