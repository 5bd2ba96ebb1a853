//! # Rideshare marketplace domain rules
//!
//! This crate holds the pure business rules of the marketplace; it performs no
//! I/O and knows nothing about the database or the HTTP surface:
//!
//! | Concern       | Module                                        |
//! |---------------|-----------------------------------------------|
//! | Fare quoting and the completion fee split | [`fees`]          |
//! | Ride lifecycle state machine              | [`ride`]          |
//! | Proposal tiers and vote tally resolution  | [`governance`]    |
//!
//! The backend service (`backend/api`) applies these rules inside database
//! transactions; everything here is deterministic and synchronous so it can be
//! tested exhaustively without a running store.

pub mod fees;
pub mod governance;
pub mod ride;

#[cfg(test)]
mod invariants;

pub use fees::{
    quote_fare, split_fare, FeeBreakdown, DRIVER_RIDE_TOKENS, MIN_TOKENS_FOR_PROPOSAL,
    RIDER_RIDE_TOKENS,
};
pub use governance::{ProposalOutcome, ProposalStatus, ProposalTier, VoteChoice};
pub use ride::RideStatus;
