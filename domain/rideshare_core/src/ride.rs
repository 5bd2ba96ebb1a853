//! Ride lifecycle state machine.
//!
//! ## Status as a Finite-State Machine
//!
//! [`RideStatus`] enforces a strict forward-only lifecycle:
//!
//! ```text
//! Requested ──► Accepted ──► DriverArriving ──► InProgress ──► Completed
//!     │             │               │                │
//!     └─────────────┴───────────────┴────────────────┴──► Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal. Every legal transition lives in
//! [`RideStatus::can_transition`]; callers consult this table in one place
//! instead of scattering per-field status checks, and the persistence layer
//! re-checks the observed prior status atomically when it applies the write.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a ride.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideStatus {
    /// Rider has requested; waiting for a driver.
    Requested,
    /// A driver claimed the ride.
    Accepted,
    /// Driver is en route to the pickup point.
    DriverArriving,
    /// Trip underway.
    InProgress,
    /// Trip finished and settled.
    Completed,
    /// Abandoned before completion; no settlement occurs.
    Cancelled,
}

impl RideStatus {
    /// Parse the snake_case column value stored in the database.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "requested" => Some(Self::Requested),
            "accepted" => Some(Self::Accepted),
            "driver_arriving" => Some(Self::DriverArriving),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// The identifier string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Accepted => "accepted",
            Self::DriverArriving => "driver_arriving",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `self → to` is a legal lifecycle transition.
    pub fn can_transition(self, to: RideStatus) -> bool {
        matches!(
            (self, to),
            (Self::Requested, Self::Accepted)
                | (Self::Accepted, Self::DriverArriving)
                | (Self::DriverArriving, Self::InProgress)
                | (Self::InProgress, Self::Completed)
                | (Self::Requested, Self::Cancelled)
                | (Self::Accepted, Self::Cancelled)
                | (Self::DriverArriving, Self::Cancelled)
                | (Self::InProgress, Self::Cancelled)
        )
    }
}
