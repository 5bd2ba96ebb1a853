//! Proposal tiers and vote tally resolution.
//!
//! A proposal's tier fixes its voting window, the share of total token supply
//! that must participate (quorum), and the share of cast power that must be in
//! favour (approval threshold). Tallies accumulate additively while a proposal
//! is active; [`resolve`] turns the frozen tallies into a pass/fail outcome
//! once the window has closed.

use serde::{Deserialize, Serialize};

/// Proposal classification; fixes the voting window and pass thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalTier {
    /// Urgent platform changes: short window, high bar.
    Emergency,
    /// Day-to-day parameter changes: a full week to vote, simple majority.
    Operational,
    /// Long-term direction: three days, simple majority, raised quorum.
    Strategic,
}

impl ProposalTier {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "emergency" => Some(Self::Emergency),
            "operational" => Some(Self::Operational),
            "strategic" => Some(Self::Strategic),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Operational => "operational",
            Self::Strategic => "strategic",
        }
    }

    /// Length of the voting window.
    pub fn voting_period_hours(&self) -> i64 {
        match self {
            Self::Emergency => 24,
            Self::Operational => 168,
            Self::Strategic => 72,
        }
    }

    /// Minimum share of total token supply that must vote, in basis points.
    pub fn quorum_bps(&self) -> i64 {
        match self {
            Self::Emergency => 3_000,
            Self::Operational => 1_500,
            Self::Strategic => 2_000,
        }
    }

    /// Minimum share of cast voting power in favour, in basis points.
    pub fn approval_bps(&self) -> i64 {
        match self {
            Self::Emergency => 6_600,
            Self::Operational => 5_100,
            Self::Strategic => 5_100,
        }
    }
}

/// Ballot choice. Votes are immutable once cast; there is no change surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteChoice {
    For,
    Against,
}

impl VoteChoice {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "for" => Some(Self::For),
            "against" => Some(Self::Against),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::For => "for",
            Self::Against => "against",
        }
    }
}

/// Lifecycle status of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
}

impl ProposalStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "passed" => Some(Self::Passed),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passed => "passed",
            Self::Rejected => "rejected",
        }
    }
}

/// Outcome of resolving a closed proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalOutcome {
    Passed,
    Rejected,
}

/// Resolve a closed proposal from its accumulated tallies.
///
/// Passes iff the cast voting power reaches the tier's quorum share of
/// `total_supply` AND the in-favour share of cast power reaches the tier's
/// approval threshold. A proposal nobody voted on is rejected.
///
/// All comparisons stay in integer arithmetic (cross-multiplied basis points)
/// so resolution is exact and platform-independent.
pub fn resolve(
    votes_for: i64,
    votes_against: i64,
    total_power_cast: i64,
    total_supply: i64,
    tier: ProposalTier,
) -> ProposalOutcome {
    let cast = votes_for + votes_against;
    if cast == 0 {
        return ProposalOutcome::Rejected;
    }

    let quorum_met = total_power_cast * 10_000 >= tier.quorum_bps() * total_supply;
    let approved = votes_for * 10_000 >= tier.approval_bps() * cast;

    if quorum_met && approved {
        ProposalOutcome::Passed
    } else {
        ProposalOutcome::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_percent_in_favour_passes_a_simple_majority_tier() {
        // 6_000 for / 4_000 against is a 60% approval share.
        let outcome = resolve(6_000, 4_000, 10_000, 20_000, ProposalTier::Operational);
        assert_eq!(outcome, ProposalOutcome::Passed);
    }

    #[test]
    fn sixty_percent_fails_the_emergency_bar() {
        // Emergency needs 66% approval; 60% is not enough even with quorum met.
        let outcome = resolve(6_000, 4_000, 10_000, 20_000, ProposalTier::Emergency);
        assert_eq!(outcome, ProposalOutcome::Rejected);
    }

    #[test]
    fn missing_quorum_rejects_despite_unanimous_approval() {
        // 1_000 of 100_000 supply is 1%, below the operational 15% quorum.
        let outcome = resolve(1_000, 0, 1_000, 100_000, ProposalTier::Operational);
        assert_eq!(outcome, ProposalOutcome::Rejected);
    }

    #[test]
    fn quorum_boundary_is_inclusive() {
        // Exactly 15% of supply cast: quorum is met, not missed.
        let outcome = resolve(1_500, 0, 1_500, 10_000, ProposalTier::Operational);
        assert_eq!(outcome, ProposalOutcome::Passed);
    }

    #[test]
    fn approval_boundary_is_inclusive() {
        // Exactly 51% in favour at a 51% threshold passes.
        let outcome = resolve(5_100, 4_900, 10_000, 10_000, ProposalTier::Operational);
        assert_eq!(outcome, ProposalOutcome::Passed);
        // One unit short of 51% fails.
        let outcome = resolve(5_099, 4_901, 10_000, 10_000, ProposalTier::Operational);
        assert_eq!(outcome, ProposalOutcome::Rejected);
    }

    #[test]
    fn no_votes_cast_rejects() {
        for tier in [
            ProposalTier::Emergency,
            ProposalTier::Operational,
            ProposalTier::Strategic,
        ] {
            assert_eq!(resolve(0, 0, 0, 50_000, tier), ProposalOutcome::Rejected);
        }
    }

    #[test]
    fn tier_strings_round_trip() {
        for tier in [
            ProposalTier::Emergency,
            ProposalTier::Operational,
            ProposalTier::Strategic,
        ] {
            assert_eq!(ProposalTier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(ProposalTier::parse("urgent"), None);
    }
}
