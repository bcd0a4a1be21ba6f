//! Difficulty and sample-size estimates for assertions.
//!
//! The audit search is agnostic to how difficulty is measured; it only needs
//! something implementing [`DifficultyEstimator`]. Plain functions and
//! closures of type `Fn(u64, u64, u64) -> f64` qualify.

use serde::{Deserialize, Serialize};

use crate::model::{Assertion, Difficulty};

/// Maps the tallies of an assertion to an estimate of how hard it is to
/// audit. Must decrease as the margin grows.
pub trait DifficultyEstimator {
    /// Raw estimate for a winner tally, loser tally and total auditable
    /// ballots.
    fn difficulty(&self, votes_for_winner: u64, votes_for_loser: u64, total_ballots: u64)
        -> Difficulty;

    /// Estimate with the margin check applied: without a positive margin the
    /// assertion is false and cannot be audited.
    fn assess(&self, votes_for_winner: u64, votes_for_loser: u64, total_ballots: u64) -> Difficulty {
        if votes_for_winner <= votes_for_loser {
            return Difficulty::UNBOUNDED;
        }
        self.difficulty(votes_for_winner, votes_for_loser, total_ballots)
    }
}

impl<F> DifficultyEstimator for F
where
    F: Fn(u64, u64, u64) -> f64,
{
    fn difficulty(&self, votes_for_winner: u64, votes_for_loser: u64, total_ballots: u64) -> Difficulty {
        Difficulty::new(self(votes_for_winner, votes_for_loser, total_ballots))
    }
}

/// Inverse squared margin for ballot-polling audits.
#[derive(Debug, Copy, Clone, Default)]
pub struct BallotPolling;

impl DifficultyEstimator for BallotPolling {
    fn difficulty(&self, votes_for_winner: u64, votes_for_loser: u64, total_ballots: u64) -> Difficulty {
        let (w, l, n) = (votes_for_winner as f64, votes_for_loser as f64, total_ballots as f64);
        let share = (w + l) / n;
        let relative_margin = (w - l) / (w + l);
        Difficulty::new((1.0 / (share * relative_margin * relative_margin)).ceil())
    }
}

/// Inverse diluted margin for ballot-comparison audits.
#[derive(Debug, Copy, Clone, Default)]
pub struct BallotComparison;

impl DifficultyEstimator for BallotComparison {
    fn difficulty(&self, votes_for_winner: u64, votes_for_loser: u64, total_ballots: u64) -> Difficulty {
        let margin = votes_for_winner as f64 - votes_for_loser as f64;
        Difficulty::new((total_ballots as f64 / margin).ceil())
    }
}

/// Which style of audit the assertions will be used for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EstimatorKind {
    /// Ballot-polling audit (BRAVO).
    BallotPolling,
    /// Ballot-level comparison audit (MACRO).
    BallotComparison,
}

impl Default for EstimatorKind {
    fn default() -> Self {
        Self::BallotComparison
    }
}

impl DifficultyEstimator for EstimatorKind {
    fn difficulty(&self, votes_for_winner: u64, votes_for_loser: u64, total_ballots: u64) -> Difficulty {
        match self {
            Self::BallotPolling => BallotPolling.difficulty(votes_for_winner, votes_for_loser, total_ballots),
            Self::BallotComparison => {
                BallotComparison.difficulty(votes_for_winner, votes_for_loser, total_ballots)
            }
        }
    }
}

/// Closed-form sample sizes, assuming no discrepancies are found.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum SampleSize {
    /// BRAVO ballot polling at the given risk limit.
    Bravo { risk_limit: f64 },
    /// MACRO ballot comparison at the given risk limit, with error
    /// inflation `gamma` and error rate `lambda`.
    Macro {
        risk_limit: f64,
        gamma: f64,
        lambda: f64,
    },
}

impl SampleSize {
    /// Expected number of ballots to sample to confirm `assertion`, out of
    /// `total_ballots`. Returns `total_ballots + 1` when there is no margin
    /// to work with; callers should treat anything at or above
    /// `total_ballots` as a full recount.
    pub fn estimate(&self, assertion: &Assertion, total_ballots: u64) -> u64 {
        let no_audit = total_ballots.saturating_add(1);
        if total_ballots == 0 || assertion.votes_for_winner <= assertion.votes_for_loser {
            return no_audit;
        }
        let n = total_ballots as f64;
        let size = match *self {
            Self::Bravo { risk_limit } => {
                let pw = assertion.votes_for_winner as f64 / n;
                let pl = assertion.votes_for_loser as f64 / n;
                let swl = pw / (pw + pl);
                let log2swl = (2.0 * swl).ln();
                let log_risk = (1.0 / risk_limit).ln();
                (log_risk + 0.5 * log2swl) / (pw * log2swl + pl * (2.0 - 2.0 * swl).ln())
            }
            Self::Macro {
                risk_limit,
                gamma,
                lambda,
            } => {
                let margin = assertion.margin as f64 / n;
                let od2g = 1.0 / (2.0 * gamma);
                let rho = -risk_limit.ln() / (od2g + lambda * (1.0 - od2g).ln());
                rho / margin
            }
        };
        if size.is_finite() && size >= 0.0 {
            (size.ceil() as u64).min(no_audit)
        } else {
            no_audit
        }
    }
}
