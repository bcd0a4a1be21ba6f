//! The fixed-shape audit that needs no search: the reported winner beats the
//! runner-up once everyone else is gone, and neither of them can be
//! eliminated before anyone else.

use crate::audit::neb::NebMatrix;
use crate::error::{Error, Result};
use crate::estimator::DifficultyEstimator;
use crate::model::{Assertion, CandidateId, Contest, ContestBallots};

/// The simple assertions that could be formed, and a description of each
/// one that could not.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleAudit {
    pub assertions: Vec<Assertion>,
    pub failed: Vec<String>,
}

impl SimpleAudit {
    /// True if every assertion could be formed, so that together they rule
    /// out every other winner.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Build the simple audit for `contest`'s reported winner against
/// `runner_up`, usually the last candidate eliminated in the reported count.
pub fn simple_irv_assertions<E>(
    contest: &Contest,
    ballots: &ContestBallots,
    estimator: &E,
    runner_up: &str,
) -> Result<SimpleAudit>
where
    E: DifficultyEstimator + ?Sized,
{
    let winner = contest.winner_index().ok_or_else(|| Error::UnknownWinner {
        contest: contest.id.clone(),
        winner: contest.winner.clone(),
    })?;
    let runner_up = contest.index_of(runner_up).ok_or_else(|| Error::UnknownCandidate {
        contest: contest.id.clone(),
        candidate: runner_up.to_string(),
    })?;
    let others: Vec<usize> = (0..contest.num_candidates())
        .filter(|&c| c != winner && c != runner_up)
        .collect();
    let other_names: Vec<CandidateId> = others.iter().map(|&c| contest.candidate(c).clone()).collect();

    let mut audit = SimpleAudit {
        assertions: Vec::new(),
        failed: Vec::new(),
    };

    let eliminated: Vec<bool> = (0..contest.num_candidates()).map(|c| others.contains(&c)).collect();
    let tallies = ballots.tallies(&eliminated);
    let difficulty = estimator.assess(tallies[winner], tallies[runner_up], contest.total_ballots);
    if difficulty.is_bounded() {
        audit.assertions.push(Assertion::nen(
            contest.id.clone(),
            contest.winner.clone(),
            contest.candidate(runner_up).clone(),
            other_names.clone(),
            tallies[winner],
            tallies[runner_up],
            difficulty,
            None,
        ));
    } else {
        audit.failed.push(format!(
            "{} NEN over {} when [{}] eliminated",
            contest.winner,
            contest.candidate(runner_up),
            other_names.join(", ")
        ));
    }

    let neb = NebMatrix::build(contest, ballots, estimator);
    for &other in &others {
        for finalist in [winner, runner_up] {
            match neb.get(finalist, other) {
                Some(assertion) => audit.assertions.push(assertion.clone()),
                None => audit.failed.push(format!(
                    "{} NEB {}",
                    contest.candidate(finalist),
                    contest.candidate(other)
                )),
            }
        }
    }

    debug!(
        "Simple audit of contest {}: {} assertions, {} could not be formed",
        contest.id,
        audit.assertions.len(),
        audit.failed.len()
    );
    Ok(audit)
}
