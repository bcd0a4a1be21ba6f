//! Plain instant-runoff counting, used to sanity-check reported winners.

use serde::{Deserialize, Serialize};

use crate::model::{CandidateId, Contest, ContestBallots};

/// Result of counting a contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IrvOutcome {
    /// The last candidate standing.
    pub winner: CandidateId,
    /// Everyone else, in the order they were eliminated.
    pub eliminated: Vec<CandidateId>,
}

impl IrvOutcome {
    /// The last candidate eliminated, if there was more than one candidate.
    pub fn runner_up(&self) -> Option<&CandidateId> {
        self.eliminated.last()
    }
}

/// Count the contest by repeatedly eliminating the standing candidate with
/// the fewest votes. Ties go against whoever is listed first in the contest.
pub fn simulate_irv(contest: &Contest, ballots: &ContestBallots) -> IrvOutcome {
    let mut eliminated = vec![false; contest.num_candidates()];
    let mut order = Vec::with_capacity(contest.num_candidates());

    for _ in 1..contest.num_candidates() {
        let tallies = ballots.tallies(&eliminated);
        let mut lowest: Option<(usize, u64)> = None;
        for (candidate, &tally) in tallies.iter().enumerate() {
            if eliminated[candidate] {
                continue;
            }
            if lowest.map_or(true, |(_, lowest_tally)| tally < lowest_tally) {
                lowest = Some((candidate, tally));
            }
        }
        if let Some((candidate, tally)) = lowest {
            trace!(
                "IRV count of contest {}: eliminating {} on {} votes",
                contest.id,
                contest.candidate(candidate),
                tally
            );
            eliminated[candidate] = true;
            order.push(contest.candidate(candidate).clone());
        }
    }

    let winner = eliminated
        .iter()
        .position(|e| !e)
        .map(|c| contest.candidate(c).clone())
        .unwrap_or_default();
    IrvOutcome {
        winner,
        eliminated: order,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::examples;

    #[audit_test(three_candidates)]
    fn three_candidate_count(contest: Contest, ballots: ContestBallots) {
        let outcome = simulate_irv(&contest, &ballots);
        assert_eq!(outcome.winner, "A");
        assert_eq!(outcome.eliminated, ["C", "B"]);
        assert_eq!(outcome.runner_up().map(String::as_str), Some("B"));
    }

    #[audit_test(two_way_tie)]
    fn ties_eliminate_first_listed(contest: Contest, ballots: ContestBallots) {
        let outcome = simulate_irv(&contest, &ballots);
        assert_eq!(outcome.winner, "B");
        assert_eq!(outcome.eliminated, ["A"]);
    }

    #[audit_test(uncontested)]
    fn single_candidate(contest: Contest, ballots: ContestBallots) {
        let outcome = simulate_irv(&contest, &ballots);
        assert_eq!(outcome.winner, "A");
        assert!(outcome.eliminated.is_empty());
        assert_eq!(outcome.runner_up(), None);
    }

    #[test]
    fn exhausted_ballots() {
        let (contest, ballots) = examples::four_candidates();
        let outcome = simulate_irv(&contest, &ballots);
        // First round: A 30, B 24, C 16, D 26. C goes; 16 CB to B.
        // Second round: A 30, B 40, D 26. D goes; 14 DAC to A, 12 DC exhaust.
        // Final: A 44, B 40.
        assert_eq!(outcome.eliminated, ["C", "D", "B"]);
        assert_eq!(outcome.winner, "A");
    }
}
