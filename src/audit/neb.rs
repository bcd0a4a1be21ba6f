use crate::estimator::DifficultyEstimator;
use crate::model::{Assertion, CandidateIndex, Contest, ContestBallots};

/// The best not-eliminated-before assertion for every ordered pair of
/// candidates, or nothing where no such assertion can be audited.
///
/// These depend only on the ballots, so they are computed once per contest
/// and looked up throughout the search.
#[derive(Debug, Clone)]
pub struct NebMatrix {
    size: usize,
    cells: Vec<Option<Assertion>>,
}

impl NebMatrix {
    pub fn build<E>(contest: &Contest, ballots: &ContestBallots, estimator: &E) -> Self
    where
        E: DifficultyEstimator + ?Sized,
    {
        let size = contest.num_candidates();
        let mut cells = vec![None; size * size];
        for winner in 0..size {
            let votes_for_winner = ballots.first_preferences(winner);
            for loser in (0..size).filter(|&l| l != winner) {
                let votes_for_loser = ballots.mentions_ahead_of(loser, winner);
                let difficulty = estimator.assess(votes_for_winner, votes_for_loser, contest.total_ballots);
                if difficulty.is_bounded() {
                    cells[winner * size + loser] = Some(Assertion::neb(
                        contest.id.clone(),
                        contest.candidate(winner).clone(),
                        contest.candidate(loser).clone(),
                        votes_for_winner,
                        votes_for_loser,
                        difficulty,
                    ));
                }
            }
        }
        Self { size, cells }
    }

    /// The assertion that `winner` is not eliminated before `loser`, if it
    /// can be audited.
    pub fn get(&self, winner: CandidateIndex, loser: CandidateIndex) -> Option<&Assertion> {
        self.cells[winner * self.size + loser].as_ref()
    }

    /// Every auditable NEB assertion, winner-major.
    pub fn iter(&self) -> impl Iterator<Item = &Assertion> {
        self.cells.iter().flatten()
    }
}
