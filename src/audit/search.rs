use std::cmp::min;

use crate::audit::neb::NebMatrix;
use crate::audit::node::{NodeArena, NodeId, RaireNode};
use crate::estimator::DifficultyEstimator;
use crate::model::{Assertion, CandidateIndex, Contest, ContestBallots, Difficulty};

/// Everything about one contest that stays fixed while its tree of
/// alternate outcomes is searched.
pub(crate) struct SearchContext<'a, E: ?Sized> {
    pub contest: &'a Contest,
    pub ballots: &'a ContestBallots,
    pub neb: NebMatrix,
    pub estimator: &'a E,
}

impl<'a, E> SearchContext<'a, E>
where
    E: DifficultyEstimator + ?Sized,
{
    pub fn new(contest: &'a Contest, ballots: &'a ContestBallots, estimator: &'a E) -> Self {
        Self {
            contest,
            ballots,
            neb: NebMatrix::build(contest, ballots, estimator),
            estimator,
        }
    }

    pub fn num_candidates(&self) -> usize {
        self.contest.num_candidates()
    }

    /// Find the cheapest assertion that rules out every outcome ending in
    /// `node.tail`, and record it on the node. Leaves the node unbounded if
    /// there is none. Ties go to the first candidate found.
    pub fn find_best_audit(&self, node: &mut RaireNode) {
        let mut best: Option<Assertion> = None;
        let mut consider = |candidate: Option<&Assertion>| {
            if let Some(candidate) = candidate {
                if best.as_ref().map_or(true, |b| candidate.difficulty < b.difficulty) {
                    best = Some(candidate.clone());
                }
            }
        };

        let (&first, later) = match node.tail.split_first() {
            Some(split) => split,
            None => return,
        };

        // `first` is eliminated before everyone later in the tail.
        for &other in later {
            consider(self.neb.get(first, other));
        }
        // Everyone outside the tail is eliminated before `first`.
        for other in (0..self.num_candidates()).filter(|c| !node.tail.contains(c)) {
            consider(self.neb.get(other, first));
        }
        // `first` is eliminated next, with exactly those outside the tail gone.
        for &other in later {
            consider(self.not_eliminated_next(&node.tail, first, other).as_ref());
        }

        node.estimate = best.as_ref().map_or(Difficulty::UNBOUNDED, |b| b.difficulty);
        node.best_assertion = best;
    }

    /// NEN(`winner`, `loser`) once everyone outside `tail` is eliminated,
    /// if it can be audited.
    fn not_eliminated_next(
        &self,
        tail: &[CandidateIndex],
        winner: CandidateIndex,
        loser: CandidateIndex,
    ) -> Option<Assertion> {
        let eliminated: Vec<bool> = (0..self.num_candidates()).map(|c| !tail.contains(&c)).collect();
        let tallies = self.ballots.tallies(&eliminated);
        let (votes_for_winner, votes_for_loser) = (tallies[winner], tallies[loser]);
        let difficulty = self
            .estimator
            .assess(votes_for_winner, votes_for_loser, self.contest.total_ballots);
        if !difficulty.is_bounded() {
            return None;
        }
        let eliminated = (0..self.num_candidates())
            .filter(|&c| eliminated[c])
            .map(|c| self.contest.candidate(c).clone())
            .collect();
        let rules_out = tail.iter().map(|&c| self.contest.candidate(c).clone()).collect();
        Some(Assertion::nen(
            self.contest.id.clone(),
            self.contest.candidate(winner).clone(),
            self.contest.candidate(loser).clone(),
            eliminated,
            votes_for_winner,
            votes_for_loser,
            difficulty,
            Some(rules_out),
        ))
    }

    /// Follow one branch from `start` down to a complete elimination order,
    /// always extending with the first candidate not yet in the tail.
    /// Returns the cheapest estimate met along the way, counting `start`'s
    /// best ancestor. Any complete order must be ruled out by one of the
    /// nodes on its path, so this is a lower bound on the cost of the whole
    /// audit.
    pub fn perform_dive(&self, arena: &NodeArena, start: NodeId) -> Difficulty {
        let start = &arena[start];
        let mut best = start.estimate;
        if let Some(ancestor) = start.best_ancestor {
            best = min(best, arena[ancestor].estimate);
        }

        let num_candidates = self.num_candidates();
        let mut tail = start.tail.clone();
        while tail.len() < num_candidates {
            let next = match (0..num_candidates).find(|c| !tail.contains(c)) {
                Some(next) => next,
                None => break,
            };
            let mut node = RaireNode::extending(&tail, next, num_candidates);
            self.find_best_audit(&mut node);
            best = min(best, node.estimate);
            tail = node.tail;
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::estimator::BallotComparison;

    fn audited<E: DifficultyEstimator + ?Sized>(context: &SearchContext<'_, E>, tail: Vec<usize>) -> RaireNode {
        let mut node = RaireNode::new(tail, context.num_candidates());
        context.find_best_audit(&mut node);
        node
    }

    #[audit_test(three_candidates)]
    fn best_audits(contest: Contest, ballots: ContestBallots) {
        let context = SearchContext::new(&contest, &ballots, &BallotComparison);

        // B wins: NEB(A, B) says A outlasts B.
        let b_wins = audited(&context, vec![1]);
        assert_eq!(b_wins.estimate, Difficulty::new(20.0));
        assert_eq!(
            b_wins.best_assertion.unwrap().to_string(),
            "NEB,Winner,A,Loser,B,Eliminated"
        );

        // C then B: with A gone C has 25 against B's 75, and no NEB helps.
        let c_then_b = audited(&context, vec![2, 1]);
        assert_eq!(c_then_b.estimate, Difficulty::UNBOUNDED);
        assert!(c_then_b.best_assertion.is_none());

        // A then B, with C gone: A has 65 against B's 35.
        let a_then_b = audited(&context, vec![0, 1]);
        let assertion = a_then_b.best_assertion.unwrap();
        assert_eq!(assertion.to_string(), "NEN,Winner,A,Loser,B,Eliminated,C");
        assert_eq!((assertion.votes_for_winner, assertion.votes_for_loser), (65, 35));
        assert_eq!(assertion.difficulty, Difficulty::new(4.0));
        assert_eq!(assertion.rules_out, Some(vec!["A".to_string(), "B".to_string()]));

        // A, C, B with nobody gone: A 40 against C 25.
        let full = audited(&context, vec![0, 2, 1]);
        assert_eq!(full.estimate, Difficulty::new(7.0));
        assert_eq!(
            full.best_assertion.unwrap().to_string(),
            "NEN,Winner,A,Loser,C,Eliminated"
        );
    }

    #[audit_test(three_candidates)]
    fn ties_keep_the_first_found(contest: Contest, ballots: ContestBallots) {
        let flat = |_w: u64, _l: u64, _n: u64| 1.0;
        let context = SearchContext::new(&contest, &ballots, &flat);
        // NEB(A, B) and NEN(A, B, {C}) are both available at the same cost.
        let node = audited(&context, vec![0, 1]);
        assert!(node.best_assertion.unwrap().is_neb());
    }

    #[audit_test(three_candidates)]
    fn dives(contest: Contest, ballots: ContestBallots) {
        let context = SearchContext::new(&contest, &ballots, &BallotComparison);
        let mut arena = NodeArena::default();

        // [B] (20) -> [A, B] (4) -> [C, A, B] (nothing auditable).
        let b_wins = arena.alloc(audited(&context, vec![1]));
        assert_eq!(context.perform_dive(&arena, b_wins), Difficulty::new(4.0));

        // [C] (10, NEB(B, C)) -> [A, C] (nothing) -> [B, A, C] (10 again).
        let c_wins = arena.alloc(audited(&context, vec![2]));
        assert_eq!(arena[c_wins].estimate, Difficulty::new(10.0));
        assert_eq!(context.perform_dive(&arena, c_wins), Difficulty::new(10.0));
    }

    #[audit_test(two_way_tie)]
    fn unbounded_dive(contest: Contest, ballots: ContestBallots) {
        let context = SearchContext::new(&contest, &ballots, &BallotComparison);
        let mut arena = NodeArena::default();
        let b_wins = arena.alloc(audited(&context, vec![1]));
        assert_eq!(context.perform_dive(&arena, b_wins), Difficulty::UNBOUNDED);
    }

    #[test]
    fn dive_counts_best_ancestor() {
        let (contest, ballots) = crate::model::examples::three_candidates();
        let context = SearchContext::new(&contest, &ballots, &BallotComparison);
        let mut arena = NodeArena::default();

        let mut ancestor = RaireNode::new(vec![1], 3);
        ancestor.estimate = Difficulty::new(1.0);
        let ancestor = arena.alloc(ancestor);
        let mut start = audited(&context, vec![2, 1]);
        start.best_ancestor = Some(ancestor);
        let start = arena.alloc(start);
        assert_eq!(context.perform_dive(&arena, start), Difficulty::new(1.0));
    }
}
