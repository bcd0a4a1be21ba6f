//! Example contests for tests.

use crate::model::{Contest, ContestBallots, Cvr, Cvrs, Ranking};

/// Build CVRs for a single contest from `(count, preferences)` groups.
pub fn cvrs_for(contest_id: &str, groups: &[(usize, &[&str])]) -> Cvrs {
    let mut cvrs = Cvrs::new();
    for (count, prefs) in groups {
        for _ in 0..*count {
            let ballot_id = format!("b{}", cvrs.len());
            let ranking = Ranking::from_preferences(prefs.iter().copied());
            cvrs.insert(ballot_id, Cvr::from([(contest_id.to_string(), ranking)]));
        }
    }
    cvrs
}

/// Build a contest and its ballots from `(count, preferences)` groups.
pub fn contest_from(
    candidates: &[&str],
    winner: &str,
    groups: &[(usize, &[&str])],
) -> (Contest, ContestBallots) {
    let cvrs = cvrs_for("1", groups);
    let contest = Contest::new("1", candidates.iter().copied(), winner, cvrs.len() as u64).unwrap();
    let ballots = ContestBallots::from_cvrs(&contest, &cvrs).unwrap();
    (contest, ballots)
}

pub const THREE_CANDIDATES: &[(usize, &[&str])] = &[
    (40, &["A", "B", "C"]),
    (35, &["B", "C", "A"]),
    (25, &["C", "A", "B"]),
];

/// 40 ABC, 35 BCA, 25 CAB. C goes first, then A beats B 65 to 35.
pub fn three_candidates() -> (Contest, ContestBallots) {
    contest_from(&["A", "B", "C"], "A", THREE_CANDIDATES)
}

/// Two candidates, 60 to 40.
pub fn two_candidates() -> (Contest, ContestBallots) {
    contest_from(&["A", "B"], "A", &[(60, &["A", "B"]), (40, &["B", "A"])])
}

/// Two candidates, dead level whichever way you look at it.
pub fn two_way_tie() -> (Contest, ContestBallots) {
    contest_from(&["A", "B"], "A", &[(50, &["A", "B"]), (50, &["B", "A"])])
}

/// Only one candidate, so there is nothing to rule out.
pub fn uncontested() -> (Contest, ContestBallots) {
    contest_from(&["A"], "A", &[(10, &["A"])])
}

/// Four candidates with partial rankings and exhausted ballots.
pub const FOUR_CANDIDATES: &[(usize, &[&str])] = &[
    (30, &["A", "B"]),
    (18, &["B", "C", "A"]),
    (16, &["C", "B"]),
    (14, &["D", "A", "C"]),
    (12, &["D", "C"]),
    (6, &["B"]),
    (4, &[]),
];

pub fn four_candidates() -> (Contest, ContestBallots) {
    contest_from(&["A", "B", "C", "D"], "A", FOUR_CANDIDATES)
}
