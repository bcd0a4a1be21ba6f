use crate::model::{Assertion, CandidateId, Contest};

/// Every complete elimination order, won by someone other than the reported
/// winner, that none of `assertions` rules out. Empty iff the assertions
/// certify the reported winner.
///
/// Orders are returned as tails: first eliminated first, winner last.
/// Branches are pruned as soon as an assertion rules out their tail.
pub fn unrefuted_outcomes(contest: &Contest, assertions: &[Assertion]) -> Vec<Vec<CandidateId>> {
    let refuted = |tail: &[CandidateId]| assertions.iter().any(|a| a.refutes_tail(tail, contest));

    let mut unrefuted = Vec::new();
    let mut pending: Vec<Vec<CandidateId>> = contest
        .candidates
        .iter()
        .rev()
        .filter(|c| **c != contest.winner)
        .map(|c| vec![c.clone()])
        .collect();

    while let Some(tail) = pending.pop() {
        if refuted(&tail) {
            continue;
        }
        if tail.len() == contest.num_candidates() {
            unrefuted.push(tail);
            continue;
        }
        for candidate in contest.candidates.iter().rev().filter(|c| !tail.contains(c)) {
            let mut extended = Vec::with_capacity(tail.len() + 1);
            extended.push(candidate.clone());
            extended.extend_from_slice(&tail);
            pending.push(extended);
        }
    }
    unrefuted
}
