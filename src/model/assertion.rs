use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::{CandidateId, Contest, ContestId, Cvr, Cvrs, Difficulty};

/// The two kinds of assertion we know how to audit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AssertionKind {
    /// The winner cannot be eliminated before the loser, whoever else has
    /// been eliminated. The winner is credited only with first preferences;
    /// the loser with every ballot ranking them that does not prefer the
    /// winner.
    #[serde(rename = "NEB")]
    NotEliminatedBefore,
    /// Once exactly `eliminated` are out, the winner has more votes than the
    /// loser, so cannot be the next to go.
    #[serde(rename = "NEN")]
    NotEliminatedNext { eliminated: Vec<CandidateId> },
}

/// A comparison between the tallies of two candidates in some context.
/// Each assertion can be audited independently; if it holds, it rules out
/// some set of alternate elimination orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    /// Contest this assertion is about.
    pub contest: ContestId,
    /// Candidate claimed to have the larger tally.
    pub winner: CandidateId,
    /// Candidate claimed to have the smaller tally.
    pub loser: CandidateId,
    #[serde(flatten)]
    pub kind: AssertionKind,
    /// Reported ballots counted for the winner.
    pub votes_for_winner: u64,
    /// Reported ballots counted for the loser.
    pub votes_for_loser: u64,
    /// `votes_for_winner - votes_for_loser`.
    pub margin: i64,
    /// Estimated cost of auditing this assertion.
    pub difficulty: Difficulty,
    /// Tail of the alternate outcome this assertion was created to rule out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules_out: Option<Vec<CandidateId>>,
}

impl Assertion {
    /// Create a not-eliminated-before assertion.
    pub fn neb(
        contest: impl Into<ContestId>,
        winner: impl Into<CandidateId>,
        loser: impl Into<CandidateId>,
        votes_for_winner: u64,
        votes_for_loser: u64,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            contest: contest.into(),
            winner: winner.into(),
            loser: loser.into(),
            kind: AssertionKind::NotEliminatedBefore,
            votes_for_winner,
            votes_for_loser,
            margin: margin(votes_for_winner, votes_for_loser),
            difficulty,
            rules_out: None,
        }
    }

    /// Create a not-eliminated-next assertion, valid once `eliminated` are
    /// gone.
    #[allow(clippy::too_many_arguments)]
    pub fn nen(
        contest: impl Into<ContestId>,
        winner: impl Into<CandidateId>,
        loser: impl Into<CandidateId>,
        eliminated: Vec<CandidateId>,
        votes_for_winner: u64,
        votes_for_loser: u64,
        difficulty: Difficulty,
        rules_out: Option<Vec<CandidateId>>,
    ) -> Self {
        Self {
            contest: contest.into(),
            winner: winner.into(),
            loser: loser.into(),
            kind: AssertionKind::NotEliminatedNext { eliminated },
            votes_for_winner,
            votes_for_loser,
            margin: margin(votes_for_winner, votes_for_loser),
            difficulty,
            rules_out,
        }
    }

    pub fn is_neb(&self) -> bool {
        matches!(self.kind, AssertionKind::NotEliminatedBefore)
    }

    /// Candidates assumed eliminated, for NEN assertions.
    pub fn eliminated(&self) -> Option<&[CandidateId]> {
        match &self.kind {
            AssertionKind::NotEliminatedBefore => None,
            AssertionKind::NotEliminatedNext { eliminated } => Some(eliminated),
        }
    }

    /// Does this CVR count towards the winner's tally?
    pub fn is_vote_for_winner(&self, cvr: &Cvr) -> bool {
        let ranking = match cvr.get(&self.contest) {
            Some(ranking) => ranking,
            None => return false,
        };
        match &self.kind {
            AssertionKind::NotEliminatedBefore => ranking.rank_of(&self.winner) == Some(0),
            AssertionKind::NotEliminatedNext { eliminated } => {
                ranking.is_vote_for(&self.winner, eliminated)
            }
        }
    }

    /// Does this CVR count towards the loser's tally?
    pub fn is_vote_for_loser(&self, cvr: &Cvr) -> bool {
        let ranking = match cvr.get(&self.contest) {
            Some(ranking) => ranking,
            None => return false,
        };
        match &self.kind {
            AssertionKind::NotEliminatedBefore => {
                match (ranking.rank_of(&self.loser), ranking.rank_of(&self.winner)) {
                    (Some(l), Some(w)) => l < w,
                    (Some(_), None) => true,
                    (None, _) => false,
                }
            }
            AssertionKind::NotEliminatedNext { eliminated } => {
                ranking.is_vote_for(&self.loser, eliminated)
            }
        }
    }

    /// Recompute `(votes_for_winner, votes_for_loser)` directly from CVRs.
    pub fn recount(&self, cvrs: &Cvrs) -> (u64, u64) {
        cvrs.values().fold((0, 0), |(w, l), cvr| {
            (
                w + u64::from(self.is_vote_for_winner(cvr)),
                l + u64::from(self.is_vote_for_loser(cvr)),
            )
        })
    }

    /// Are these the same claim (ignoring tallies and difficulty)?
    pub fn same_as(&self, other: &Assertion) -> bool {
        self.contest == other.contest
            && self.winner == other.winner
            && self.loser == other.loser
            && self.kind == other.kind
    }

    /// Does this assertion rule out everything `other` rules out, so that
    /// auditing this one makes `other` redundant? Not symmetric, and never
    /// true of an NEB `other`.
    pub fn subsumes(&self, other: &Assertion) -> bool {
        self.subsumes_for(other, other.rules_out.as_deref())
    }

    /// [`Self::subsumes`], judged against `tail` rather than the tail `other`
    /// was created for. An NEN rules out every order with its eliminated set
    /// and its winner next to go, so one NEN may stand for several tails.
    pub fn subsumes_for(&self, other: &Assertion, tail: Option<&[CandidateId]>) -> bool {
        if other.is_neb() {
            return false;
        }
        match &self.kind {
            AssertionKind::NotEliminatedBefore => {
                if self.winner == other.winner && self.loser == other.loser {
                    return true;
                }
                match tail {
                    Some(tail) => {
                        let winner = tail.iter().position(|c| *c == self.winner);
                        let loser = tail.iter().position(|c| *c == self.loser);
                        match (winner, loser) {
                            (Some(w), Some(l)) => w < l,
                            (None, Some(_)) => true,
                            (_, None) => false,
                        }
                    }
                    None => false,
                }
            }
            AssertionKind::NotEliminatedNext { eliminated } => {
                let other_eliminated = match other.eliminated() {
                    Some(other_eliminated) => other_eliminated,
                    None => return false,
                };
                self.winner == other.winner
                    && as_set(eliminated) == as_set(other_eliminated)
            }
        }
    }

    /// Does this assertion, if true, rule out every elimination order that
    /// ends with `tail`? The tail lists the last candidates eliminated, in
    /// order, with the hypothetical winner last.
    pub fn refutes_tail(&self, tail: &[CandidateId], contest: &Contest) -> bool {
        match &self.kind {
            AssertionKind::NotEliminatedBefore => {
                let loser = match tail.iter().position(|c| *c == self.loser) {
                    Some(loser) => loser,
                    None => return false,
                };
                // The winner went before the loser, either within the tail or
                // before the tail started.
                match tail.iter().position(|c| *c == self.winner) {
                    Some(winner) => winner < loser,
                    None => true,
                }
            }
            AssertionKind::NotEliminatedNext { eliminated } => {
                tail.first() == Some(&self.winner)
                    && tail.contains(&self.loser)
                    && tail.len() + eliminated.len() == contest.num_candidates()
                    && !tail.iter().any(|c| eliminated.contains(c))
            }
        }
    }
}

fn margin(votes_for_winner: u64, votes_for_loser: u64) -> i64 {
    votes_for_winner as i64 - votes_for_loser as i64
}

fn as_set(candidates: &[CandidateId]) -> HashSet<&str> {
    candidates.iter().map(String::as_str).collect()
}

impl Display for Assertion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            AssertionKind::NotEliminatedBefore => write!(
                f,
                "NEB,Winner,{},Loser,{},Eliminated",
                self.winner, self.loser
            ),
            AssertionKind::NotEliminatedNext { eliminated } => {
                write!(f, "NEN,Winner,{},Loser,{},Eliminated", self.winner, self.loser)?;
                for candidate in eliminated {
                    write!(f, ",{}", candidate)?;
                }
                Ok(())
            }
        }
    }
}

/// Sort assertions from hardest to easiest to audit. The sort is stable, so
/// equally difficult assertions keep their relative order.
pub fn sort_by_difficulty(assertions: &mut [Assertion]) {
    assertions.sort_by(|a, b| b.difficulty.cmp(&a.difficulty));
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::Ranking;

    fn names(names: &[&str]) -> Vec<CandidateId> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn nen(winner: &str, loser: &str, eliminated: &[&str], tail: &[&str]) -> Assertion {
        Assertion::nen(
            "1",
            winner,
            loser,
            names(eliminated),
            10,
            5,
            Difficulty::new(3.0),
            Some(names(tail)),
        )
    }

    fn neb(winner: &str, loser: &str) -> Assertion {
        Assertion::neb("1", winner, loser, 10, 5, Difficulty::new(3.0))
    }

    #[test]
    fn display() {
        assert_eq!(neb("A", "B").to_string(), "NEB,Winner,A,Loser,B,Eliminated");
        assert_eq!(
            nen("A", "B", &["C", "D"], &["A", "B"]).to_string(),
            "NEN,Winner,A,Loser,B,Eliminated,C,D"
        );
        assert_eq!(
            nen("A", "B", &[], &["A", "B"]).to_string(),
            "NEN,Winner,A,Loser,B,Eliminated"
        );
    }

    #[test]
    fn margins() {
        assert_eq!(neb("A", "B").margin, 5);
        let losing = Assertion::neb("1", "A", "B", 3, 7, Difficulty::UNBOUNDED);
        assert_eq!(losing.margin, -4);
    }

    #[test]
    fn neb_subsumption() {
        let a = neb("A", "B");
        // NEBs never subsume other NEBs.
        assert!(!a.subsumes(&neb("A", "B")));
        // Same winner and loser.
        assert!(a.subsumes(&nen("A", "B", &["C"], &["A", "B"])));
        // Winner before loser in the tail.
        assert!(a.subsumes(&nen("C", "D", &[], &["C", "A", "D", "B"])));
        // Loser present, winner absent.
        assert!(a.subsumes(&nen("C", "D", &["A"], &["C", "B", "D"])));
        // Loser before winner.
        assert!(!a.subsumes(&nen("C", "D", &[], &["C", "B", "D", "A"])));
        // Loser absent.
        assert!(!a.subsumes(&nen("C", "D", &["B"], &["C", "A", "D"])));
    }

    #[test]
    fn subsumption_for_another_tail() {
        let shared = nen("A", "B", &["C"], &["A", "B", "D"]);
        let b_before_d = neb("B", "D");
        assert!(b_before_d.subsumes(&shared));
        assert!(b_before_d.subsumes_for(&shared, Some(names(&["A", "B", "D"]).as_slice())));
        assert!(!b_before_d.subsumes_for(&shared, Some(names(&["A", "D", "B"]).as_slice())));
        assert!(!b_before_d.subsumes_for(&shared, None));
        // Same winner and loser holds whatever the tail.
        assert!(neb("A", "B").subsumes_for(&shared, None));
    }

    #[test]
    fn nen_subsumption() {
        let a = nen("A", "B", &["C", "D"], &["A", "B", "E"]);
        assert!(a.subsumes(&nen("A", "E", &["D", "C"], &["A", "E", "B"])));
        assert!(!a.subsumes(&nen("B", "E", &["C", "D"], &["B", "A", "E"])));
        assert!(!a.subsumes(&nen("A", "E", &["C"], &["A", "E", "B", "D"])));
        assert!(!a.subsumes(&neb("A", "B")));
    }

    #[test]
    fn same_as() {
        assert!(neb("A", "B").same_as(&Assertion::neb("1", "A", "B", 1, 0, Difficulty::new(9.0))));
        assert!(!neb("A", "B").same_as(&neb("B", "A")));
        assert!(!neb("A", "B").same_as(&nen("A", "B", &[], &["A", "B"])));
        assert!(!nen("A", "B", &["C"], &["A", "B"]).same_as(&nen("A", "B", &["D"], &["A", "B"])));
    }

    #[test]
    fn refutes_tails() {
        let contest = Contest::new("1", ["A", "B", "C", "D"], "A", 0).unwrap();
        let tail = |t: &[&str]| names(t);

        let a = neb("A", "B");
        assert!(a.refutes_tail(&tail(&["A", "B"]), &contest));
        assert!(a.refutes_tail(&tail(&["C", "B"]), &contest));
        assert!(!a.refutes_tail(&tail(&["B", "A"]), &contest));
        assert!(!a.refutes_tail(&tail(&["C", "A"]), &contest));

        let n = nen("A", "B", &["C"], &["A", "D", "B"]);
        assert!(n.refutes_tail(&tail(&["A", "D", "B"]), &contest));
        assert!(n.refutes_tail(&tail(&["A", "B", "D"]), &contest));
        assert!(!n.refutes_tail(&tail(&["A", "C", "B"]), &contest));
        assert!(!n.refutes_tail(&tail(&["D", "A", "B"]), &contest));
        assert!(!n.refutes_tail(&tail(&["A", "B"]), &contest));
    }

    #[test]
    fn recount() {
        let mut cvrs = Cvrs::new();
        let ballots = [
            vec!["A", "B", "C"],
            vec!["B", "C", "A"],
            vec!["C", "A", "B"],
            vec!["C"],
        ];
        for (i, prefs) in ballots.iter().enumerate() {
            cvrs.insert(
                i.to_string(),
                Cvr::from([("1".to_string(), Ranking::from_preferences(prefs.clone()))]),
            );
        }
        assert_eq!(neb("A", "B").recount(&cvrs), (1, 1));
        assert_eq!(neb("B", "C").recount(&cvrs), (1, 2));
        assert_eq!(nen("A", "B", &["C"], &["A", "B"]).recount(&cvrs), (2, 1));
        assert_eq!(nen("A", "C", &[], &["A", "C", "B"]).recount(&cvrs), (1, 2));
    }

    #[test]
    fn sorting() {
        let mut assertions = vec![
            Assertion::neb("1", "A", "B", 1, 0, Difficulty::new(2.0)),
            Assertion::neb("1", "A", "C", 1, 0, Difficulty::new(9.0)),
            Assertion::neb("1", "A", "D", 1, 0, Difficulty::new(2.0)),
        ];
        sort_by_difficulty(&mut assertions);
        let losers: Vec<_> = assertions.iter().map(|a| a.loser.as_str()).collect();
        assert_eq!(losers, ["C", "B", "D"]);
    }
}
