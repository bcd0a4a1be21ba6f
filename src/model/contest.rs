use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{CandidateId, CandidateIndex, ContestId},
};

/// A single IRV contest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contest {
    /// Contest unique ID.
    pub id: ContestId,
    /// Candidates standing in this contest. This order is also the order in
    /// which the audit search tries candidates.
    pub candidates: Vec<CandidateId>,
    /// The reported winner.
    pub winner: CandidateId,
    /// Number of ballots that could be sampled when auditing this contest.
    pub total_ballots: u64,
}

impl Contest {
    /// Create and validate a new contest.
    pub fn new<C>(
        id: impl Into<ContestId>,
        candidates: impl IntoIterator<Item = C>,
        winner: impl Into<CandidateId>,
        total_ballots: u64,
    ) -> Result<Self>
    where
        C: Into<CandidateId>,
    {
        let contest = Self {
            id: id.into(),
            candidates: candidates.into_iter().map(Into::into).collect(),
            winner: winner.into(),
            total_ballots,
        };
        contest.validate()?;
        Ok(contest)
    }

    /// Check that the candidate list is non-empty and unique, and that the
    /// reported winner is one of the candidates.
    pub fn validate(&self) -> Result<()> {
        if self.candidates.is_empty() {
            return Err(Error::NoCandidates {
                contest: self.id.clone(),
            });
        }
        let mut seen = HashSet::with_capacity(self.candidates.len());
        for candidate in &self.candidates {
            if !seen.insert(candidate.as_str()) {
                return Err(Error::DuplicateCandidate {
                    contest: self.id.clone(),
                    candidate: candidate.clone(),
                });
            }
        }
        if !seen.contains(self.winner.as_str()) {
            return Err(Error::UnknownWinner {
                contest: self.id.clone(),
                winner: self.winner.clone(),
            });
        }
        Ok(())
    }

    /// Number of candidates standing.
    pub fn num_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Position of the given candidate in [`Self::candidates`], if present.
    pub fn index_of(&self, candidate: &str) -> Option<CandidateIndex> {
        self.candidates.iter().position(|c| c == candidate)
    }

    /// Position of the reported winner.
    pub fn winner_index(&self) -> Option<CandidateIndex> {
        self.index_of(&self.winner)
    }

    /// Name of the candidate at the given position.
    pub fn candidate(&self, index: CandidateIndex) -> &CandidateId {
        &self.candidates[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_contest() {
        let contest = Contest::new("1", ["A", "B", "C"], "B", 10).unwrap();
        assert_eq!(contest.num_candidates(), 3);
        assert_eq!(contest.winner_index(), Some(1));
        assert_eq!(contest.index_of("C"), Some(2));
        assert_eq!(contest.index_of("D"), None);
        assert_eq!(contest.candidate(0), "A");
    }

    #[test]
    fn invalid_contests() {
        let empty: [&str; 0] = [];
        assert!(matches!(
            Contest::new("1", empty, "A", 0),
            Err(Error::NoCandidates { .. })
        ));
        assert!(matches!(
            Contest::new("1", ["A", "B", "A"], "A", 0),
            Err(Error::DuplicateCandidate { candidate, .. }) if candidate == "A"
        ));
        assert!(matches!(
            Contest::new("1", ["A", "B"], "Z", 0),
            Err(Error::UnknownWinner { winner, .. }) if winner == "Z"
        ));
    }
}
