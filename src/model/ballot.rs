use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    model::{BallotId, CandidateId, CandidateIndex, Contest, ContestId},
};

/// The preferences expressed on one ballot for one contest: a map from
/// candidate to rank, where rank 0 is the first preference. Candidates that
/// were not ranked are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ranking(HashMap<CandidateId, u32>);

impl Ranking {
    /// Create an empty ranking.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ranking from an ordered list of preferences, most preferred
    /// first. Repeated mentions of a candidate keep the earliest position.
    pub fn from_preferences<C>(preferences: impl IntoIterator<Item = C>) -> Self
    where
        C: Into<CandidateId>,
    {
        let mut ranking = Self::new();
        for (rank, candidate) in (0..).zip(preferences) {
            ranking.0.entry(candidate.into()).or_insert(rank);
        }
        ranking
    }

    /// Position of `candidate` on this ballot, or `None` if unranked.
    pub fn rank_of(&self, candidate: &str) -> Option<u32> {
        self.0.get(candidate).copied()
    }

    /// Is this ballot a vote for `candidate` once everyone in `eliminated`
    /// has been removed? True iff `candidate` is still standing, is ranked,
    /// and no other standing candidate is ranked strictly higher.
    pub fn is_vote_for<S: AsRef<str>>(&self, candidate: &str, eliminated: &[S]) -> bool {
        let is_eliminated = |c: &str| eliminated.iter().any(|e| e.as_ref() == c);
        if is_eliminated(candidate) {
            return false;
        }
        let rank = match self.rank_of(candidate) {
            Some(rank) => rank,
            None => return false,
        };
        !self
            .0
            .iter()
            .any(|(other, &other_rank)| other != candidate && !is_eliminated(other) && other_rank < rank)
    }

    /// Number of candidates ranked.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Is this an empty (exhausted from the start) ballot?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A cast vote record: the rankings on one physical ballot, per contest.
pub type Cvr = HashMap<ContestId, Ranking>;

/// All cast vote records, keyed by ballot ID. Ordered so that iteration is
/// deterministic.
pub type Cvrs = BTreeMap<BallotId, Cvr>;

/// The ballots of a single contest, validated against it and stored densely
/// by candidate position. This is the form the audit search works on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestBallots {
    num_candidates: usize,
    ranks: Vec<Vec<Option<u32>>>,
}

impl ContestBallots {
    /// Validate and index the given rankings for `contest`.
    /// Fails if any ranking mentions someone who is not a candidate.
    pub fn from_rankings<'a>(
        contest: &Contest,
        rankings: impl IntoIterator<Item = &'a Ranking>,
    ) -> Result<Self> {
        let num_candidates = contest.num_candidates();
        let mut ranks = Vec::new();
        for ranking in rankings {
            let mut row = vec![None; num_candidates];
            for (candidate, &rank) in &ranking.0 {
                let index = contest
                    .index_of(candidate)
                    .ok_or_else(|| Error::UnknownCandidate {
                        contest: contest.id.clone(),
                        candidate: candidate.clone(),
                    })?;
                row[index] = Some(rank);
            }
            ranks.push(row);
        }
        Ok(Self {
            num_candidates,
            ranks,
        })
    }

    /// Extract the ballots for `contest` from a full set of CVRs. Ballots
    /// that do not include the contest are skipped.
    pub fn from_cvrs(contest: &Contest, cvrs: &Cvrs) -> Result<Self> {
        Self::from_rankings(contest, cvrs.values().filter_map(|cvr| cvr.get(&contest.id)))
    }

    /// Number of ballots.
    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    /// Are there no ballots at all?
    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Number of candidates each ballot is indexed by.
    pub fn num_candidates(&self) -> usize {
        self.num_candidates
    }

    /// Dense counterpart of [`Ranking::is_vote_for`]; `eliminated` is
    /// indexed by candidate position.
    pub fn is_vote_for(&self, ballot: usize, candidate: CandidateIndex, eliminated: &[bool]) -> bool {
        if eliminated[candidate] {
            return false;
        }
        let row = &self.ranks[ballot];
        let rank = match row[candidate] {
            Some(rank) => rank,
            None => return false,
        };
        !row.iter().enumerate().any(|(other, other_rank)| {
            other != candidate && !eliminated[other] && matches!(other_rank, Some(r) if *r < rank)
        })
    }

    /// Tally of every candidate when those flagged in `eliminated` have been
    /// removed. Eliminated candidates get zero.
    pub fn tallies(&self, eliminated: &[bool]) -> Vec<u64> {
        let mut tallies = vec![0; self.num_candidates];
        for row in &self.ranks {
            let best = row
                .iter()
                .enumerate()
                .filter(|(c, _)| !eliminated[*c])
                .filter_map(|(_, rank)| *rank)
                .min();
            if let Some(best) = best {
                // Tied top ranks count for every tied candidate, as with `is_vote_for`.
                for (c, rank) in row.iter().enumerate() {
                    if !eliminated[c] && *rank == Some(best) {
                        tallies[c] += 1;
                    }
                }
            }
        }
        tallies
    }

    /// Number of ballots ranking `candidate` first.
    pub fn first_preferences(&self, candidate: CandidateIndex) -> u64 {
        self.ranks
            .iter()
            .filter(|row| row[candidate] == Some(0))
            .count() as u64
    }

    /// Number of ballots that rank `candidate` and either do not rank
    /// `other` or rank `candidate` ahead of it.
    pub fn mentions_ahead_of(&self, candidate: CandidateIndex, other: CandidateIndex) -> u64 {
        self.ranks
            .iter()
            .filter(|row| match (row[candidate], row[other]) {
                (Some(c), Some(o)) => c < o,
                (Some(_), None) => true,
                (None, _) => false,
            })
            .count() as u64
    }
}
