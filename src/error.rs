use thiserror::Error;

use crate::model::{CandidateId, ContestId};

pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can stop an audit from being attempted.
///
/// Failing to find an audit is not an error; see [`crate::AuditOutcome`].
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Contest {contest} has no candidates")]
    NoCandidates { contest: ContestId },
    #[error("Contest {contest} lists candidate {candidate} more than once")]
    DuplicateCandidate {
        contest: ContestId,
        candidate: CandidateId,
    },
    #[error("Reported winner {winner} is not a candidate in contest {contest}")]
    UnknownWinner {
        contest: ContestId,
        winner: CandidateId,
    },
    #[error("A ballot ranks {candidate}, who is not a candidate in contest {contest}")]
    UnknownCandidate {
        contest: ContestId,
        candidate: CandidateId,
    },
    #[error("Ballot {ballot} refers to unknown contest {contest}")]
    UnknownContest { ballot: String, contest: ContestId },
    #[error("Malformed input at line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("Invalid configuration: {0}")]
    Config(String),
}
