pub mod assertion;
pub mod ballot;
pub mod contest;
pub mod difficulty;

#[cfg(test)]
pub mod examples;

pub use assertion::{Assertion, AssertionKind};
pub use ballot::{ContestBallots, Cvr, Cvrs, Ranking};
pub use contest::Contest;
pub use difficulty::Difficulty;

/// Our contest IDs are strings.
pub type ContestId = String;
/// Our candidate IDs (names) are strings.
pub type CandidateId = String;
/// Our ballot IDs are strings.
pub type BallotId = String;
/// Position of a candidate within [`Contest::candidates`].
pub type CandidateIndex = usize;
