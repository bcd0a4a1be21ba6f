//! Loading contests and cast vote records from `.raire` files.
//!
//! The format is plain comma-separated text:
//!
//! ```text
//! 1
//! Contest,1,3,A,B,C,winner,A
//! 1,b1,A,B,C
//! 1,b2,C
//! ```
//!
//! The first line gives the number of contests, then one line per contest
//! gives its ID, candidate count, candidates and reported winner. Every
//! remaining line is one ballot's preferences in one contest, most preferred
//! first. Blank lines are ignored.
//!
//! Single contests can also be given as ballot signatures in `.txt` files:
//!
//! ```text
//! A,B,C,winner,A
//! Party 1,Party 2,Party 3
//! -----
//! (A,B,C) : 40
//! (C) : 2
//! ```
//!
//! The first line lists the candidates and the reported winner, the second
//! their parties (unused) and the third is a separator. Each remaining line
//! is a preference ordering and the number of ballots cast with it.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{Contest, ContestBallots, Cvr, Cvrs, Ranking};

/// Everything in a `.raire` file.
#[derive(Debug, Clone, PartialEq)]
pub struct RaireData {
    /// Contests in file order. Each contest's `total_ballots` is the number
    /// of ballot lines for it.
    pub contests: Vec<Contest>,
    pub cvrs: Cvrs,
}

impl RaireData {
    /// The ballots for one of this file's contests.
    pub fn ballots_for(&self, contest: &Contest) -> Result<ContestBallots> {
        ContestBallots::from_cvrs(contest, &self.cvrs)
    }
}

/// Load a `.raire` file from disk.
pub fn load_raire(path: impl AsRef<Path>) -> Result<RaireData> {
    let path = path.as_ref();
    debug!("Loading contests from {}", path.display());
    parse_raire(BufReader::new(File::open(path)?))
}

/// Load contests from disk, as ballot signatures if the file name ends in
/// `.txt` and in `.raire` format otherwise.
pub fn load(path: impl AsRef<Path>) -> Result<RaireData> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some("txt") => load_txt(path),
        _ => load_raire(path),
    }
}

/// Load a ballot-signature `.txt` file from disk.
pub fn load_txt(path: impl AsRef<Path>) -> Result<RaireData> {
    let path = path.as_ref();
    debug!("Loading ballot signatures from {}", path.display());
    parse_txt(BufReader::new(File::open(path)?))
}

fn parse_error(line: usize, reason: impl Into<String>) -> Error {
    Error::Parse {
        line,
        reason: reason.into(),
    }
}

/// Parse `.raire` data from any reader.
pub fn parse_raire(reader: impl BufRead) -> Result<RaireData> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|line| (i + 1, line)))
        .filter(|line| !matches!(line, Ok((_, text)) if text.trim().is_empty()));

    let (line, header) = lines
        .next()
        .ok_or_else(|| parse_error(1, "empty file"))??;
    let num_contests: usize = header
        .trim()
        .parse()
        .map_err(|_| parse_error(line, format!("expected a number of contests, found {header:?}")))?;

    let mut contests = Vec::with_capacity(num_contests);
    let mut ballot_counts: HashMap<String, u64> = HashMap::with_capacity(num_contests);
    for _ in 0..num_contests {
        let (line, text) = lines
            .next()
            .ok_or_else(|| parse_error(line + contests.len() + 1, "missing contest line"))??;
        let contest = parse_contest(line, &text)?;
        if ballot_counts.insert(contest.id.clone(), 0).is_some() {
            return Err(parse_error(line, format!("contest {} is listed twice", contest.id)));
        }
        contests.push(contest);
    }

    let mut cvrs = Cvrs::new();
    for next in lines {
        let (line, text) = next?;
        let fields = split(&text);
        if fields.len() < 2 {
            return Err(parse_error(line, "expected a contest ID and a ballot ID"));
        }
        let (contest_id, ballot_id, preferences) = (fields[0], fields[1], &fields[2..]);

        let contest = contests
            .iter()
            .find(|c| c.id == contest_id)
            .ok_or_else(|| Error::UnknownContest {
                ballot: ballot_id.to_string(),
                contest: contest_id.to_string(),
            })?;
        if let Some(unknown) = preferences.iter().find(|p| contest.index_of(p).is_none()) {
            return Err(Error::UnknownCandidate {
                contest: contest.id.clone(),
                candidate: unknown.to_string(),
            });
        }

        let cvr: &mut Cvr = cvrs.entry(ballot_id.to_string()).or_default();
        if cvr
            .insert(contest_id.to_string(), Ranking::from_preferences(preferences.iter().copied()))
            .is_some()
        {
            return Err(parse_error(
                line,
                format!("ballot {ballot_id} appears twice in contest {contest_id}"),
            ));
        }
        if let Some(count) = ballot_counts.get_mut(contest_id) {
            *count += 1;
        }
    }

    for contest in &mut contests {
        contest.total_ballots = ballot_counts.get(&contest.id).copied().unwrap_or_default();
    }
    info!("Loaded {} contests and {} ballots", contests.len(), cvrs.len());
    Ok(RaireData { contests, cvrs })
}

/// Parse ballot signatures from any reader. The contest gets ID `1`, its
/// ballots are numbered from 0, and every ballot counts towards
/// `total_ballots`, including those ranking no one.
pub fn parse_txt(reader: impl BufRead) -> Result<RaireData> {
    let mut lines = reader
        .lines()
        .enumerate()
        .map(|(i, line)| line.map(|line| (i + 1, line)))
        .filter(|line| !matches!(line, Ok((_, text)) if text.trim().is_empty()));

    let (line, header) = lines
        .next()
        .ok_or_else(|| parse_error(1, "empty file"))??;
    let fields = split(&header);
    if fields.len() < 3 || fields[fields.len() - 2] != "winner" {
        return Err(parse_error(line, "expected candidates followed by the winner"));
    }
    let candidates = &fields[..fields.len() - 2];
    let mut contest = Contest::new("1", candidates.iter().copied(), fields[fields.len() - 1], 0)?;

    // Parties, then a separator.
    for expected in ["a list of parties", "a separator"] {
        lines
            .next()
            .ok_or_else(|| parse_error(line + 1, format!("expected {expected}")))??;
    }

    let mut cvrs = Cvrs::new();
    for next in lines {
        let (line, text) = next?;
        let (signature, count) = text
            .rsplit_once(':')
            .ok_or_else(|| parse_error(line, "expected (preferences) : count"))?;
        let count: u64 = count
            .trim()
            .parse()
            .map_err(|_| parse_error(line, format!("bad ballot count {:?}", count.trim())))?;
        let preferences = signature
            .trim()
            .strip_prefix('(')
            .and_then(|s| s.strip_suffix(')'))
            .ok_or_else(|| parse_error(line, format!("expected (preferences), found {:?}", signature.trim())))?;
        let preferences: Vec<&str> = split(preferences).into_iter().filter(|p| !p.is_empty()).collect();
        if let Some(unknown) = preferences.iter().find(|p| contest.index_of(p).is_none()) {
            return Err(Error::UnknownCandidate {
                contest: contest.id.clone(),
                candidate: unknown.to_string(),
            });
        }

        let ranking = Ranking::from_preferences(preferences.iter().copied());
        for _ in 0..count {
            let ballot_id = contest.total_ballots.to_string();
            cvrs.insert(ballot_id, Cvr::from([(contest.id.clone(), ranking.clone())]));
            contest.total_ballots += 1;
        }
    }

    info!(
        "Loaded contest {} with {} ballots",
        contest.id, contest.total_ballots
    );
    Ok(RaireData {
        contests: vec![contest],
        cvrs,
    })
}

fn split(text: &str) -> Vec<&str> {
    text.trim().split(',').map(str::trim).collect()
}

/// `Contest,<id>,<count>,<candidates...>,winner,<winner>`
fn parse_contest(line: usize, text: &str) -> Result<Contest> {
    let fields = split(text);
    if fields.len() < 3 || fields[0] != "Contest" {
        return Err(parse_error(line, format!("expected a contest line, found {text:?}")));
    }
    let num_candidates: usize = fields[2]
        .parse()
        .map_err(|_| parse_error(line, format!("bad candidate count {:?}", fields[2])))?;
    if fields.len() != num_candidates + 5 || fields[num_candidates + 3] != "winner" {
        return Err(parse_error(
            line,
            format!("expected {num_candidates} candidates followed by the winner"),
        ));
    }
    let candidates = &fields[3..3 + num_candidates];
    Contest::new(fields[1], candidates.iter().copied(), fields[num_candidates + 4], 0)
}
