//! Randomly generated contests, for property tests and benchmarks.

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::irv::simulate_irv;
use crate::model::{CandidateId, Contest, ContestBallots, Cvr, Cvrs, Ranking};

/// `A` to `Z`, then `C26`, `C27` and so on.
fn candidate_name(index: usize) -> CandidateId {
    match u8::try_from(index) {
        Ok(offset) if offset < 26 => char::from(b'A' + offset).to_string(),
        _ => format!("C{index}"),
    }
}

/// A contest with ID `1` whose first preferences lean towards the candidates
/// listed first, with random partial rankings after that. The reported
/// winner is the true IRV winner. The same seed always gives the same
/// contest.
pub fn random_contest(seed: u64, num_candidates: usize, num_ballots: usize) -> Result<(Contest, Cvrs)> {
    if num_candidates == 0 {
        return Err(Error::NoCandidates {
            contest: "1".to_string(),
        });
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let candidates: Vec<CandidateId> = (0..num_candidates).map(candidate_name).collect();

    let mut cvrs = Cvrs::new();
    for b in 0..num_ballots {
        let mut prefs = candidates.clone();
        prefs.shuffle(&mut rng);
        // The lower of two draws, so earlier candidates are favoured.
        let favourite = rng.gen_range(0..num_candidates).min(rng.gen_range(0..num_candidates));
        if let Some(pos) = prefs.iter().position(|c| *c == candidates[favourite]) {
            prefs.swap(0, pos);
        }
        prefs.truncate(rng.gen_range(1..=num_candidates));
        cvrs.insert(
            format!("b{b}"),
            Cvr::from([("1".to_string(), Ranking::from_preferences(prefs))]),
        );
    }

    let mut contest = Contest::new("1", candidates.iter().cloned(), candidates[0].clone(), num_ballots as u64)?;
    let ballots = ContestBallots::from_cvrs(&contest, &cvrs)?;
    contest.winner = simulate_irv(&contest, &ballots).winner;
    Ok((contest, cvrs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(candidate_name(0), "A");
        assert_eq!(candidate_name(25), "Z");
        assert_eq!(candidate_name(26), "C26");
    }

    #[test]
    fn repeatable() {
        let first = random_contest(7, 4, 50).unwrap();
        assert_eq!(first, random_contest(7, 4, 50).unwrap());

        let (contest, cvrs) = first;
        assert_eq!(contest.candidates, ["A", "B", "C", "D"]);
        assert_eq!(contest.total_ballots, 50);
        assert_eq!(cvrs.len(), 50);
        assert!(cvrs.values().all(|cvr| !cvr["1"].is_empty()));

        let ballots = ContestBallots::from_cvrs(&contest, &cvrs).unwrap();
        assert_eq!(simulate_irv(&contest, &ballots).winner, contest.winner);
    }

    #[test]
    fn needs_candidates() {
        assert!(matches!(random_contest(1, 0, 10), Err(Error::NoCandidates { .. })));
    }
}
