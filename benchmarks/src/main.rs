use anyhow::anyhow;
use clap::{Parser, ValueEnum};
use std::ops::AddAssign;
use std::process;
use std::thread;
use std::time::{Duration, Instant};

use raire_audit::estimator::EstimatorKind;
use raire_audit::model::{Contest, ContestBallots};
use raire_audit::synthetic;
use raire_audit::{compute_raire_assertions, AuditOutcome, SearchOptions};

#[derive(Parser)]
struct Args {
    /// How many threads to use. Defaults to the number of logical CPUs.
    #[arg(long, default_value_t = num_cpus::get())]
    threads: usize,

    /// How many contests each thread audits.
    #[arg(long, default_value_t = 20)]
    contests: usize,

    /// Candidates per contest.
    #[arg(long, default_value_t = 6)]
    candidates: usize,

    /// Ballots per contest.
    #[arg(long, default_value_t = 10_000)]
    ballots: usize,

    /// Seed for contest generation; each contest adds its own index.
    #[arg(long, default_value_t = 1234567)]
    seed: u64,

    /// How assertion difficulty is measured.
    #[arg(long, value_enum, default_value_t)]
    estimator: Estimator,

    /// Accept audits within this much of the easiest possible.
    #[arg(long, default_value_t = 0.0)]
    agap: f64,
}

/// How assertion difficulty is measured.
#[derive(Debug, Copy, Clone, ValueEnum)]
enum Estimator {
    /// Ballot-polling audits.
    Polling,
    /// Ballot-comparison audits.
    Comparison,
}

impl Default for Estimator {
    fn default() -> Self {
        Self::Comparison
    }
}

impl From<Estimator> for EstimatorKind {
    fn from(estimator: Estimator) -> Self {
        match estimator {
            Estimator::Polling => Self::BallotPolling,
            Estimator::Comparison => Self::BallotComparison,
        }
    }
}

/// Running totals for one thread.
#[derive(Debug, Default, Copy, Clone)]
struct Tally {
    search: Duration,
    certified: usize,
    impossible: usize,
    exhausted: usize,
    assertions: usize,
}

impl AddAssign for Tally {
    fn add_assign(&mut self, rhs: Self) {
        self.search += rhs.search;
        self.certified += rhs.certified;
        self.impossible += rhs.impossible;
        self.exhausted += rhs.exhausted;
        self.assertions += rhs.assertions;
    }
}

/// Generate a contest and index its ballots for searching.
fn random_contest(seed: u64, num_candidates: usize, num_ballots: usize) -> anyhow::Result<(Contest, ContestBallots)> {
    let (contest, cvrs) = synthetic::random_contest(seed, num_candidates, num_ballots)?;
    let ballots = ContestBallots::from_cvrs(&contest, &cvrs)?;
    Ok((contest, ballots))
}

/// Run the benchmark.
fn benchmark(args: &Args) -> anyhow::Result<()> {
    let estimator = EstimatorKind::from(args.estimator);
    let options = SearchOptions {
        agap: args.agap,
        max_iterations: None,
    };

    // Generate up front so that only the search is timed.
    let contests = (0..args.threads * args.contests)
        .map(|i| random_contest(args.seed + i as u64, args.candidates, args.ballots))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let start = Instant::now();
    thread::scope(|s| {
        let mut threads = Vec::with_capacity(args.threads);

        for chunk in contests.chunks(args.contests.max(1)) {
            let (estimator, options) = (&estimator, &options);
            let t = s.spawn(move || {
                let mut tally = Tally::default();
                for (contest, ballots) in chunk {
                    let pre_search = Instant::now();
                    let outcome = compute_raire_assertions(contest, ballots, estimator, options)?;
                    tally.search += pre_search.elapsed();
                    match outcome {
                        AuditOutcome::Certified(audit) => {
                            tally.certified += 1;
                            tally.assertions += audit.assertions.len();
                        }
                        AuditOutcome::Impossible => tally.impossible += 1,
                        AuditOutcome::Exhausted => tally.exhausted += 1,
                    }
                }
                Ok::<_, anyhow::Error>(tally)
            });
            threads.push(t);
        }

        let mut tally = Tally::default();
        for t in threads {
            tally += t.join().map_err(|_| anyhow!("thread panicked"))??;
        }
        let total_duration = start.elapsed();

        let searched = contests.len();
        if searched == 0 {
            return Err(anyhow!("no contests to audit"));
        }
        let avg_search = tally.search / searched as u32;
        let contests_per_sec = searched as f64 / total_duration.as_secs_f64();

        println!("search: {:?} per contest", avg_search);
        println!(
            "outcomes: {} certified ({} assertions), {} impossible, {} exhausted",
            tally.certified, tally.assertions, tally.impossible, tally.exhausted
        );
        println!(
            "\nactual duration: {} contests in {:?} ({:.2}/s)",
            searched, total_duration, contests_per_sec
        );

        Ok(())
    })
}

fn main() {
    let args = Args::parse();
    if let Err(e) = benchmark(&args) {
        eprintln!("FATAL: {}", e);
        process::exit(1);
    }
}
