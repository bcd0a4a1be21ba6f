//! A CLI tool for generating RAIRE assertions for every contest in a
//! `.raire` or ballot-signature `.txt` file and estimating how many ballots
//! auditing them will take.

use std::fmt::{Display, Formatter};

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use log::{error, warn, LevelFilter};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Logger, Root},
    encode::pattern::PatternEncoder,
    Config,
};
use serde::Serialize;

use raire_audit::{
    audit::{simple_irv_assertions, unrefuted_outcomes},
    compute_raire_assertions,
    cvr::load,
    estimator::EstimatorKind,
    irv::simulate_irv,
    model::{Assertion, Contest},
    AuditConfig, AuditOutcome, Error,
};

const PROGRAM_NAME: &str = "raire-cli";

const ABOUT_TEXT: &str = "Generate assertions for a risk-limiting audit of IRV contests.

EXIT CODES:
     0: Every contest can be audited.
   255: Ran successfully, but at least one contest cannot be audited.
 Other: Error.";

const RAIRE_PATH: &str = "RAIRE_PATH";
const VERBOSE: &str = "verbose";
const AGAP: &str = "agap";
const ESTIMATOR: &str = "estimator";
const RISK_LIMIT: &str = "risk-limit";
const MAX_ITERATIONS: &str = "max-iterations";
const CONFIG: &str = "config";
const JSON: &str = "json";
const CHECK: &str = "check";
const SIMPLE: &str = "simple";

const RAIRE_PATH_HELP: &str = "The path to a contest file, in .raire format or as .txt ballot signatures";

/// Construct the CLI configuration.
fn cli() -> Command {
    // Make the build dirty when the toml changes.
    include_str!("../Cargo.toml");

    clap::command!(PROGRAM_NAME)
        .about(ABOUT_TEXT)
        .arg(
            Arg::new(RAIRE_PATH)
                .help(RAIRE_PATH_HELP)
                .action(ArgAction::Set)
                .required(true),
        )
        .arg(
            Arg::new(VERBOSE)
                .short('v')
                .long(VERBOSE)
                .help("Print every assertion, and log the search")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(AGAP)
                .long(AGAP)
                .help("Accept an audit within this much of the easiest possible")
                .value_parser(value_parser!(f64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(ESTIMATOR)
                .long(ESTIMATOR)
                .help("How assertion difficulty is measured")
                .value_parser(["polling", "comparison"])
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(RISK_LIMIT)
                .long(RISK_LIMIT)
                .help("Risk limit used to estimate sample sizes")
                .value_parser(value_parser!(f64))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(MAX_ITERATIONS)
                .long(MAX_ITERATIONS)
                .help("Give up on a contest after this many refinement steps")
                .value_parser(value_parser!(usize))
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(CONFIG)
                .long(CONFIG)
                .help("JSON file of settings; flags take precedence")
                .action(ArgAction::Set),
        )
        .arg(
            Arg::new(JSON)
                .long(JSON)
                .help("Print one JSON object per contest")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(CHECK)
                .long(CHECK)
                .help("Check every certificate against the ballots before reporting it")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new(SIMPLE)
                .long(SIMPLE)
                .help("Also compare each audit with the simple winner against runner-up audit")
                .action(ArgAction::SetTrue),
        )
}

/// Assemble the audit settings from the config file (if any) and flags.
fn config_from(args: &ArgMatches) -> Result<AuditConfig, Error> {
    let mut config = match args.get_one::<String>(CONFIG) {
        Some(path) => AuditConfig::from_json_file(path)?,
        None => AuditConfig::default(),
    };
    if let Some(&agap) = args.get_one::<f64>(AGAP) {
        config = config.with_agap(agap);
    }
    if let Some(estimator) = args.get_one::<String>(ESTIMATOR) {
        let estimator = match estimator.as_str() {
            "polling" => EstimatorKind::BallotPolling,
            _ => EstimatorKind::BallotComparison,
        };
        config = config.with_estimator(estimator);
    }
    if let Some(&risk_limit) = args.get_one::<f64>(RISK_LIMIT) {
        config = config.with_risk_limit(risk_limit);
    }
    if let Some(&max_iterations) = args.get_one::<usize>(MAX_ITERATIONS) {
        config = config.with_max_iterations(max_iterations);
    }
    config.validate()?;
    Ok(config)
}

/// Ballots needed by one way of auditing a contest.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Cost {
    Ballots(u64),
    FullRecount,
    Unavailable,
}

impl Cost {
    fn of(sample_size: u64, total_ballots: u64) -> Self {
        if sample_size >= total_ballots && sample_size > 0 {
            Self::FullRecount
        } else {
            Self::Ballots(sample_size)
        }
    }
}

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ballots(n) => write!(f, "{n}"),
            Self::FullRecount => write!(f, "Full Recount"),
            Self::Unavailable => write!(f, "none"),
        }
    }
}

/// What we found out about one contest.
#[derive(Debug, PartialEq)]
struct ContestReport {
    path: String,
    contest: Contest,
    outcome: AuditOutcome,
    /// Estimated sample size for each assertion, capped at a full recount.
    sample_sizes: Vec<u64>,
    /// Problems found by `--check`.
    problems: Vec<String>,
    /// Cost of the simple audit, found by `--simple`.
    simple: Option<Cost>,
}

impl ContestReport {
    /// Sample size for the audit as a whole.
    fn asn(&self) -> u64 {
        self.sample_sizes.iter().copied().max().unwrap_or_default()
    }

    fn percentage(&self, sample_size: u64) -> f64 {
        if self.contest.total_ballots == 0 {
            0.0
        } else {
            100.0 * sample_size as f64 / self.contest.total_ballots as f64
        }
    }

    fn succeeded(&self) -> bool {
        self.outcome.is_certified() && self.problems.is_empty()
    }

    /// The simple audit and RAIRE side by side, if `--simple` was given.
    fn comparison(&self) -> Option<String> {
        let simple = self.simple?;
        let raire = if self.outcome.is_certified() {
            Cost::of(self.asn(), self.contest.total_ballots)
        } else {
            Cost::Unavailable
        };
        let prefix = format!("File {}, Contest {}", self.path, self.contest.id);
        Some(match simple {
            Cost::Unavailable => format!("{prefix}, no simple audit, RAIRE, {raire}"),
            simple => format!("{prefix}, simple audit, {simple}, RAIRE, {raire}"),
        })
    }
}

impl Display for ContestReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "File {}, Contest {}, ", self.path, self.contest.id)?;
        match &self.outcome {
            AuditOutcome::Certified(_) => {
                write!(f, "asn {}, {:.2}%", self.asn(), self.percentage(self.asn()))
            }
            AuditOutcome::Impossible => write!(f, "No audit possible"),
            AuditOutcome::Exhausted => write!(f, "Search exhausted"),
        }
    }
}

/// Machine-readable form of a [`ContestReport`].
#[derive(Serialize)]
struct JsonReport<'a> {
    contest: &'a str,
    outcome: &'static str,
    asn: Option<u64>,
    assertions: &'a [Assertion],
    problems: &'a [String],
}

impl<'a> From<&'a ContestReport> for JsonReport<'a> {
    fn from(report: &'a ContestReport) -> Self {
        let outcome = match report.outcome {
            AuditOutcome::Certified(_) => "certified",
            AuditOutcome::Impossible => "impossible",
            AuditOutcome::Exhausted => "exhausted",
        };
        Self {
            contest: &report.contest.id,
            outcome,
            asn: report.outcome.is_certified().then(|| report.asn()),
            assertions: report.outcome.assertions().unwrap_or_default(),
            problems: &report.problems,
        }
    }
}

/// Audit every contest in the file at `path`.
fn audit_file(path: &str, config: &AuditConfig, check: bool, compare: bool) -> Result<Vec<ContestReport>, Error> {
    let data = load(path)?;
    let estimator = config.estimator();
    let sample_size = config.sample_size();
    let options = config.search_options();

    let mut reports = Vec::with_capacity(data.contests.len());
    for contest in &data.contests {
        let ballots = data.ballots_for(contest)?;
        let counted = simulate_irv(contest, &ballots);
        if counted.winner != contest.winner {
            warn!(
                "Contest {} reports {} as the winner, but {} wins the count",
                contest.id, contest.winner, counted.winner
            );
        }

        let outcome = compute_raire_assertions(contest, &ballots, &estimator, &options)?;
        let assertions = outcome.assertions().unwrap_or_default();
        let sample_sizes = assertions
            .iter()
            .map(|a| sample_size.estimate(a, contest.total_ballots).min(contest.total_ballots))
            .collect();

        let mut problems = Vec::new();
        if check && outcome.is_certified() {
            for assertion in assertions {
                let recounted = assertion.recount(&data.cvrs);
                if recounted != (assertion.votes_for_winner, assertion.votes_for_loser) {
                    problems.push(format!("{assertion} recounts as {recounted:?}"));
                }
            }
            for tail in unrefuted_outcomes(contest, assertions) {
                problems.push(format!("outcome {} is not ruled out", tail.join(" ")));
            }
            for problem in &problems {
                error!("Contest {}: {}", contest.id, problem);
            }
        }

        let simple = if compare {
            Some(match counted.runner_up() {
                _ if counted.winner != contest.winner => Cost::Unavailable,
                None => Cost::Ballots(0),
                Some(runner_up) => {
                    let audit = simple_irv_assertions(contest, &ballots, &estimator, runner_up)?;
                    if audit.is_complete() {
                        let hardest = audit
                            .assertions
                            .iter()
                            .map(|a| sample_size.estimate(a, contest.total_ballots))
                            .max()
                            .unwrap_or_default();
                        Cost::of(hardest, contest.total_ballots)
                    } else {
                        Cost::Unavailable
                    }
                }
            })
        } else {
            None
        };

        reports.push(ContestReport {
            path: path.to_string(),
            contest: contest.clone(),
            outcome,
            sample_sizes,
            problems,
            simple,
        });
    }
    Ok(reports)
}

/// Run the audits, report the results, and return the exit code.
fn run(args: &ArgMatches) -> u8 {
    let path: &String = args.get_one(RAIRE_PATH).unwrap(); // Required argument is guaranteed to be present.
    let verbose = args.get_flag(VERBOSE);
    let json = args.get_flag(JSON);

    let config = match config_from(args) {
        Ok(config) => config,
        Err(err) => {
            println!("{err}");
            return 1;
        }
    };
    let reports = match audit_file(path, &config, args.get_flag(CHECK), args.get_flag(SIMPLE)) {
        Ok(reports) => reports,
        Err(err) => {
            println!("{err}");
            return 1;
        }
    };

    for report in &reports {
        if json {
            match serde_json::to_string(&JsonReport::from(report)) {
                Ok(line) => println!("{line}"),
                Err(err) => {
                    println!("{err}");
                    return 1;
                }
            }
            continue;
        }
        if verbose {
            let assertions = report.outcome.assertions().unwrap_or_default();
            for (assertion, &size) in assertions.iter().zip(&report.sample_sizes) {
                println!("{}, est {}, {:.2}%", assertion, size, report.percentage(size));
            }
        }
        println!("{report}");
        if let Some(comparison) = report.comparison() {
            println!("{comparison}");
        }
        for problem in &report.problems {
            println!("Check failed: {problem}");
        }
    }

    if reports.iter().all(ContestReport::succeeded) {
        0
    } else {
        255
    }
}

/// Log to stderr, so that stdout holds only the results.
fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let stderr = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{d(%H:%M:%S%.3f)} {h({l})} {t} - {m}{n}")))
        .build();
    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .logger(Logger::builder().build("raire_audit", level))
        .logger(Logger::builder().build("raire_cli", level))
        .build(Root::builder().appender("stderr").build(LevelFilter::Warn));
    match config {
        Ok(config) => {
            if let Err(err) = log4rs::init_config(config) {
                eprintln!("Failed to initialise logging: {err}");
            }
        }
        Err(err) => eprintln!("Failed to initialise logging: {err}"),
    }
}

fn main() {
    let args = cli().get_matches();
    init_logging(args.get_flag(VERBOSE));
    let exit_code = run(&args);
    std::process::exit(exit_code.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        log4rs_test_utils::test_logging::init_logging_once_for(["raire_audit", "raire_cli"], None, None);
    }

    #[test]
    fn three_candidate_file() {
        init_logging();

        let reports = audit_file(
            "example_contests/three_candidates.raire",
            &AuditConfig::default(),
            true,
            false,
        )
        .unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert!(report.succeeded());
        assert_eq!(report.outcome.assertions().map(<[Assertion]>::len), Some(3));
        // MACRO at 10% risk: 2.2 ln(10) / 0.1 for the hardest margin of 10.
        assert_eq!(report.sample_sizes, [51, 34, 17]);
        assert_eq!(
            report.to_string(),
            "File example_contests/three_candidates.raire, Contest 1, asn 51, 51.00%"
        );
        assert_eq!(report.comparison(), None);

        let json = serde_json::to_value(JsonReport::from(report)).unwrap();
        assert_eq!(json["outcome"], "certified");
        assert_eq!(json["asn"], 51);
        assert_eq!(json["assertions"][0]["type"], "NEB");
    }

    #[test]
    fn file_with_a_tie() {
        init_logging();

        let reports = audit_file("example_contests/tie.raire", &AuditConfig::default(), false, false).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports[0].succeeded());
        assert_eq!(reports[1].outcome, AuditOutcome::Impossible);
        assert_eq!(
            reports[1].to_string(),
            "File example_contests/tie.raire, Contest 2, No audit possible"
        );
    }

    #[test]
    fn simple_audit_comparison() {
        init_logging();

        // 50 ABC, 30 BAC, 20 CAB. The simple audit needs B NEB C, a margin
        // of 10, where RAIRE gets by with A NEB C and A NEN B.
        let reports = audit_file("example_contests/landslide.txt", &AuditConfig::default(), true, true).unwrap();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].succeeded());
        assert_eq!(reports[0].simple, Some(Cost::Ballots(51)));
        assert_eq!(
            reports[0].comparison().unwrap(),
            "File example_contests/landslide.txt, Contest 1, simple audit, 51, RAIRE, 17"
        );

        // C is preferred to A on too many ballots for A NEB C.
        let reports = audit_file(
            "example_contests/three_candidates.raire",
            &AuditConfig::default(),
            false,
            true,
        )
        .unwrap();
        assert_eq!(reports[0].simple, Some(Cost::Unavailable));
        assert_eq!(
            reports[0].comparison().unwrap(),
            "File example_contests/three_candidates.raire, Contest 1, no simple audit, RAIRE, 51"
        );
    }

    #[test]
    fn costs() {
        assert_eq!(Cost::of(17, 100), Cost::Ballots(17));
        assert_eq!(Cost::of(0, 100), Cost::Ballots(0));
        assert_eq!(Cost::of(100, 100), Cost::FullRecount);
        assert_eq!(Cost::of(101, 100), Cost::FullRecount);
        assert_eq!(Cost::FullRecount.to_string(), "Full Recount");
        assert_eq!(Cost::Ballots(51).to_string(), "51");
    }

    #[test]
    fn correct_cli_usage() {
        init_logging();

        let command_line = [PROGRAM_NAME, "example_contests/three_candidates.raire"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let command_line = [
            PROGRAM_NAME,
            "example_contests/three_candidates.raire",
            "-v",
            "--check",
            "--estimator",
            "polling",
            "--risk-limit",
            "0.05",
        ];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let command_line = [PROGRAM_NAME, "example_contests/landslide.txt", "--simple"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let command_line = [PROGRAM_NAME, "example_contests/three_candidates.raire", "--simple", "-v"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 0);

        let command_line = [PROGRAM_NAME, "example_contests/tie.raire", "--json"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 255);

        let command_line = [
            PROGRAM_NAME,
            "example_contests/three_candidates.raire",
            "--max-iterations",
            "1",
        ];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 255);

        let command_line = [PROGRAM_NAME, "example_contests/malformed.raire"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);

        let command_line = [PROGRAM_NAME, "not a real file"];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);

        let command_line = [
            PROGRAM_NAME,
            "example_contests/three_candidates.raire",
            "--risk-limit",
            "2",
        ];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);

        let command_line = [
            PROGRAM_NAME,
            "example_contests/three_candidates.raire",
            "--config",
            "not a real config.json",
        ];
        let args = cli().try_get_matches_from(command_line).unwrap();
        assert_eq!(run(&args), 1);
    }

    #[test]
    fn bad_cli_usage() {
        // Something very wrong.
        let command_line = [PROGRAM_NAME, "this", "invocation", "is", "incorrect"];
        cli().try_get_matches_from(command_line).unwrap_err();

        // No options at all.
        let command_line = [PROGRAM_NAME];
        cli().try_get_matches_from(command_line).unwrap_err();

        // Unknown estimator.
        let command_line = [PROGRAM_NAME, "file.raire", "--estimator", "guesswork"];
        cli().try_get_matches_from(command_line).unwrap_err();

        // Not a number.
        let command_line = [PROGRAM_NAME, "file.raire", "--max-iterations", "lots"];
        cli().try_get_matches_from(command_line).unwrap_err();
    }
}
