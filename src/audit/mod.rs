//! The search for a set of assertions that certifies a reported IRV winner.
//!
//! Alternate outcomes are represented by tails of an elimination order:
//! the tail `[C, B]` stands for every order in which C is eliminated second
//! to last and B wins. The search starts with one tail per losing candidate
//! and refines the hardest to rule out until refining no longer pays.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::estimator::DifficultyEstimator;
use crate::logging::{display_node, FrontierDisplay, SearchId};
use crate::model::{assertion, Assertion, ContestId, Contest, ContestBallots, Difficulty};

pub(crate) mod frontier;
pub mod minimize;
pub mod neb;
pub(crate) mod node;
pub(crate) mod search;
pub mod simple;
pub mod verify;

use frontier::Frontier;
use node::{NodeArena, NodeId, RaireNode};
use search::SearchContext;

pub use simple::{simple_irv_assertions, SimpleAudit};
pub use verify::unrefuted_outcomes;

/// Tuning for [`compute_raire_assertions`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    /// Stop refining once the hardest remaining node is within this much of
    /// the lower bound. Zero finds an audit no harder than necessary.
    pub agap: f64,
    /// Give up after this many refinement steps.
    pub max_iterations: Option<usize>,
}

/// A certificate for one contest: if every assertion holds, the reported
/// winner is the true winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    pub contest: ContestId,
    /// Hardest first.
    pub assertions: Vec<Assertion>,
}

impl Audit {
    /// Difficulty of the audit as a whole, which is that of its hardest
    /// assertion. `None` if there is nothing to audit.
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.assertions.iter().map(|a| a.difficulty).max()
    }
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditOutcome {
    Certified(Audit),
    /// Some alternate outcome cannot be ruled out by any assertion.
    Impossible,
    /// The iteration limit was reached first.
    Exhausted,
}

impl AuditOutcome {
    /// The assertions found, if the search succeeded.
    pub fn assertions(&self) -> Option<&[Assertion]> {
        match self {
            Self::Certified(audit) => Some(&audit.assertions),
            Self::Impossible | Self::Exhausted => None,
        }
    }

    pub fn is_certified(&self) -> bool {
        matches!(self, Self::Certified(_))
    }
}

/// Find a set of assertions that together rule out every elimination order
/// in which someone other than `contest.winner` wins.
///
/// Fails only if the contest or ballots are malformed; an audit that cannot
/// be found is reported through [`AuditOutcome`].
pub fn compute_raire_assertions<E>(
    contest: &Contest,
    ballots: &ContestBallots,
    estimator: &E,
    options: &SearchOptions,
) -> Result<AuditOutcome>
where
    E: DifficultyEstimator + ?Sized,
{
    contest.validate()?;
    if ballots.num_candidates() != contest.num_candidates() {
        return Err(Error::Config(format!(
            "ballots for contest {} are indexed by {} candidates, not {}",
            contest.id,
            ballots.num_candidates(),
            contest.num_candidates()
        )));
    }
    let winner = contest.winner_index().ok_or_else(|| Error::UnknownWinner {
        contest: contest.id.clone(),
        winner: contest.winner.clone(),
    })?;

    let search_id = SearchId::next();
    info!(
        "{} Auditing contest {}: {} candidates, {} ballots, winner {}",
        search_id,
        contest.id,
        contest.num_candidates(),
        ballots.len(),
        contest.winner
    );

    let context = SearchContext::new(contest, ballots, estimator);
    let outcome = Search::new(search_id, &context, options).run(winner);
    match &outcome {
        AuditOutcome::Certified(audit) => info!(
            "{} Contest {} certified with {} assertions, difficulty {}",
            search_id,
            contest.id,
            audit.assertions.len(),
            audit.difficulty().map_or_else(|| "0".to_string(), |d| d.to_string())
        ),
        AuditOutcome::Impossible => info!("{} Contest {}: no audit possible", search_id, contest.id),
        AuditOutcome::Exhausted => info!("{} Contest {}: search exhausted", search_id, contest.id),
    }
    Ok(outcome)
}

/// State of one search.
struct Search<'c, 'a, E: ?Sized> {
    id: SearchId,
    context: &'c SearchContext<'a, E>,
    options: &'c SearchOptions,
    arena: NodeArena,
    frontier: Frontier,
    /// No audit can be easier than this.
    lower_bound: f64,
}

impl<'c, 'a, E> Search<'c, 'a, E>
where
    E: DifficultyEstimator + ?Sized,
{
    fn new(id: SearchId, context: &'c SearchContext<'a, E>, options: &'c SearchOptions) -> Self {
        Self {
            id,
            context,
            options,
            arena: NodeArena::default(),
            frontier: Frontier::default(),
            lower_bound: 0.0,
        }
    }

    fn contest(&self) -> &'a Contest {
        self.context.contest
    }

    fn raise_lower_bound(&mut self, difficulty: Difficulty) {
        if let Some(value) = difficulty.value() {
            self.lower_bound = self.lower_bound.max(value);
        }
    }

    /// Put one node on the frontier for every candidate except `winner`.
    fn seed(&mut self, winner: usize) {
        let num_candidates = self.context.num_candidates();
        for candidate in (0..num_candidates).filter(|&c| c != winner) {
            let mut node = RaireNode::new(vec![candidate], num_candidates);
            self.context.find_best_audit(&mut node);
            let id = self.arena.alloc(node);
            self.frontier.insert_node(&self.arena, id);
        }
    }

    /// A complete elimination order on the frontier with no assertion to
    /// rule it out. Only a seed can be such a leaf.
    fn unbounded_leaf(&self) -> Option<NodeId> {
        self.frontier
            .iter()
            .copied()
            .find(|&id| !self.arena[id].expandable && !self.arena[id].estimate.is_bounded())
    }

    fn run(mut self, winner: usize) -> AuditOutcome {
        self.seed(winner);

        let mut iterations = 0;
        loop {
            if log_enabled!(log::Level::Trace) {
                trace!(
                    "{} Frontier with lower bound {}:\n{}",
                    self.id,
                    self.lower_bound,
                    FrontierDisplay {
                        contest: self.contest(),
                        arena: &self.arena,
                        frontier: &self.frontier,
                    }
                );
            }

            let first = match self.frontier.first() {
                Some(first) => &self.arena[first],
                None => break,
            };
            if !first.expandable {
                if let Some(leaf) = self.unbounded_leaf() {
                    debug!(
                        "{} Nothing rules out {}",
                        self.id,
                        display_node(self.contest(), &self.arena, leaf)
                    );
                    return AuditOutcome::Impossible;
                }
                break;
            }
            if let Some(estimate) = first.estimate.value() {
                if estimate <= self.lower_bound {
                    break;
                }
                if self.options.agap > 0.0 && estimate - self.lower_bound <= self.options.agap {
                    debug!(
                        "{} Stopping within {} of the lower bound {}",
                        self.id, self.options.agap, self.lower_bound
                    );
                    break;
                }
            }

            if matches!(self.options.max_iterations, Some(max) if iterations >= max) {
                warn!(
                    "{} Giving up on contest {} after {} iterations",
                    self.id,
                    self.contest().id,
                    iterations
                );
                return AuditOutcome::Exhausted;
            }
            iterations += 1;

            if self.refine().is_none() {
                return AuditOutcome::Impossible;
            }
        }

        debug!(
            "{} Search finished after {} iterations and {} nodes",
            self.id,
            iterations,
            self.arena.len()
        );
        self.collect()
    }

    /// Take the hardest node off the frontier and replace it with something
    /// easier. Returns `None` if some outcome below it can never be ruled
    /// out.
    fn refine(&mut self) -> Option<()> {
        let id = self.frontier.pop_first()?;
        let node = &self.arena[id];
        debug!(
            "{} Refining {}",
            self.id,
            display_node(self.contest(), &self.arena, id)
        );

        if let Some(ancestor) = node.best_ancestor {
            if self.arena[ancestor].estimate.at_most(self.lower_bound) {
                let removed = self.frontier.replace_descendents(&self.arena, ancestor);
                debug!(
                    "{} Best ancestor is within the lower bound, replaced {} nodes",
                    self.id, removed
                );
                return Some(());
            }
        }

        let dive = self.context.perform_dive(&self.arena, id);
        if !dive.is_bounded() {
            debug!("{} Dive found an outcome that cannot be ruled out", self.id);
            return None;
        }
        self.raise_lower_bound(dive);

        let ancestor = self.arena.inherited_ancestor(id);
        let num_candidates = self.context.num_candidates();
        let tail = self.arena[id].tail.clone();
        for candidate in (0..num_candidates).filter(|c| !tail.contains(c)) {
            let mut child = RaireNode::extending(&tail, candidate, num_candidates);
            self.context.find_best_audit(&mut child);
            debug_assert!(child.is_descendent_of(&self.arena[ancestor]));
            child.best_ancestor = Some(ancestor);
            let ancestor_estimate = self.arena[ancestor].estimate;

            if !child.expandable {
                if !child.estimate.is_bounded() && !ancestor_estimate.is_bounded() {
                    debug!("{} Leaf cannot be ruled out", self.id);
                    return None;
                }
                if child.estimate < ancestor_estimate {
                    let estimate = child.estimate;
                    let child = self.arena.alloc(child);
                    self.frontier.insert_node(&self.arena, child);
                    self.raise_lower_bound(estimate);
                } else {
                    self.frontier.replace_descendents(&self.arena, ancestor);
                    self.raise_lower_bound(ancestor_estimate);
                }
            } else if ancestor_estimate.at_most(self.lower_bound) {
                self.frontier.replace_descendents(&self.arena, ancestor);
            } else {
                let child = self.arena.alloc(child);
                self.frontier.insert_node(&self.arena, child);
            }
        }
        Some(())
    }

    /// Gather and minimize the assertions of the surviving nodes.
    fn collect(self) -> AuditOutcome {
        let mut assertions = Vec::with_capacity(self.frontier.len());
        for &id in self.frontier.iter() {
            match &self.arena[id].best_assertion {
                Some(assertion) => assertions.push(assertion.clone()),
                None => {
                    error!(
                        "{} Search ended with no assertion for {}",
                        self.id,
                        display_node(self.contest(), &self.arena, id)
                    );
                    return AuditOutcome::Impossible;
                }
            }
        }

        let mut assertions = minimize::minimize(assertions);
        assertion::sort_by_difficulty(&mut assertions);
        AuditOutcome::Certified(Audit {
            contest: self.contest().id.clone(),
            assertions,
        })
    }
}
