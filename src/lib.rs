//! Generation of assertions for risk-limiting audits of instant-runoff (IRV)
//! elections.
//!
//! Given the cast vote records of a contest and its reported winner,
//! [`audit::compute_raire_assertions`] searches the tree of alternate
//! elimination orders and returns a set of assertions which, if they all hold,
//! rule out every outcome in which someone else wins.

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate audit_test;

pub mod audit;
pub mod config;
pub mod cvr;
pub mod error;
pub mod estimator;
pub mod irv;
pub mod logging;
pub mod model;
#[cfg(any(test, feature = "synthetic"))]
pub mod synthetic;

pub use audit::{compute_raire_assertions, Audit, AuditOutcome, SearchOptions};
pub use config::AuditConfig;
pub use error::{Error, Result};
pub use estimator::DifficultyEstimator;
