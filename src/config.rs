use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::audit::SearchOptions;
use crate::error::{Error, Result};
use crate::estimator::{EstimatorKind, SampleSize};

/// Settings for an audit run, loadable from a JSON file. Every field is
/// optional in the file and can be overridden from the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuditConfig {
    agap: f64,
    max_iterations: Option<usize>,
    estimator: EstimatorKind,
    risk_limit: f64,
    gamma: f64,
    lambda: f64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            agap: 0.0,
            max_iterations: None,
            estimator: EstimatorKind::default(),
            risk_limit: 0.10,
            gamma: 1.1,
            lambda: 0.0,
        }
    }
}

impl AuditConfig {
    /// Load and validate a config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: Self = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every setting is in range.
    pub fn validate(&self) -> Result<()> {
        if !(self.agap >= 0.0 && self.agap.is_finite()) {
            return Err(Error::Config(format!("agap must be non-negative, not {}", self.agap)));
        }
        if !(self.risk_limit > 0.0 && self.risk_limit < 1.0) {
            return Err(Error::Config(format!(
                "risk limit must be strictly between 0 and 1, not {}",
                self.risk_limit
            )));
        }
        if !(self.gamma > 0.5) {
            return Err(Error::Config(format!("gamma must exceed 0.5, not {}", self.gamma)));
        }
        if !(self.lambda >= 0.0) {
            return Err(Error::Config(format!("lambda must be non-negative, not {}", self.lambda)));
        }
        Ok(())
    }

    /// Acceptable gap between the audit found and the best possible one
    /// (`--agap`).
    pub fn agap(&self) -> f64 {
        self.agap
    }

    /// Maximum number of refinement steps per contest (`--max-iterations`).
    pub fn max_iterations(&self) -> Option<usize> {
        self.max_iterations
    }

    /// How assertion difficulty is measured (`--estimator`).
    pub fn estimator(&self) -> EstimatorKind {
        self.estimator
    }

    /// Risk limit used for sample sizes (`--risk-limit`).
    pub fn risk_limit(&self) -> f64 {
        self.risk_limit
    }

    /// MACRO error inflation factor.
    pub fn gamma(&self) -> f64 {
        self.gamma
    }

    /// MACRO expected error rate.
    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn with_agap(mut self, agap: f64) -> Self {
        self.agap = agap;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_estimator(mut self, estimator: EstimatorKind) -> Self {
        self.estimator = estimator;
        self
    }

    pub fn with_risk_limit(mut self, risk_limit: f64) -> Self {
        self.risk_limit = risk_limit;
        self
    }

    /// Options for [`crate::compute_raire_assertions`].
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            agap: self.agap,
            max_iterations: self.max_iterations,
        }
    }

    /// The sample size estimator matching the chosen style of audit.
    pub fn sample_size(&self) -> SampleSize {
        match self.estimator {
            EstimatorKind::BallotPolling => SampleSize::Bravo {
                risk_limit: self.risk_limit,
            },
            EstimatorKind::BallotComparison => SampleSize::Macro {
                risk_limit: self.risk_limit,
                gamma: self.gamma,
                lambda: self.lambda,
            },
        }
    }
}
