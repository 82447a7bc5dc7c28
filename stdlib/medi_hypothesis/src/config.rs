//! Engine configuration: significance level, convergence settings for the
//! CDF evaluator, and which Fisher p-value to report.
//!
//! A config can be written as TOML; every key is optional:
//!
//! ```toml
//! significance_level = 0.01
//! tolerance = 1e-12
//! max_iterations = 5000
//! fisher_p_value = "two_sided"
//! ```

use std::fmt;

use crate::error::{HypothesisError, Result};
use crate::special::Convergence;

/// Threshold below which a p-value rejects the null hypothesis.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct SignificanceLevel(f64);

impl SignificanceLevel {
    pub const DEFAULT: SignificanceLevel = SignificanceLevel(0.05);

    pub fn new(alpha: f64) -> Result<Self> {
        if alpha.is_finite() && alpha > 0.0 && alpha < 1.0 {
            Ok(Self(alpha))
        } else {
            Err(HypothesisError::invalid(format!(
                "significance level must lie strictly between 0 and 1, got {alpha}"
            )))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }

    /// Whether `p_value` is small enough to reject the null hypothesis.
    pub fn rejects(self, p_value: f64) -> bool {
        p_value < self.0
    }
}

impl Default for SignificanceLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for SignificanceLevel {
    type Error = HypothesisError;

    fn try_from(alpha: f64) -> Result<Self> {
        Self::new(alpha)
    }
}

impl From<SignificanceLevel> for f64 {
    fn from(level: SignificanceLevel) -> Self {
        level.0
    }
}

impl fmt::Display for SignificanceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which quantity the Fisher exact test reports as its p-value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FisherPValue {
    /// Hypergeometric probability of exactly the observed table.
    #[default]
    PointProbability,
    /// Sum over all tables with the same margins that are no more likely
    /// than the observed one. 2×2 tables only.
    TwoSided,
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct HypothesisConfig {
    pub significance_level: SignificanceLevel,
    pub tolerance: f64,
    pub max_iterations: usize,
    pub fisher_p_value: FisherPValue,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        let conv = Convergence::default();
        Self {
            significance_level: SignificanceLevel::DEFAULT,
            tolerance: conv.tolerance,
            max_iterations: conv.max_iterations,
            fisher_p_value: FisherPValue::default(),
        }
    }
}

impl HypothesisConfig {
    pub fn with_significance_level(mut self, level: SignificanceLevel) -> Self {
        self.significance_level = level;
        self
    }

    pub fn with_fisher_p_value(mut self, mode: FisherPValue) -> Self {
        self.fisher_p_value = mode;
        self
    }

    /// Stopping rule handed to the CDF evaluator.
    pub fn convergence(&self) -> Result<Convergence> {
        Convergence::new(self.tolerance, self.max_iterations)
    }

    pub fn validate(&self) -> Result<()> {
        self.convergence().map(|_| ())
    }

    /// Parse and validate a TOML document; absent keys keep their defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| HypothesisError::invalid(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
