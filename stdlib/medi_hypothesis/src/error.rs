//! Error type shared by every computation in the crate

use std::fmt;

use thiserror::Error;

/// Which margin of a contingency table an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Row,
    Column,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Column => write!(f, "column"),
        }
    }
}

/// Failures a hypothesis-test computation can report.
///
/// Every variant is produced where the violation is detected; callers never
/// see a NaN or infinite statistic in place of one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HypothesisError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Expected frequency is zero: {axis} {index} has a total of 0")]
    ZeroExpectedFrequency { axis: Axis, index: usize },

    #[error("Within-group variance is zero; the test statistic is undefined")]
    ZeroWithinVariance,

    #[error("At least 2 groups are required, found {found}")]
    InsufficientGroups { found: usize },

    #[error("Group {group} has {size} observation(s), at least {minimum} required")]
    InsufficientSampleSize {
        group: usize,
        size: usize,
        minimum: usize,
    },

    #[error("Expected {expected} groups, found {found}")]
    MismatchedGroupCount { expected: usize, found: usize },

    #[error("{function} did not converge within {iterations} iterations")]
    NonConvergence {
        function: &'static str,
        iterations: usize,
    },
}

impl HypothesisError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        HypothesisError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, HypothesisError>;
