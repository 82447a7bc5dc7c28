//! Test orchestration: one request in, one [`TestOutcome`] out.
//!
//! The runner validates that the input matches the requested test, computes
//! the statistic, converts it to a p-value and applies the significance level.
//! It holds no state between calls.

use std::fmt;

use log::debug;

use crate::config::{FisherPValue, HypothesisConfig, SignificanceLevel};
use crate::contingency::{
    chi_square_test, fisher_exact_2x2_two_sided, fisher_point_probability, ContingencyTable,
};
use crate::distribution::Distribution;
use crate::error::{HypothesisError, Result};
use crate::groups::{one_way_anova, pooled_t_test, SampleGroup};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TestKind {
    FisherExact,
    ChiSquare,
    Anova,
    TTest,
}

impl TestKind {
    pub fn name(self) -> &'static str {
        match self {
            TestKind::FisherExact => "Fisher exact test",
            TestKind::ChiSquare => "Chi-square test",
            TestKind::Anova => "One-way ANOVA",
            TestKind::TTest => "Two-sample t-test",
        }
    }

    /// Whether the test runs on a contingency table rather than sample groups.
    pub fn takes_table(self) -> bool {
        matches!(self, TestKind::FisherExact | TestKind::ChiSquare)
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum TestInput {
    Table(ContingencyTable),
    Groups(Vec<SampleGroup>),
}

/// A single test to run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestRequest {
    pub kind: TestKind,
    pub input: TestInput,
    /// Overrides the config's level when set.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub significance_level: Option<SignificanceLevel>,
}

impl TestRequest {
    pub fn new(kind: TestKind, input: TestInput) -> Self {
        Self {
            kind,
            input,
            significance_level: None,
        }
    }

    pub fn with_significance_level(mut self, level: SignificanceLevel) -> Self {
        self.significance_level = Some(level);
        self
    }
}

/// Statistic, p-value and decision returned to the caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestOutcome {
    pub kind: TestKind,
    /// For the Fisher test this is the point probability of the observed table.
    pub statistic: f64,
    pub p_value: f64,
    pub reject_null: bool,
    pub significance_level: SignificanceLevel,
    /// Reference distribution of the statistic; `None` for the Fisher test.
    pub distribution: Option<Distribution>,
}

impl TestOutcome {
    fn new(
        kind: TestKind,
        statistic: f64,
        p_value: f64,
        level: SignificanceLevel,
        distribution: Option<Distribution>,
    ) -> Self {
        Self {
            kind,
            statistic,
            p_value,
            reject_null: level.rejects(p_value),
            significance_level: level,
            distribution,
        }
    }

    /// One-line human-readable result.
    pub fn summary(&self) -> String {
        let decision = if self.reject_null {
            "reject the null hypothesis"
        } else {
            "fail to reject the null hypothesis"
        };
        let dist = self
            .distribution
            .map(|d| format!(" [{d}]"))
            .unwrap_or_default();
        format!(
            "{}: statistic = {:.4}, p = {:.4}{dist}; {decision} at alpha = {}",
            self.kind, self.statistic, self.p_value, self.significance_level
        )
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Run a request with the given engine configuration.
///
/// The request's significance level wins over the config's; the config also
/// supplies the convergence settings and the Fisher p-value mode.
pub fn run(request: &TestRequest, config: &HypothesisConfig) -> Result<TestOutcome> {
    let conv = config.convergence()?;
    let level = request
        .significance_level
        .unwrap_or(config.significance_level);
    let outcome = match (request.kind, &request.input) {
        (TestKind::FisherExact, TestInput::Table(table)) => {
            // log space; exact binomials grow quadratically with the total
            let point = fisher_point_probability(table);
            let p_value = match config.fisher_p_value {
                FisherPValue::PointProbability => point,
                FisherPValue::TwoSided => {
                    if !table.is_2x2() {
                        return Err(HypothesisError::invalid(format!(
                            "two-sided Fisher p-value needs a 2x2 table, got {}x{}",
                            table.n_rows(),
                            table.n_cols()
                        )));
                    }
                    let r = table.rows();
                    fisher_exact_2x2_two_sided(r[0][0], r[0][1], r[1][0], r[1][1])?
                }
            };
            TestOutcome::new(request.kind, point, p_value, level, None)
        }
        (TestKind::ChiSquare, TestInput::Table(table)) => {
            let res = chi_square_test(table, &conv)?;
            TestOutcome::new(
                request.kind,
                res.statistic,
                res.p_value,
                level,
                Some(Distribution::ChiSquare { df: res.df }),
            )
        }
        (TestKind::Anova, TestInput::Groups(groups)) => {
            let res = one_way_anova(groups, &conv)?;
            TestOutcome::new(
                request.kind,
                res.f_statistic,
                res.p_value,
                level,
                Some(Distribution::F {
                    d1: res.df_between,
                    d2: res.df_within,
                }),
            )
        }
        (TestKind::TTest, TestInput::Groups(groups)) => {
            let res = pooled_t_test(groups, &conv)?;
            TestOutcome::new(
                request.kind,
                res.t_statistic,
                res.p_value,
                level,
                Some(Distribution::StudentT { df: res.df }),
            )
        }
        (kind, _) => {
            let expected = if kind.takes_table() {
                "a contingency table"
            } else {
                "sample groups"
            };
            return Err(HypothesisError::invalid(format!(
                "{kind} expects {expected}"
            )));
        }
    };
    debug!(
        "{}: statistic={:.6} p={:.6} reject={}",
        outcome.kind, outcome.statistic, outcome.p_value, outcome.reject_null
    );
    Ok(outcome)
}

fn run_default(kind: TestKind, input: TestInput, level: SignificanceLevel) -> Result<TestOutcome> {
    let request = TestRequest::new(kind, input).with_significance_level(level);
    run(&request, &HypothesisConfig::default())
}

/// Fisher exact point probability of `table` at `level`.
pub fn run_fisher_exact(table: &ContingencyTable, level: SignificanceLevel) -> Result<TestOutcome> {
    run_default(TestKind::FisherExact, TestInput::Table(table.clone()), level)
}

pub fn run_chi_square(table: &ContingencyTable, level: SignificanceLevel) -> Result<TestOutcome> {
    run_default(TestKind::ChiSquare, TestInput::Table(table.clone()), level)
}

pub fn run_anova(groups: &[SampleGroup], level: SignificanceLevel) -> Result<TestOutcome> {
    run_default(TestKind::Anova, TestInput::Groups(groups.to_vec()), level)
}

pub fn run_t_test(
    first: &SampleGroup,
    second: &SampleGroup,
    level: SignificanceLevel,
) -> Result<TestOutcome> {
    run_default(
        TestKind::TTest,
        TestInput::Groups(vec![first.clone(), second.clone()]),
        level,
    )
}
