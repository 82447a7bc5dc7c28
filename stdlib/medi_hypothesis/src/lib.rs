//! Hypothesis-test engine for Medi.
//!
//! Computes test statistics and p-values for the Fisher exact test, the
//! chi-square test of independence, one-way ANOVA and the pooled two-sample
//! t-test. Every p-value goes through the shared incomplete gamma/beta
//! evaluation in [`special`] via [`Distribution`].
//!
//! ```
//! use medi_hypothesis::{run_t_test, SampleGroup, SignificanceLevel};
//!
//! let a = SampleGroup::new(vec![1.0, 2.0, 3.0]).unwrap();
//! let b = SampleGroup::new(vec![4.0, 5.0, 6.0]).unwrap();
//! let outcome = run_t_test(&a, &b, SignificanceLevel::default()).unwrap();
//! assert!(outcome.reject_null);
//! assert!((outcome.p_value - 0.0213).abs() < 1e-3);
//! ```
//!
//! Every operation is a pure function of its input; values can be shared
//! across threads freely.

pub mod combinatorics;
pub mod config;
pub mod contingency;
pub mod distribution;
pub mod error;
pub mod groups;
pub mod runner;
pub mod special;
pub mod stable;

pub use combinatorics::{binomial_coefficient, factorial, ln_factorial};
pub use config::{FisherPValue, HypothesisConfig, SignificanceLevel};
pub use contingency::{
    chi_square_test, fisher_exact_2x2, fisher_exact_2x2_table, fisher_exact_2x2_two_sided,
    fisher_point_probability, ChiSquareResult, ContingencyTable,
};
pub use distribution::Distribution;
pub use error::{Axis, HypothesisError, Result};
pub use groups::{
    one_way_anova, pooled_t_test, pooled_t_test_pair, AnovaResult, SampleGroup, TTestResult,
};
pub use runner::{
    run, run_anova, run_chi_square, run_fisher_exact, run_t_test, TestInput, TestKind,
    TestOutcome, TestRequest,
};
pub use special::Convergence;
