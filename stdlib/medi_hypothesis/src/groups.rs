//! Tests over groups of real-valued observations: one-way ANOVA and the
//! two-sample pooled (equal-variance) t-test.

use log::debug;

use crate::distribution::Distribution;
use crate::error::{HypothesisError, Result};
use crate::special::Convergence;
use crate::stable::{KahanSum, Welford};

/// Non-empty sequence of finite observations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<f64>", into = "Vec<f64>"))]
pub struct SampleGroup {
    values: Vec<f64>,
    summary: Welford,
}

impl SampleGroup {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(HypothesisError::invalid("sample group is empty"));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(HypothesisError::invalid(format!(
                "observation {i} is not finite ({})",
                values[i]
            )));
        }
        let summary = Welford::from_slice(&values);
        Ok(Self { values, summary })
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn mean(&self) -> f64 {
        self.summary.mean()
    }

    /// Sample variance with an n - 1 denominator; `None` for a single value.
    pub fn variance(&self) -> Option<f64> {
        self.summary.variance_sample()
    }

    /// Sum of squared deviations from the group mean.
    pub fn sum_of_squares(&self) -> f64 {
        self.summary.sum_of_squares()
    }
}

impl TryFrom<Vec<f64>> for SampleGroup {
    type Error = HypothesisError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        Self::new(values)
    }
}

impl From<SampleGroup> for Vec<f64> {
    fn from(group: SampleGroup) -> Self {
        group.values
    }
}

fn grand_mean(groups: &[SampleGroup]) -> (f64, usize) {
    let n: usize = groups.iter().map(SampleGroup::len).sum();
    let sum = groups
        .iter()
        .flat_map(|g| g.values().iter().copied())
        .collect::<KahanSum>()
        .value();
    (sum / n as f64, n)
}

/// Outcome of a one-way analysis of variance.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub df_between: u64,
    pub df_within: u64,
    pub ss_between: f64,
    pub ss_within: f64,
    pub p_value: f64,
}

/// One-way ANOVA across `groups`.
pub fn one_way_anova(groups: &[SampleGroup], conv: &Convergence) -> Result<AnovaResult> {
    let k = groups.len();
    if k < 2 {
        return Err(HypothesisError::InsufficientGroups { found: k });
    }
    let (grand, n) = grand_mean(groups);

    let ss_between = groups
        .iter()
        .map(|g| {
            let d = g.mean() - grand;
            g.len() as f64 * d * d
        })
        .collect::<KahanSum>()
        .value();
    let ss_within = groups
        .iter()
        .map(SampleGroup::sum_of_squares)
        .collect::<KahanSum>()
        .value();

    // Welford leaves m2 at exactly 0 for constant groups and singletons
    if ss_within == 0.0 {
        return Err(HypothesisError::ZeroWithinVariance);
    }

    let df_between = (k - 1) as u64;
    let df_within = (n - k) as u64;
    let f_statistic = (ss_between / df_between as f64) / (ss_within / df_within as f64);
    let p_value = Distribution::f(df_between, df_within)?.upper_tail(f_statistic, conv)?;
    debug!(
        "anova: k={k} n={n} F={f_statistic:.6} df=({df_between}, {df_within}) p={p_value:.6}"
    );

    Ok(AnovaResult {
        f_statistic,
        df_between,
        df_within,
        ss_between,
        ss_within,
        p_value,
    })
}

/// Outcome of a pooled two-sample t-test.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TTestResult {
    pub t_statistic: f64,
    pub df: u64,
    pub mean_difference: f64,
    pub pooled_variance: f64,
    /// Two-sided.
    pub p_value: f64,
}

/// Pooled t-test over exactly two groups.
pub fn pooled_t_test(groups: &[SampleGroup], conv: &Convergence) -> Result<TTestResult> {
    match groups {
        [a, b] => pooled_t_test_pair(a, b, conv),
        _ => Err(HypothesisError::MismatchedGroupCount {
            expected: 2,
            found: groups.len(),
        }),
    }
}

/// Student's two-sample t-test assuming equal variances.
pub fn pooled_t_test_pair(
    a: &SampleGroup,
    b: &SampleGroup,
    conv: &Convergence,
) -> Result<TTestResult> {
    let (var1, var2) = match (a.variance(), b.variance()) {
        (Some(v1), Some(v2)) => (v1, v2),
        (None, _) => {
            return Err(HypothesisError::InsufficientSampleSize {
                group: 0,
                size: a.len(),
                minimum: 2,
            })
        }
        (_, None) => {
            return Err(HypothesisError::InsufficientSampleSize {
                group: 1,
                size: b.len(),
                minimum: 2,
            })
        }
    };
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let df = (a.len() + b.len() - 2) as u64;

    let mean_difference = a.mean() - b.mean();
    let pooled_variance = ((n1 - 1.0) * var1 + (n2 - 1.0) * var2) / df as f64;
    if pooled_variance == 0.0 {
        return Err(HypothesisError::ZeroWithinVariance);
    }

    let t_statistic = mean_difference / (pooled_variance * (1.0 / n1 + 1.0 / n2)).sqrt();
    let p_value = Distribution::student_t(df)?.two_sided_tail(t_statistic, conv)?;
    debug!("pooled t-test: t={t_statistic:.6} df={df} p={p_value:.6}");

    Ok(TTestResult {
        t_statistic,
        df,
        mean_difference,
        pooled_variance,
        p_value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn conv() -> Convergence {
        Convergence::default()
    }

    fn groups(data: &[&[f64]]) -> Vec<SampleGroup> {
        data.iter()
            .map(|g| SampleGroup::new(g.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn sample_group_summary() {
        let g = SampleGroup::new(vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(g.len(), 3);
        assert_abs_diff_eq!(g.mean(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(g.variance().unwrap(), 1.0, epsilon = 1e-12);
        assert_eq!(SampleGroup::new(vec![4.0]).unwrap().variance(), None);
    }

    #[test]
    fn sample_group_validation() {
        assert!(SampleGroup::new(vec![]).is_err());
        assert!(SampleGroup::new(vec![1.0, f64::NAN]).is_err());
        assert!(SampleGroup::new(vec![f64::INFINITY]).is_err());
    }

    #[test]
    fn anova_three_groups() {
        // means 2, 3, 6; SSB = 26, SSW = 6, F = (26/2)/(6/6) = 13
        let gs = groups(&[&[1.0, 2.0, 3.0], &[2.0, 3.0, 4.0], &[5.0, 6.0, 7.0]]);
        let res = one_way_anova(&gs, &conv()).unwrap();
        assert_abs_diff_eq!(res.ss_between, 26.0, epsilon = 1e-10);
        assert_abs_diff_eq!(res.ss_within, 6.0, epsilon = 1e-10);
        assert_eq!((res.df_between, res.df_within), (2, 6));
        assert_abs_diff_eq!(res.f_statistic, 13.0, epsilon = 1e-10);
        // F(2, d2) tail has the closed form (1 + 2F/d2)^(-d2/2)
        let expected = (1.0f64 + 2.0 * 13.0 / 6.0).powf(-3.0);
        assert_abs_diff_eq!(res.p_value, expected, epsilon = 1e-9);
    }

    #[test]
    fn anova_identical_values_has_zero_within_variance() {
        let gs = groups(&[&[2.0, 2.0], &[2.0, 2.0]]);
        assert_eq!(
            one_way_anova(&gs, &conv()).unwrap_err(),
            HypothesisError::ZeroWithinVariance
        );
    }

    #[test]
    fn anova_singleton_groups_have_zero_within_variance() {
        let gs = groups(&[&[1.0], &[5.0], &[9.0]]);
        assert_eq!(
            one_way_anova(&gs, &conv()).unwrap_err(),
            HypothesisError::ZeroWithinVariance
        );
    }

    #[test]
    fn tiny_spread_far_apart_is_not_zero_variance() {
        let gs = groups(&[&[0.0, 1e-6], &[1e4, 1e4 + 1e-6]]);
        let f = one_way_anova(&gs, &conv()).unwrap();
        assert!(f.ss_within > 0.0);
        assert!(f.f_statistic > 1e19);
        assert!(f.p_value < 1e-12);

        let t = pooled_t_test(&gs, &conv()).unwrap();
        assert!(t.pooled_variance > 0.0);
        assert!(t.t_statistic < -1e9);
        assert!(t.p_value < 1e-12);
    }

    #[test]
    fn anova_needs_two_groups() {
        let gs = groups(&[&[1.0, 2.0, 3.0]]);
        assert_eq!(
            one_way_anova(&gs, &conv()).unwrap_err(),
            HypothesisError::InsufficientGroups { found: 1 }
        );
        assert_eq!(
            one_way_anova(&[], &conv()).unwrap_err(),
            HypothesisError::InsufficientGroups { found: 0 }
        );
    }

    #[test]
    fn t_test_reference() {
        let gs = groups(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let res = pooled_t_test(&gs, &conv()).unwrap();
        assert_abs_diff_eq!(res.pooled_variance, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(res.mean_difference, -3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(res.t_statistic, -3.674_234_614, epsilon = 1e-6);
        assert_eq!(res.df, 4);
        assert_abs_diff_eq!(res.p_value, 0.021_312, epsilon = 1e-4);
    }

    #[test]
    fn two_group_anova_is_squared_t_test() {
        let gs = groups(&[&[1.2, 3.4, 2.2, 5.0], &[4.1, 6.3, 5.5]]);
        let t = pooled_t_test(&gs, &conv()).unwrap();
        let f = one_way_anova(&gs, &conv()).unwrap();
        assert_abs_diff_eq!(f.f_statistic, t.t_statistic.powi(2), epsilon = 1e-9);
        assert_abs_diff_eq!(f.p_value, t.p_value, epsilon = 1e-9);
    }

    #[test]
    fn t_test_group_count() {
        let gs = groups(&[&[1.0, 2.0]]);
        assert_eq!(
            pooled_t_test(&gs, &conv()).unwrap_err(),
            HypothesisError::MismatchedGroupCount {
                expected: 2,
                found: 1
            }
        );
        let gs = groups(&[&[1.0, 2.0], &[1.0, 3.0], &[2.0, 2.5]]);
        assert!(matches!(
            pooled_t_test(&gs, &conv()),
            Err(HypothesisError::MismatchedGroupCount { found: 3, .. })
        ));
    }

    #[test]
    fn t_test_sample_size() {
        let gs = groups(&[&[1.0, 2.0, 3.0], &[4.0]]);
        assert_eq!(
            pooled_t_test(&gs, &conv()).unwrap_err(),
            HypothesisError::InsufficientSampleSize {
                group: 1,
                size: 1,
                minimum: 2
            }
        );
    }

    #[test]
    fn t_test_constant_groups() {
        let gs = groups(&[&[1.0, 1.0], &[3.0, 3.0]]);
        assert_eq!(
            pooled_t_test(&gs, &conv()).unwrap_err(),
            HypothesisError::ZeroWithinVariance
        );
    }
}
