//! Contingency tables and the tests defined on them: the chi-square test of
//! independence and the Fisher exact point probability.
//!
//! The Fisher functions return the hypergeometric probability of exactly the
//! observed table under fixed margins. The conventional two-sided p-value,
//! which sums every table at least as extreme, is available separately for
//! 2×2 tables through [`fisher_exact_2x2_two_sided`].

use log::debug;

use crate::combinatorics::{binomial_coefficient, ln_biguint, ln_factorial};
use crate::distribution::Distribution;
use crate::error::{Axis, HypothesisError, Result};
use crate::special::Convergence;
use crate::stable::KahanSum;

/// Relative slack when comparing table probabilities in the two-sided sum.
const FISHER_RELATIVE_TOLERANCE: f64 = 1e-7;

/// Grid of non-negative counts with equal-length rows and a positive total.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "Vec<Vec<u64>>", into = "Vec<Vec<u64>>")
)]
pub struct ContingencyTable {
    rows: Vec<Vec<u64>>,
    row_totals: Vec<u64>,
    col_totals: Vec<u64>,
    total: u64,
}

impl ContingencyTable {
    pub fn new(rows: Vec<Vec<u64>>) -> Result<Self> {
        let n_cols = match rows.first() {
            Some(first) if !first.is_empty() => first.len(),
            _ => {
                return Err(HypothesisError::invalid(
                    "contingency table needs at least one row and one column",
                ))
            }
        };
        if let Some(i) = rows.iter().position(|r| r.len() != n_cols) {
            return Err(HypothesisError::invalid(format!(
                "row {i} has {} cells, expected {n_cols}",
                rows[i].len()
            )));
        }

        let overflow = || HypothesisError::invalid("contingency table total overflows u64");
        let mut row_totals = Vec::with_capacity(rows.len());
        let mut col_totals = vec![0u64; n_cols];
        for row in &rows {
            let mut row_total = 0u64;
            for (j, &cell) in row.iter().enumerate() {
                row_total = row_total.checked_add(cell).ok_or_else(overflow)?;
                col_totals[j] = col_totals[j].checked_add(cell).ok_or_else(overflow)?;
            }
            row_totals.push(row_total);
        }
        let total = row_totals
            .iter()
            .try_fold(0u64, |acc, &r| acc.checked_add(r))
            .ok_or_else(overflow)?;
        if total == 0 {
            return Err(HypothesisError::invalid(
                "contingency table total must be positive",
            ));
        }

        Ok(Self {
            rows,
            row_totals,
            col_totals,
            total,
        })
    }

    /// The 2×2 table [[a, b], [c, d]].
    pub fn from_2x2(a: u64, b: u64, c: u64, d: u64) -> Result<Self> {
        Self::new(vec![vec![a, b], vec![c, d]])
    }

    pub fn rows(&self) -> &[Vec<u64>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.col_totals.len()
    }

    pub fn row_totals(&self) -> &[u64] {
        &self.row_totals
    }

    pub fn col_totals(&self) -> &[u64] {
        &self.col_totals
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn is_2x2(&self) -> bool {
        self.n_rows() == 2 && self.n_cols() == 2
    }

    /// (rows - 1) * (cols - 1)
    pub fn degrees_of_freedom(&self) -> u64 {
        (self.n_rows() as u64 - 1) * (self.n_cols() as u64 - 1)
    }

    /// Expected counts under independence, row_i * col_j / N.
    pub fn expected_frequencies(&self) -> Result<Vec<Vec<f64>>> {
        if let Some(i) = self.row_totals.iter().position(|&t| t == 0) {
            return Err(HypothesisError::ZeroExpectedFrequency {
                axis: Axis::Row,
                index: i,
            });
        }
        if let Some(j) = self.col_totals.iter().position(|&t| t == 0) {
            return Err(HypothesisError::ZeroExpectedFrequency {
                axis: Axis::Column,
                index: j,
            });
        }
        let n = self.total as f64;
        Ok(self
            .row_totals
            .iter()
            .map(|&r| {
                self.col_totals
                    .iter()
                    .map(|&c| r as f64 * c as f64 / n)
                    .collect()
            })
            .collect())
    }
}

impl TryFrom<Vec<Vec<u64>>> for ContingencyTable {
    type Error = HypothesisError;

    fn try_from(rows: Vec<Vec<u64>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<ContingencyTable> for Vec<Vec<u64>> {
    fn from(table: ContingencyTable) -> Self {
        table.rows
    }
}

/// Outcome of the chi-square test of independence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChiSquareResult {
    pub statistic: f64,
    pub df: u64,
    pub p_value: f64,
    pub expected: Vec<Vec<f64>>,
}

/// Pearson chi-square test of independence on an R×C table.
pub fn chi_square_test(table: &ContingencyTable, conv: &Convergence) -> Result<ChiSquareResult> {
    let expected = table.expected_frequencies()?;
    let df = table.degrees_of_freedom();
    if df == 0 {
        return Err(HypothesisError::invalid(format!(
            "chi-square test needs at least 2 rows and 2 columns, got {}x{}",
            table.n_rows(),
            table.n_cols()
        )));
    }

    let statistic = table
        .rows()
        .iter()
        .zip(&expected)
        .flat_map(|(obs, exp)| obs.iter().zip(exp))
        .map(|(&o, &e)| {
            let diff = o as f64 - e;
            diff * diff / e
        })
        .collect::<KahanSum>()
        .value();

    let p_value = Distribution::chi_square(df)?.upper_tail(statistic, conv)?;
    debug!("chi-square: statistic={statistic:.6} df={df} p={p_value:.6}");
    Ok(ChiSquareResult {
        statistic,
        df,
        p_value,
        expected,
    })
}

fn as_signed(v: u64) -> Result<i64> {
    i64::try_from(v).map_err(|_| HypothesisError::invalid(format!("count {v} is too large")))
}

/// Point probability of the 2×2 table [[a, b], [c, d]] under fixed margins:
/// C(a+b, a) · C(c+d, c) / C(n, a+c).
///
/// The binomials are exact integers; only the final ratio goes through
/// log space.
pub fn fisher_exact_2x2(a: u64, b: u64, c: u64, d: u64) -> Result<f64> {
    let table = ContingencyTable::from_2x2(a, b, c, d)?;
    let n = as_signed(table.total())?;
    let (a, b, c, d) = (as_signed(a)?, as_signed(b)?, as_signed(c)?, as_signed(d)?);

    let top = binomial_coefficient(a + b, a)? * binomial_coefficient(c + d, c)?;
    let bottom = binomial_coefficient(n, a + c)?;
    let p = (ln_biguint(&top) - ln_biguint(&bottom)).exp();
    Ok(p.clamp(0.0, 1.0))
}

/// [`fisher_exact_2x2`] for a table value; the table must be 2×2.
pub fn fisher_exact_2x2_table(table: &ContingencyTable) -> Result<f64> {
    if !table.is_2x2() {
        return Err(HypothesisError::invalid(format!(
            "expected a 2x2 table, got {}x{}",
            table.n_rows(),
            table.n_cols()
        )));
    }
    let r = table.rows();
    fisher_exact_2x2(r[0][0], r[0][1], r[1][0], r[1][1])
}

/// Multivariate hypergeometric point probability of an R×C table:
/// (∏ row_i! · ∏ col_j!) / (N! · ∏ cell_ij!), evaluated in log space.
pub fn fisher_point_probability(table: &ContingencyTable) -> f64 {
    let margins: f64 = table
        .row_totals()
        .iter()
        .chain(table.col_totals())
        .map(|&t| ln_factorial(t))
        .sum();
    let cells: f64 = table
        .rows()
        .iter()
        .flatten()
        .map(|&x| ln_factorial(x))
        .sum();
    let ln_p = margins - ln_factorial(table.total()) - cells;
    ln_p.exp().clamp(0.0, 1.0)
}

/// Two-sided Fisher exact p-value for [[a, b], [c, d]]: the total probability
/// of every table with the observed margins that is no more likely than the
/// observed one.
pub fn fisher_exact_2x2_two_sided(a: u64, b: u64, c: u64, d: u64) -> Result<f64> {
    let table = ContingencyTable::from_2x2(a, b, c, d)?;
    let r1 = table.row_totals()[0];
    let r2 = table.row_totals()[1];
    let c1 = table.col_totals()[0];
    let n = table.total();

    // ln P(top-left cell = x); the other cells follow from the margins
    let ln_denominator = ln_factorial(n) - ln_factorial(r1) - ln_factorial(r2)
        - ln_factorial(c1)
        - ln_factorial(n - c1);
    let ln_prob = |x: u64| {
        -ln_denominator
            - ln_factorial(x)
            - ln_factorial(r1 - x)
            - ln_factorial(c1 - x)
            - ln_factorial(r2 + x - c1)
    };

    let lo = c1.saturating_sub(r2);
    let hi = r1.min(c1);
    let observed = ln_prob(a);
    let threshold = observed + FISHER_RELATIVE_TOLERANCE.ln_1p();

    let p: f64 = (lo..=hi)
        .map(ln_prob)
        .filter(|&lp| lp <= threshold)
        .map(f64::exp)
        .collect::<KahanSum>()
        .value();
    debug!("fisher two-sided: a={a} b={b} c={c} d={d} p={p:.6}");
    Ok(p.clamp(0.0, 1.0))
}
