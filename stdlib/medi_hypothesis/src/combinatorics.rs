//! Exact combinatorial primitives backing the Fisher exact computations

use std::f64::consts::LN_2;

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

use crate::error::{HypothesisError, Result};
use crate::special::ln_gamma;

/// Exact n! as an unbounded integer.
pub fn factorial(n: u64) -> BigUint {
    (2..=n).fold(BigUint::one(), |acc, i| acc * i)
}

/// Exact binomial coefficient C(n, k).
///
/// Uses the multiplicative form so no intermediate factorial is built; every
/// partial product C(n, i) is itself an integer, so the division is exact.
pub fn binomial_coefficient(n: i64, k: i64) -> Result<BigUint> {
    if n < 0 || k < 0 {
        return Err(HypothesisError::invalid(format!(
            "binomial coefficient arguments must be non-negative (n={n}, k={k})"
        )));
    }
    if k > n {
        return Err(HypothesisError::invalid(format!(
            "binomial coefficient requires k <= n (n={n}, k={k})"
        )));
    }
    let n = n as u64;
    let k = (k as u64).min(n - k as u64);
    let mut acc = BigUint::one();
    for i in 0..k {
        acc *= n - i;
        acc /= i + 1;
    }
    Ok(acc)
}

/// ln(n!), exact zero for n <= 1.
pub fn ln_factorial(n: u64) -> f64 {
    if n < 2 {
        0.0
    } else {
        ln_gamma(n as f64 + 1.0)
    }
}

/// Natural log of an arbitrarily large integer. ln(0) is -inf.
pub fn ln_biguint(value: &BigUint) -> f64 {
    if value.is_zero() {
        return f64::NEG_INFINITY;
    }
    let bits = value.bits();
    if bits <= 64 {
        return value.to_u64().map_or(f64::INFINITY, |v| (v as f64).ln());
    }
    // keep the top 64 bits, account for the rest as a power of two
    let shift = bits - 64;
    let top = (value >> shift).to_u64().unwrap_or(u64::MAX);
    (top as f64).ln() + shift as f64 * LN_2
}
