//! Numerically stable accumulators: Welford mean/variance and Kahan summation

/// Kahan compensated summation
#[derive(Debug, Clone, Copy, Default)]
pub struct KahanSum {
    sum: f64,
    c: f64, // compensation
}

impl KahanSum {
    fn new() -> Self {
        Self { sum: 0.0, c: 0.0 }
    }

    fn add(&mut self, x: f64) {
        let y = x - self.c;
        let t = self.sum + y;
        self.c = (t - self.sum) - y;
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum
    }
}

impl FromIterator<f64> for KahanSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut ks = KahanSum::new();
        for x in iter {
            ks.add(x);
        }
        ks
    }
}

/// Welford's online algorithm for mean and variance.
///
/// `m2` is the running sum of squared deviations from the current mean,
/// which is exactly the within-group sum of squares once all values are in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Welford {
    n: u64,
    mean: f64,
    m2: f64,
}

impl Welford {
    fn new() -> Self {
        Self {
            n: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    pub fn from_slice(xs: &[f64]) -> Self {
        let mut w = Self::new();
        for &x in xs {
            w.update(x);
        }
        w
    }

    fn update(&mut self, x: f64) {
        self.n += 1;
        let n_f = self.n as f64;
        let delta = x - self.mean;
        self.mean += delta / n_f;
        let delta2 = x - self.mean;
        self.m2 += delta * delta2;
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn sum_of_squares(&self) -> f64 {
        self.m2
    }

    /// Sample variance (n - 1 denominator); `None` below two observations.
    pub fn variance_sample(&self) -> Option<f64> {
        if self.n < 2 {
            None
        } else {
            Some(self.m2 / ((self.n as f64) - 1.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn kahan_keeps_small_increments() {
        let ks: KahanSum = std::iter::repeat(1e-8).take(1_000_000).collect();
        assert_abs_diff_eq!(ks.value(), 0.01, epsilon = 1e-12);
    }

    #[test]
    fn welford_matches_batch_stats() {
        let data = [1.0, 2.0, 3.0, 4.0];
        let w = Welford::from_slice(&data);
        let mean = data.iter().sum::<f64>() / data.len() as f64;
        let ss = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
        assert_abs_diff_eq!(w.mean(), mean, epsilon = 1e-12);
        assert_abs_diff_eq!(w.sum_of_squares(), ss, epsilon = 1e-12);
        assert_abs_diff_eq!(w.variance_sample().unwrap(), ss / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn welford_needs_two_values_for_variance() {
        assert_eq!(Welford::from_slice(&[5.0]).variance_sample(), None);
        assert_eq!(Welford::new().variance_sample(), None);
    }

    #[test]
    fn welford_constant_input_has_zero_spread() {
        let w = Welford::from_slice(&[2.0, 2.0, 2.0]);
        assert_eq!(w.sum_of_squares(), 0.0);
        assert_eq!(w.mean(), 2.0);
    }
}
