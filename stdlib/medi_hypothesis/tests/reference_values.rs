mod util;

use approx::assert_abs_diff_eq;
use medi_hypothesis::{
    binomial_coefficient, factorial, fisher_exact_2x2, one_way_anova, run_chi_square,
    run_t_test, ContingencyTable, Convergence, Distribution, HypothesisError, SampleGroup,
    SignificanceLevel,
};
use num_bigint::BigUint;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};
use util::{group, init_logger};

#[test]
fn factorials() {
    init_logger();
    assert_eq!(factorial(0), BigUint::from(1u32));
    assert_eq!(factorial(5), BigUint::from(120u32));
}

#[test]
fn binomials() {
    assert_eq!(binomial_coefficient(5, 2).unwrap(), BigUint::from(10u32));
    assert!(matches!(
        binomial_coefficient(2, 5),
        Err(HypothesisError::InvalidArgument(_))
    ));
}

#[test]
fn fisher_balanced_table() {
    init_logger();
    assert_abs_diff_eq!(fisher_exact_2x2(1, 1, 1, 1).unwrap(), 4.0 / 6.0, epsilon = 1e-12);
}

#[test]
fn chi_square_on_independent_table() {
    init_logger();
    let table = ContingencyTable::new(vec![vec![10, 10], vec![10, 10]]).unwrap();
    let out = run_chi_square(&table, SignificanceLevel::DEFAULT).unwrap();
    assert_eq!(out.statistic, 0.0);
    assert_eq!(out.p_value, 1.0);
}

#[test]
fn anova_with_constant_groups() {
    let groups = vec![group(&[2.0, 2.0]), group(&[2.0, 2.0])];
    assert_eq!(
        one_way_anova(&groups, &Convergence::default()).unwrap_err(),
        HypothesisError::ZeroWithinVariance
    );
}

#[test]
fn t_test_textbook_example() {
    init_logger();
    let out = run_t_test(
        &group(&[1.0, 2.0, 3.0]),
        &group(&[4.0, 5.0, 6.0]),
        SignificanceLevel::DEFAULT,
    )
    .unwrap();
    assert_abs_diff_eq!(out.statistic, -3.674, epsilon = 1e-3);
    assert_abs_diff_eq!(out.p_value, 0.021, epsilon = 1e-3);
    assert_eq!(out.distribution, Some(Distribution::StudentT { df: 4 }));
}

#[test]
fn chi_square_critical_value() {
    let p = Distribution::chi_square(1)
        .unwrap()
        .upper_tail(3.841, &Convergence::default())
        .unwrap();
    assert_abs_diff_eq!(p, 0.05, epsilon = 1e-3);
}

#[test]
fn chi_square_tail_matches_statrs() {
    let conv = Convergence::default();
    for df in [1u64, 2, 3, 5, 10, 30, 100] {
        let reference = ChiSquared::new(df as f64).unwrap();
        let dist = Distribution::chi_square(df).unwrap();
        for x in [0.05, 0.5, 1.0, 3.841, 7.5, 20.0, 60.0, 150.0] {
            let ours = dist.upper_tail(x, &conv).unwrap();
            assert_abs_diff_eq!(ours, reference.sf(x), epsilon = 1e-7);
        }
    }
}

#[test]
fn f_tail_matches_statrs() {
    let conv = Convergence::default();
    for (d1, d2) in [(1u64, 1u64), (1, 10), (2, 6), (3, 20), (5, 2), (12, 40)] {
        let reference = FisherSnedecor::new(d1 as f64, d2 as f64).unwrap();
        let dist = Distribution::f(d1, d2).unwrap();
        for x in [0.1, 0.5, 1.0, 2.0, 4.96, 13.0, 50.0] {
            let ours = dist.upper_tail(x, &conv).unwrap();
            assert_abs_diff_eq!(ours, reference.sf(x), epsilon = 1e-7);
        }
    }
}

#[test]
fn t_tail_matches_statrs() {
    let conv = Convergence::default();
    for df in [1u64, 2, 4, 9, 30, 200] {
        let reference = StudentsT::new(0.0, 1.0, df as f64).unwrap();
        let dist = Distribution::student_t(df).unwrap();
        for t in [-4.0, -1.5, -0.2, 0.0, 0.7, 2.0, 3.674, 8.0] {
            let ours = dist.upper_tail(t, &conv).unwrap();
            assert_abs_diff_eq!(ours, reference.sf(t), epsilon = 1e-7);
        }
    }
}

#[test]
fn requests_can_run_in_parallel() {
    let a = group(&[5.1, 4.9, 6.2, 5.8, 6.0]);
    let b = group(&[6.5, 7.1, 6.9, 7.4, 6.8]);
    let expected = run_t_test(&a, &b, SignificanceLevel::DEFAULT).unwrap();

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| run_t_test(&a, &b, SignificanceLevel::DEFAULT).unwrap()))
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), expected);
        }
    });
}

#[test]
fn sample_group_rejects_non_finite() {
    assert!(matches!(
        SampleGroup::new(vec![1.0, f64::INFINITY]),
        Err(HypothesisError::InvalidArgument(_))
    ));
}
