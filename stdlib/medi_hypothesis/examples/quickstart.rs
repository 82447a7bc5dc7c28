use medi_hypothesis::{
    run, run_anova, run_chi_square, run_fisher_exact, run_t_test, ContingencyTable,
    FisherPValue, HypothesisConfig, HypothesisError, SampleGroup, SignificanceLevel, TestInput,
    TestKind, TestRequest,
};

fn main() -> Result<(), HypothesisError> {
    env_logger::init();
    let alpha = SignificanceLevel::default();

    // treatment vs control, improved / not improved
    let table = ContingencyTable::from_2x2(8, 2, 1, 5)?;
    println!("{}", run_fisher_exact(&table, alpha)?.summary());
    println!("{}", run_chi_square(&table, alpha)?.summary());

    let two_sided = HypothesisConfig::default().with_fisher_p_value(FisherPValue::TwoSided);
    let request = TestRequest::new(TestKind::FisherExact, TestInput::Table(table));
    println!("{} (two-sided)", run(&request, &two_sided)?.summary());

    // systolic blood pressure under three dosing regimens
    let low = SampleGroup::new(vec![128.0, 131.0, 125.0, 135.0, 129.0])?;
    let mid = SampleGroup::new(vec![122.0, 126.0, 119.0, 124.0, 121.0])?;
    let high = SampleGroup::new(vec![115.0, 118.0, 112.0, 120.0, 117.0])?;
    println!("{}", run_anova(&[low.clone(), mid, high.clone()], alpha)?.summary());
    println!("{}", run_t_test(&low, &high, alpha)?.summary());

    let flat = SampleGroup::new(vec![2.0, 2.0])?;
    match run_anova(&[flat.clone(), flat], alpha) {
        Ok(outcome) => println!("{}", outcome.summary()),
        Err(e) => println!("ANOVA not computed: {e}"),
    }
    Ok(())
}
