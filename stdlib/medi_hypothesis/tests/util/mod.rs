#![allow(dead_code)]

use std::sync::Once;

use medi_hypothesis::SampleGroup;

static INIT: Once = Once::new();

pub fn init_logger() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub fn group(xs: &[f64]) -> SampleGroup {
    SampleGroup::new(xs.to_vec()).expect("valid sample group")
}
