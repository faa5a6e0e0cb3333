//! Property tests for the side masses of the fitted density.
//!
//! For any mixed-sign sample inside `[-1, 1]` and any bandwidth from the
//! default candidate range, both side masses and their difference must lie
//! in `[0, 1]` and the index must be non-negative.
use proptest::prelude::*;
use rust_polarization::estimation::{
    options::IntegrationOptions, polarization::PolarizationMetrics,
};

fn mixed_sample() -> impl Strategy<Value = Vec<f64>> {
    (
        prop::collection::vec(-1.0f64..-0.01, 1..15),
        prop::collection::vec(0.01f64..1.0, 1..15),
    )
        .prop_map(|(mut neg, pos)| {
            neg.extend(pos);
            neg
        })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn side_masses_stay_in_unit_interval(sample in mixed_sample(), h in 0.1f64..1.0) {
        let out = PolarizationMetrics::compute(h, &sample, &IntegrationOptions::default())
            .expect("mixed-sign sample with spread");
        let m = out.metrics;
        prop_assert!((0.0..=1.0).contains(&m.pop_neg), "pop_neg = {}", m.pop_neg);
        prop_assert!((0.0..=1.0).contains(&m.pop_pos), "pop_pos = {}", m.pop_pos);
        prop_assert!((0.0..=1.0).contains(&m.diff_pops), "diff_pops = {}", m.diff_pops);
        prop_assert!(m.pop_neg + m.pop_pos <= 1.0 + 1e-9);
        prop_assert!(m.pol_index >= 0.0, "pol_index = {}", m.pol_index);
    }
}
