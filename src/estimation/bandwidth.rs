//! estimation::bandwidth — cross-validated KDE bandwidth selection.
//!
//! Purpose
//! -------
//! Choose the smoothing width of a Gaussian KDE for one period by grid
//! search over candidate bandwidths, scoring each by k-fold cross-validated
//! held-out log-likelihood.
//!
//! Key behaviors
//! -------------
//! - Subsample: when the sample holds more than `sample_size` points, draw
//!   exactly `sample_size` of them uniformly without replacement from an RNG
//!   seeded with the caller's `seed`. Smaller samples are used as-is and the
//!   seed is ignored.
//! - Folds: contiguous, unshuffled; the first `n mod k` folds hold one extra
//!   point. When `2 <= n < k` the fold count drops to `n` (leave-one-out).
//! - Score: for each candidate `h`, the mean over folds of the *total*
//!   log-likelihood of the test fold under a KDE fitted on the remaining
//!   points. The highest mean wins; ties resolve to the earliest (smallest)
//!   candidate.
//!
//! Invariants & assumptions
//! ------------------------
//! - The returned bandwidth is one of `options.candidates()`; it is always
//!   finite and strictly positive.
//! - Given the same sample, options and seed the result is bit-identical.
//!
//! Conventions
//! -----------
//! - The fold loop is outermost so each training set is materialised once
//!   and shared across all candidates.
//!
//! Downstream usage
//! ----------------
//! - The distribution stage calls [`select_bandwidth`] once per period and
//!   then fits the final KDE on the *full* sample with the chosen width.
//!
//! Testing notes
//! -------------
//! - Unit tests cover fold layout, the leave-one-out fallback, insufficient
//!   data, seed determinism, seed independence below the threshold, and
//!   that wide versus tight samples pick wide versus narrow bandwidths.
use crate::estimation::{
    errors::{PolarizationError, PolarizationResult},
    kernel::GaussianKde,
    options::BandwidthOptions,
    validation::validate_sample,
};
use rand::{rngs::StdRng, seq::index, SeedableRng};
use std::ops::Range;

/// Minimum sample length for which a training set can be formed.
pub const MIN_CV_SAMPLE: usize = 2;

/// BandwidthSelection — chosen bandwidth and the search trace.
///
/// Fields
/// ------
/// - `bandwidth`: the winning candidate.
/// - `scores`: mean held-out log-likelihood per candidate, in grid order.
/// - `folds`: fold count actually used (after the small-sample fallback).
/// - `fitted_points`: number of points the search ran on (after
///   subsampling).
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthSelection {
    pub bandwidth: f64,
    pub scores: Vec<f64>,
    pub folds: usize,
    pub fitted_points: usize,
}

/// Select a KDE bandwidth for `sample`.
///
/// Parameters
/// ----------
/// - `sample`: ScoreSample for one period.
/// - `options`: candidate grid, fold count and subsampling threshold.
/// - `seed`: seed for the subsampling RNG.
///
/// Errors
/// ------
/// - `PolarizationError::InsufficientData` when `sample.len() < 2`.
/// - `PolarizationError::InvalidScore` for non-finite scores.
///
/// Examples
/// --------
/// ```rust
/// use rust_polarization::estimation::{bandwidth::select_bandwidth, options::BandwidthOptions};
///
/// let sample = [-0.8, -0.6, -0.2, 0.1, 0.5, 0.9];
/// let chosen = select_bandwidth(&sample, &BandwidthOptions::default(), 7).unwrap();
/// assert!(chosen.bandwidth >= 0.1 && chosen.bandwidth <= 1.0);
/// assert_eq!(chosen.folds, 6);
/// ```
pub fn select_bandwidth(
    sample: &[f64], options: &BandwidthOptions, seed: u64,
) -> PolarizationResult<BandwidthSelection> {
    validate_sample(sample, MIN_CV_SAMPLE)?;

    let fitted = subsample(sample, options.sample_size, seed);
    let folds = effective_folds(fitted.len(), options.folds);
    let candidates = options.candidates();

    let mut totals = vec![0.0_f64; candidates.len()];
    let mut train = Vec::with_capacity(fitted.len());

    for range in fold_ranges(fitted.len(), folds) {
        train.clear();
        train.extend_from_slice(&fitted[..range.start]);
        train.extend_from_slice(&fitted[range.end..]);
        let test = &fitted[range];

        for (total, &h) in totals.iter_mut().zip(candidates.iter()) {
            let kde = GaussianKde::fit(&train, h)?;
            *total += kde.total_log_likelihood(test);
        }
    }

    let scores: Vec<f64> = totals.iter().map(|t| t / folds as f64).collect();
    let best = argmax_first(&scores).ok_or(PolarizationError::InsufficientData {
        len: fitted.len(),
        required: MIN_CV_SAMPLE,
    })?;

    Ok(BandwidthSelection {
        bandwidth: candidates[best],
        scores,
        folds,
        fitted_points: fitted.len(),
    })
}

/// Draw `size` points without replacement when `sample.len() > size`;
/// otherwise return the sample unchanged.
pub fn subsample(sample: &[f64], size: usize, seed: u64) -> Vec<f64> {
    if sample.len() <= size {
        return sample.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    index::sample(&mut rng, sample.len(), size).into_iter().map(|i| sample[i]).collect()
}

/// Fold count after the small-sample fallback.
pub fn effective_folds(n: usize, requested: usize) -> usize {
    requested.min(n)
}

/// Contiguous fold index ranges; the first `n % k` folds get one extra
/// element.
pub fn fold_ranges(n: usize, k: usize) -> Vec<Range<usize>> {
    if k == 0 {
        return Vec::new();
    }
    let base = n / k;
    let extra = n % k;
    let mut start = 0;
    (0..k)
        .map(|fold| {
            let len = base + usize::from(fold < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect()
}

/// Index of the first maximum, ignoring NaNs.
fn argmax_first(scores: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Fold layout and the leave-one-out fallback.
    // - `InsufficientData` for samples that cannot be cross-validated.
    // - Seed determinism and seed independence below the threshold.
    // - Sensitivity of the chosen bandwidth to sample spread.
    //
    // They intentionally DO NOT cover:
    // - KDE evaluation accuracy (see `kernel`).
    // -------------------------------------------------------------------------

    fn spread_sample(n: usize) -> Vec<f64> {
        (0..n).map(|i| -0.95 + 1.9 * (i as f64) / ((n - 1) as f64)).collect()
    }

    #[test]
    // Purpose
    // -------
    // Verify contiguous fold layout with the remainder spread over the
    // leading folds.
    //
    // Given
    // -----
    // - n = 23, k = 5.
    //
    // Expect
    // ------
    // - Fold lengths [5, 5, 5, 4, 4], covering 0..23 without gaps.
    fn fold_ranges_are_contiguous_with_leading_remainder() {
        // Act
        let folds = fold_ranges(23, 5);

        // Assert
        let lens: Vec<usize> = folds.iter().map(|r| r.len()).collect();
        assert_eq!(lens, vec![5, 5, 5, 4, 4]);
        assert_eq!(folds[0].start, 0);
        assert_eq!(folds[4].end, 23);
        assert!(folds.windows(2).all(|w| w[0].end == w[1].start));
    }

    #[test]
    // Purpose
    // -------
    // Ensure samples shorter than the fold count fall back to
    // leave-one-out rather than failing.
    //
    // Given
    // -----
    // - Six scores and the default 20 folds.
    //
    // Expect
    // ------
    // - `folds == 6`, one score per candidate, bandwidth within the grid.
    fn small_sample_uses_leave_one_out() {
        // Arrange
        let sample = [-0.8, -0.6, -0.2, 0.1, 0.5, 0.9];
        let opts = BandwidthOptions::default();

        // Act
        let chosen = select_bandwidth(&sample, &opts, 0).expect("selection should succeed");

        // Assert
        assert_eq!(chosen.folds, 6);
        assert_eq!(chosen.scores.len(), 30);
        assert!(chosen.bandwidth >= 0.1 - 1e-12 && chosen.bandwidth <= 1.0 + 1e-12);
        assert!(chosen.scores.iter().all(|s| s.is_finite()));
    }

    #[test]
    // Purpose
    // -------
    // Ensure empty and single-point samples are rejected.
    //
    // Given
    // -----
    // - An empty sample and `[0.4]`.
    //
    // Expect
    // ------
    // - `InsufficientData { len, required: 2 }` in both cases.
    fn insufficient_samples_are_rejected() {
        // Arrange
        let opts = BandwidthOptions::default();

        // Act
        let empty = select_bandwidth(&[], &opts, 0);
        let single = select_bandwidth(&[0.4], &opts, 0);

        // Assert
        assert_eq!(empty, Err(PolarizationError::InsufficientData { len: 0, required: 2 }));
        assert_eq!(single, Err(PolarizationError::InsufficientData { len: 1, required: 2 }));
    }

    #[test]
    // Purpose
    // -------
    // Verify that bandwidth selection is deterministic for a fixed seed
    // when subsampling is active.
    //
    // Given
    // -----
    // - 300 scores with a subsampling threshold of 120 and 10 folds.
    //
    // Expect
    // ------
    // - Two runs with seed 42 return identical selections, on 120 points.
    fn fixed_seed_is_deterministic_with_subsampling() {
        // Arrange
        let sample = spread_sample(300);
        let opts = BandwidthOptions::new(120, (0.1, 1.0, 30), 10).expect("valid options");

        // Act
        let first = select_bandwidth(&sample, &opts, 42).expect("first run");
        let second = select_bandwidth(&sample, &opts, 42).expect("second run");

        // Assert
        assert_eq!(first, second);
        assert_eq!(first.fitted_points, 120);
    }

    #[test]
    // Purpose
    // -------
    // Verify that the seed has no effect when the sample does not exceed
    // the subsampling threshold.
    //
    // Given
    // -----
    // - 60 scores, default options (threshold 1000), seeds 1 and 999.
    //
    // Expect
    // ------
    // - Identical bandwidths and score traces.
    fn seed_is_irrelevant_below_threshold() {
        // Arrange
        let sample = spread_sample(60);
        let opts = BandwidthOptions::default();

        // Act
        let a = select_bandwidth(&sample, &opts, 1).expect("run a");
        let b = select_bandwidth(&sample, &opts, 999).expect("run b");

        // Assert
        assert_eq!(a, b);
        assert_eq!(a.fitted_points, 60);
    }

    #[test]
    // Purpose
    // -------
    // Pin the subsampling boundary: a sample exactly at the threshold is
    // used whole, in its original order.
    //
    // Given
    // -----
    // - 40 scores with `sample_size = 40` (and 39 for contrast), 8 folds.
    //
    // Expect
    // ------
    // - `subsample` returns the input unchanged for any seed at n == size.
    // - Selections at n == size agree across seeds and fit all 40 points.
    // - At size 39 a subsample of 39 points is drawn.
    fn sample_at_threshold_is_not_subsampled() {
        // Arrange
        let sample = spread_sample(40);
        let at = BandwidthOptions::new(40, (0.1, 1.0, 30), 8).expect("valid options");
        let below = BandwidthOptions::new(39, (0.1, 1.0, 30), 8).expect("valid options");

        // Act
        let kept_a = subsample(&sample, 40, 5);
        let kept_b = subsample(&sample, 40, 6);
        let a = select_bandwidth(&sample, &at, 5).expect("run a");
        let b = select_bandwidth(&sample, &at, 6).expect("run b");
        let drawn = select_bandwidth(&sample, &below, 5).expect("subsampled run");

        // Assert
        assert_eq!(kept_a, sample);
        assert_eq!(kept_b, sample);
        assert_eq!(a, b);
        assert_eq!(a.fitted_points, 40);
        assert_eq!(drawn.fitted_points, 39);
    }

    #[test]
    // Purpose
    // -------
    // Check that subsampling draws distinct positions of the original
    // sample and keeps the requested size.
    //
    // Given
    // -----
    // - 50 distinct scores subsampled to 20.
    //
    // Expect
    // ------
    // - 20 values, all distinct, all drawn from the input.
    fn subsample_draws_without_replacement() {
        // Arrange
        let sample = spread_sample(50);

        // Act
        let drawn = subsample(&sample, 20, 3);

        // Assert
        assert_eq!(drawn.len(), 20);
        let mut sorted = drawn.clone();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup();
        assert_eq!(sorted.len(), 20);
        assert!(drawn.iter().all(|x| sample.contains(x)));
    }

    #[test]
    // Purpose
    // -------
    // Sanity-check the selection criterion: two tight, well-separated
    // clusters favour the narrowest candidate, whereas an evenly spread
    // sample favours a wider one.
    //
    // Given
    // -----
    // - Tight clusters of 20 points at ±0.7 (jitter 0.01).
    // - 40 evenly spaced points on [-0.95, 0.95].
    //
    // Expect
    // ------
    // - The clustered sample picks 0.1; the spread sample picks > 0.1.
    fn clustered_sample_prefers_narrower_bandwidth() {
        // Arrange
        let clustered: Vec<f64> = (0..40)
            .map(|i| {
                let centre = if i % 2 == 0 { -0.7 } else { 0.7 };
                centre + 0.01 * ((i / 2) as f64 / 19.0 - 0.5)
            })
            .collect();
        let spread = spread_sample(40);
        let opts = BandwidthOptions::default();

        // Act
        let tight = select_bandwidth(&clustered, &opts, 0).expect("clustered");
        let wide = select_bandwidth(&spread, &opts, 0).expect("spread");

        // Assert
        assert!((tight.bandwidth - 0.1).abs() < 1e-12, "tight = {}", tight.bandwidth);
        assert!(wide.bandwidth > 0.1, "wide = {}", wide.bandwidth);
    }

    #[test]
    // Purpose
    // -------
    // Verify that ties resolve to the earliest candidate and NaNs are
    // skipped.
    //
    // Given
    // -----
    // - Scores [NaN, 1.0, 3.0, 3.0].
    //
    // Expect
    // ------
    // - Index 2.
    fn argmax_prefers_first_maximum() {
        assert_eq!(argmax_first(&[f64::NAN, 1.0, 3.0, 3.0]), Some(2));
        assert_eq!(argmax_first(&[]), None);
    }
}
