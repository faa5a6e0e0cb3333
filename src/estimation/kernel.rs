//! estimation::kernel — one-dimensional Gaussian kernel density estimate.
//!
//! Purpose
//! -------
//! Fit a Gaussian KDE to a sample of individual polarity scores and evaluate
//! its probability density at arbitrary points. The model is evaluated on
//! demand and never pre-tabulated; a diagnostic grid evaluation is available
//! for inspection.
//!
//! Key behaviors
//! -------------
//! - [`GaussianKde::fit`] validates the sample and bandwidth and borrows the
//!   sample; no copy is made.
//! - [`GaussianKde::log_density`] evaluates
//!   `log f̂(x) = logsumexp_i(−½((x − xᵢ)/h)²) − ln n − ln h − ln √(2π)`
//!   with a max-shift so that points far from the sample mass do not
//!   underflow to `−∞`.
//! - [`GaussianKde::density`] and [`GaussianKde::evaluate`] exponentiate the
//!   log density for scalar and vector queries.
//! - [`GaussianKde::diagnostic_grid`] evaluates the density on an evenly
//!   spaced grid over the scaled sample range (see [`GaussianKde::grid_bounds`]).
//!
//! Invariants & assumptions
//! ------------------------
//! - `bandwidth > 0` and finite; the sample is non-empty and finite.
//! - Densities returned are `>= 0`; they are exactly `0.0` only when
//!   `exp` underflows, never negative or NaN for validated inputs.
//!
//! Conventions
//! -----------
//! - Kernel shape is fixed to the standard normal.
//! - Query points are plain `f64` or `ndarray` views; results are owned
//!   `Array1<f64>` for vector queries.
//!
//! Testing notes
//! -------------
//! - Unit tests compare against closed-form normal densities for a single
//!   point, check far-tail stability of the log density, verify the grid
//!   scaling rule for all sign combinations and that the density integrates
//!   to ~1 on a wide grid.
use crate::estimation::{
    errors::PolarizationResult,
    validation::{validate_bandwidth, validate_sample},
};
use ndarray::{Array1, ArrayView1};
use statrs::{consts::LN_SQRT_2PI, statistics::Statistics};

/// GaussianKde — fitted density model for one period.
///
/// Fields
/// ------
/// - `sample`: `&'a [f64]`
///   The ScoreSample the density was fitted on.
/// - `bandwidth`: `f64`
///   Smoothing width `h > 0`.
/// - `log_norm`: `f64`
///   Cached `ln n + ln h + ln √(2π)`.
///
/// Performance
/// -----------
/// - Each density evaluation is O(n) in the sample size; two passes are made
///   over the sample (max-shift, then sum).
#[derive(Debug, Clone, Copy)]
pub struct GaussianKde<'a> {
    sample: &'a [f64],
    bandwidth: f64,
    log_norm: f64,
}

impl<'a> GaussianKde<'a> {
    /// Fit a Gaussian KDE to `sample` with smoothing width `bandwidth`.
    ///
    /// Errors
    /// ------
    /// - `PolarizationError::InsufficientData` for an empty sample.
    /// - `PolarizationError::InvalidScore` for non-finite scores.
    /// - `PolarizationError::InvalidBandwidth` for `h <= 0` or non-finite `h`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// use rust_polarization::estimation::kernel::GaussianKde;
    ///
    /// let sample = [-0.5, 0.5];
    /// let kde = GaussianKde::fit(&sample, 0.2).unwrap();
    /// assert!(kde.density(0.5) > kde.density(0.0));
    /// ```
    pub fn fit(sample: &'a [f64], bandwidth: f64) -> PolarizationResult<Self> {
        validate_sample(sample, 1)?;
        validate_bandwidth(bandwidth)?;
        let log_norm = (sample.len() as f64).ln() + bandwidth.ln() + LN_SQRT_2PI;
        Ok(GaussianKde { sample, bandwidth, log_norm })
    }

    /// Smoothing width `h`.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// The sample the model was fitted on.
    pub fn sample(&self) -> &'a [f64] {
        self.sample
    }

    /// Log of the estimated density at `x`.
    pub fn log_density(&self, x: f64) -> f64 {
        let inv_h = 1.0 / self.bandwidth;
        let exponent = |xi: f64| {
            let z = (x - xi) * inv_h;
            -0.5 * z * z
        };

        let shift = self.sample.iter().map(|&xi| exponent(xi)).fold(f64::NEG_INFINITY, f64::max);
        let sum: f64 = self.sample.iter().map(|&xi| (exponent(xi) - shift).exp()).sum();

        shift + sum.ln() - self.log_norm
    }

    /// Estimated density at `x`.
    #[inline]
    pub fn density(&self, x: f64) -> f64 {
        self.log_density(x).exp()
    }

    /// Estimated density at every point of `xs`.
    pub fn evaluate(&self, xs: ArrayView1<'_, f64>) -> Array1<f64> {
        xs.mapv(|x| self.density(x))
    }

    /// Sum of log densities at `xs`; the held-out score used by
    /// cross-validation.
    pub fn total_log_likelihood(&self, xs: &[f64]) -> f64 {
        xs.iter().map(|&x| self.log_density(x)).sum()
    }

    /// Observed sample extremes `(min, max)`.
    pub fn sample_range(&self) -> (f64, f64) {
        (Statistics::min(self.sample.iter()), Statistics::max(self.sample.iter()))
    }

    /// Bounds of the diagnostic grid.
    ///
    /// Each extremum is scaled by 1.2 when that moves it away from zero in
    /// the direction of its own sign, and by 0.8 otherwise:
    /// `lo = 1.2·min` if `min < 0` else `0.8·min`,
    /// `hi = 1.2·max` if `max > 0` else `0.8·max`.
    pub fn grid_bounds(&self) -> (f64, f64) {
        let (min, max) = self.sample_range();
        let lo = if min < 0.0 { 1.2 * min } else { 0.8 * min };
        let hi = if max > 0.0 { 1.2 * max } else { 0.8 * max };
        (lo, hi)
    }

    /// Evaluate the density on `multiplier · n` evenly spaced points over
    /// [`grid_bounds`](Self::grid_bounds).
    ///
    /// Returns
    /// -------
    /// `(grid, pdf)` with `pdf[i] = f̂(grid[i])`.
    pub fn diagnostic_grid(&self, multiplier: usize) -> (Array1<f64>, Array1<f64>) {
        let (lo, hi) = self.grid_bounds();
        let grid = Array1::linspace(lo, hi, multiplier * self.sample.len());
        let pdf = self.evaluate(grid.view());
        (grid, pdf)
    }
}
