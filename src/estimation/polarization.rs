//! estimation::polarization — population-separation metrics from a fitted KDE.
//!
//! Purpose
//! -------
//! Derive the polarization index of one period from its bandwidth and
//! ScoreSample: probability mass on each side of zero, the center of gravity
//! of each side, the normalized distance between the two centers, and the
//! index `(1 − |A⁺ − A⁻|) · d`.
//!
//! Key behaviors
//! -------------
//! - [`PolarizationMetrics::compute`] fits a [`GaussianKde`], rejects
//!   zero-spread samples, integrates `f̂` and `x·f̂` over [-1, 0] and [0, 1]
//!   with adaptive Gauss–Kronrod quadrature and assembles the seven metrics.
//! - [`side_mass`], [`center_of_gravity`] and [`normalized_center_distance`]
//!   expose the individual steps; `compute` is assembled from the same
//!   steps, so the checks and escalation rules are shared.
//! - Every integral's error estimate is kept in [`IntegrationDiagnostics`].
//!   Estimates above `warn_rel_err` (or non-converged ones) are flagged;
//!   any estimate above `max_rel_err` fails the period, converged or not.
//!
//! Invariants & assumptions
//! ------------------------
//! - `pop_neg + pop_pos` is not forced to 1; mass outside [-1, 1] and
//!   quadrature error are tolerated.
//! - A side is *degenerate* when no score lies strictly on it or its mass is
//!   `<= mass_floor`; its center of gravity is then reported as
//!   `DegenerateMass` instead of a NaN or ±∞.
//! - The range check runs before any integration, so a sample of identical
//!   values always reports `DegenerateRange`.
//! - Side degeneracy is decided before error escalation: a side without
//!   observations reports `DegenerateMass` even if its tail integral is
//!   poorly resolved.
//! - The computation is a pure function of `(bandwidth, sample, options)`.
//!
//! Conventions
//! -----------
//! - `x_min`/`x_max` in the distance normalization are the observed sample
//!   extremes, not the [-1, 1] support bounds.
//! - Scores exactly equal to zero belong to neither side.
//!
//! Testing notes
//! -------------
//! - Unit tests cover mass bounds, symmetry, the two degenerate cases,
//!   idempotence, a closed-form single-side check, the reference
//!   six-point scenario and the convergence escalation path.
use crate::estimation::{
    errors::{PolarizationError, PolarizationResult},
    kernel::GaussianKde,
    options::IntegrationOptions,
    quadrature::{integrate, QuadOutcome},
};
use serde::{Deserialize, Serialize};

/// Side of zero on the polarity axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Negative,
    Positive,
}

impl Side {
    /// Integration domain for this side.
    pub fn domain(&self) -> (f64, f64) {
        match self {
            Side::Negative => (-1.0, 0.0),
            Side::Positive => (0.0, 1.0),
        }
    }

    /// Diagnostics name of the side's mass integral.
    pub fn mass_label(&self) -> &'static str {
        match self {
            Side::Negative => "pop_neg",
            Side::Positive => "pop_pos",
        }
    }

    /// Diagnostics name of the side's first-moment integral.
    pub fn moment_label(&self) -> &'static str {
        match self {
            Side::Negative => "exp_neg",
            Side::Positive => "exp_pos",
        }
    }

    /// Whether `score` lies strictly on this side of zero.
    pub fn contains(&self, score: f64) -> bool {
        match self {
            Side::Negative => score < 0.0,
            Side::Positive => score > 0.0,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Negative => f.write_str("negative"),
            Side::Positive => f.write_str("positive"),
        }
    }
}

/// Error report for one integral.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegralReport {
    pub name: String,
    pub value: f64,
    pub abs_err: f64,
    pub rel_err: f64,
    pub subintervals: usize,
    pub converged: bool,
    /// Set when the relative error exceeded `warn_rel_err` or the
    /// subdivision limit was reached.
    pub warning: bool,
}

/// IntegrationDiagnostics — per-period quadrature report.
///
/// Fields
/// ------
/// - `integrals`: one [`IntegralReport`] per computed integral, in the order
///   `pop_neg`, `pop_pos`, `exp_neg`, `exp_pos`.
/// - `max_rel_err`: largest relative error among them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationDiagnostics {
    pub integrals: Vec<IntegralReport>,
    pub max_rel_err: f64,
}

impl IntegrationDiagnostics {
    /// Whether any integral raised a convergence warning.
    pub fn has_warnings(&self) -> bool {
        self.integrals.iter().any(|r| r.warning)
    }

    /// Record `outcome` under `name`, escalating to an error when its
    /// relative error exceeds `max_rel_err`.
    fn record(
        &mut self, name: &'static str, outcome: QuadOutcome, options: &IntegrationOptions,
    ) -> PolarizationResult<f64> {
        let rel_err = outcome.rel_err();
        if rel_err > options.max_rel_err {
            return Err(PolarizationError::IntegrationConvergence {
                integral: name,
                rel_err,
                threshold: options.max_rel_err,
            });
        }

        self.max_rel_err = self.max_rel_err.max(rel_err);
        self.integrals.push(IntegralReport {
            name: name.to_string(),
            value: outcome.value,
            abs_err: outcome.abs_err,
            rel_err,
            subintervals: outcome.subintervals,
            converged: outcome.converged,
            warning: !outcome.converged || rel_err > options.warn_rel_err,
        });
        Ok(outcome.value)
    }
}

/// PolarizationMetrics — the persisted per-period result.
///
/// Fields
/// ------
/// - `pop_neg`, `pop_pos`: density mass on [-1, 0] and [0, 1].
/// - `diff_pops`: `|pop_pos − pop_neg|`.
/// - `gc_neg`, `gc_pos`: conditional means on each side.
/// - `dist_gc`: `|gc_pos − gc_neg| / |x_max − x_min|`.
/// - `pol_index`: `(1 − diff_pops) · dist_gc`, not clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PolarizationMetrics {
    pub pop_neg: f64,
    pub pop_pos: f64,
    pub diff_pops: f64,
    pub gc_neg: f64,
    pub gc_pos: f64,
    pub dist_gc: f64,
    pub pol_index: f64,
}

/// PolarizationOutcome — metrics plus the quadrature report behind them.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarizationOutcome {
    pub metrics: PolarizationMetrics,
    pub diagnostics: IntegrationDiagnostics,
}

impl PolarizationMetrics {
    /// Compute the polarization metrics of one period.
    ///
    /// Parameters
    /// ----------
    /// - `bandwidth`: KDE smoothing width (`> 0`).
    /// - `sample`: the period's ScoreSample (non-empty, finite).
    /// - `options`: quadrature tolerances and thresholds.
    ///
    /// Errors
    /// ------
    /// - `InsufficientData`, `InvalidScore`, `InvalidBandwidth` from the fit.
    /// - `DegenerateRange` when every score is identical.
    /// - `DegenerateMass { side }` when a side carries no mass.
    /// - `IntegrationConvergence` when an integral's relative error estimate
    ///   exceeds `max_rel_err`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// use rust_polarization::estimation::{
    ///     options::IntegrationOptions, polarization::PolarizationMetrics,
    /// };
    ///
    /// let sample = [-0.8, -0.6, -0.2, 0.1, 0.5, 0.9];
    /// let out = PolarizationMetrics::compute(0.3, &sample, &IntegrationOptions::default()).unwrap();
    /// assert!((0.0..=1.0).contains(&out.metrics.pol_index));
    /// ```
    pub fn compute(
        bandwidth: f64, sample: &[f64], options: &IntegrationOptions,
    ) -> PolarizationResult<PolarizationOutcome> {
        let kde = GaussianKde::fit(sample, bandwidth)?;
        let (x_min, x_max) = kde.sample_range();
        check_range(x_min, x_max)?;

        let neg = side_mass(&kde, Side::Negative, options);
        let pos = side_mass(&kde, Side::Positive, options);
        ensure_side_mass(&kde, Side::Negative, neg.value, options)?;
        ensure_side_mass(&kde, Side::Positive, pos.value, options)?;

        let mut diagnostics = IntegrationDiagnostics::default();
        let pop_neg = diagnostics.record(Side::Negative.mass_label(), neg, options)?;
        let pop_pos = diagnostics.record(Side::Positive.mass_label(), pos, options)?;
        let diff_pops = (pop_pos - pop_neg).abs();

        let gc_neg = side_center(&kde, Side::Negative, pop_neg, &mut diagnostics, options)?;
        let gc_pos = side_center(&kde, Side::Positive, pop_pos, &mut diagnostics, options)?;

        let dist_gc = normalized_center_distance(gc_neg, gc_pos, x_min, x_max)?;
        let pol_index = (1.0 - diff_pops) * dist_gc;

        Ok(PolarizationOutcome {
            metrics: PolarizationMetrics {
                pop_neg,
                pop_pos,
                diff_pops,
                gc_neg,
                gc_pos,
                dist_gc,
                pol_index,
            },
            diagnostics,
        })
    }
}

/// `∫ f̂(x) dx` over the domain of `side`.
pub fn side_mass(kde: &GaussianKde<'_>, side: Side, options: &IntegrationOptions) -> QuadOutcome {
    let (a, b) = side.domain();
    integrate(|x| kde.density(x), a, b, options.epsabs, options.epsrel, options.limit)
}

/// `∫ x·f̂(x) dx` over the domain of `side`.
pub fn side_moment(kde: &GaussianKde<'_>, side: Side, options: &IntegrationOptions) -> QuadOutcome {
    let (a, b) = side.domain();
    integrate(|x| x * kde.density(x), a, b, options.epsabs, options.epsrel, options.limit)
}

/// Center of gravity `E[x | side]` of the fitted density.
///
/// Errors
/// ------
/// - `DegenerateMass { side, mass }` when no score lies strictly on `side`
///   or the integrated mass is `<= mass_floor`.
/// - `IntegrationConvergence` when the mass or moment integral has a
///   relative error above `max_rel_err`.
pub fn center_of_gravity(
    kde: &GaussianKde<'_>, side: Side, options: &IntegrationOptions,
) -> PolarizationResult<f64> {
    let outcome = side_mass(kde, side, options);
    ensure_side_mass(kde, side, outcome.value, options)?;

    let mut diagnostics = IntegrationDiagnostics::default();
    let mass = diagnostics.record(side.mass_label(), outcome, options)?;
    side_center(kde, side, mass, &mut diagnostics, options)
}

/// Moment over an already-checked side mass.
fn side_center(
    kde: &GaussianKde<'_>, side: Side, mass: f64, diagnostics: &mut IntegrationDiagnostics,
    options: &IntegrationOptions,
) -> PolarizationResult<f64> {
    let moment = diagnostics.record(side.moment_label(), side_moment(kde, side, options), options)?;
    Ok(moment / mass)
}

/// Normalized distance `|gc_pos − gc_neg| / |x_max − x_min|`.
///
/// Errors
/// ------
/// - `DegenerateRange { value }` when `x_max == x_min`.
pub fn normalized_center_distance(
    gc_neg: f64, gc_pos: f64, x_min: f64, x_max: f64,
) -> PolarizationResult<f64> {
    check_range(x_min, x_max)?;
    Ok((gc_pos - gc_neg).abs() / (x_max - x_min).abs())
}

fn check_range(x_min: f64, x_max: f64) -> PolarizationResult<()> {
    if x_max == x_min {
        return Err(PolarizationError::DegenerateRange { value: x_min });
    }
    Ok(())
}

fn ensure_side_mass(
    kde: &GaussianKde<'_>, side: Side, mass: f64, options: &IntegrationOptions,
) -> PolarizationResult<()> {
    let observed = kde.sample().iter().any(|&x| side.contains(x));
    if !observed || mass <= options.mass_floor {
        return Err(PolarizationError::DegenerateMass { side, mass });
    }
    Ok(())
}
