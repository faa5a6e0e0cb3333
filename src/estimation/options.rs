//! estimation::options — validated configuration for the numerical stage.
//!
//! Purpose
//! -------
//! Bundle the tuning constants of bandwidth selection, numerical
//! integration and diagnostic grid evaluation into small, validated option
//! structs. They are built once per run and passed by reference into every
//! per-period computation.
//!
//! Key behaviors
//! -------------
//! - [`BandwidthOptions`] — subsampling threshold, candidate grid and fold
//!   count for cross-validated bandwidth selection.
//! - [`IntegrationOptions`] — quadrature tolerances, subdivision limit,
//!   warning / hard relative-error thresholds and the side-mass floor.
//! - [`PolarizationOptions`] — both of the above plus the diagnostic grid
//!   multiplier.
//! - Each struct has a validating `new` and a `Default` mirroring the
//!   reference constants (1000-point subsample, 30 bandwidths on [0.1, 1.0],
//!   20 folds, grid of 10·n points).
//!
//! Invariants & assumptions
//! ------------------------
//! - Constructed values always satisfy the invariants documented on each
//!   field; downstream code does not re-check them.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the defaults, the candidate grid endpoints and each
//!   rejection branch.
use crate::estimation::errors::{PolarizationError, PolarizationResult};
use ndarray::Array1;

/// Default subsampling threshold for bandwidth selection.
pub const DEFAULT_SAMPLE_SIZE: usize = 1000;
/// Default number of cross-validation folds.
pub const DEFAULT_FOLDS: usize = 20;
/// Default candidate grid `(min, max, count)`.
pub const DEFAULT_BANDWIDTH_GRID: (f64, f64, usize) = (0.1, 1.0, 30);
/// Default diagnostic grid resolution, in points per sample element.
pub const DEFAULT_GRID_MULTIPLIER: usize = 10;

/// BandwidthOptions — cross-validated bandwidth search settings.
///
/// Fields
/// ------
/// - `sample_size`: `usize`
///   Samples larger than this are uniformly subsampled (without
///   replacement) to exactly this many points before the search. `>= 2`.
/// - `grid`: `(f64, f64, usize)`
///   Candidate bandwidths `linspace(min, max, count)`; `0 < min <= max`,
///   finite, `count >= 1`.
/// - `folds`: `usize`
///   Number of contiguous CV folds. `>= 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandwidthOptions {
    pub sample_size: usize,
    pub grid: (f64, f64, usize),
    pub folds: usize,
}

impl BandwidthOptions {
    /// Construct validated bandwidth-search options.
    ///
    /// Errors
    /// ------
    /// - `PolarizationError::InvalidOption` when any field violates its
    ///   documented range.
    pub fn new(
        sample_size: usize, grid: (f64, f64, usize), folds: usize,
    ) -> PolarizationResult<Self> {
        if sample_size < 2 {
            return Err(PolarizationError::InvalidOption {
                name: "sample_size",
                value: sample_size as f64,
                reason: "must be at least 2",
            });
        }

        let (min, max, count) = grid;
        if !min.is_finite() || !max.is_finite() || min <= 0.0 {
            return Err(PolarizationError::InvalidOption {
                name: "bandwidth_min",
                value: min,
                reason: "grid bounds must be finite with min > 0",
            });
        }
        if max < min {
            return Err(PolarizationError::InvalidOption {
                name: "bandwidth_max",
                value: max,
                reason: "must be >= bandwidth_min",
            });
        }
        if count == 0 {
            return Err(PolarizationError::InvalidOption {
                name: "bandwidth_count",
                value: 0.0,
                reason: "must be at least 1",
            });
        }

        if folds < 2 {
            return Err(PolarizationError::InvalidOption {
                name: "folds",
                value: folds as f64,
                reason: "must be at least 2",
            });
        }

        Ok(BandwidthOptions { sample_size, grid, folds })
    }

    /// Candidate bandwidths, evenly spaced and endpoint-inclusive.
    pub fn candidates(&self) -> Array1<f64> {
        let (min, max, count) = self.grid;
        Array1::linspace(min, max, count)
    }
}

impl Default for BandwidthOptions {
    fn default() -> Self {
        BandwidthOptions {
            sample_size: DEFAULT_SAMPLE_SIZE,
            grid: DEFAULT_BANDWIDTH_GRID,
            folds: DEFAULT_FOLDS,
        }
    }
}

/// IntegrationOptions — quadrature tolerances and escalation thresholds.
///
/// Fields
/// ------
/// - `epsabs`, `epsrel`: quadrature stopping tolerances (`>= 0`, not both 0).
/// - `limit`: maximum subintervals per integral (`>= 1`).
/// - `warn_rel_err`: relative error above which an integral is flagged in
///   diagnostics and logged as a warning.
/// - `max_rel_err`: relative error above which the period fails with
///   `IntegrationConvergence`. Must be `>= warn_rel_err`.
/// - `mass_floor`: a side whose integrated mass is `<= mass_floor` is
///   treated as carrying no mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegrationOptions {
    pub epsabs: f64,
    pub epsrel: f64,
    pub limit: usize,
    pub warn_rel_err: f64,
    pub max_rel_err: f64,
    pub mass_floor: f64,
}

impl IntegrationOptions {
    /// Construct validated integration options.
    ///
    /// Errors
    /// ------
    /// - `PolarizationError::InvalidOption` for negative / non-finite
    ///   tolerances, a zero limit, or `max_rel_err < warn_rel_err`.
    pub fn new(
        epsabs: f64, epsrel: f64, limit: usize, warn_rel_err: f64, max_rel_err: f64,
        mass_floor: f64,
    ) -> PolarizationResult<Self> {
        for (name, value) in [
            ("epsabs", epsabs),
            ("epsrel", epsrel),
            ("warn_rel_err", warn_rel_err),
            ("max_rel_err", max_rel_err),
            ("mass_floor", mass_floor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(PolarizationError::InvalidOption {
                    name,
                    value,
                    reason: "must be finite and >= 0",
                });
            }
        }
        if epsabs == 0.0 && epsrel == 0.0 {
            return Err(PolarizationError::InvalidOption {
                name: "epsrel",
                value: epsrel,
                reason: "epsabs and epsrel cannot both be zero",
            });
        }
        if limit == 0 {
            return Err(PolarizationError::InvalidOption {
                name: "limit",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        if max_rel_err < warn_rel_err {
            return Err(PolarizationError::InvalidOption {
                name: "max_rel_err",
                value: max_rel_err,
                reason: "must be >= warn_rel_err",
            });
        }

        Ok(IntegrationOptions { epsabs, epsrel, limit, warn_rel_err, max_rel_err, mass_floor })
    }
}

impl Default for IntegrationOptions {
    fn default() -> Self {
        IntegrationOptions {
            epsabs: 1.49e-8,
            epsrel: 1.49e-8,
            limit: 200,
            warn_rel_err: 1e-6,
            max_rel_err: 1e-3,
            mass_floor: 1e-12,
        }
    }
}

/// PolarizationOptions — full configuration of the numerical stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolarizationOptions {
    pub bandwidth: BandwidthOptions,
    pub integration: IntegrationOptions,
    /// Diagnostic grid points per sample element; `0` disables the grid.
    pub grid_multiplier: usize,
}

impl PolarizationOptions {
    /// Bundle already-validated components.
    pub fn new(
        bandwidth: BandwidthOptions, integration: IntegrationOptions, grid_multiplier: usize,
    ) -> Self {
        PolarizationOptions { bandwidth, integration, grid_multiplier }
    }
}

impl Default for PolarizationOptions {
    fn default() -> Self {
        PolarizationOptions {
            bandwidth: BandwidthOptions::default(),
            integration: IntegrationOptions::default(),
            grid_multiplier: DEFAULT_GRID_MULTIPLIER,
        }
    }
}
