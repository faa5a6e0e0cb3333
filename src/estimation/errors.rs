//! estimation::errors — error kinds for density estimation and polarization.
//!
//! Purpose
//! -------
//! Provide the error enum and result alias shared by the bandwidth selector,
//! the Gaussian KDE, the quadrature layer and the polarization calculator.
//! Every failure in this subtree is *period-scoped*: callers are expected to
//! record it against the offending period and keep going.
//!
//! Key behaviors
//! -------------
//! - Define [`PolarizationError`] with one variant per failure condition and
//!   [`PolarizationResult<T>`] as the canonical result alias.
//! - Classify each error into a coarse, stable [`ErrorKind`] used in
//!   the per-period error log written by the pipeline driver.
//! - Attach human-readable `Display` messages that embed the offending value
//!   so that log lines are meaningful without further context.
//!
//! Invariants & assumptions
//! ------------------------
//! - Error values are small and `Clone`, so they can be collected from
//!   parallel workers and stored in reports without borrowing issues.
//! - No variant ever carries a NaN produced by the computation itself; NaN
//!   payloads only appear when the *input* contained them.
//!
//! Conventions
//! -----------
//! - Messages are phrased in terms of the domain constraint that failed
//!   ("bandwidth must be finite and > 0") rather than implementation detail.
//! - [`ErrorKind`] names are stable strings; they appear verbatim in the
//!   `kind` column of `<stem>_errors.csv`.
//!
//! Testing notes
//! -------------
//! - Unit tests check payload embedding in `Display` and the
//!   error-to-kind mapping.
use crate::estimation::polarization::Side;

/// Result alias for estimation and polarization routines.
pub type PolarizationResult<T> = Result<T, PolarizationError>;

/// PolarizationError — failures of the per-period numerical stage.
///
/// Variants
/// --------
/// - `InsufficientData { len, required }`
///   The sample has fewer than `required` points (empty, or a single point
///   when cross-validation needs a training set).
/// - `InvalidScore { index, value }`
///   A score is NaN or ±∞.
/// - `InvalidBandwidth { value }`
///   A bandwidth is not finite or not strictly positive.
/// - `DegenerateMass { side, mass }`
///   One side of zero carries effectively no density mass, so its center of
///   gravity is undefined.
/// - `DegenerateRange { value }`
///   Every score in the sample equals `value`, so the normalized center
///   distance is undefined.
/// - `IntegrationConvergence { integral, rel_err, threshold }`
///   Adaptive quadrature for `integral` returned a relative error estimate
///   above the configured hard threshold.
/// - `InvalidOption { name, value, reason }`
///   An option struct was constructed with an out-of-range value.
#[derive(Debug, Clone, PartialEq)]
pub enum PolarizationError {
    // ---- Input validation ----
    InsufficientData { len: usize, required: usize },
    InvalidScore { index: usize, value: f64 },
    InvalidBandwidth { value: f64 },

    // ---- Degenerate distributions ----
    DegenerateMass { side: Side, mass: f64 },
    DegenerateRange { value: f64 },

    // ---- Numerical integration ----
    IntegrationConvergence { integral: &'static str, rel_err: f64, threshold: f64 },

    // ---- Options ----
    InvalidOption { name: &'static str, value: f64, reason: &'static str },
}

impl PolarizationError {
    /// Coarse classification used in error logs.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PolarizationError::InsufficientData { .. } => ErrorKind::InsufficientData,
            PolarizationError::InvalidScore { .. } => ErrorKind::InvalidScore,
            PolarizationError::InvalidBandwidth { .. } => ErrorKind::InvalidBandwidth,
            PolarizationError::DegenerateMass { .. } => ErrorKind::DegenerateMass,
            PolarizationError::DegenerateRange { .. } => ErrorKind::DegenerateRange,
            PolarizationError::IntegrationConvergence { .. } => ErrorKind::IntegrationConvergence,
            PolarizationError::InvalidOption { .. } => ErrorKind::InvalidOption,
        }
    }
}

impl std::error::Error for PolarizationError {}

impl std::fmt::Display for PolarizationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Input validation ----
            PolarizationError::InsufficientData { len, required } => {
                write!(f, "Sample has {len} score(s); at least {required} required.")
            }
            PolarizationError::InvalidScore { index, value } => {
                write!(f, "Score at index {index} is non-finite: {value}")
            }
            PolarizationError::InvalidBandwidth { value } => {
                write!(f, "Bandwidth must be finite and > 0; got: {value}")
            }

            // ---- Degenerate distributions ----
            PolarizationError::DegenerateMass { side, mass } => {
                write!(
                    f,
                    "No density mass on the {side} side of zero (mass = {mass}); center of gravity undefined."
                )
            }
            PolarizationError::DegenerateRange { value } => {
                write!(f, "All scores equal {value}; normalized center distance undefined.")
            }

            // ---- Numerical integration ----
            PolarizationError::IntegrationConvergence { integral, rel_err, threshold } => {
                write!(
                    f,
                    "Quadrature for {integral} did not converge: relative error {rel_err:e} exceeds {threshold:e}."
                )
            }

            // ---- Options ----
            PolarizationError::InvalidOption { name, value, reason } => {
                write!(f, "Invalid option {name} = {value}: {reason}")
            }
        }
    }
}

/// ErrorKind — stable classification of per-period failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InsufficientData,
    InvalidScore,
    InvalidBandwidth,
    DegenerateMass,
    DegenerateRange,
    IntegrationConvergence,
    InvalidOption,
}

impl ErrorKind {
    /// Name written to error logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InsufficientData => "InsufficientDataError",
            ErrorKind::InvalidScore => "InvalidScoreError",
            ErrorKind::InvalidBandwidth => "InvalidBandwidthError",
            ErrorKind::DegenerateMass => "DegenerateMassError",
            ErrorKind::DegenerateRange => "DegenerateRangeError",
            ErrorKind::IntegrationConvergence => "IntegrationConvergenceError",
            ErrorKind::InvalidOption => "InvalidOptionError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
