//! estimation — kernel density estimation and the polarization index.
//!
//! Purpose
//! -------
//! Hold the numerical core of the crate: cross-validated bandwidth
//! selection, the Gaussian KDE, adaptive quadrature and the polarization
//! calculator that turns a fitted density into per-period separation
//! metrics.
//!
//! Key behaviors
//! -------------
//! - Select a bandwidth per period with [`select_bandwidth`] (seeded
//!   subsampling, k-fold CV log-likelihood over a candidate grid).
//! - Fit and evaluate densities with [`GaussianKde`], including the
//!   diagnostic grid evaluation.
//! - Integrate with [`integrate`] (adaptive Gauss–Kronrod 7/15).
//! - Derive [`PolarizationMetrics`] and [`IntegrationDiagnostics`] via
//!   [`PolarizationMetrics::compute`].
//! - Report every failure as a typed [`PolarizationError`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Every routine here is a pure function of its inputs: no I/O, no
//!   logging, no global state. Randomness enters only through the explicit
//!   `seed` passed to [`select_bandwidth`].
//! - Options are validated once at construction ([`BandwidthOptions`],
//!   [`IntegrationOptions`]) and shared immutably across periods, so the
//!   per-period calls are safe to run from parallel workers.
//!
//! Downstream usage
//! ----------------
//! - The pipeline driver calls [`select_bandwidth`] and
//!   [`GaussianKde::diagnostic_grid`] in the distribution stage and
//!   [`PolarizationMetrics::compute`] in the index stage; each per-period
//!   `Err` is logged and the batch continues.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests for its own contract; end-to-end
//!   behaviour over batches of periods is covered in `tests/`.

pub mod bandwidth;
pub mod errors;
pub mod kernel;
pub mod options;
pub mod polarization;
pub mod quadrature;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::bandwidth::{select_bandwidth, BandwidthSelection};
pub use self::errors::{ErrorKind, PolarizationError, PolarizationResult};
pub use self::kernel::GaussianKde;
pub use self::options::{BandwidthOptions, IntegrationOptions, PolarizationOptions};
pub use self::polarization::{
    center_of_gravity, normalized_center_distance, side_mass, IntegrationDiagnostics,
    PolarizationMetrics, PolarizationOutcome, Side,
};
pub use self::quadrature::{integrate, QuadOutcome};
pub use self::validation::{validate_bandwidth, validate_sample};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_polarization::estimation::prelude::*;
//
// to import the main estimation surface in a single line.

pub mod prelude {
    pub use super::bandwidth::select_bandwidth;
    pub use super::errors::{ErrorKind, PolarizationError, PolarizationResult};
    pub use super::kernel::GaussianKde;
    pub use super::options::{BandwidthOptions, IntegrationOptions, PolarizationOptions};
    pub use super::polarization::{PolarizationMetrics, Side};
}
