//! rust_polarization — kernel-density polarization index over per-period
//! polarity scores.
//!
//! Purpose
//! -------
//! Measure how split a population of individual polarity scores in
//! `[-1, 1]` is, one time period at a time. Each period's scores are
//! smoothed with a Gaussian KDE whose bandwidth is chosen by k-fold
//! cross-validated log-likelihood; the fitted density is then integrated on
//! each side of zero to obtain population masses and centers of gravity,
//! which combine into the polarization index
//! `pol_index = (1 - |pop_pos - pop_neg|) · |gc_pos - gc_neg| / (x_max - x_min)`.
//!
//! Key behaviors
//! -------------
//! - [`estimation`]: bandwidth selection, KDE, adaptive quadrature and the
//!   polarization calculator. Pure functions with typed errors.
//! - [`pipeline`]: loading score files, running the distribution and index
//!   stages over every period, and writing JSON/CSV artifacts plus error
//!   logs.
//! - [`tracing_config`]: subscriber setup used by the `polarization` binary.
//!
//! Invariants & assumptions
//! ------------------------
//! - A failing period never aborts a batch; it is skipped with a typed
//!   reason. Only a batch with no successful period is a run-level error.
//! - Results are deterministic for a fixed run seed, independent of thread
//!   count.
//!
//! Downstream usage
//! ----------------
//! - Library users typically call
//!   [`PolarizationMetrics::compute`](estimation::PolarizationMetrics::compute)
//!   on a sample with a known bandwidth, or
//!   [`select_bandwidth`](estimation::select_bandwidth) first.
//! - Batch users drive [`pipeline::run_all`] or the `polarization` CLI.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end batches over temporary
//!   files are in `tests/`.

pub mod estimation;
pub mod pipeline;
pub mod tracing_config;
