//! pipeline — batch orchestration around the numerical core.
//!
//! Purpose
//! -------
//! Move data between files and the [`estimation`](crate::estimation)
//! routines: load per-period scores, run the distribution and index stages
//! over every period, and write artifacts, diagnostics and error logs.
//!
//! Key behaviors
//! -------------
//! - [`data`] parses the upstream scores file.
//! - [`driver`] maps periods to results (optionally in parallel) and
//!   partitions them into successes and [`PeriodFailure`]s.
//! - [`artifacts`] owns every on-disk format.
//! - [`stages`] wires the three run modes (`distribution`, `index`, `run`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Per-period failures never abort a stage; only I/O, malformed input,
//!   invalid configuration or an empty result do ([`PipelineError`]).
//! - All logging of the crate happens in this subtree.

pub mod artifacts;
pub mod data;
pub mod driver;
pub mod errors;
pub mod stages;

pub use self::artifacts::{DistributionArtifact, DistributionRecord};
pub use self::data::{load_scores, PeriodScores};
pub use self::driver::{
    compute_polarization, estimate_distributions, PeriodFailure, RunOptions, StageReport,
};
pub use self::errors::{PipelineError, PipelineResult};
pub use self::stages::{run_all, run_distribution, run_index, StageSummary};
