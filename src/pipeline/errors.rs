//! pipeline::errors — run-level failures of the batch pipeline.
//!
//! Purpose
//! -------
//! Describe failures that stop a pipeline stage as a whole: unreadable or
//! malformed input files, unwritable outputs, invalid configuration, and a
//! stage that produced no successful period. Per-period numerical failures
//! are *not* represented here; they are collected as
//! [`PeriodFailure`](crate::pipeline::driver::PeriodFailure) values and never
//! abort the batch.
//!
//! Conventions
//! -----------
//! - Variants carry the offending path and a rendered message rather than
//!   the source error, keeping the type `Clone` like the numerical errors.
use crate::estimation::errors::PolarizationError;
use std::path::{Path, PathBuf};

/// Result alias for pipeline stages.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// PipelineError — failures that abort a whole stage.
///
/// Variants
/// --------
/// - `Io { path, message }`: reading or writing `path` failed.
/// - `Json { path, message }`: `path` is not valid JSON for the expected
///   artifact.
/// - `Format { path, message }`: valid JSON that violates the input
///   contract (e.g. a period that is not an object of users).
/// - `Options(PolarizationError)`: an option struct rejected its values.
/// - `ThreadPool { message }`: the dedicated rayon pool failed to build.
/// - `NoPeriods { stage, skipped }`: the stage finished without a single
///   successful period.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Io { path: PathBuf, message: String },
    Json { path: PathBuf, message: String },
    Format { path: PathBuf, message: String },
    Options(PolarizationError),
    ThreadPool { message: String },
    NoPeriods { stage: &'static str, skipped: usize },
}

impl PipelineError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        PipelineError::Io { path: path.to_path_buf(), message: err.to_string() }
    }

    pub(crate) fn json(path: &Path, err: serde_json::Error) -> Self {
        PipelineError::Json { path: path.to_path_buf(), message: err.to_string() }
    }

    pub(crate) fn format(path: &Path, message: impl Into<String>) -> Self {
        PipelineError::Format { path: path.to_path_buf(), message: message.into() }
    }
}

impl From<PolarizationError> for PipelineError {
    fn from(err: PolarizationError) -> Self {
        PipelineError::Options(err)
    }
}

impl std::error::Error for PipelineError {}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io { path, message } => {
                write!(f, "I/O error on {}: {message}", path.display())
            }
            PipelineError::Json { path, message } => {
                write!(f, "Invalid JSON in {}: {message}", path.display())
            }
            PipelineError::Format { path, message } => {
                write!(f, "Unexpected layout in {}: {message}", path.display())
            }
            PipelineError::Options(err) => write!(f, "Invalid configuration: {err}"),
            PipelineError::ThreadPool { message } => {
                write!(f, "Could not start worker pool: {message}")
            }
            PipelineError::NoPeriods { stage, skipped } => {
                write!(f, "Stage {stage} produced no periods ({skipped} skipped).")
            }
        }
    }
}
