//! pipeline::stages — file-level entry points of the three run modes.
//!
//! Each stage loads its input once, runs the batch driver, writes the error
//! log (when any period was skipped) and then its artifacts. A stage with
//! zero successful periods writes only the error log and returns
//! [`PipelineError::NoPeriods`](crate::pipeline::errors::PipelineError::NoPeriods).
//!
//! In `run` mode the index stage also carries the periods skipped by the
//! distribution stage, so its summary and `<metrics_stem>_errors.csv` cover
//! the whole run.
use crate::{
    estimation::options::{IntegrationOptions, PolarizationOptions},
    pipeline::{
        artifacts::{
            read_distribution, write_distribution, write_error_log, write_metrics,
            DistributionArtifact, DistributionRecord,
        },
        data::{load_scores, PeriodScores},
        driver::{
            compute_polarization, estimate_distributions, PeriodFailure, RunOptions, StageReport,
        },
        errors::PipelineResult,
    },
};
use std::{
    path::{Path, PathBuf},
    time::Instant,
};

/// What a finished stage produced.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSummary {
    pub stage: &'static str,
    pub processed: usize,
    pub skipped: usize,
    pub outputs: Vec<PathBuf>,
    pub error_log: Option<PathBuf>,
}

impl std::fmt::Display for StageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} period(s) processed, {} skipped", self.stage, self.processed, self.skipped)
    }
}

/// `distribution` mode: scores file → distribution artifact at `<stem>.json`.
pub fn run_distribution(
    input: &Path, stem: &Path, options: &PolarizationOptions, run: &RunOptions,
) -> PipelineResult<StageSummary> {
    let periods = timed_load(input, load_scores)?;
    distribution_stage(&periods, stem, options, run).map(|(summary, _)| summary)
}

/// `index` mode: distribution artifact → metrics JSON, CSV and diagnostics.
pub fn run_index(
    input: &Path, stem: &Path, options: &IntegrationOptions, run: &RunOptions,
) -> PipelineResult<StageSummary> {
    let artifact = timed_load(input, read_distribution)?;
    index_stage(&artifact, stem, options, run)
}

/// `run` mode: both stages back to back without re-reading the artifact.
///
/// The second summary (and `<metrics_stem>_errors.csv`) counts every
/// skipped period of the run, from either stage.
pub fn run_all(
    input: &Path, distribution_stem: &Path, metrics_stem: &Path, options: &PolarizationOptions,
    run: &RunOptions,
) -> PipelineResult<Vec<StageSummary>> {
    let periods = timed_load(input, load_scores)?;
    let (first, report) = distribution_stage(&periods, distribution_stem, options, run)?;
    let second = index_stage_carrying(
        &report.successes,
        metrics_stem,
        &options.integration,
        run,
        report.failures,
    )?;
    Ok(vec![first, second])
}

/// Distribution stage over already-loaded periods.
///
/// Returns the summary together with the full report, whose `successes`
/// form the distribution artifact.
pub fn distribution_stage(
    periods: &[PeriodScores], stem: &Path, options: &PolarizationOptions, run: &RunOptions,
) -> PipelineResult<(StageSummary, StageReport<DistributionRecord>)> {
    let report = estimate_distributions(periods, options, run)?;
    let error_log = write_error_log(stem, &report.failures)?;
    log_error_log(&error_log, report.skipped());
    report.require_any("distribution")?;

    let path = write_distribution(stem, report.artifact())?;
    let summary = StageSummary {
        stage: "distribution",
        processed: report.processed(),
        skipped: report.skipped(),
        outputs: vec![path],
        error_log,
    };
    tracing::info!(processed = summary.processed, skipped = summary.skipped, "distribution stage done");
    Ok((summary, report))
}

/// Index stage over an already-loaded distribution artifact.
pub fn index_stage(
    artifact: &DistributionArtifact, stem: &Path, options: &IntegrationOptions, run: &RunOptions,
) -> PipelineResult<StageSummary> {
    index_stage_carrying(artifact, stem, options, run, Vec::new())
}

/// Index stage that also reports `carried` failures from an earlier stage.
fn index_stage_carrying(
    artifact: &DistributionArtifact, stem: &Path, options: &IntegrationOptions, run: &RunOptions,
    mut carried: Vec<PeriodFailure>,
) -> PipelineResult<StageSummary> {
    let mut report = compute_polarization(artifact, options, run)?;
    carried.append(&mut report.failures);
    report.failures = carried;
    let error_log = write_error_log(stem, &report.failures)?;
    log_error_log(&error_log, report.skipped());
    report.require_any("index")?;

    let outputs = write_metrics(stem, &report.metrics(), &report.diagnostics())?;
    let summary = StageSummary {
        stage: "index",
        processed: report.processed(),
        skipped: report.skipped(),
        outputs,
        error_log,
    };
    tracing::info!(processed = summary.processed, skipped = summary.skipped, "index stage done");
    Ok(summary)
}

fn timed_load<T>(path: &Path, load: impl FnOnce(&Path) -> PipelineResult<T>) -> PipelineResult<T> {
    let started = Instant::now();
    let value = load(path)?;
    tracing::info!(
        path = %path.display(),
        elapsed_ms = started.elapsed().as_secs_f64() * 1e3,
        "input loaded"
    );
    Ok(value)
}

fn log_error_log(path: &Option<PathBuf>, skipped: usize) {
    if let Some(path) = path {
        tracing::warn!(path = %path.display(), skipped, "skipped periods written to error log");
    }
}
