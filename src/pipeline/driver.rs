//! pipeline::driver — batch execution of the two numerical stages.
//!
//! Purpose
//! -------
//! Run the distribution estimator and the polarization calculator over
//! every period of a batch, isolating per-period failures so that one bad
//! period never aborts the run.
//!
//! Key behaviors
//! -------------
//! - Map each period independently to a `PolarizationResult`, optionally in
//!   parallel on a rayon pool, then partition into successes (keyed by
//!   period) and [`PeriodFailure`]s.
//! - Derive each period's subsampling seed from the run seed and the period
//!   key, so results do not depend on scheduling or on which other periods
//!   are in the batch.
//! - Log progress (`key`, `index`, `total`), per-period elapsed time and
//!   integration warnings through `tracing`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Options are validated before they reach the driver and are shared by
//!   reference across workers.
//! - Failures are reported in input order; successes are keyed in a
//!   `BTreeMap`, so output order is by key regardless of parallelism.
use crate::{
    estimation::{
        bandwidth::select_bandwidth,
        errors::{ErrorKind, PolarizationError, PolarizationResult},
        kernel::GaussianKde,
        options::{IntegrationOptions, PolarizationOptions},
        polarization::{PolarizationMetrics, PolarizationOutcome},
        validation::validate_sample,
    },
    pipeline::{
        artifacts::{DiagnosticsTable, DistributionArtifact, DistributionRecord, MetricsTable},
        data::PeriodScores,
        errors::{PipelineError, PipelineResult},
    },
};
use rayon::prelude::*;
use std::{collections::BTreeMap, time::Instant};

/// Default run seed.
pub const DEFAULT_SEED: u64 = 0;

/// Seed and parallelism of one pipeline run.
///
/// `threads == 0` uses rayon's global pool; `1` runs sequentially on the
/// calling thread; any other value builds a dedicated pool of that size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub seed: u64,
    pub threads: usize,
}

impl RunOptions {
    pub fn new(seed: u64, threads: usize) -> Self {
        RunOptions { seed, threads }
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions { seed: DEFAULT_SEED, threads: 0 }
    }
}

/// A skipped period: key, error classification and rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodFailure {
    pub key: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl PeriodFailure {
    fn new(key: &str, err: &PolarizationError) -> Self {
        PeriodFailure { key: key.to_string(), kind: err.kind(), message: err.to_string() }
    }
}

/// StageReport — partitioned outcome of one stage over a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct StageReport<T> {
    pub successes: BTreeMap<String, T>,
    pub failures: Vec<PeriodFailure>,
}

impl<T> StageReport<T> {
    pub fn processed(&self) -> usize {
        self.successes.len()
    }

    pub fn skipped(&self) -> usize {
        self.failures.len()
    }

    /// Error out with `NoPeriods` when nothing succeeded.
    pub fn require_any(&self, stage: &'static str) -> PipelineResult<()> {
        if self.successes.is_empty() {
            return Err(PipelineError::NoPeriods { stage, skipped: self.skipped() });
        }
        Ok(())
    }

    fn partition(results: Vec<(String, PolarizationResult<T>)>) -> Self {
        let mut successes = BTreeMap::new();
        let mut failures = Vec::new();
        for (key, result) in results {
            match result {
                Ok(value) => {
                    successes.insert(key, value);
                }
                Err(err) => failures.push(PeriodFailure::new(&key, &err)),
            }
        }
        StageReport { successes, failures }
    }
}

impl StageReport<DistributionRecord> {
    /// Successful records as a distribution artifact.
    pub fn artifact(&self) -> &DistributionArtifact {
        &self.successes
    }
}

impl StageReport<PolarizationOutcome> {
    pub fn metrics(&self) -> MetricsTable {
        self.successes.iter().map(|(k, o)| (k.clone(), o.metrics)).collect()
    }

    pub fn diagnostics(&self) -> DiagnosticsTable {
        self.successes.iter().map(|(k, o)| (k.clone(), o.diagnostics.clone())).collect()
    }
}

/// Seed for one period: FNV-1a of the key, mixed with the run seed.
pub fn period_seed(run_seed: u64, key: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let hash = key.bytes().fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME));
    hash ^ run_seed.wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

/// Bandwidth selection and diagnostic-grid evaluation for one period.
///
/// Errors
/// ------
/// - `InsufficientData` for fewer than two scores (including empty
///   periods), `InvalidScore` for non-finite scores, and anything
///   [`select_bandwidth`] reports.
pub fn estimate_distribution(
    scores: &[f64], options: &PolarizationOptions, seed: u64,
) -> PolarizationResult<DistributionRecord> {
    validate_sample(scores, 2)?;
    let selection = select_bandwidth(scores, &options.bandwidth, seed)?;
    let kde = GaussianKde::fit(scores, selection.bandwidth)?;
    let pdf_array = if options.grid_multiplier == 0 {
        Vec::new()
    } else {
        kde.diagnostic_grid(options.grid_multiplier).1.to_vec()
    };

    Ok(DistributionRecord {
        bandwidth: selection.bandwidth,
        total_users: scores.len(),
        diff_array: scores.to_vec(),
        pdf_array,
    })
}

/// Run the distribution stage over every period.
pub fn estimate_distributions(
    periods: &[PeriodScores], options: &PolarizationOptions, run: &RunOptions,
) -> PipelineResult<StageReport<DistributionRecord>> {
    let total = periods.len();
    let results = map_periods(periods, run.threads, |index, period| {
        tracing::info!(period = %period.key, index = index + 1, total, "estimating distribution");
        let started = Instant::now();
        let seed = period_seed(run.seed, &period.key);
        let result = estimate_distribution(&period.scores, options, seed);
        log_period_result(&period.key, &result, started);
        (period.key.clone(), result)
    })?;
    Ok(StageReport::partition(results))
}

/// Run the polarization calculator over every record of an artifact.
pub fn compute_polarization(
    artifact: &DistributionArtifact, options: &IntegrationOptions, run: &RunOptions,
) -> PipelineResult<StageReport<PolarizationOutcome>> {
    let entries: Vec<(&String, &DistributionRecord)> = artifact.iter().collect();
    let total = entries.len();
    let results = map_periods(&entries, run.threads, |index, (key, record)| {
        tracing::info!(period = %key, index = index + 1, total, "computing polarization");
        let started = Instant::now();
        let result = PolarizationMetrics::compute(record.bandwidth, &record.diff_array, options);
        if let Ok(outcome) = &result {
            for report in outcome.diagnostics.integrals.iter().filter(|r| r.warning) {
                tracing::warn!(
                    period = %key,
                    integral = %report.name,
                    rel_err = report.rel_err,
                    converged = report.converged,
                    "integration convergence warning"
                );
            }
        }
        log_period_result(key, &result, started);
        ((*key).clone(), result)
    })?;
    Ok(StageReport::partition(results))
}

fn log_period_result<T>(key: &str, result: &PolarizationResult<T>, started: Instant) {
    let elapsed_ms = started.elapsed().as_secs_f64() * 1e3;
    match result {
        Ok(_) => tracing::info!(period = %key, elapsed_ms, "period done"),
        Err(err) => {
            tracing::warn!(period = %key, kind = %err.kind(), elapsed_ms, "period skipped: {err}")
        }
    }
}

/// Order-preserving map over `items` with the parallelism in `threads`.
fn map_periods<I, T, F>(items: &[I], threads: usize, f: F) -> PipelineResult<Vec<T>>
where
    I: Sync,
    T: Send,
    F: Fn(usize, &I) -> T + Sync + Send,
{
    match threads {
        1 => Ok(items.iter().enumerate().map(|(i, item)| f(i, item)).collect()),
        0 => Ok(items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect()),
        n => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| PipelineError::ThreadPool { message: e.to_string() })?;
            Ok(pool.install(|| items.par_iter().enumerate().map(|(i, item)| f(i, item)).collect()))
        }
    }
}
