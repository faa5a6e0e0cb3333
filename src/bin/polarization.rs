//! `polarization` — batch CLI for the KDE polarization index.
//!
//! Modes:
//! - `distribution`: scores JSON → distribution artifact (bandwidth search).
//! - `index`: distribution artifact → metrics JSON/CSV + diagnostics.
//! - `run`: both in sequence.
//!
//! Every stage writes `<stem>_errors.csv` when periods were skipped and
//! exits non-zero when no period succeeded.

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use rust_polarization::estimation::options::{
    BandwidthOptions, IntegrationOptions, PolarizationOptions, DEFAULT_BANDWIDTH_GRID,
    DEFAULT_FOLDS, DEFAULT_GRID_MULTIPLIER, DEFAULT_SAMPLE_SIZE,
};
use rust_polarization::pipeline::{self, PipelineError, RunOptions, StageSummary};
use rust_polarization::tracing_config;

// ── CLI ─────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "polarization", about = "kernel-density polarization index per period")]
struct Cli {
    /// seed for bandwidth-search subsampling
    #[arg(long, env = "POLARIZATION_SEED", default_value_t = 0, global = true)]
    seed: u64,

    /// worker threads (0 = all cores, 1 = sequential)
    #[arg(long, env = "POLARIZATION_THREADS", default_value_t = 0, global = true)]
    threads: usize,

    /// debug-level logging with source locations
    #[arg(long, global = true)]
    debug: bool,

    /// explicit log filter (EnvFilter syntax); overrides RUST_LOG and --debug
    #[arg(long, env = "POLARIZATION_LOG", global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// estimate per-period densities from a scores file
    Distribution {
        /// scores JSON: {period: {user: {diff: ...}}}
        input: PathBuf,
        /// output stem; writes <stem>.json
        #[arg(long, short)]
        output: PathBuf,
        #[command(flatten)]
        bandwidth: BandwidthArgs,
    },
    /// compute polarization metrics from a distribution artifact
    Index {
        /// distribution artifact JSON
        input: PathBuf,
        /// output stem; writes <stem>.json, <stem>.csv, <stem>_diagnostics.json
        #[arg(long, short)]
        output: PathBuf,
        #[command(flatten)]
        integration: IntegrationArgs,
    },
    /// run both stages
    Run {
        /// scores JSON: {period: {user: {diff: ...}}}
        input: PathBuf,
        /// stem of the distribution artifact
        #[arg(long)]
        distribution: PathBuf,
        /// stem of the metrics outputs
        #[arg(long, short)]
        output: PathBuf,
        #[command(flatten)]
        bandwidth: BandwidthArgs,
        #[command(flatten)]
        integration: IntegrationArgs,
    },
}

#[derive(Args)]
struct BandwidthArgs {
    /// maximum number of points used for the bandwidth search
    #[arg(long, env = "POLARIZATION_SAMPLE_SIZE", default_value_t = DEFAULT_SAMPLE_SIZE)]
    sample_size: usize,
    /// cross-validation folds
    #[arg(long, env = "POLARIZATION_FOLDS", default_value_t = DEFAULT_FOLDS)]
    folds: usize,
    /// smallest candidate bandwidth
    #[arg(long, default_value_t = DEFAULT_BANDWIDTH_GRID.0)]
    bandwidth_min: f64,
    /// largest candidate bandwidth
    #[arg(long, default_value_t = DEFAULT_BANDWIDTH_GRID.1)]
    bandwidth_max: f64,
    /// number of candidate bandwidths
    #[arg(long, default_value_t = DEFAULT_BANDWIDTH_GRID.2)]
    bandwidth_count: usize,
    /// diagnostic grid points per score (0 disables pdf_array)
    #[arg(long, default_value_t = DEFAULT_GRID_MULTIPLIER)]
    grid_multiplier: usize,
}

#[derive(Args)]
struct IntegrationArgs {
    /// absolute quadrature tolerance
    #[arg(long, default_value_t = 1.49e-8)]
    epsabs: f64,
    /// relative quadrature tolerance
    #[arg(long, default_value_t = 1.49e-8)]
    epsrel: f64,
    /// maximum quadrature subintervals
    #[arg(long, default_value_t = 200)]
    limit: usize,
    /// relative error above which a warning is logged
    #[arg(long, default_value_t = 1e-6)]
    warn_rel_err: f64,
    /// relative error above which a period is skipped
    #[arg(long, default_value_t = 1e-3)]
    max_rel_err: f64,
    /// side mass at or below which a side counts as empty
    #[arg(long, default_value_t = 1e-12)]
    mass_floor: f64,
}

impl BandwidthArgs {
    fn options(&self) -> Result<BandwidthOptions> {
        let grid = (self.bandwidth_min, self.bandwidth_max, self.bandwidth_count);
        BandwidthOptions::new(self.sample_size, grid, self.folds)
            .context("invalid bandwidth options")
    }
}

impl IntegrationArgs {
    fn options(&self) -> Result<IntegrationOptions> {
        IntegrationOptions::new(
            self.epsabs,
            self.epsrel,
            self.limit,
            self.warn_rel_err,
            self.max_rel_err,
            self.mass_floor,
        )
        .context("invalid integration options")
    }
}

// ── main ────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    match (&cli.log_filter, cli.debug) {
        (Some(directives), _) => tracing_config::init_with_filter(directives),
        (None, true) => tracing_config::init_debug(),
        (None, false) => tracing_config::init(),
    }

    match execute(&cli) {
        Ok(summaries) => {
            for summary in &summaries {
                report(summary);
            }
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            let code = match err.downcast_ref::<PipelineError>() {
                Some(PipelineError::NoPeriods { .. }) => 2,
                _ => 1,
            };
            process::exit(code);
        }
    }
}

fn execute(cli: &Cli) -> Result<Vec<StageSummary>> {
    let run = RunOptions::new(cli.seed, cli.threads);

    let summaries = match &cli.command {
        Command::Distribution { input, output, bandwidth } => {
            let options = PolarizationOptions::new(
                bandwidth.options()?,
                IntegrationOptions::default(),
                bandwidth.grid_multiplier,
            );
            vec![pipeline::run_distribution(input, output, &options, &run)?]
        }
        Command::Index { input, output, integration } => {
            vec![pipeline::run_index(input, output, &integration.options()?, &run)?]
        }
        Command::Run { input, distribution, output, bandwidth, integration } => {
            let options = PolarizationOptions::new(
                bandwidth.options()?,
                integration.options()?,
                bandwidth.grid_multiplier,
            );
            pipeline::run_all(input, distribution, output, &options, &run)?
        }
    };
    Ok(summaries)
}

fn report(summary: &StageSummary) {
    println!("{summary}");
    for path in &summary.outputs {
        println!("  wrote {}", path.display());
    }
    if let Some(path) = &summary.error_log {
        println!("  error log: {}", path.display());
    }
}
