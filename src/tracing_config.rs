//! Tracing subscriber setup for the polarization pipeline.
//!
//! Only the binary calls into this module; library users may install their
//! own subscriber. Verbosity follows `RUST_LOG` when set, otherwise
//! [`DEFAULT_FILTER`] (or [`DEBUG_FILTER`] for [`init_debug`]).

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

/// Info for this crate, warnings for dependencies.
pub const DEFAULT_FILTER: &str = "warn,rust_polarization=info";
/// Debug for this crate, info for dependencies.
pub const DEBUG_FILTER: &str = "info,rust_polarization=debug";

/// Compact stderr logging with [`DEFAULT_FILTER`].
///
/// ```rust
/// use rust_polarization::tracing_config;
///
/// tracing_config::init();
/// // RUST_LOG=rust_polarization=debug polarization run ...
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .with(filter)
        .try_init();
}

/// Verbose logging with thread ids and source locations.
pub fn init_debug() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEBUG_FILTER));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true),
        )
        .with(filter)
        .try_init();
}

/// Install a subscriber with an explicit `EnvFilter` directive string,
/// ignoring `RUST_LOG`. Backs the binary's `--log-filter` flag.
///
/// Directives that fail to parse are dropped by `EnvFilter::new`, which
/// then falls back to its own default.
pub fn init_with_filter(directives: &str) {
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().compact().with_writer(std::io::stderr).with_target(true))
        .with(EnvFilter::new(directives))
        .try_init();
}
