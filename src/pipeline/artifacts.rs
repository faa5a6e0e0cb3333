//! pipeline::artifacts — on-disk formats of the pipeline stages.
//!
//! Purpose
//! -------
//! Define the JSON distribution artifact that links the two stages, and
//! write the metrics (JSON + CSV), diagnostics and error-log side files.
//!
//! Key behaviors
//! -------------
//! - [`DistributionRecord`] is the per-period intermediate: selected
//!   bandwidth, user count, the raw scores and the density on the
//!   diagnostic grid. The index stage needs only `bandwidth` and
//!   `diff_array`, so metrics can be regenerated without repeating the
//!   bandwidth search.
//! - Output files are named from a *stem*: `<stem>.json`, `<stem>.csv`,
//!   `<stem>_diagnostics.json`, `<stem>_errors.csv`.
//! - CSV rows are ordered by period key ascending; maps are `BTreeMap`s so
//!   the JSON objects follow the same order.
//!
//! Conventions
//! -----------
//! - CSV is rendered to a `String` first ([`metrics_csv`], [`errors_csv`])
//!   and written in one call, so the rendering is testable without files.
//! - Float fields use Rust's shortest round-trip formatting.
use crate::{
    estimation::polarization::{IntegrationDiagnostics, PolarizationMetrics},
    pipeline::{
        driver::PeriodFailure,
        errors::{PipelineError, PipelineResult},
    },
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::Write as _,
    path::{Path, PathBuf},
};

/// Header of the metrics CSV.
pub const METRICS_CSV_HEADER: &str = "key,pop_neg,pop_pos,diff_pops,gc_neg,gc_pos,dist_gc,pol_index";
/// Header of the error-log CSV.
pub const ERRORS_CSV_HEADER: &str = "key,kind,message";

/// Per-period output of the distribution stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionRecord {
    pub bandwidth: f64,
    #[serde(alias = "total_usuarios")]
    pub total_users: usize,
    /// Scores the density was fitted on.
    pub diff_array: Vec<f64>,
    /// Density on the diagnostic grid; empty when the grid is disabled.
    pub pdf_array: Vec<f64>,
}

/// Distribution artifact: one record per period key.
pub type DistributionArtifact = BTreeMap<String, DistributionRecord>;

/// Metrics per period key.
pub type MetricsTable = BTreeMap<String, PolarizationMetrics>;

/// Integration diagnostics per period key.
pub type DiagnosticsTable = BTreeMap<String, IntegrationDiagnostics>;

/// `<stem><suffix>`, e.g. `out/metrics` + `_errors.csv`.
pub fn stem_path(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

/// Serialize `value` as pretty JSON into `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| PipelineError::json(path, e))?;
    write_text(path, &text)
}

/// Deserialize a JSON document from `path`.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> PipelineResult<T> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| PipelineError::json(path, e))
}

/// Read a distribution artifact written by the distribution stage.
pub fn read_distribution(path: &Path) -> PipelineResult<DistributionArtifact> {
    read_json(path)
}

/// Write `<stem>.json` and return its path.
pub fn write_distribution(stem: &Path, artifact: &DistributionArtifact) -> PipelineResult<PathBuf> {
    let path = stem_path(stem, ".json");
    write_json(&path, artifact)?;
    Ok(path)
}

/// Write `<stem>.json`, `<stem>.csv` and `<stem>_diagnostics.json`.
///
/// Returns the written paths in that order.
pub fn write_metrics(
    stem: &Path, metrics: &MetricsTable, diagnostics: &DiagnosticsTable,
) -> PipelineResult<Vec<PathBuf>> {
    let json_path = stem_path(stem, ".json");
    let csv_path = stem_path(stem, ".csv");
    let diag_path = stem_path(stem, "_diagnostics.json");

    write_json(&json_path, metrics)?;
    write_text(&csv_path, &metrics_csv(metrics))?;
    write_json(&diag_path, diagnostics)?;
    Ok(vec![json_path, csv_path, diag_path])
}

/// Write `<stem>_errors.csv` when `failures` is non-empty.
///
/// Returns the path written, or `None` when there was nothing to log.
pub fn write_error_log(stem: &Path, failures: &[PeriodFailure]) -> PipelineResult<Option<PathBuf>> {
    if failures.is_empty() {
        return Ok(None);
    }
    let path = stem_path(stem, "_errors.csv");
    write_text(&path, &errors_csv(failures))?;
    Ok(Some(path))
}

/// Render the metrics table as CSV, one row per key in ascending order.
pub fn metrics_csv(metrics: &MetricsTable) -> String {
    let mut out = String::from(METRICS_CSV_HEADER);
    out.push('\n');
    for (key, m) in metrics {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            csv_field(key),
            m.pop_neg,
            m.pop_pos,
            m.diff_pops,
            m.gc_neg,
            m.gc_pos,
            m.dist_gc,
            m.pol_index
        );
    }
    out
}

/// Render failures as CSV, sorted by key (stable for equal keys).
pub fn errors_csv(failures: &[PeriodFailure]) -> String {
    let mut rows: Vec<&PeriodFailure> = failures.iter().collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    let mut out = String::from(ERRORS_CSV_HEADER);
    out.push('\n');
    for f in rows {
        let _ = writeln!(out, "{},{},{}", csv_field(&f.key), f.kind, csv_field(&f.message));
    }
    out
}

/// Quote a CSV field when it contains a separator, quote or line break.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn write_text(path: &Path, text: &str) -> PipelineResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| PipelineError::io(parent, e))?;
    }
    std::fs::write(path, text).map_err(|e| PipelineError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::errors::ErrorKind;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Stem-based naming of side files.
    // - CSV rendering order, header and quoting.
    // - Reading artifacts that use the legacy `total_usuarios` field.
    // -------------------------------------------------------------------------

    fn metrics(pol_index: f64) -> PolarizationMetrics {
        PolarizationMetrics {
            pop_neg: 0.5,
            pop_pos: 0.5,
            diff_pops: 0.0,
            gc_neg: -0.5,
            gc_pos: 0.5,
            dist_gc: 0.5,
            pol_index,
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify side-file names are derived from the stem.
    //
    // Given
    // -----
    // - Stem "out/metrics".
    //
    // Expect
    // ------
    // - "out/metrics_errors.csv" and "out/metrics.json".
    fn stem_path_appends_suffix() {
        // Arrange
        let stem = Path::new("out/metrics");

        // Act / Assert
        assert_eq!(stem_path(stem, "_errors.csv"), PathBuf::from("out/metrics_errors.csv"));
        assert_eq!(stem_path(stem, ".json"), PathBuf::from("out/metrics.json"));
    }

    #[test]
    // Purpose
    // -------
    // Ensure metrics rows follow ascending key order under the fixed header.
    //
    // Given
    // -----
    // - Keys inserted as "2016-05", "2016-03".
    //
    // Expect
    // ------
    // - Header first, then "2016-03", then "2016-05".
    fn metrics_csv_is_sorted_by_key() {
        // Arrange
        let mut table = MetricsTable::new();
        table.insert("2016-05".into(), metrics(0.2));
        table.insert("2016-03".into(), metrics(0.1));

        // Act
        let csv = metrics_csv(&table);
        let lines: Vec<&str> = csv.lines().collect();

        // Assert
        assert_eq!(lines[0], METRICS_CSV_HEADER);
        assert!(lines[1].starts_with("2016-03,"));
        assert!(lines[2].starts_with("2016-05,"));
        assert!(lines[1].ends_with(",0.1"));
    }

    #[test]
    // Purpose
    // -------
    // Ensure messages containing commas and quotes stay one CSV field.
    //
    // Given
    // -----
    // - A failure message `bad "x", really`.
    //
    // Expect
    // ------
    // - The field is quoted with doubled inner quotes.
    fn errors_csv_quotes_messages() {
        // Arrange
        let failures = vec![PeriodFailure {
            key: "p".into(),
            kind: ErrorKind::DegenerateMass,
            message: "bad \"x\", really".into(),
        }];

        // Act
        let csv = errors_csv(&failures);

        // Assert
        assert_eq!(csv.lines().nth(1), Some("p,DegenerateMassError,\"bad \"\"x\"\", really\""));
    }

    #[test]
    // Purpose
    // -------
    // Ensure artifacts written by the older tooling still load.
    //
    // Given
    // -----
    // - A record using `total_usuarios` instead of `total_users`.
    //
    // Expect
    // ------
    // - The count lands in `total_users`.
    fn distribution_record_accepts_legacy_count_field() {
        // Arrange
        let text = r#"{"bandwidth": 0.3, "total_usuarios": 2,
                       "diff_array": [-0.1, 0.4], "pdf_array": []}"#;

        // Act
        let record: DistributionRecord = serde_json::from_str(text).expect("valid record");

        // Assert
        assert_eq!(record.total_users, 2);
        assert_eq!(record.diff_array, vec![-0.1, 0.4]);
    }
}
