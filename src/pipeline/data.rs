//! pipeline::data — loading per-period score samples.
//!
//! Purpose
//! -------
//! Read the upstream aggregation output (a JSON object mapping each period
//! to an object of users, each carrying a `diff` field) and turn it into
//! one score sample per period. User identifiers are discarded.
//!
//! Key behaviors
//! -------------
//! - Accept `diff` as a number, a decimal string (`"0.12345"`), or the
//!   labelled object form `{"title": "...", "value": "0.12345"}`.
//! - Keep periods and users in file order, so fold assignment during
//!   bandwidth selection follows the input layout.
//! - Map unparsable scores to NaN; the numerical stage then rejects the
//!   period with `InvalidScore`, so one bad record does not abort the run.
//!
//! Invariants & assumptions
//! ------------------------
//! - The top-level value and each period value must be JSON objects;
//!   anything else is a [`PipelineError::Format`].
//! - A period with zero users is kept as an empty sample so the driver can
//!   record it as skipped.
use crate::pipeline::errors::{PipelineError, PipelineResult};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

/// Opaque identifier of a time bucket, e.g. `"2016-03"`.
pub type PeriodKey = String;

/// Scores of every unlabeled user in one period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodScores {
    pub key: PeriodKey,
    pub scores: Vec<f64>,
}

/// Encodings accepted for a user's `diff` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DiffField {
    Number(f64),
    Text(String),
    Labeled { value: Box<DiffField> },
}

impl DiffField {
    /// Numeric score; NaN when the text does not parse.
    pub fn score(&self) -> f64 {
        match self {
            DiffField::Number(x) => *x,
            DiffField::Text(s) => s.trim().parse().unwrap_or(f64::NAN),
            DiffField::Labeled { value } => value.score(),
        }
    }
}

/// One user's record; only `diff` is read.
#[derive(Debug, Clone, Deserialize)]
pub struct UserRecord {
    pub diff: DiffField,
}

/// Load every period of a scores file.
///
/// Errors
/// ------
/// - `PipelineError::Io` when the file cannot be read.
/// - `PipelineError::Json` when it is not valid JSON.
/// - `PipelineError::Format` when the layout is not
///   `{period: {user: {diff: ...}}}`.
pub fn load_scores(path: &Path) -> PipelineResult<Vec<PeriodScores>> {
    let text = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;
    let value: Value = serde_json::from_str(&text).map_err(|e| PipelineError::json(path, e))?;
    scores_from_value(&value, path)
}

/// Convert an already-parsed scores document. `origin` is used in error
/// messages only.
pub fn scores_from_value(value: &Value, origin: &Path) -> PipelineResult<Vec<PeriodScores>> {
    let periods = value
        .as_object()
        .ok_or_else(|| PipelineError::format(origin, "top level must be an object of periods"))?;

    let mut out = Vec::with_capacity(periods.len());
    for (key, users) in periods {
        let users = users.as_object().ok_or_else(|| {
            PipelineError::format(origin, format!("period {key} is not an object of users"))
        })?;

        let mut scores = Vec::with_capacity(users.len());
        for (user, record) in users {
            let record = UserRecord::deserialize(record).map_err(|e| {
                PipelineError::format(origin, format!("period {key}, user {user}: {e}"))
            })?;
            let score = record.diff.score();
            if score.is_nan() {
                tracing::warn!(period = %key, user = %user, "unparsable diff value");
            }
            scores.push(score);
        }
        out.push(PeriodScores { key: key.clone(), scores });
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - All accepted `diff` encodings.
    // - Preservation of period and user order.
    // - Empty periods and malformed layouts.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify the three `diff` encodings and that extra fields are ignored.
    //
    // Given
    // -----
    // - One period with a numeric, a string and a labelled-object diff.
    //
    // Expect
    // ------
    // - Scores [0.25, -0.5, 0.12345] in file order.
    fn parses_all_diff_encodings_in_order() {
        // Arrange
        let doc = json!({
            "2016-03": {
                "u9": {"diff": 0.25},
                "u1": {"diff": "-0.50000", "pro": {"value": "25.00"}},
                "u5": {"diff": {"title": "Percentual Difference", "value": "0.12345"}}
            }
        });

        // Act
        let periods = scores_from_value(&doc, Path::new("mem")).expect("valid layout");

        // Assert
        assert_eq!(periods.len(), 1);
        assert_eq!(periods[0].key, "2016-03");
        assert_eq!(periods[0].scores, vec![0.25, -0.5, 0.12345]);
    }

    #[test]
    // Purpose
    // -------
    // Ensure an empty period is kept and an unparsable score becomes NaN.
    //
    // Given
    // -----
    // - Period "a" with no users and period "b" with diff "n/a".
    //
    // Expect
    // ------
    // - "a" has an empty sample; "b" has one NaN score.
    fn keeps_empty_periods_and_marks_bad_scores() {
        // Arrange
        let doc = json!({"a": {}, "b": {"u": {"diff": "n/a"}}});

        // Act
        let periods = scores_from_value(&doc, Path::new("mem")).expect("valid layout");

        // Assert
        assert_eq!(periods[0].key, "a");
        assert!(periods[0].scores.is_empty());
        assert!(periods[1].scores[0].is_nan());
    }

    #[test]
    // Purpose
    // -------
    // Ensure layouts that break the input contract are rejected.
    //
    // Given
    // -----
    // - A top-level array; a period holding a number; a user without diff.
    //
    // Expect
    // ------
    // - `PipelineError::Format` in each case.
    fn rejects_malformed_layouts() {
        // Arrange
        let origin = Path::new("mem");

        // Act / Assert
        assert!(matches!(
            scores_from_value(&json!([1, 2]), origin),
            Err(PipelineError::Format { .. })
        ));
        assert!(matches!(
            scores_from_value(&json!({"p": 3}), origin),
            Err(PipelineError::Format { .. })
        ));
        assert!(matches!(
            scores_from_value(&json!({"p": {"u": {"pro": 1}}}), origin),
            Err(PipelineError::Format { .. })
        ));
    }
}
