//! estimation::validation — shared input guards for score samples.
//!
//! Purpose
//! -------
//! Centralize the checks every entry point of the estimation subtree runs
//! before touching a sample: minimum length, finiteness of each score, and
//! validity of a bandwidth.
//!
//! Invariants & assumptions
//! ------------------------
//! - Scores are expected to lie in [-1, 1] but this is *not* enforced; a
//!   score outside that range is still a valid real and only shifts mass
//!   outside the integration domain, which the calculator tolerates.
//! - A successful return is a guarantee that the sample is non-empty (or as
//!   long as requested) and fully finite.
//!
//! Testing notes
//! -------------
//! - Unit tests cover each error branch and a success path.
use crate::estimation::errors::{PolarizationError, PolarizationResult};

/// Validate that `sample` has at least `required` finite scores.
///
/// Errors
/// ------
/// - `PolarizationError::InsufficientData` when `sample.len() < required`.
/// - `PolarizationError::InvalidScore` for the first NaN or ±∞ entry.
pub fn validate_sample(sample: &[f64], required: usize) -> PolarizationResult<()> {
    if sample.len() < required {
        return Err(PolarizationError::InsufficientData { len: sample.len(), required });
    }

    for (index, &value) in sample.iter().enumerate() {
        if !value.is_finite() {
            return Err(PolarizationError::InvalidScore { index, value });
        }
    }

    Ok(())
}

/// Validate that a bandwidth is finite and strictly positive.
pub fn validate_bandwidth(bandwidth: f64) -> PolarizationResult<()> {
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Err(PolarizationError::InvalidBandwidth { value: bandwidth });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - `validate_sample` success, short-sample and non-finite branches.
    // - `validate_bandwidth` acceptance and rejection.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Verify that a finite sample of sufficient length passes validation.
    //
    // Given
    // -----
    // - Three finite scores and `required = 1`.
    //
    // Expect
    // ------
    // - `validate_sample` returns `Ok(())`.
    fn validate_sample_accepts_finite_scores() {
        // Arrange
        let sample = [-0.5, 0.0, 0.5];

        // Act
        let result = validate_sample(&sample, 1);

        // Assert
        assert!(result.is_ok(), "Expected Ok(()), got {result:?}");
    }

    #[test]
    // Purpose
    // -------
    // Ensure an empty sample is rejected with `InsufficientData`.
    //
    // Given
    // -----
    // - An empty slice and `required = 1`.
    //
    // Expect
    // ------
    // - `Err(InsufficientData { len: 0, required: 1 })`.
    fn validate_sample_rejects_empty_sample() {
        // Arrange
        let sample: [f64; 0] = [];

        // Act
        let result = validate_sample(&sample, 1);

        // Assert
        assert_eq!(result, Err(PolarizationError::InsufficientData { len: 0, required: 1 }));
    }

    #[test]
    // Purpose
    // -------
    // Ensure the first non-finite score is reported with its index.
    //
    // Given
    // -----
    // - A sample whose second element is +∞.
    //
    // Expect
    // ------
    // - `Err(InvalidScore { index: 1, .. })`.
    fn validate_sample_reports_first_non_finite_index() {
        // Arrange
        let sample = [0.1, f64::INFINITY, f64::NAN];

        // Act
        let result = validate_sample(&sample, 1);

        // Assert
        match result {
            Err(PolarizationError::InvalidScore { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidScore, got {other:?}"),
        }
    }

    #[test]
    // Purpose
    // -------
    // Verify bandwidth validation rejects zero, negative and NaN values.
    //
    // Given
    // -----
    // - Bandwidths 0.3 (valid), 0.0, -0.1 and NaN.
    //
    // Expect
    // ------
    // - Only 0.3 is accepted.
    fn validate_bandwidth_requires_positive_finite_value() {
        // Act / Assert
        assert!(validate_bandwidth(0.3).is_ok());
        assert!(validate_bandwidth(0.0).is_err());
        assert!(validate_bandwidth(-0.1).is_err());
        assert!(validate_bandwidth(f64::NAN).is_err());
    }
}
