//! Quality rating for an audit run

use crate::types::{Rating, RunMetrics};

/// Rating lost per lint or security error
pub const PENALTY_PER_ERROR: f64 = 0.5;

impl Rating {
    /// Linear penalty model: `max(1.0, 10.0 - 0.5 * errors)`, one decimal place.
    ///
    /// Only lint and security errors count; problematic files and complexity
    /// notes do not affect the rating.
    pub fn from_metrics(metrics: &RunMetrics) -> Self {
        Self::from_error_count(metrics.total_errors())
    }

    pub fn from_error_count(errors: u64) -> Self {
        let raw = Self::MAX - PENALTY_PER_ERROR * errors as f64;
        let rounded = (raw.max(Self::MIN) * 10.0).round() / 10.0;
        Rating(rounded.clamp(Self::MIN, Self::MAX))
    }
}

/// Calculate the rating of a run
pub fn calculate_rating(metrics: &RunMetrics) -> Rating {
    Rating::from_metrics(metrics)
}
