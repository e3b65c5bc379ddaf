//! Run-to-run comparison

use crate::types::{HistoryRecord, MetricsDiff, RunMetrics};

/// Signed change of each rated metric; zero when there is no previous run
pub fn diff(current: &RunMetrics, previous: Option<&HistoryRecord>) -> MetricsDiff {
    let Some(previous) = previous else {
        return MetricsDiff::default();
    };

    MetricsDiff {
        pylint_errors: signed_delta(
            current.pylint_error_count,
            previous.metrics.pylint_error_count,
        ),
        security_errors: signed_delta(
            current.security_error_count,
            previous.metrics.security_error_count,
        ),
    }
}

fn signed_delta(current: u64, previous: u64) -> i64 {
    (current as i128 - previous as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
}

impl std::fmt::Display for MetricsDiff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pylint errors {:+}, security errors {:+}",
            self.pylint_errors, self.security_errors
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Rating;

    fn metrics(pylint: u64, security: u64) -> RunMetrics {
        RunMetrics {
            pylint_error_count: pylint,
            security_error_count: security,
            ..Default::default()
        }
    }

    fn record(pylint: u64, security: u64) -> HistoryRecord {
        let m = metrics(pylint, security);
        let rating = Rating::from_metrics(&m);
        HistoryRecord::new(m, rating)
    }

    #[test]
    fn test_no_history_is_zero() {
        assert_eq!(diff(&metrics(5, 1), None), MetricsDiff::default());
    }

    #[test]
    fn test_signed_deltas() {
        let d = diff(&metrics(5, 1), Some(&record(3, 2)));
        assert_eq!(d.pylint_errors, 2);
        assert_eq!(d.security_errors, -1);
        assert_eq!(d.to_string(), "pylint errors +2, security errors -1");
    }

    #[test]
    fn test_identical_runs_unchanged() {
        assert!(diff(&metrics(4, 4), Some(&record(4, 4))).is_unchanged());
    }
}
