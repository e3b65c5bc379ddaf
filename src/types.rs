//! Core data types for audit reporting

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Metrics aggregated from the artifacts of one audit run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunMetrics {
    /// Lines in the lint log matching an error marker
    pub pylint_error_count: u64,
    /// Second token of each error line, assumed to name a file or module
    #[serde(default)]
    pub problematic_files: BTreeSet<String>,
    /// Entries under `errors` in the security-scan report
    pub security_error_count: u64,
    /// Trimmed contents of the complexity report, if non-empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity_notes: Option<String>,
}

impl RunMetrics {
    /// Errors that count against the rating
    pub fn total_errors(&self) -> u64 {
        self.pylint_error_count.saturating_add(self.security_error_count)
    }
}

/// Quality rating in `[1.0, 10.0]`, one decimal place
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(pub(crate) f64);

impl Rating {
    pub const MAX: f64 = 10.0;
    pub const MIN: f64 = 1.0;

    pub fn value(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// Snapshot of the most recent run, as persisted by a history store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub metrics: RunMetrics,
    pub rating: Rating,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recorded_at: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    /// Create a record stamped with the current time
    pub fn new(metrics: RunMetrics, rating: Rating) -> Self {
        Self {
            metrics,
            rating,
            recorded_at: Some(Utc::now()),
        }
    }
}

/// Signed change of each rated metric since the previous run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsDiff {
    pub pylint_errors: i64,
    pub security_errors: i64,
}

impl MetricsDiff {
    pub fn is_unchanged(&self) -> bool {
        self.pylint_errors == 0 && self.security_errors == 0
    }
}

/// How much the rendered report contains
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportLevel {
    Brief,
    #[default]
    Full,
    Detailed,
}

impl std::fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Brief => write!(f, "brief"),
            Self::Full => write!(f, "full"),
            Self::Detailed => write!(f, "detailed"),
        }
    }
}

impl std::str::FromStr for ReportLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "brief" => Ok(Self::Brief),
            "full" => Ok(Self::Full),
            "detailed" => Ok(Self::Detailed),
            _ => Err(format!(
                "Unknown report level: {} (expected brief, full or detailed)",
                s
            )),
        }
    }
}

/// Encoding of the final report artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Html,
    #[default]
    Markdown,
}

impl ExportFormat {
    /// Conventional report file name for this encoding
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Json => "full_report.json",
            Self::Html => "full_report.html",
            Self::Markdown => "full_report.md",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Html => write!(f, "html"),
            Self::Markdown => write!(f, "markdown"),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "html" => Ok(Self::Html),
            "markdown" | "md" => Ok(Self::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone, Serialize)]
pub struct AuditOutcome {
    pub metrics: RunMetrics,
    pub rating: Rating,
    pub diff: MetricsDiff,
    /// Whether a previous record existed to diff against
    pub had_history: bool,
    pub summary: Vec<String>,
    pub report_path: PathBuf,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<ExportFormat>(), Ok(ExportFormat::Json));
        assert_eq!("md".parse::<ExportFormat>(), Ok(ExportFormat::Markdown));
        assert!("pdf".parse::<ExportFormat>().is_err());
        assert_eq!("detailed".parse::<ReportLevel>(), Ok(ReportLevel::Detailed));
        assert!("verbose".parse::<ReportLevel>().is_err());
    }

    #[test]
    fn test_record_without_timestamp_deserializes() {
        let json = r#"{
            "metrics": {
                "pylint_error_count": 3,
                "problematic_files": ["a.py"],
                "security_error_count": 2
            },
            "rating": 7.5
        }"#;
        let record: HistoryRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.metrics.total_errors(), 5);
        assert_eq!(record.rating.value(), 7.5);
        assert!(record.recorded_at.is_none());
    }
}
