//! Metrics extraction from tool artifacts
//!
//! Every artifact is optional. A missing or unparseable artifact degrades
//! its share of the metrics to zero/empty and leaves a note in the summary.

use crate::artifacts::{read_json, read_text, JsonArtifact, TextArtifact};
use crate::config::ArtifactNames;
use crate::types::RunMetrics;
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Generic error marker in lint output
pub const ERROR_MARKER: &str = "ERROR";
/// Pylint code for a file that failed to parse
pub const FATAL_PARSE_MARKER: &str = "E0001";

/// Recommendation bullets closing every summary
pub const RECOMMENDATIONS: [&str; 3] = [
    "- Fix the reported lint errors, starting with the files listed above",
    "- Review the security scan findings and update vulnerable dependencies",
    "- Refactor functions with high cyclomatic complexity and cover them with tests",
];

/// Result of scanning a results directory
#[derive(Debug, Clone)]
pub struct Extraction {
    pub metrics: RunMetrics,
    /// Human-readable summary, one entry per line
    pub summary: Vec<String>,
}

impl Extraction {
    pub fn summary_text(&self) -> String {
        self.summary.join("\n")
    }
}

/// Counts gathered from the lint log
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LintFindings {
    pub error_count: u64,
    pub files: BTreeSet<String>,
}

/// Scan a lint log line by line.
///
/// The second whitespace-separated token of an error line is taken to be a
/// file or module name. This is a heuristic: it is not checked against the
/// filesystem, and lines in other layouts yield unrelated tokens.
pub fn parse_lint_log(text: &str) -> LintFindings {
    let mut findings = LintFindings::default();

    for line in text.lines() {
        if !(line.contains(ERROR_MARKER) || line.contains(FATAL_PARSE_MARKER)) {
            continue;
        }
        findings.error_count += 1;
        if let Some(token) = line.split_whitespace().nth(1) {
            findings.files.insert(token.to_string());
        }
    }

    findings
}

/// Number of entries in the `errors` list of a security report
pub fn security_error_count(report: &Value) -> u64 {
    report
        .get("errors")
        .and_then(Value::as_array)
        .map(|errors| errors.len() as u64)
        .unwrap_or(0)
}

/// Build run metrics and a summary from whatever artifacts exist in `dir`
pub fn extract_metrics(dir: &Path, names: &ArtifactNames) -> Extraction {
    let mut metrics = RunMetrics::default();
    let mut summary = Vec::new();

    match read_text(dir, &names.lint_log) {
        TextArtifact::Missing => {
            summary.push(format!("pylint: report {} not found", names.lint_log));
        }
        TextArtifact::Empty => {
            summary.push(format!("pylint: {}", errors_found(0)));
        }
        TextArtifact::Present(text) => {
            let findings = parse_lint_log(&text);
            metrics.pylint_error_count = findings.error_count;
            metrics.problematic_files = findings.files;
            summary.push(format!("pylint: {}", errors_found(metrics.pylint_error_count)));
        }
    }

    if metrics.problematic_files.is_empty() {
        summary.push("Problematic files: none found".to_string());
    } else {
        let files: Vec<&str> = metrics.problematic_files.iter().map(String::as_str).collect();
        summary.push(format!("Problematic files: {}", files.join(", ")));
    }

    metrics.security_error_count = match read_json(dir, &names.security_json) {
        JsonArtifact::Parsed(report) => security_error_count(&report),
        JsonArtifact::Missing | JsonArtifact::Malformed => 0,
    };
    summary.push(format!(
        "Security scan: {}",
        errors_found(metrics.security_error_count)
    ));

    match read_text(dir, &names.complexity_log) {
        TextArtifact::Present(text) => {
            let notes = text.trim().to_string();
            summary.push("Complexity analysis:".to_string());
            summary.extend(notes.lines().map(|l| format!("  {}", l)));
            metrics.complexity_notes = Some(notes);
        }
        TextArtifact::Empty => {
            summary.push("Complexity analysis: nothing critical found".to_string());
        }
        TextArtifact::Missing => {
            summary.push(format!(
                "Complexity analysis: report {} not found",
                names.complexity_log
            ));
        }
    }

    summary.push("Recommendations:".to_string());
    summary.extend(RECOMMENDATIONS.iter().map(|r| r.to_string()));

    info!(
        "Extracted metrics: {} lint errors in {} files, {} security errors",
        metrics.pylint_error_count,
        metrics.problematic_files.len(),
        metrics.security_error_count
    );
    debug!("Complexity notes present: {}", metrics.complexity_notes.is_some());

    Extraction { metrics, summary }
}

fn errors_found(count: u64) -> String {
    match count {
        1 => "1 error found".to_string(),
        n => format!("{} errors found", n),
    }
}
