//! Report rendering
//!
//! Supports three encodings:
//! - `markdown` - sectioned plain document (default)
//! - `html` - standalone page
//! - `json` - machine-readable data file
//!
//! The detail level only adds sections; it never changes the metrics.

use crate::error::{AuditError, Result};
use crate::types::{ExportFormat, MetricsDiff, Rating, ReportLevel, RunMetrics};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_TITLE: &str = "nAUDIT Audit Report";

const DETAILS_NOTE: &str = "Full tool logs are kept next to this report in the reports directory.";

/// Fixed tips appended at the `detailed` level
pub const DETAILED_TIPS: [&str; 4] = [
    "Use a separate virtual environment for every project",
    "Run static analysis regularly, not only before releases",
    "Follow the PEP 8 style guide",
    "Write tests for every functional block",
];

/// Everything a report is rendered from
#[derive(Debug, Clone)]
pub struct ReportInput<'a> {
    pub target: &'a Path,
    pub timestamp: DateTime<Utc>,
    pub metrics: &'a RunMetrics,
    pub rating: Rating,
    pub diff: MetricsDiff,
    pub had_history: bool,
    pub summary: &'a [String],
}

#[derive(Serialize)]
struct JsonReport<'a> {
    title: &'static str,
    generated_at: DateTime<Utc>,
    target: String,
    metrics: &'a RunMetrics,
    rating: Rating,
    differences: Option<MetricsDiff>,
    recommendations: &'a [String],
    details: JsonDetails,
}

#[derive(Serialize)]
struct JsonDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tips: Vec<&'static str>,
}

/// Render a report in the given encoding
pub fn render_report(
    input: &ReportInput<'_>,
    format: ExportFormat,
    level: ReportLevel,
) -> Result<String> {
    match format {
        ExportFormat::Json => render_json(input, level),
        ExportFormat::Html => Ok(render_html(input, level)),
        ExportFormat::Markdown => Ok(render_markdown(input, level)),
    }
}

/// Render a report and write it to its conventional file name in `dir`
pub fn write_report(
    dir: &Path,
    input: &ReportInput<'_>,
    format: ExportFormat,
    level: ReportLevel,
) -> Result<PathBuf> {
    let content = render_report(input, format, level)?;
    let path = dir.join(format.file_name());

    std::fs::create_dir_all(dir).map_err(|e| AuditError::report_write(&path, e))?;
    std::fs::write(&path, content).map_err(|e| AuditError::report_write(&path, e))?;

    info!("{} report written to {}", format, path.display());
    Ok(path)
}

fn shows_details(level: ReportLevel) -> bool {
    matches!(level, ReportLevel::Full | ReportLevel::Detailed)
}

fn render_json(input: &ReportInput<'_>, level: ReportLevel) -> Result<String> {
    let report = JsonReport {
        title: REPORT_TITLE,
        generated_at: input.timestamp,
        target: input.target.display().to_string(),
        metrics: input.metrics,
        rating: input.rating,
        differences: input.had_history.then_some(input.diff),
        recommendations: input.summary,
        details: JsonDetails {
            note: shows_details(level).then_some(DETAILS_NOTE),
            tips: if level == ReportLevel::Detailed {
                DETAILED_TIPS.to_vec()
            } else {
                Vec::new()
            },
        },
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn render_markdown(input: &ReportInput<'_>, level: ReportLevel) -> String {
    let mut md = String::new();

    md.push_str(&format!("# {}\n\n", REPORT_TITLE));
    md.push_str(&format!("**Generated:** {}\n\n", input.timestamp));
    md.push_str(&format!("**Target:** {}\n\n", input.target.display()));

    md.push_str("## Rating\n\n");
    md.push_str(&format!("**{} / 10**\n\n", input.rating));

    md.push_str("## Metrics\n\n");
    md.push_str(&format!("- Lint errors: {}\n", input.metrics.pylint_error_count));
    md.push_str(&format!(
        "- Problematic files: {}\n",
        input.metrics.problematic_files.len()
    ));
    md.push_str(&format!(
        "- Security errors: {}\n\n",
        input.metrics.security_error_count
    ));

    md.push_str("## Changes since last audit\n\n");
    if input.had_history {
        md.push_str(&format!("- Lint errors: {:+}\n", input.diff.pylint_errors));
        md.push_str(&format!("- Security errors: {:+}\n\n", input.diff.security_errors));
    } else {
        md.push_str("No previous audit recorded.\n\n");
    }

    md.push_str("## Summary and recommendations\n\n");
    md.push_str("```text\n");
    for line in input.summary {
        md.push_str(line);
        md.push('\n');
    }
    md.push_str("```\n");

    if shows_details(level) {
        md.push_str("\n## Detailed report\n\n");
        md.push_str(DETAILS_NOTE);
        md.push('\n');
    }

    if level == ReportLevel::Detailed {
        md.push_str("\n## Tips\n\n");
        for tip in DETAILED_TIPS {
            md.push_str(&format!("- {}\n", tip));
        }
    }

    md
}

fn render_html(input: &ReportInput<'_>, level: ReportLevel) -> String {
    let mut html = String::new();

    html.push_str(&format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>\n",
        REPORT_TITLE
    ));
    html.push_str(&format!("<h1>{}</h1>\n", REPORT_TITLE));
    html.push_str(&format!(
        "<p>Generated {} for <code>{}</code></p>\n",
        input.timestamp,
        html_escape(&input.target.display().to_string())
    ));

    html.push_str("<h2>Rating</h2>\n");
    html.push_str(&format!("<p class=\"rating\">{} / 10</p>\n", input.rating));

    html.push_str("<h2>Main metrics</h2>\n<ul>\n");
    html.push_str(&format!(
        "<li>Lint errors: {}</li>\n",
        input.metrics.pylint_error_count
    ));
    html.push_str(&format!(
        "<li>Problematic files: {}</li>\n",
        input.metrics.problematic_files.len()
    ));
    html.push_str(&format!(
        "<li>Security errors: {}</li>\n",
        input.metrics.security_error_count
    ));
    html.push_str("</ul>\n");

    html.push_str("<h2>Changes since last audit</h2>\n");
    if input.had_history {
        html.push_str(&format!(
            "<ul>\n<li>Lint errors: {:+}</li>\n<li>Security errors: {:+}</li>\n</ul>\n",
            input.diff.pylint_errors, input.diff.security_errors
        ));
    } else {
        html.push_str("<p>No previous audit recorded.</p>\n");
    }

    if shows_details(level) {
        html.push_str(&format!("<h2>Detailed report</h2>\n<p>{}</p>\n", DETAILS_NOTE));
    }

    html.push_str("<h2>Summary and recommendations</h2>\n");
    html.push_str(&format!(
        "<p>{}</p>\n",
        html_escape(&input.summary.join("\n")).replace('\n', "<br>")
    ));

    if level == ReportLevel::Detailed {
        html.push_str("<h2>Tips</h2>\n<ul>\n");
        for tip in DETAILED_TIPS {
            html.push_str(&format!("<li>{}</li>\n", tip));
        }
        html.push_str("</ul>\n");
    }

    html.push_str("</body></html>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fixture() -> (RunMetrics, Vec<String>) {
        let metrics = RunMetrics {
            pylint_error_count: 5,
            problematic_files: ["a.py".to_string(), "<b>.py".to_string()].into_iter().collect(),
            security_error_count: 1,
            complexity_notes: None,
        };
        let summary = vec![
            "pylint: 5 errors found".to_string(),
            "Problematic files: <b>.py, a.py".to_string(),
        ];
        (metrics, summary)
    }

    fn input<'a>(
        metrics: &'a RunMetrics,
        summary: &'a [String],
        had_history: bool,
    ) -> ReportInput<'a> {
        ReportInput {
            target: Path::new("project"),
            timestamp: Utc::now(),
            metrics,
            rating: Rating::from_metrics(metrics),
            diff: MetricsDiff {
                pylint_errors: 2,
                security_errors: -1,
            },
            had_history,
            summary,
        }
    }

    fn render(had_history: bool, format: ExportFormat, level: ReportLevel) -> String {
        let (metrics, summary) = fixture();
        render_report(&input(&metrics, &summary, had_history), format, level).unwrap()
    }

    #[test]
    fn test_json_keeps_summary_structured() {
        let out = render(true, ExportFormat::Json, ReportLevel::Full);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert_eq!(value["title"], REPORT_TITLE);
        assert_eq!(value["rating"], 7.0);
        assert_eq!(value["metrics"]["pylint_error_count"], 5);
        assert_eq!(value["differences"]["pylint_errors"], 2);
        assert_eq!(value["differences"]["security_errors"], -1);
        assert_eq!(value["recommendations"].as_array().unwrap().len(), 2);
        assert_eq!(value["details"]["note"], DETAILS_NOTE);
        assert!(value["details"].get("tips").is_none());
    }

    #[test]
    fn test_json_detailed_tips_and_no_history() {
        let out = render(false, ExportFormat::Json, ReportLevel::Detailed);
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();

        assert!(value["differences"].is_null());
        assert_eq!(
            value["details"]["tips"].as_array().unwrap().len(),
            DETAILED_TIPS.len()
        );
    }

    #[test]
    fn test_html_escapes_and_breaks_lines() {
        let out = render(true, ExportFormat::Html, ReportLevel::Brief);

        assert!(out.contains("pylint: 5 errors found<br>Problematic files: &lt;b&gt;.py, a.py"));
        assert!(out.contains("Lint errors: +2"));
        assert!(out.contains("Security errors: -1"));
        assert!(!out.contains("Detailed report"));
        assert!(!out.contains(DETAILED_TIPS[0]));
    }

    #[test]
    fn test_markdown_levels() {
        let brief = render(false, ExportFormat::Markdown, ReportLevel::Brief);
        let full = render(false, ExportFormat::Markdown, ReportLevel::Full);
        let detailed = render(false, ExportFormat::Markdown, ReportLevel::Detailed);

        assert!(brief.contains("**7.0 / 10**"));
        assert!(brief.contains("No previous audit recorded."));
        assert!(!brief.contains("## Detailed report"));
        assert!(full.contains("## Detailed report"));
        assert!(!full.contains("## Tips"));
        assert!(detailed.contains("## Tips"));
        assert!(detailed.contains(DETAILED_TIPS[3]));
    }

    #[test]
    fn test_write_report_overwrites_fixed_name() {
        let dir = tempdir().unwrap();
        let (metrics, summary) = fixture();
        let inp = input(&metrics, &summary, false);

        let first = write_report(dir.path(), &inp, ExportFormat::Html, ReportLevel::Full).unwrap();
        let second =
            write_report(dir.path(), &inp, ExportFormat::Html, ReportLevel::Brief).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("full_report.html"));
        let content = std::fs::read_to_string(&second).unwrap();
        assert!(!content.contains("Detailed report"));
    }

    #[test]
    fn test_write_failure_names_path() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        std::fs::write(&blocker, "").unwrap();
        let (metrics, summary) = fixture();

        let inp = input(&metrics, &summary, false);

        let err = write_report(&blocker, &inp, ExportFormat::Markdown, ReportLevel::Full)
            .unwrap_err();
        assert!(matches!(err, AuditError::ReportWriteError { .. }));
        assert!(err.to_string().contains("full_report.md"));
    }
}
