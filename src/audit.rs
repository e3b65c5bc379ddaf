//! Main audit orchestration logic

use crate::config::AuditConfig;
use crate::diff::diff;
use crate::error::{AuditError, Result};
use crate::extract::extract_metrics;
use crate::history::{HistoryState, HistoryStore, JsonHistoryStore};
use crate::plugins::{builtin_plugins, run_plugins, Plugin};
use crate::report::{write_report, ReportInput};
use crate::tools::{
    default_steps, missing_commands, outcome_warnings, run_stage, snapshot_environment, Stage,
    ToolStep, EXTERNAL_COMMANDS,
};
use crate::types::{AuditOutcome, HistoryRecord, Rating};
use chrono::Utc;
use tracing::{info, warn};

/// Receives pipeline progress, 0 to 100
pub trait ProgressObserver {
    fn progress(&self, percent: u8, message: &str);
}

/// Observer that ignores progress
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn progress(&self, _percent: u8, _message: &str) {}
}

/// Run every external tool, then aggregate, rate and report
pub async fn run_audit(
    config: &AuditConfig,
    observer: &dyn ProgressObserver,
) -> Result<AuditOutcome> {
    run_steps(config, &default_steps(config), observer).await
}

pub(crate) async fn run_steps(
    config: &AuditConfig,
    steps: &[ToolStep],
    observer: &dyn ProgressObserver,
) -> Result<AuditOutcome> {
    config.validate()?;
    info!("Starting audit of: {}", config.target.display());

    prepare_directories(config)?;
    observer.progress(0, "Initializing audit");

    for cmd in missing_commands(&EXTERNAL_COMMANDS) {
        warn!("External tool '{}' not found; install it with your package manager", cmd);
    }

    let mut tool_warnings = Vec::new();
    for (i, stage) in Stage::ALL.into_iter().enumerate() {
        if stage == Stage::Infrastructure {
            if let Err(e) = snapshot_environment(&config.layout.configs_dir()) {
                warn!("Could not snapshot environment: {}", e);
            }
        }
        let outcomes = run_stage(steps, stage, config).await;
        tool_warnings.extend(outcome_warnings(&outcomes));
        observer.progress((i as u8 + 1) * 20, &format!("Finished {}", stage));
    }

    observer.progress(90, "Generating report");
    let store = JsonHistoryStore::new(config.layout.history_path());
    let outcome = generate_report(config, &store, &builtin_plugins(), &tool_warnings)?;

    observer.progress(100, "Audit complete");
    info!(
        "Audit complete: rating {} ({}), report at {}",
        outcome.rating,
        outcome.diff,
        outcome.report_path.display()
    );

    Ok(outcome)
}

/// Aggregate existing artifacts into a report and update history.
///
/// `tool_warnings` are listed under "Tool warnings:" in the summary; pass an
/// empty slice when the tools were not run by this process. The report is
/// written before the history, so a failed write leaves the previous record
/// in place.
pub fn generate_report(
    config: &AuditConfig,
    store: &dyn HistoryStore,
    plugins: &[Plugin],
    tool_warnings: &[String],
) -> Result<AuditOutcome> {
    prepare_directories(config)?;
    let reports_dir = config.layout.reports_dir();

    let extraction = extract_metrics(&reports_dir, &config.artifacts);
    let metrics = extraction.metrics;
    let mut summary = extraction.summary;

    let plugin_lines = run_plugins(plugins, config, &reports_dir);
    if !plugin_lines.is_empty() {
        summary.push("Plugin checks:".to_string());
        summary.extend(plugin_lines.into_iter().map(|l| format!("  {}", l)));
    }

    if !tool_warnings.is_empty() {
        summary.push("Tool warnings:".to_string());
        summary.extend(tool_warnings.iter().map(|l| format!("  {}", l)));
    }

    let previous = match store.inspect() {
        HistoryState::Found(record) => Some(record),
        HistoryState::Absent => None,
        HistoryState::Corrupt(reason) => {
            summary.push(format!(
                "History warning: previous audit record unreadable ({}); treated as first run",
                reason
            ));
            None
        }
    };

    let rating = Rating::from_metrics(&metrics);
    let diff = diff(&metrics, previous.as_ref());
    let timestamp = Utc::now();

    let input = ReportInput {
        target: &config.target,
        timestamp,
        metrics: &metrics,
        rating,
        diff,
        had_history: previous.is_some(),
        summary: &summary,
    };
    let report_path = write_report(
        &reports_dir,
        &input,
        config.export_format,
        config.report_level,
    )?;

    store.save(&HistoryRecord {
        metrics: metrics.clone(),
        rating,
        recorded_at: Some(timestamp),
    })?;

    Ok(AuditOutcome {
        metrics,
        rating,
        diff,
        had_history: previous.is_some(),
        summary,
        report_path,
        timestamp,
    })
}

fn prepare_directories(config: &AuditConfig) -> Result<()> {
    for dir in [config.layout.reports_dir(), config.layout.configs_dir()] {
        std::fs::create_dir_all(&dir).map_err(|e| AuditError::setup(&dir, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExportFormat, MetricsDiff, ReportLevel};
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::tempdir;

    fn config_at(root: &Path) -> AuditConfig {
        AuditConfig::builder()
            .target(root.join("project"))
            .results_root(root.join("audit_results"))
            .skip_plugin("sample")
            .build()
    }

    fn offline_config(root: &Path) -> AuditConfig {
        let mut config = config_at(root);
        for step in default_steps(&config) {
            config.skip_tools.insert(step.name.to_string());
        }
        config
    }

    fn write_artifact(config: &AuditConfig, name: &str, content: &str) {
        let dir = config.layout.reports_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_three_lint_errors_scenario() {
        let root = tempdir().unwrap();
        let config = config_at(root.path());
        write_artifact(
            &config,
            "pylint.log",
            "ERROR a.py undefined variable\nERROR a.py bad import\n\
             ERROR b.py syntax\nC0114 missing docstring\n",
        );

        let store = JsonHistoryStore::new(config.layout.history_path());
        let outcome = generate_report(&config, &store, &[], &[]).unwrap();

        assert_eq!(outcome.metrics.pylint_error_count, 3);
        assert_eq!(
            outcome.metrics.problematic_files.iter().cloned().collect::<Vec<_>>(),
            vec!["a.py".to_string(), "b.py".to_string()]
        );
        assert_eq!(outcome.metrics.security_error_count, 0);
        assert_eq!(outcome.rating.value(), 8.5);
        assert_eq!(outcome.diff, MetricsDiff::default());
        assert!(!outcome.had_history);
        assert_eq!(
            outcome.report_path,
            config.layout.reports_dir().join("full_report.md")
        );
    }

    #[test]
    fn test_second_identical_run_has_zero_diff() {
        let root = tempdir().unwrap();
        let config = config_at(root.path());
        write_artifact(&config, "pylint.log", "ERROR x.py oops\n");
        write_artifact(&config, "security_issues.json", r#"{"errors": [1, 2]}"#);
        let store = JsonHistoryStore::new(config.layout.history_path());

        let first = generate_report(&config, &store, &[], &[]).unwrap();
        let second = generate_report(&config, &store, &[], &[]).unwrap();

        assert_eq!(first.rating.value(), 8.5);
        assert!(second.had_history);
        assert!(second.diff.is_unchanged());
        assert_eq!(store.load().unwrap().metrics, second.metrics);
    }

    #[test]
    fn test_diff_against_previous_run() {
        let root = tempdir().unwrap();
        let config = config_at(root.path());
        let store = JsonHistoryStore::new(config.layout.history_path());

        write_artifact(&config, "pylint.log", "ERROR a.py\nERROR a.py\nERROR a.py\n");
        write_artifact(&config, "security_issues.json", r#"{"errors": [1, 2]}"#);
        generate_report(&config, &store, &[], &[]).unwrap();

        write_artifact(
            &config,
            "pylint.log",
            "ERROR a.py\nERROR a.py\nERROR a.py\nERROR b.py\nERROR b.py\n",
        );
        write_artifact(&config, "security_issues.json", r#"{"errors": [1]}"#);
        let outcome = generate_report(&config, &store, &[], &[]).unwrap();

        assert_eq!(outcome.diff.pylint_errors, 2);
        assert_eq!(outcome.diff.security_errors, -1);
    }

    #[test]
    fn test_report_failure_keeps_history() {
        let root = tempdir().unwrap();
        let config = config_at(root.path());
        let store = JsonHistoryStore::new(config.layout.history_path());
        write_artifact(&config, "pylint.log", "ERROR a.py\n");
        generate_report(&config, &store, &[], &[]).unwrap();

        // Block the report file name with a directory
        let report = config.layout.reports_dir().join("full_report.md");
        std::fs::remove_file(&report).unwrap();
        std::fs::create_dir(&report).unwrap();
        write_artifact(&config, "pylint.log", "ERROR a.py\nERROR b.py\n");

        let err = generate_report(&config, &store, &[], &[]).unwrap_err();
        assert!(matches!(err, AuditError::ReportWriteError { .. }));
        assert_eq!(store.load().unwrap().metrics.pylint_error_count, 1);
    }

    #[test]
    fn test_plugin_lines_appended() {
        let root = tempdir().unwrap();
        let mut config = config_at(root.path());
        config.skip_plugins.clear();
        std::fs::create_dir_all(config.layout.reports_dir()).unwrap();
        let store = JsonHistoryStore::new(config.layout.history_path());

        let outcome = generate_report(&config, &store, &builtin_plugins(), &[]).unwrap();
        let idx = outcome.summary.iter().position(|l| l == "Plugin checks:").unwrap();
        assert!(outcome.summary[idx + 1].starts_with("  sample:"));
    }

    #[test]
    fn test_corrupt_history_is_reported() {
        let root = tempdir().unwrap();
        let config = config_at(root.path());
        write_artifact(&config, "pylint.log", "ERROR a.py\n");
        std::fs::create_dir_all(config.layout.configs_dir()).unwrap();
        std::fs::write(config.layout.history_path(), "not json at all").unwrap();
        let store = JsonHistoryStore::new(config.layout.history_path());

        let outcome = generate_report(&config, &store, &[], &[]).unwrap();

        assert!(!outcome.had_history);
        assert!(outcome.diff.is_unchanged());
        let warning = outcome
            .summary
            .iter()
            .find(|l| l.starts_with("History warning:"))
            .unwrap();
        assert!(warning.ends_with("treated as first run"));
        let report = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(report.contains("History warning:"));

        // The unreadable record is replaced by this run
        assert_eq!(store.load().unwrap().metrics.pylint_error_count, 1);
    }

    struct Recorder(RefCell<Vec<u8>>);

    impl ProgressObserver for Recorder {
        fn progress(&self, percent: u8, _message: &str) {
            self.0.borrow_mut().push(percent);
        }
    }

    #[tokio::test]
    async fn test_run_audit_offline() {
        let root = tempdir().unwrap();
        let mut config = offline_config(root.path());
        config.export_format = ExportFormat::Json;
        config.report_level = ReportLevel::Detailed;
        std::fs::create_dir_all(&config.target).unwrap();

        let recorder = Recorder(RefCell::new(Vec::new()));
        let outcome = run_audit(&config, &recorder).await.unwrap();

        assert_eq!(*recorder.0.borrow(), vec![0, 20, 40, 60, 80, 90, 100]);
        assert_eq!(outcome.rating.value(), 10.0);
        assert!(outcome.report_path.ends_with("full_report.json"));
        assert!(config.layout.configs_dir().join("environment_vars.log").exists());
        assert!(config.layout.history_path().exists());
        assert!(!outcome.summary.iter().any(|l| l == "Tool warnings:"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_tool_listed_in_report() {
        let root = tempdir().unwrap();
        let config = config_at(root.path());
        std::fs::create_dir_all(&config.target).unwrap();
        let steps = vec![
            ToolStep::new("pylint", Stage::CodeAnalysis, "false")
                .stdout_to(config.layout.reports_dir().join("pylint.log")),
        ];

        let outcome = run_steps(&config, &steps, &NoProgress).await.unwrap();

        let idx = outcome.summary.iter().position(|l| l == "Tool warnings:").unwrap();
        assert!(outcome.summary[idx + 1].starts_with("  pylint failed"));
        assert_eq!(outcome.metrics.pylint_error_count, 0);
        let report = std::fs::read_to_string(&outcome.report_path).unwrap();
        assert!(report.contains("pylint failed"));
    }
}
