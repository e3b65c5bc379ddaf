//! Example showing custom configuration and a custom history store

use naudit::{
    builtin_plugins, generate_report, AuditConfig, ExportFormat, HistoryRecord, HistoryStore,
    ReportLevel,
};
use std::cell::RefCell;

/// Keeps history in memory instead of on disk
#[derive(Default)]
struct MemoryHistory(RefCell<Option<HistoryRecord>>);

impl HistoryStore for MemoryHistory {
    fn load(&self) -> Option<HistoryRecord> {
        self.0.borrow().clone()
    }

    fn save(&self, record: &HistoryRecord) -> naudit::Result<()> {
        *self.0.borrow_mut() = Some(record.clone());
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AuditConfig::builder()
        .target("src")
        .exclude("migrations")
        .results_root("audit_results")
        .report_level(ReportLevel::Detailed)
        .export_format(ExportFormat::Html)
        .skip_plugin("sample")
        .build();
    config.validate()?;

    // Aggregate whatever artifacts are already in audit_results/reports
    let history = MemoryHistory::default();
    let first = generate_report(&config, &history, &builtin_plugins(), &[])?;
    let second = generate_report(&config, &history, &builtin_plugins(), &[])?;

    println!("=== Custom Audit Results ===");
    println!("Rating: {}", first.rating);
    println!("Lint errors: {}", first.metrics.pylint_error_count);
    println!("Security errors: {}", first.metrics.security_error_count);
    println!("Second run unchanged: {}", second.diff.is_unchanged());
    println!("Report: {}", second.report_path.display());

    Ok(())
}
