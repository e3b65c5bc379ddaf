//! # naudit
//!
//! A project audit orchestrator. It runs external analysis tools against a
//! code directory and turns what they leave behind into:
//! - **Metrics**: lint errors, problematic files, security errors, complexity notes
//! - **Rating**: a 1.0–10.0 quality score from a linear penalty model
//! - **History**: the previous run's metrics, diffed against the current run
//! - **Reports**: Markdown, HTML or JSON documents in the results directory
//!
//! ## Quick Start
//!
//! ```no_run
//! use naudit::{run_audit, AuditConfig, NoProgress};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = AuditConfig::builder().target("my_project").build();
//! let outcome = run_audit(&config, &NoProgress).await?;
//!
//! println!("rating {} ({})", outcome.rating, outcome.diff);
//! # Ok(())
//! # }
//! ```
//!
//! Tools are optional: whatever is missing on PATH is skipped, and the
//! corresponding metrics fall back to zero.

mod artifacts;
mod audit;
mod config;
mod diff;
mod error;
mod extract;
mod history;
mod plugins;
mod report;
mod scoring;
mod tools;
mod types;

// Re-export public API
pub use audit::{generate_report, run_audit, NoProgress, ProgressObserver};
pub use config::{ArtifactNames, AuditConfig, AuditConfigBuilder, ResultsLayout};
pub use diff::diff;
pub use error::{AuditError, Result};
pub use extract::{extract_metrics, Extraction};
pub use history::{HistoryState, HistoryStore, JsonHistoryStore};
pub use plugins::{builtin_plugins, Plugin, PluginFn};
pub use report::{render_report, write_report, ReportInput};
pub use scoring::calculate_rating;
pub use tools::{default_steps, outcome_warnings, Stage, StepOutcome, ToolStep};
pub use types::{
    AuditOutcome, ExportFormat, HistoryRecord, MetricsDiff, Rating, ReportLevel, RunMetrics,
};
