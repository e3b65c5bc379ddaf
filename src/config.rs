//! Configuration for audit runs and the results directory layout

use crate::error::{AuditError, Result};
use crate::types::{ExportFormat, ReportLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

/// Main configuration for an audit run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Directory or module to audit
    pub target: PathBuf,
    /// Files or directories the external tools should skip
    pub exclude: Vec<String>,
    /// Report detail level
    pub report_level: ReportLevel,
    /// Report encoding
    pub export_format: ExportFormat,
    /// Echo intermediate progress
    pub verbose: bool,
    /// Where artifacts, reports and history are kept
    pub layout: ResultsLayout,
    /// File names of the artifacts the metrics are extracted from
    pub artifacts: ArtifactNames,
    /// Tool steps to skip, by name
    pub skip_tools: HashSet<String>,
    /// Plugins to skip, by name
    pub skip_plugins: HashSet<String>,
    /// Per-tool timeout in seconds (none = wait indefinitely)
    pub tool_timeout_secs: Option<u64>,
}

/// Results directory layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsLayout {
    /// Root of all audit output
    pub root: PathBuf,
    /// Subdirectory for tool artifacts and the final report
    pub reports: String,
    /// Subdirectory for environment snapshots and history
    pub configs: String,
    /// History file name inside the configs directory
    pub history_file: String,
}

/// Names of the artifacts consumed by the metrics extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactNames {
    /// Line-oriented lint output
    pub lint_log: String,
    /// Security scanner JSON report
    pub security_json: String,
    /// Complexity analysis output
    pub complexity_log: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            target: PathBuf::from("."),
            exclude: Vec::new(),
            report_level: ReportLevel::default(),
            export_format: ExportFormat::default(),
            verbose: false,
            layout: ResultsLayout::default(),
            artifacts: ArtifactNames::default(),
            skip_tools: HashSet::new(),
            skip_plugins: HashSet::new(),
            tool_timeout_secs: None,
        }
    }
}

impl Default for ResultsLayout {
    fn default() -> Self {
        Self {
            root: PathBuf::from("audit_results"),
            reports: "reports".to_string(),
            configs: "configs".to_string(),
            history_file: "audit_history.json".to_string(),
        }
    }
}

impl Default for ArtifactNames {
    fn default() -> Self {
        Self {
            lint_log: "pylint.log".to_string(),
            security_json: "security_issues.json".to_string(),
            complexity_log: "complexity.log".to_string(),
        }
    }
}

impl ResultsLayout {
    /// Layout rooted at `root` with the conventional subdirectories
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join(&self.reports)
    }

    pub fn configs_dir(&self) -> PathBuf {
        self.root.join(&self.configs)
    }

    pub fn history_path(&self) -> PathBuf {
        self.configs_dir().join(&self.history_file)
    }
}

impl AuditConfig {
    /// Create a new builder for AuditConfig
    pub fn builder() -> AuditConfigBuilder {
        AuditConfigBuilder::default()
    }

    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AuditConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would make paths collide or escape the layout
    pub fn validate(&self) -> Result<()> {
        let names = [
            ("lint_log", &self.artifacts.lint_log),
            ("security_json", &self.artifacts.security_json),
            ("complexity_log", &self.artifacts.complexity_log),
            ("history_file", &self.layout.history_file),
        ];
        for (key, name) in names {
            if name.trim().is_empty() {
                return Err(AuditError::config(format!("{} must not be empty", key)));
            }
            let mut components = Path::new(name).components();
            let plain = matches!(
                (components.next(), components.next()),
                (Some(Component::Normal(_)), None)
            );
            if !plain {
                return Err(AuditError::config(format!(
                    "{} must be a plain file name, got '{}'",
                    key, name
                )));
            }
        }
        if self.layout.reports.trim().is_empty() || self.layout.configs.trim().is_empty() {
            return Err(AuditError::config("results subdirectories must not be empty"));
        }
        if self.tool_timeout_secs == Some(0) {
            return Err(AuditError::config("tool_timeout_secs must be positive"));
        }
        Ok(())
    }

    /// Get tool timeout as Duration
    pub fn tool_timeout(&self) -> Option<Duration> {
        self.tool_timeout_secs.map(Duration::from_secs)
    }
}

/// Builder for AuditConfig
#[derive(Default)]
pub struct AuditConfigBuilder {
    target: Option<PathBuf>,
    exclude: Vec<String>,
    report_level: Option<ReportLevel>,
    export_format: Option<ExportFormat>,
    verbose: bool,
    layout: Option<ResultsLayout>,
    artifacts: Option<ArtifactNames>,
    skip_tools: HashSet<String>,
    skip_plugins: HashSet<String>,
    tool_timeout_secs: Option<u64>,
}

impl AuditConfigBuilder {
    pub fn target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude.push(pattern.into());
        self
    }

    pub fn report_level(mut self, level: ReportLevel) -> Self {
        self.report_level = Some(level);
        self
    }

    pub fn export_format(mut self, format: ExportFormat) -> Self {
        self.export_format = Some(format);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn results_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.layout = Some(ResultsLayout::at(root));
        self
    }

    pub fn layout(mut self, layout: ResultsLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn artifacts(mut self, artifacts: ArtifactNames) -> Self {
        self.artifacts = Some(artifacts);
        self
    }

    pub fn skip_tool(mut self, name: impl Into<String>) -> Self {
        self.skip_tools.insert(name.into());
        self
    }

    pub fn skip_plugin(mut self, name: impl Into<String>) -> Self {
        self.skip_plugins.insert(name.into());
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.tool_timeout_secs = Some(secs);
        self
    }

    pub fn build(self) -> AuditConfig {
        AuditConfig {
            target: self.target.unwrap_or_else(|| PathBuf::from(".")),
            exclude: self.exclude,
            report_level: self.report_level.unwrap_or_default(),
            export_format: self.export_format.unwrap_or_default(),
            verbose: self.verbose,
            layout: self.layout.unwrap_or_default(),
            artifacts: self.artifacts.unwrap_or_default(),
            skip_tools: self.skip_tools,
            skip_plugins: self.skip_plugins,
            tool_timeout_secs: self.tool_timeout_secs,
        }
    }
}
