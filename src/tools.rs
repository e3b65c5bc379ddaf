//! External tool invocation
//!
//! Tools run one at a time. Their exit status never decides the outcome of
//! an audit: a missing binary, a spawn failure, a non-zero exit or a timeout
//! is logged and the pipeline moves on to whatever artifacts exist.

use crate::config::AuditConfig;
use crate::error::Result;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Commands whose absence is worth a warning before the run starts
pub const EXTERNAL_COMMANDS: [&str; 8] = [
    "radon", "pylint", "bandit", "safety", "gitleaks", "coverage", "sqlfluff", "docker",
];

/// Pipeline stage a tool belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CodeAnalysis,
    Security,
    Tests,
    Infrastructure,
}

impl Stage {
    pub const ALL: [Stage; 4] = [
        Stage::CodeAnalysis,
        Stage::Security,
        Stage::Tests,
        Stage::Infrastructure,
    ];
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CodeAnalysis => write!(f, "static code analysis"),
            Self::Security => write!(f, "security checks"),
            Self::Tests => write!(f, "test coverage"),
            Self::Infrastructure => write!(f, "infrastructure checks"),
        }
    }
}

/// One external command and where its output goes
#[derive(Debug, Clone)]
pub struct ToolStep {
    pub name: &'static str,
    pub stage: Stage,
    pub program: String,
    pub args: Vec<String>,
    /// File that receives stdout; discarded when `None`
    pub stdout_to: Option<PathBuf>,
    /// Extra command that must be on PATH for the step to run
    pub requires: Option<&'static str>,
}

impl ToolStep {
    pub(crate) fn new(name: &'static str, stage: Stage, program: &str) -> Self {
        Self {
            name,
            stage,
            program: program.to_string(),
            args: Vec::new(),
            stdout_to: None,
            requires: None,
        }
    }

    pub(crate) fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub(crate) fn stdout_to(mut self, path: PathBuf) -> Self {
        self.stdout_to = Some(path);
        self
    }

    fn requires(mut self, command: &'static str) -> Self {
        self.requires = Some(command);
        self
    }
}

/// What happened to a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed(String),
    /// Could not run, e.g. the binary is not installed
    Skipped(String),
    /// Turned off through `skip_tools`
    Disabled,
}

/// Summary lines for steps that failed or could not run
pub fn outcome_warnings(outcomes: &[(&str, StepOutcome)]) -> Vec<String> {
    outcomes
        .iter()
        .filter_map(|(name, outcome)| match outcome {
            StepOutcome::Failed(reason) => Some(format!(
                "{} failed ({}); its metrics may be incomplete",
                name, reason
            )),
            StepOutcome::Skipped(reason) => Some(format!("{} skipped: {}", name, reason)),
            StepOutcome::Succeeded | StepOutcome::Disabled => None,
        })
        .collect()
}

/// The conventional tool table, in execution order
pub fn default_steps(config: &AuditConfig) -> Vec<ToolStep> {
    let target = config.target.display().to_string();
    let reports = config.layout.reports_dir();
    let configs = config.layout.configs_dir();
    let excluded = config.exclude.join(",");

    let mut radon = ToolStep::new("radon", Stage::CodeAnalysis, "radon")
        .arg("cc")
        .arg("-s")
        .arg("-n")
        .arg("C");
    let mut pylint = ToolStep::new("pylint", Stage::CodeAnalysis, "pylint");
    let mut bandit = ToolStep::new("bandit", Stage::Security, "bandit")
        .arg("-r")
        .arg(&target)
        .arg("-f")
        .arg("json")
        .arg("-o")
        .arg(reports.join(&config.artifacts.security_json).display().to_string());
    if !config.exclude.is_empty() {
        radon = radon.arg("-e").arg(&excluded);
        pylint = pylint.arg(format!("--ignore={}", excluded));
        bandit = bandit.arg("-x").arg(&excluded);
    }
    let radon = radon
        .arg(&target)
        .stdout_to(reports.join(&config.artifacts.complexity_log));
    let pylint = pylint
        .arg(&target)
        .stdout_to(reports.join(&config.artifacts.lint_log));

    vec![
        radon,
        pylint,
        bandit,
        ToolStep::new("safety", Stage::Security, "safety")
            .arg("check")
            .arg("--json")
            .stdout_to(reports.join("vulnerabilities.json")),
        ToolStep::new("gitleaks", Stage::Security, "gitleaks")
            .arg("detect")
            .arg("--no-banner")
            .arg("--source")
            .arg(&target)
            .arg("--report-path")
            .arg(reports.join("gitleaks.json").display().to_string()),
        ToolStep::new("coverage-run", Stage::Tests, "coverage")
            .arg("run")
            .arg("-m")
            .arg("pytest")
            .arg(&target)
            .stdout_to(reports.join("tests_results.log")),
        ToolStep::new("coverage-html", Stage::Tests, "coverage")
            .arg("html")
            .arg("-d")
            .arg(reports.join("coverage_report").display().to_string()),
        ToolStep::new("pip-freeze", Stage::Infrastructure, "pip")
            .arg("freeze")
            .stdout_to(configs.join("requirements_snapshot.txt")),
        ToolStep::new("docker-compose", Stage::Infrastructure, "docker-compose")
            .arg("config")
            .stdout_to(configs.join("docker_compose_validated.log"))
            .requires("docker"),
        ToolStep::new("sqlfluff", Stage::Infrastructure, "sqlfluff")
            .arg("lint")
            .arg(config.target.join("db").display().to_string())
            .stdout_to(reports.join("sql_analysis.json")),
    ]
}

/// Whether a command can be found on PATH
pub fn command_exists(command: &str) -> bool {
    which::which(command).is_ok()
}

/// Commands from `commands` that are not on PATH
pub fn missing_commands(commands: &[&str]) -> Vec<String> {
    commands
        .iter()
        .filter(|cmd| !command_exists(cmd))
        .map(|cmd| cmd.to_string())
        .collect()
}

/// Run a single step to completion
pub async fn run_step(step: &ToolStep, timeout: Option<Duration>) -> StepOutcome {
    if let Some(required) = step.requires {
        if !command_exists(required) {
            return StepOutcome::Skipped(format!("'{}' is not installed", required));
        }
    }
    let program = match which::which(&step.program) {
        Ok(path) => path,
        Err(_) => return StepOutcome::Skipped(format!("'{}' is not installed", step.program)),
    };

    let stdout = match &step.stdout_to {
        Some(path) => match File::create(path) {
            Ok(file) => Stdio::from(file),
            Err(e) => {
                return StepOutcome::Failed(format!(
                    "cannot create {}: {}",
                    path.display(),
                    e
                ))
            }
        },
        None => Stdio::null(),
    };

    debug!("Running {} {}", step.program, step.args.join(" "));
    let mut child = match Command::new(&program)
        .args(&step.args)
        .stdin(Stdio::null())
        .stdout(stdout)
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => return StepOutcome::Failed(format!("failed to start: {}", e)),
    };

    let status = match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(status) => status,
            Err(_) => {
                let _ = child.kill().await;
                return StepOutcome::Failed(format!("timed out after {}s", limit.as_secs()));
            }
        },
        None => child.wait().await,
    };

    match status {
        Ok(status) if status.success() => StepOutcome::Succeeded,
        Ok(status) => StepOutcome::Failed(format!("exited with {}", status)),
        Err(e) => StepOutcome::Failed(e.to_string()),
    }
}

/// Run every enabled step of `stage`, in order
pub async fn run_stage(
    steps: &[ToolStep],
    stage: Stage,
    config: &AuditConfig,
) -> Vec<(&'static str, StepOutcome)> {
    info!("Running {}", stage);
    let mut outcomes = Vec::new();

    for step in steps.iter().filter(|s| s.stage == stage) {
        let outcome = if config.skip_tools.contains(step.name) {
            StepOutcome::Disabled
        } else {
            run_step(step, config.tool_timeout()).await
        };

        match &outcome {
            StepOutcome::Succeeded => info!("{} finished", step.name),
            StepOutcome::Failed(reason) => {
                warn!("{} {}; continuing with available artifacts", step.name, reason)
            }
            StepOutcome::Skipped(reason) => debug!("{} skipped: {}", step.name, reason),
            StepOutcome::Disabled => debug!("{} disabled in configuration", step.name),
        }
        outcomes.push((step.name, outcome));
    }

    outcomes
}

/// Write the current environment variables, sorted, one `KEY=value` per line
pub fn snapshot_environment(configs_dir: &Path) -> Result<PathBuf> {
    let mut vars: Vec<(String, String)> = std::env::vars_os()
        .map(|(k, v)| (k.to_string_lossy().into_owned(), v.to_string_lossy().into_owned()))
        .collect();
    vars.sort();

    let mut content = String::new();
    for (key, value) in vars {
        content.push_str(&key);
        content.push('=');
        content.push_str(&value);
        content.push('\n');
    }

    let path = configs_dir.join("environment_vars.log");
    std::fs::write(&path, content)?;
    Ok(path)
}
