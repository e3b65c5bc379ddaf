//! CLI tool for auditing a project with external analysis tools

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use naudit::{
    builtin_plugins, generate_report, run_audit, AuditConfig, AuditOutcome, ExportFormat,
    HistoryStore, JsonHistoryStore, MetricsDiff, ProgressObserver, Rating, ReportLevel,
    ResultsLayout,
};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "naudit")]
#[command(about = "Audit a project with external analysis tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Module or directory to audit
    #[arg(short = 'm', long = "module", global = true)]
    module: Option<PathBuf>,

    /// Files or directories the tools should skip (can be specified multiple times)
    #[arg(long, global = true)]
    exclude: Vec<String>,

    /// Report level: brief, full or detailed
    #[arg(long, global = true)]
    report_level: Option<ReportLevel>,

    /// Report format: markdown, html or json
    #[arg(short = 'f', long, global = true)]
    export_format: Option<ExportFormat>,

    /// Directory for artifacts, reports and history
    #[arg(long, global = true)]
    results_dir: Option<PathBuf>,

    /// Tool steps to skip (can be specified multiple times)
    #[arg(long = "skip-tool", global = true)]
    skip_tools: Vec<String>,

    /// Path to custom configuration file (TOML)
    #[arg(short = 'c', long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all tools, then rate and report (default)
    Run,

    /// Build the report from artifacts already in the results directory
    Report,

    /// Show the rating stored from the last audit
    History {
        /// Print the raw JSON record
        #[arg(long)]
        json: bool,
    },
}

/// Progress bar standing in for the audit animation
struct BarProgress(ProgressBar);

impl BarProgress {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("=^.^= [{bar:40.green/white}] {pos:>3}% {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        Self(bar)
    }
}

impl ProgressObserver for BarProgress {
    fn progress(&self, percent: u8, message: &str) {
        self.0.set_position(percent as u64);
        self.0.set_message(message.to_string());
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    let config = match build_config(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{} Failed to load config: {:#}", "Error:".red().bold(), e);
            process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let progress = BarProgress::new();
            let result = run_audit(&config, &progress).await;
            progress.0.finish_and_clear();
            finish(result, &config);
        }

        Commands::Report => {
            let store = JsonHistoryStore::new(config.layout.history_path());
            let result = generate_report(&config, &store, &builtin_plugins(), &[]);
            finish(result, &config);
        }

        Commands::History { json } => {
            let store = JsonHistoryStore::new(config.layout.history_path());
            match store.load() {
                Some(record) if json => match serde_json::to_string_pretty(&record) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("{} Failed to serialize history: {}", "Error:".red().bold(), e);
                        process::exit(1);
                    }
                },
                Some(record) => {
                    println!("\n{}", "=== Last Audit ===".bold());
                    if let Some(at) = record.recorded_at {
                        println!("Recorded: {}", at);
                    }
                    println!("Rating: {}", colored_rating(record.rating));
                    println!("Lint errors: {}", record.metrics.pylint_error_count);
                    println!("Security errors: {}", record.metrics.security_error_count);
                    println!("Problematic files: {}", record.metrics.problematic_files.len());
                }
                None => {
                    println!(
                        "No audit history at {}",
                        config.layout.history_path().display()
                    );
                }
            }
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// File configuration first, command-line flags on top
fn build_config(cli: &Cli) -> anyhow::Result<AuditConfig> {
    let mut config = match &cli.config {
        Some(path) => AuditConfig::from_toml_file(path)
            .with_context(|| format!("reading {}", path.display()))?,
        None => AuditConfig::default(),
    };

    if let Some(module) = &cli.module {
        config.target = module.clone();
    }
    config.exclude.extend(cli.exclude.iter().cloned());
    if let Some(level) = cli.report_level {
        config.report_level = level;
    }
    if let Some(format) = cli.export_format {
        config.export_format = format;
    }
    if let Some(dir) = &cli.results_dir {
        config.layout = ResultsLayout {
            root: dir.clone(),
            ..config.layout
        };
    }
    config.skip_tools.extend(cli.skip_tools.iter().cloned());
    config.verbose |= cli.verbose;

    config.validate()?;
    Ok(config)
}

fn finish(result: naudit::Result<AuditOutcome>, config: &AuditConfig) {
    match result {
        Ok(outcome) => {
            display_summary(&outcome);
            if config.verbose {
                info!("{} report: {}", config.export_format, outcome.report_path.display());
            }
            println!(
                "\nReport saved to: {}",
                outcome.report_path.display().to_string().cyan()
            );
        }
        Err(e) => {
            eprintln!("{} Audit failed: {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

fn display_summary(outcome: &AuditOutcome) {
    println!("\n{}", "=== Audit Summary ===".bold());
    for line in &outcome.summary {
        println!("{}", line);
    }
    println!();

    println!("Rating: {}", colored_rating(outcome.rating));
    if outcome.had_history {
        println!("Since last audit:");
        println!("  Lint errors: {}", colored_delta(outcome.diff.pylint_errors));
        println!("  Security errors: {}", colored_delta(outcome.diff.security_errors));
        if outcome.diff == MetricsDiff::default() {
            println!("  {}", "No change".dimmed());
        }
    } else {
        println!("No previous audit to compare with");
    }
}

fn colored_rating(rating: Rating) -> ColoredString {
    let text = format!("{} / 10", rating);
    if rating.value() >= 8.0 {
        text.green().bold()
    } else if rating.value() >= 5.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

// Fewer errors is an improvement
fn colored_delta(delta: i64) -> ColoredString {
    let text = format!("{:+}", delta);
    match delta.signum() {
        -1 => text.green(),
        1 => text.red(),
        _ => text.normal(),
    }
}
