//! Extension checks contributing extra report lines
//!
//! Plugins are registered in a static table at build time rather than
//! discovered on disk. Each receives the configuration and the reports
//! directory and returns lines to add to the summary.

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use std::path::Path;
use tracing::{info, warn};

/// Signature of a plugin entry point
pub type PluginFn = fn(&AuditConfig, &Path) -> Result<Vec<String>>;

/// A registered plugin
#[derive(Debug, Clone, Copy)]
pub struct Plugin {
    pub name: &'static str,
    pub run: PluginFn,
}

/// Plugins shipped with the tool, in run order
pub fn builtin_plugins() -> Vec<Plugin> {
    vec![Plugin {
        name: "sample",
        run: sample_plugin,
    }]
}

/// Run `plugins`, collecting their lines; failures are logged and skipped
pub fn run_plugins(plugins: &[Plugin], config: &AuditConfig, reports_dir: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    for plugin in plugins {
        if config.skip_plugins.contains(plugin.name) {
            continue;
        }
        info!("Running plugin {}", plugin.name);
        match (plugin.run)(config, reports_dir) {
            Ok(found) => lines.extend(found),
            Err(e) => warn!("{}", e),
        }
    }

    lines
}

fn sample_plugin(_config: &AuditConfig, reports_dir: &Path) -> Result<Vec<String>> {
    let path = reports_dir.join("sample_plugin_report.txt");
    std::fs::write(
        &path,
        "Sample plugin report:\nAdditional checks passed.\n",
    )
    .map_err(|e| AuditError::plugin("sample", e.to_string()))?;

    Ok(vec![format!(
        "sample: additional checks passed (see {})",
        path.display()
    )])
}
