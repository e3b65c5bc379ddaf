//! Error types for the audit system

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Main error type for audit operations
///
/// Only conditions that abort a run live here. Missing or malformed tool
/// artifacts and a corrupt history file are degraded to defaults instead.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to prepare results directory {}: {source}", path.display())]
    SetupError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write audit history to {}: {source}", path.display())]
    HistoryWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write report to {}: {source}", path.display())]
    ReportWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Plugin '{name}' failed: {message}")]
    PluginError { name: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl AuditError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Create a plugin error
    pub fn plugin(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PluginError {
            name: name.into(),
            message: message.into(),
        }
    }

    pub(crate) fn history_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::HistoryWriteError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn report_write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReportWriteError {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn setup(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SetupError {
            path: path.into(),
            source,
        }
    }
}
