//! Cross-run history of audit results
//!
//! History is single-slot: the store keeps the most recent record only.
//! `load` returns the most recent record and `save` replaces it, so a store
//! that appends timestamped records can implement the same trait.

use crate::error::{AuditError, Result};
use crate::types::HistoryRecord;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What a store found when asked for the previous run
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryState {
    Found(HistoryRecord),
    /// Nothing stored yet
    Absent,
    /// Something is stored but cannot be used; the reason is for display only
    Corrupt(String),
}

impl HistoryState {
    pub fn into_record(self) -> Option<HistoryRecord> {
        match self {
            Self::Found(record) => Some(record),
            Self::Absent | Self::Corrupt(_) => None,
        }
    }
}

/// Durable storage for the previous run
pub trait HistoryStore {
    /// Most recent record, or `None` if there is no usable one
    fn load(&self) -> Option<HistoryRecord>;

    /// Like `load`, but tells an empty store from an unusable one
    fn inspect(&self) -> HistoryState {
        match self.load() {
            Some(record) => HistoryState::Found(record),
            None => HistoryState::Absent,
        }
    }

    /// Replace the stored record with `record`
    fn save(&self, record: &HistoryRecord) -> Result<()>;
}

/// On-disk envelope
#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    last_audit: HistoryRecord,
}

/// History kept as a single JSON document
#[derive(Debug, Clone)]
pub struct JsonHistoryStore {
    path: PathBuf,
}

impl JsonHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_atomic(&self, record: &HistoryRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Write to temp file first, then rename (atomic on POSIX)
        let tmp_path = self.path.with_extension("json.tmp");
        let envelope = HistoryFile {
            last_audit: record.clone(),
        };

        let result = (|| {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, &envelope)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();

        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result
    }
}

impl HistoryStore for JsonHistoryStore {
    fn load(&self) -> Option<HistoryRecord> {
        self.inspect().into_record()
    }

    fn inspect(&self) -> HistoryState {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No audit history at {}", self.path.display());
                return HistoryState::Absent;
            }
            Err(e) => {
                warn!("Could not read audit history {}: {}", self.path.display(), e);
                return HistoryState::Corrupt(e.to_string());
            }
        };

        match serde_json::from_str::<HistoryFile>(&content) {
            Ok(file) => HistoryState::Found(file.last_audit),
            Err(e) => {
                warn!(
                    "Ignoring corrupt audit history {}: {}",
                    self.path.display(),
                    e
                );
                HistoryState::Corrupt(e.to_string())
            }
        }
    }

    fn save(&self, record: &HistoryRecord) -> Result<()> {
        self.write_atomic(record)
            .map_err(|e| AuditError::history_write(&self.path, e))?;
        debug!("Saved audit history to {}", self.path.display());
        Ok(())
    }
}
