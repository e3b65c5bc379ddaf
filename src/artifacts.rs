//! Reading tool artifacts from a results directory

use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// State of a text artifact on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextArtifact {
    Missing,
    /// Present, but nothing besides whitespace
    Empty,
    Present(String),
}

/// State of a JSON artifact on disk
#[derive(Debug, Clone, PartialEq)]
pub enum JsonArtifact {
    Missing,
    /// Present but not valid JSON
    Malformed,
    Parsed(Value),
}

/// Read a text artifact; unreadable files count as missing
pub fn read_text(dir: &Path, name: &str) -> TextArtifact {
    let path = dir.join(name);
    match std::fs::read(&path) {
        Ok(bytes) => {
            let text = String::from_utf8_lossy(&bytes).into_owned();
            if text.trim().is_empty() {
                debug!("Artifact {} is empty", path.display());
                TextArtifact::Empty
            } else {
                TextArtifact::Present(text)
            }
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("Artifact {} not found", path.display());
            TextArtifact::Missing
        }
        Err(e) => {
            warn!("Could not read artifact {}: {}", path.display(), e);
            TextArtifact::Missing
        }
    }
}

/// Read and parse a JSON artifact
pub fn read_json(dir: &Path, name: &str) -> JsonArtifact {
    let text = match read_text(dir, name) {
        TextArtifact::Missing => return JsonArtifact::Missing,
        TextArtifact::Empty => String::new(),
        TextArtifact::Present(text) => text,
    };

    match serde_json::from_str(&text) {
        Ok(value) => JsonArtifact::Parsed(value),
        Err(e) => {
            // Reported like a missing file; the log keeps the two apart.
            debug!("Artifact {} is present but malformed: {}", dir.join(name).display(), e);
            JsonArtifact::Malformed
        }
    }
}
