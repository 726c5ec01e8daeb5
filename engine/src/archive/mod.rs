//! Transcript archive
//!
//! Persists finished call records as one JSON file per conversation in the
//! configured transcript directory. Durability beyond the filesystem write
//! is out of scope; the archive exists so finished calls can be inspected
//! and listed after the in-memory store is gone.

use sdk::errors::DisputeError;
use sdk::types::CallRecord;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Summary line for one archived transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub filename: String,
    pub conversation_id: String,
    pub saved_at: String,
    pub duration_secs: f64,
    pub message_count: usize,
}

/// Persisted form: the call record plus the archival timestamp
#[derive(Debug, Serialize, Deserialize)]
struct ArchivedCall {
    #[serde(flatten)]
    record: CallRecord,
    saved_at: String,
}

/// JSON-file transcript archive
#[derive(Clone)]
pub struct TranscriptArchive {
    storage_dir: PathBuf,
}

impl TranscriptArchive {
    /// Open an archive rooted at `storage_dir`, creating it if needed
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self, DisputeError> {
        let storage_dir = storage_dir.into();
        fs::create_dir_all(&storage_dir)
            .map_err(|e| DisputeError::Archive(format!("failed to create {storage_dir:?}: {e}")))?;
        Ok(Self { storage_dir })
    }

    /// Save a call record under `filename` (".json" appended if missing).
    ///
    /// Returns the path of the written file.
    pub fn save(&self, record: &CallRecord, filename: &str) -> Result<PathBuf, DisputeError> {
        let filename = ensure_json_extension(filename);
        let filepath = self.storage_dir.join(&filename);

        let archived = ArchivedCall {
            record: record.clone(),
            saved_at: chrono::Utc::now().to_rfc3339(),
        };

        let json = serde_json::to_string_pretty(&archived)
            .map_err(|e| DisputeError::Archive(format!("failed to serialize transcript: {e}")))?;

        fs::write(&filepath, json)
            .map_err(|e| DisputeError::Archive(format!("failed to write {filepath:?}: {e}")))?;

        Ok(filepath)
    }

    /// Load a call record by filename (".json" appended if missing)
    pub fn load(&self, filename: &str) -> Result<CallRecord, DisputeError> {
        let filename = ensure_json_extension(filename);
        let filepath = self.storage_dir.join(&filename);

        let contents = fs::read_to_string(&filepath)
            .map_err(|e| DisputeError::Archive(format!("failed to read {filepath:?}: {e}")))?;

        let archived: ArchivedCall = serde_json::from_str(&contents)
            .map_err(|e| DisputeError::Archive(format!("failed to parse {filepath:?}: {e}")))?;

        Ok(archived.record)
    }

    /// List all archived transcripts, newest first.
    ///
    /// Unreadable files are logged and skipped rather than failing the
    /// whole listing.
    pub fn list(&self) -> Result<Vec<ArchiveEntry>, DisputeError> {
        let mut entries = Vec::new();

        let dir = fs::read_dir(&self.storage_dir).map_err(|e| {
            DisputeError::Archive(format!("failed to read {:?}: {e}", self.storage_dir))
        })?;

        for dir_entry in dir.flatten() {
            let path = dir_entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match read_entry(&path) {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!(path = ?path, error = %e, "skipping unreadable transcript"),
            }
        }

        entries.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(entries)
    }

    /// Find the archive filename for a conversation id, if one exists
    pub fn find_by_conversation_id(&self, conversation_id: &str) -> Option<String> {
        self.list()
            .ok()?
            .into_iter()
            .find(|entry| entry.conversation_id == conversation_id)
            .map(|entry| entry.filename)
    }

    /// Delete an archived transcript. Returns true if a file was removed.
    pub fn delete(&self, filename: &str) -> Result<bool, DisputeError> {
        let filename = ensure_json_extension(filename);
        let filepath = self.storage_dir.join(&filename);

        if !filepath.exists() {
            return Ok(false);
        }

        fs::remove_file(&filepath)
            .map_err(|e| DisputeError::Archive(format!("failed to delete {filepath:?}: {e}")))?;
        Ok(true)
    }
}

fn ensure_json_extension(filename: &str) -> String {
    if filename.ends_with(".json") {
        filename.to_string()
    } else {
        format!("{filename}.json")
    }
}

fn read_entry(path: &Path) -> Result<ArchiveEntry, DisputeError> {
    let contents = fs::read_to_string(path)
        .map_err(|e| DisputeError::Archive(format!("failed to read {path:?}: {e}")))?;
    let archived: ArchivedCall = serde_json::from_str(&contents)
        .map_err(|e| DisputeError::Archive(format!("failed to parse {path:?}: {e}")))?;

    let filename = path
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(ArchiveEntry {
        filename,
        conversation_id: archived.record.conversation_id.clone(),
        saved_at: archived.saved_at,
        duration_secs: archived.record.metadata.call_duration_secs,
        message_count: archived.record.transcript.len(),
    })
}
