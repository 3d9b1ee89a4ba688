//! Per-session chat history files
//!
//! Each session's transcript is a JSON array stored at
//! `<sessions_dir>/<id>.json`. Appends are read-modify-write of the whole
//! array. That is only safe while a single turn is in flight per process,
//! which the controller guarantees by taking `&mut self` for sends.

use super::atomic_write;
use super::types::ChatEntry;
use crate::error::Result;
use std::path::{Path, PathBuf};

/// Reads and writes session transcripts
#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    /// Store rooted at the sessions directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the history files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `session_id`
    ///
    /// Ids made of `[A-Za-z0-9-]` map to `<id>.json` unchanged. Any other
    /// byte, `_` included, is written as `_XX` so distinct ids never share a
    /// file and no id can escape the sessions directory.
    pub fn path_for(&self, session_id: &str) -> PathBuf {
        let mut safe = String::with_capacity(session_id.len());
        for byte in session_id.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                safe.push(char::from(byte));
            } else {
                safe.push_str(&format!("_{:02X}", byte));
            }
        }
        self.dir.join(format!("{}.json", safe))
    }

    /// Whether a history file exists for `session_id`
    pub fn exists(&self, session_id: &str) -> bool {
        self.path_for(session_id).exists()
    }

    /// The transcript of `session_id`
    ///
    /// Missing or corrupt files read as an empty history.
    pub fn get_history(&self, session_id: &str) -> Vec<ChatEntry> {
        let path = self.path_for(session_id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to read history {}: {}", path.display(), e);
                }
                return Vec::new();
            }
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("History {} is corrupt, treating as empty: {}", path.display(), e);
            Vec::new()
        })
    }

    fn write(&self, session_id: &str, entries: &[ChatEntry]) -> Result<()> {
        let data = serde_json::to_vec_pretty(entries)?;
        atomic_write(&self.path_for(session_id), &data)
    }

    /// Append one entry
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Storage` if the file cannot be written.
    pub fn append(&self, session_id: &str, entry: ChatEntry) -> Result<()> {
        let mut history = self.get_history(session_id);
        history.push(entry);
        self.write(session_id, &history)?;
        tracing::debug!(session = session_id, entries = history.len(), "Appended entry");
        Ok(())
    }

    /// Replace the transcript with an empty one
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Storage` if the file cannot be written.
    pub fn clear(&self, session_id: &str) -> Result<()> {
        self.write(session_id, &[])?;
        tracing::debug!(session = session_id, "Cleared history");
        Ok(())
    }

    /// Create an empty transcript if none exists yet
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Storage` if the file cannot be written.
    pub fn create_backing(&self, session_id: &str) -> Result<()> {
        if self.exists(session_id) {
            return Ok(());
        }
        self.write(session_id, &[])
    }

    /// Remove the transcript file; a missing file is not an error
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file exists but cannot be removed.
    pub fn delete_backing(&self, session_id: &str) -> Result<()> {
        match std::fs::remove_file(self.path_for(session_id)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Drop the oldest entries so at most `max_entries` remain
    ///
    /// Returns the number of entries removed.
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Storage` if the file cannot be written.
    pub fn truncate_front(&self, session_id: &str, max_entries: usize) -> Result<usize> {
        let history = self.get_history(session_id);
        if history.len() <= max_entries {
            return Ok(0);
        }
        let removed = history.len() - max_entries;
        self.write(session_id, &history[removed..])?;
        tracing::debug!(session = session_id, removed, "Trimmed history");
        Ok(removed)
    }
}
