//! Session persistence for Vapor
//!
//! Chat history is split into named sessions per workspace. The on-disk
//! layout under the data root is:
//!
//! ```text
//! <data_root>/sessions/sessions.json   workspace key -> {current, sessions}
//! <data_root>/sessions/<id>.json       ordered [{sender, text}, ...]
//! ```
//!
//! Both files are rewritten whole through [`atomic_write`], so a reader
//! never observes a partially written record.

use crate::error::{Result, VaporError};
use anyhow::Context;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub mod history;
pub mod index;
pub mod types;

pub use history::SessionStore;
pub use index::{new_session_id, SessionIndex, NO_WORKSPACE_KEY};
pub use types::{
    ChatEntry, Sender, Session, SessionRecord, SessionSummary, WorkspaceSessionSet,
    DEFAULT_SESSION_TITLE,
};

/// Name of the directory holding the index and history files
pub const SESSIONS_DIR: &str = "sessions";

/// Name of the session index file
pub const INDEX_FILE: &str = "sessions.json";

const TEMP_SUFFIX: &str = ".tmp";

/// File locations derived from a data root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Layout rooted at `root` (normally `~/.vapor`)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The data root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the index and per-session files
    pub fn sessions_dir(&self) -> PathBuf {
        self.root.join(SESSIONS_DIR)
    }

    /// Path of the session index
    pub fn index_path(&self) -> PathBuf {
        self.sessions_dir().join(INDEX_FILE)
    }

    /// Create the sessions directory if needed
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Storage` if the directory cannot be created.
    pub fn ensure_dirs(&self) -> Result<()> {
        let dir = self.sessions_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create sessions directory {}", dir.display()))
            .map_err(|e| VaporError::Storage(format!("{:#}", e)))?;
        Ok(())
    }
}

/// Write `data` to `path` via a temp file and rename
///
/// The previous file stays intact if anything fails before the rename.
///
/// # Errors
///
/// Returns `VaporError::Storage` on any IO failure.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| VaporError::Storage(format!("Invalid file path: {}", path.display())))?;
    let temp_path = path.with_file_name(format!(".{}{}", file_name, TEMP_SUFFIX));

    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(data)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        fs::rename(&temp_path, path)
    };

    write().map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        VaporError::Storage(format!("Failed to write {}: {}", path.display(), e))
    })?;

    tracing::debug!(path = %path.display(), "Atomic write completed");
    Ok(())
}
