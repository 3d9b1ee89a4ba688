//! Per-workspace session index
//!
//! One JSON file maps each workspace key to its session set. The whole
//! mapping is loaded once and rewritten after every mutation; this process
//! is assumed to be the only writer.

use super::atomic_write;
use super::types::{Session, SessionRecord, WorkspaceSessionSet, DEFAULT_SESSION_TITLE};
use crate::error::{Result, VaporError};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Workspace key used when no workspace folder is open
pub const NO_WORKSPACE_KEY: &str = "no-workspace";

/// Mint a session id: 32 hex characters
///
/// Drawn from a general-purpose random source. Good enough to keep a
/// person's sessions apart, not meant to be unguessable.
///
/// # Examples
///
/// ```
/// let id = vapor::storage::new_session_id();
/// assert_eq!(id.len(), 32);
/// assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
/// ```
pub fn new_session_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

/// Index entries as found on disk; older files stored a bare session id
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredEntry {
    Set(WorkspaceSessionSet),
    Legacy(String),
}

impl From<StoredEntry> for WorkspaceSessionSet {
    fn from(entry: StoredEntry) -> Self {
        match entry {
            StoredEntry::Set(set) => set,
            StoredEntry::Legacy(id) => {
                WorkspaceSessionSet::with_session(id, SessionRecord::new(DEFAULT_SESSION_TITLE))
            }
        }
    }
}

#[derive(Serialize)]
#[serde(transparent)]
struct IndexFile<'a>(&'a BTreeMap<String, WorkspaceSessionSet>);

/// Directory of session identities, keyed by workspace
#[derive(Debug)]
pub struct SessionIndex {
    path: PathBuf,
    workspaces: BTreeMap<String, WorkspaceSessionSet>,
}

impl SessionIndex {
    /// Load the index at `path`
    ///
    /// A missing or unparsable file yields an empty index; the problem is
    /// logged and the file is replaced on the next save.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let workspaces = Self::read(&path);
        Self { path, workspaces }
    }

    fn read(path: &Path) -> BTreeMap<String, WorkspaceSessionSet> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No session index at {}, starting empty", path.display());
                return BTreeMap::new();
            }
            Err(e) => {
                tracing::warn!("Failed to read session index {}: {}", path.display(), e);
                return BTreeMap::new();
            }
        };

        let raw = match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&contents) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Session index {} is corrupt: {}", path.display(), e);
                return BTreeMap::new();
            }
        };

        // Each workspace is decoded on its own so one bad entry only loses itself
        raw.into_iter()
            .filter_map(|(key, value)| match serde_json::from_value::<StoredEntry>(value) {
                Ok(entry) => Some((key, entry.into())),
                Err(e) => {
                    tracing::warn!(
                        workspace = %key,
                        "Skipping unreadable entry in session index {}: {}",
                        path.display(),
                        e
                    );
                    None
                }
            })
            .collect()
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the full mapping
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Storage` if the file cannot be written; the
    /// previous file is left untouched in that case.
    pub fn save(&self) -> Result<()> {
        let data = serde_json::to_vec_pretty(&IndexFile(&self.workspaces))?;
        atomic_write(&self.path, &data)?;
        tracing::debug!(
            path = %self.path.display(),
            workspaces = self.workspaces.len(),
            "Saved session index"
        );
        Ok(())
    }

    /// The session set for `key`, if initialised
    pub fn workspace(&self, key: &str) -> Option<&WorkspaceSessionSet> {
        self.workspaces.get(key)
    }

    /// All workspace keys
    pub fn workspace_keys(&self) -> impl Iterator<Item = &str> {
        self.workspaces.keys().map(String::as_str)
    }

    /// Return the session set for `key`, creating it if needed
    ///
    /// A new set holds one session titled [`DEFAULT_SESSION_TITLE`]. A set
    /// whose `current` pointer is dangling (e.g. after a hand edit) is
    /// repaired. Changes are persisted before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be saved.
    pub fn ensure_workspace(&mut self, key: &str) -> Result<&WorkspaceSessionSet> {
        let mut changed = false;

        match self.workspaces.get_mut(key) {
            None => {
                let id = new_session_id();
                tracing::info!(workspace = key, session = %id, "Created workspace session set");
                self.workspaces.insert(
                    key.to_string(),
                    WorkspaceSessionSet::with_session(id, SessionRecord::new(DEFAULT_SESSION_TITLE)),
                );
                changed = true;
            }
            Some(set) if set.sessions.is_empty() => {
                let id = new_session_id();
                set.sessions
                    .insert(id.clone(), SessionRecord::new(DEFAULT_SESSION_TITLE));
                set.current = id;
                changed = true;
            }
            Some(set) if !set.sessions.contains_key(&set.current) => {
                if let Some(id) = set.most_recent().map(str::to_string) {
                    tracing::warn!(workspace = key, "Current session missing, selecting {}", id);
                    set.current = id;
                    changed = true;
                }
            }
            Some(_) => {}
        }

        if changed {
            self.save()?;
        }
        self.workspace(key)
            .ok_or_else(|| VaporError::Storage(format!("Workspace {} vanished", key)).into())
    }

    fn workspace_mut(&mut self, key: &str) -> Result<&mut WorkspaceSessionSet> {
        self.workspaces.get_mut(key).ok_or_else(|| {
            VaporError::Storage(format!("Workspace {} is not initialised", key)).into()
        })
    }

    /// Mint a new session, make it current, and persist
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be saved.
    pub fn create_session(&mut self, key: &str, title: &str) -> Result<Session> {
        self.ensure_workspace(key)?;
        let set = self.workspace_mut(key)?;

        let mut id = new_session_id();
        while set.sessions.contains_key(&id) {
            id = new_session_id();
        }
        let record = SessionRecord::new(title);
        let session = Session::from_record(&id, &record);
        set.sessions.insert(id.clone(), record);
        set.current = id;

        self.save()?;
        tracing::info!(workspace = key, session = %session.id, title, "Created session");
        Ok(session)
    }

    /// Make `id` the current session and persist
    ///
    /// # Errors
    ///
    /// Returns `VaporError::SessionNotFound` if `id` is not in the
    /// workspace; the current session is unchanged.
    pub fn switch_session(&mut self, key: &str, id: &str) -> Result<()> {
        let set = self.workspace_mut(key)?;
        if !set.sessions.contains_key(id) {
            return Err(VaporError::SessionNotFound {
                workspace: key.to_string(),
                id: id.to_string(),
            }
            .into());
        }
        set.current = id.to_string();
        self.save()?;
        tracing::info!(workspace = key, session = id, "Switched session");
        Ok(())
    }

    /// Retitle a session and persist
    ///
    /// Returns `false` without touching anything when `id` is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be saved.
    pub fn rename_session(&mut self, key: &str, id: &str, title: &str) -> Result<bool> {
        let Some(record) = self
            .workspaces
            .get_mut(key)
            .and_then(|set| set.sessions.get_mut(id))
        else {
            tracing::debug!(workspace = key, session = id, "Rename of unknown session ignored");
            return Ok(false);
        };
        record.title = title.to_string();
        self.save()?;
        tracing::info!(workspace = key, session = id, title, "Renamed session");
        Ok(true)
    }

    /// Remove a session and persist
    ///
    /// If it was current, the most recently updated remaining session
    /// becomes current. Callers wanting to delete the only session must
    /// create a replacement first.
    ///
    /// # Errors
    ///
    /// Returns `VaporError::SessionNotFound` if `id` is unknown and
    /// `VaporError::Storage` if it is the workspace's last session.
    pub fn delete_session(&mut self, key: &str, id: &str) -> Result<Session> {
        let set = self.workspace_mut(key)?;
        let Some(record) = set.sessions.get(id) else {
            return Err(VaporError::SessionNotFound {
                workspace: key.to_string(),
                id: id.to_string(),
            }
            .into());
        };
        if set.sessions.len() == 1 {
            return Err(VaporError::Storage(format!(
                "Refusing to delete {}: it is the last session of {}",
                id, key
            ))
            .into());
        }

        let removed = Session::from_record(id, record);
        set.sessions.remove(id);
        if set.current == id {
            if let Some(next) = set.most_recent().map(str::to_string) {
                set.current = next;
            }
        }

        self.save()?;
        tracing::info!(workspace = key, session = id, "Deleted session");
        Ok(removed)
    }

    /// Bump a session's `updated_at` and persist
    ///
    /// Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be saved.
    pub fn touch(&mut self, key: &str, id: &str) -> Result<()> {
        if let Some(record) = self
            .workspaces
            .get_mut(key)
            .and_then(|set| set.sessions.get_mut(id))
        {
            record.updated_at = Utc::now();
            self.save()?;
        }
        Ok(())
    }

    /// The current session id for `key`
    pub fn current_session_id(&self, key: &str) -> Option<&str> {
        self.workspace(key).map(WorkspaceSessionSet::current_session_id)
    }

    /// Look up one session
    pub fn session(&self, key: &str, id: &str) -> Option<Session> {
        self.workspace(key)
            .and_then(|set| set.sessions.get(id))
            .map(|record| Session::from_record(id, record))
    }

    /// Sessions of `key`, newest first
    pub fn list_sessions(&self, key: &str) -> Vec<Session> {
        self.workspace(key)
            .map(WorkspaceSessionSet::sorted)
            .unwrap_or_default()
    }

    /// Expand an id prefix to a full session id
    ///
    /// # Errors
    ///
    /// Returns `VaporError::SessionNotFound` when nothing matches and
    /// `VaporError::AmbiguousSession` when more than one session does.
    pub fn resolve_id(&self, key: &str, prefix: &str) -> Result<String> {
        let not_found = || VaporError::SessionNotFound {
            workspace: key.to_string(),
            id: prefix.to_string(),
        };
        let set = self.workspace(key).ok_or_else(not_found)?;
        if set.sessions.contains_key(prefix) {
            return Ok(prefix.to_string());
        }
        if prefix.is_empty() {
            return Err(not_found().into());
        }

        let mut matches = set.sessions.keys().filter(|id| id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(id), None) => Ok(id.clone()),
            (Some(_), Some(_)) => Err(VaporError::AmbiguousSession(prefix.to_string()).into()),
            (None, _) => Err(not_found().into()),
        }
    }
}
