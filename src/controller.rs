//! Session controller
//!
//! Ties the session index, the history store, the configuration and the
//! chat backend together for one workspace, and pushes updates to an
//! optional presentation layer.
//!
//! Sends take `&mut self`, so a controller can only have one turn in flight.
//! The history store's read-modify-write appends rely on that.

use crate::config::ConfigStore;
use crate::error::{Result, VaporError};
use crate::providers::ChatBackend;
use crate::storage::{
    ChatEntry, Session, SessionIndex, SessionStore, SessionSummary, StorageLayout,
    DEFAULT_SESSION_TITLE, NO_WORKSPACE_KEY,
};
use chrono::Utc;
use std::path::Path;
use std::sync::{Arc, Weak};

/// Presentation layer fed by the controller
///
/// The controller only holds a weak reference; once the view is dropped
/// updates are silently discarded.
pub trait ChatView: Send + Sync {
    /// A reply was recorded for the active session
    fn reply(&self, entry: &ChatEntry);

    /// The full history of the active session, after it changed wholesale
    fn restore_history(&self, history: &[ChatEntry]);

    /// The session list, newest first
    fn show_sessions(&self, sessions: &[SessionSummary]);

    /// A different session became active
    fn session_changed(&self, session_id: &str);
}

/// Index key for a workspace root, or the no-workspace sentinel
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use vapor::controller::workspace_key;
///
/// assert_eq!(workspace_key(None), "no-workspace");
/// assert_eq!(workspace_key(Some(Path::new("/src/project"))), "/src/project");
/// ```
pub fn workspace_key(workspace_root: Option<&Path>) -> String {
    match workspace_root {
        Some(root) => root.to_string_lossy().into_owned(),
        None => NO_WORKSPACE_KEY.to_string(),
    }
}

/// Orchestrates chat turns and session management for one workspace
pub struct SessionController {
    index: SessionIndex,
    store: SessionStore,
    config: ConfigStore,
    backend: Box<dyn ChatBackend>,
    workspace_key: String,
    view: Option<Weak<dyn ChatView>>,
}

impl SessionController {
    /// Open the session data under `layout` for `workspace_key`
    ///
    /// The workspace gets a default session if it has none, and the
    /// current session's history file is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the sessions directory or the index cannot be
    /// written.
    pub fn open(
        layout: &StorageLayout,
        workspace_key: impl Into<String>,
        config: ConfigStore,
        backend: Box<dyn ChatBackend>,
    ) -> Result<Self> {
        layout.ensure_dirs()?;
        let workspace_key = workspace_key.into();
        let mut index = SessionIndex::load(layout.index_path());
        let store = SessionStore::new(layout.sessions_dir());

        let current = index.ensure_workspace(&workspace_key)?.current.clone();
        store.create_backing(&current)?;

        tracing::info!(
            workspace = %workspace_key,
            session = %current,
            "Session controller ready"
        );

        Ok(Self {
            index,
            store,
            config,
            backend,
            workspace_key,
            view: None,
        })
    }

    /// Attach the presentation layer
    pub fn set_view(&mut self, view: &Arc<dyn ChatView>) {
        self.view = Some(Arc::downgrade(view));
    }

    /// Detach the presentation layer
    pub fn clear_view(&mut self) {
        self.view = None;
    }

    fn view(&self) -> Option<Arc<dyn ChatView>> {
        self.view.as_ref().and_then(Weak::upgrade)
    }

    /// The workspace this controller manages
    pub fn workspace_key(&self) -> &str {
        &self.workspace_key
    }

    /// The configuration used for sends
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// Id of the active session
    pub fn current_session_id(&self) -> &str {
        self.index
            .current_session_id(&self.workspace_key)
            .unwrap_or_default()
    }

    /// The active session
    pub fn current_session(&self) -> Option<Session> {
        self.index
            .session(&self.workspace_key, self.current_session_id())
    }

    /// History of the active session
    pub fn get_history(&self) -> Vec<ChatEntry> {
        self.store.get_history(self.current_session_id())
    }

    /// Sessions of this workspace, newest first
    pub fn list_sessions(&self) -> Vec<SessionSummary> {
        let current = self.current_session_id();
        self.index
            .list_sessions(&self.workspace_key)
            .into_iter()
            .map(|session| SessionSummary {
                is_current: session.id == current,
                session,
            })
            .collect()
    }

    /// Expand a unique id prefix to a session id of this workspace
    ///
    /// # Errors
    ///
    /// Returns `VaporError::SessionNotFound` or
    /// `VaporError::AmbiguousSession`.
    pub fn resolve_session_id(&self, prefix: &str) -> Result<String> {
        self.index.resolve_id(&self.workspace_key, prefix)
    }

    /// Record one chat turn in the active session
    ///
    /// The user entry is persisted before the backend is called, and the
    /// reply (or the rendered backend error) is persisted afterwards. The
    /// history is then trimmed to the configured entry limit.
    ///
    /// # Errors
    ///
    /// Returns an error only if history or index files cannot be written;
    /// backend failures are part of the reply text.
    pub async fn send_user_message(&mut self, text: &str) -> Result<String> {
        let session_id = self.current_session_id().to_string();
        self.store.append(&session_id, ChatEntry::user(text))?;
        self.index.touch(&self.workspace_key, &session_id)?;

        let settings = self.config.settings();
        let reply = self.backend.send(text, &settings).await;

        let entry = ChatEntry::bot(reply.clone());
        self.store.append(&session_id, entry.clone())?;
        self.index.touch(&self.workspace_key, &session_id)?;
        self.store
            .truncate_front(&session_id, settings.limits.max_entries)?;

        if let Some(view) = self.view() {
            view.reply(&entry);
        }
        Ok(reply)
    }

    /// Create a session, make it active, and show its (empty) history
    ///
    /// # Errors
    ///
    /// Returns an error if the index or history file cannot be written.
    pub fn new_session(&mut self, title: Option<&str>) -> Result<Session> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SESSION_TITLE);
        let session = self.index.create_session(&self.workspace_key, title)?;
        self.store.create_backing(&session.id)?;
        self.refresh_view();
        Ok(session)
    }

    /// Make `id` the active session
    ///
    /// # Errors
    ///
    /// Returns `VaporError::SessionNotFound` for an unknown id; the active
    /// session is unchanged.
    pub fn switch_session(&mut self, id: &str) -> Result<()> {
        self.index.switch_session(&self.workspace_key, id)?;
        self.store.create_backing(id)?;
        self.refresh_view();
        Ok(())
    }

    /// Retitle a session; unknown ids are ignored and yield `false`
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be written.
    pub fn rename_session(&mut self, id: &str, title: &str) -> Result<bool> {
        let renamed = self.index.rename_session(&self.workspace_key, id, title)?;
        if renamed {
            self.push_sessions();
        }
        Ok(renamed)
    }

    /// Delete a session and its history
    ///
    /// Deleting the only session first creates a fresh default one.
    /// Deleting the active session activates the most recently updated
    /// remaining one.
    ///
    /// # Errors
    ///
    /// Returns `VaporError::SessionNotFound` for an unknown id.
    pub fn delete_session(&mut self, id: &str) -> Result<Session> {
        let Some(set) = self.index.workspace(&self.workspace_key) else {
            return Err(self.not_found(id));
        };
        if !set.sessions.contains_key(id) {
            return Err(self.not_found(id));
        }
        let was_last = set.sessions.len() == 1;
        let previous = set.current.clone();

        if was_last {
            let replacement = self
                .index
                .create_session(&self.workspace_key, DEFAULT_SESSION_TITLE)?;
            self.store.create_backing(&replacement.id)?;
        }

        let removed = self.index.delete_session(&self.workspace_key, id)?;
        if let Err(e) = self.store.delete_backing(id) {
            tracing::warn!(session = id, "Failed to delete history file: {:#}", e);
        }

        if self.current_session_id() != previous {
            self.store.create_backing(&self.current_session_id().to_string())?;
            self.refresh_view();
        } else {
            self.push_sessions();
        }
        Ok(removed)
    }

    /// Empty the active session's history
    ///
    /// # Errors
    ///
    /// Returns an error if the history or index file cannot be written.
    pub fn clear_history(&mut self) -> Result<()> {
        let session_id = self.current_session_id().to_string();
        self.store.clear(&session_id)?;
        self.index.touch(&self.workspace_key, &session_id)?;
        tracing::info!(session = %session_id, "Cleared session history");
        if let Some(view) = self.view() {
            view.restore_history(&[]);
        }
        Ok(())
    }

    /// Remove stale and surplus sessions
    ///
    /// Sessions idle longer than the retention period are removed, then
    /// the oldest sessions beyond the session cap. The active session is
    /// always kept. Returns the removed sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be written.
    pub fn prune(&mut self) -> Result<Vec<Session>> {
        let limits = self.config.settings().limits;
        let retention = chrono::Duration::from_std(limits.retention).ok();
        let now = Utc::now();
        let current = self.current_session_id().to_string();

        let mut kept = 1;
        let mut doomed = Vec::new();
        for session in self.index.list_sessions(&self.workspace_key) {
            if session.id == current {
                continue;
            }
            let expired = retention.is_some_and(|r| now - session.updated_at > r);
            if expired || kept >= limits.max_sessions {
                doomed.push(session);
            } else {
                kept += 1;
            }
        }

        for session in &doomed {
            self.index.delete_session(&self.workspace_key, &session.id)?;
            if let Err(e) = self.store.delete_backing(&session.id) {
                tracing::warn!(session = %session.id, "Failed to delete history file: {:#}", e);
            }
        }

        if !doomed.is_empty() {
            tracing::info!(
                workspace = %self.workspace_key,
                removed = doomed.len(),
                "Pruned sessions"
            );
            self.push_sessions();
        }
        Ok(doomed)
    }

    /// Push the active session, its history and the session list to the view
    pub fn refresh_view(&self) {
        if let Some(view) = self.view() {
            view.session_changed(self.current_session_id());
            view.restore_history(&self.get_history());
            view.show_sessions(&self.list_sessions());
        }
    }

    /// Push the session list to the view and return it
    pub fn show_session_list(&self) -> Vec<SessionSummary> {
        let sessions = self.list_sessions();
        if let Some(view) = self.view() {
            view.show_sessions(&sessions);
        }
        sessions
    }

    fn push_sessions(&self) {
        if let Some(view) = self.view() {
            view.show_sessions(&self.list_sessions());
        }
    }

    fn not_found(&self, id: &str) -> anyhow::Error {
        VaporError::SessionNotFound {
            workspace: self.workspace_key.clone(),
            id: id.to_string(),
        }
        .into()
    }
}
