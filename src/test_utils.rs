//! Test utilities for Vapor
//!
//! Temporary directories, config files, a scripted chat backend and a view
//! that records what it was shown.

use crate::config::{BackendKind, ConfigStore, Settings};
use crate::controller::ChatView;
use crate::providers::ChatBackend;
use crate::storage::{ChatEntry, SessionSummary};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a temporary directory for testing
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Create a test file with the given content
///
/// # Panics
///
/// Panics if the file cannot be written
pub fn create_test_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Assert that an error contains the expected message
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: crate::error::Result<T>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}' but got Ok", expected),
        Err(e) => {
            let error_msg = e.to_string();
            assert!(
                error_msg.contains(expected),
                "Error message '{}' does not contain '{}'",
                error_msg,
                expected
            );
        }
    }
}

/// A config store backed by a file in `dir`, already loaded
pub fn test_config_store(dir: &TempDir, yaml: &str) -> ConfigStore {
    let path = create_test_file(dir, "vapor-config.yaml", yaml);
    let store = ConfigStore::new(Some(path));
    assert!(store.load(), "test config should load");
    store
}

/// One call observed by [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCall {
    pub message: String,
    pub kind: BackendKind,
    pub endpoint: Option<String>,
}

/// Backend that answers `"echo: <message>"` and records every call
#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend {
    calls: Arc<Mutex<Vec<BackendCall>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn send(&self, message: &str, settings: &Settings) -> String {
        self.calls.lock().unwrap().push(BackendCall {
            message: message.to_string(),
            kind: settings.backend_kind,
            endpoint: settings.endpoint.clone(),
        });
        format!("echo: {}", message)
    }
}

/// Something a [`RecordingView`] was asked to display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    Reply(ChatEntry),
    RestoreHistory(Vec<ChatEntry>),
    ShowSessions(Vec<SessionSummary>),
    SessionChanged(String),
}

/// View that records every update pushed to it
#[derive(Debug, Default)]
pub struct RecordingView {
    events: Mutex<Vec<ViewEvent>>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Take the events recorded so far
    pub fn drain(&self) -> Vec<ViewEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl ChatView for RecordingView {
    fn reply(&self, entry: &ChatEntry) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::Reply(entry.clone()));
    }

    fn restore_history(&self, history: &[ChatEntry]) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::RestoreHistory(history.to_vec()));
    }

    fn show_sessions(&self, sessions: &[SessionSummary]) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::ShowSessions(sessions.to_vec()));
    }

    fn session_changed(&self, session_id: &str) {
        self.events
            .lock()
            .unwrap()
            .push(ViewEvent::SessionChanged(session_id.to_string()));
    }
}
