//! File system watcher for the configuration file

use crate::config::ConfigStore;
use crate::error::{Result, VaporError};
use notify::event::EventKind;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Change observed on the configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    /// The file appeared
    Created,
    /// The file contents changed
    Modified,
    /// The file was removed
    Deleted,
}

impl ConfigEvent {
    /// Classify a notify event for the watched file
    ///
    /// Renames and attribute changes are reported by some platforms for
    /// editors that save via a temporary file, so the final state on disk
    /// decides between `Modified` and `Deleted`.
    pub fn classify(kind: &EventKind, exists: bool) -> Option<Self> {
        match kind {
            EventKind::Access(_) => None,
            EventKind::Create(_) if exists => Some(Self::Created),
            EventKind::Remove(_) if !exists => Some(Self::Deleted),
            _ if exists => Some(Self::Modified),
            _ => Some(Self::Deleted),
        }
    }
}

/// Apply a configuration file event to the store
///
/// Created and modified files are reloaded; a deleted file resets the
/// connection settings.
pub fn apply_event(store: &ConfigStore, event: ConfigEvent) {
    debug!(?event, path = ?store.path(), "Config file event");
    match event {
        ConfigEvent::Created | ConfigEvent::Modified => {
            store.load();
        }
        ConfigEvent::Deleted => store.reset(),
    }
}

/// Keeps a [`ConfigStore`] in sync with its file
///
/// The parent directory is watched (non-recursively) so that deleting and
/// re-creating the file is observed. Events for other files in that
/// directory are ignored. Dropping the watcher stops it.
pub struct ConfigWatcher {
    path: PathBuf,
    watcher: Option<RecommendedWatcher>,
}

impl ConfigWatcher {
    /// Start watching the store's configuration file
    ///
    /// Must be called from within a tokio runtime; events are applied on a
    /// spawned task.
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Config` if the store has no resolved path or the
    /// path has no parent directory, and `VaporError::Watch` if the
    /// platform watcher cannot be created.
    pub fn start(store: ConfigStore) -> Result<Self> {
        let path = store
            .path()
            .map(Path::to_path_buf)
            .ok_or_else(|| VaporError::Config("No configuration file to watch".to_string()))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .ok_or_else(|| {
                VaporError::Config(format!("{} has no parent directory", path.display()))
            })?;
        let file_name: OsString = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| VaporError::Config(format!("{} has no file name", path.display())))?;

        let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ConfigEvent>();
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |result: std::result::Result<Event, notify::Error>| match result {
                Ok(event) => {
                    if !event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()))
                    {
                        return;
                    }
                    if let Some(change) = ConfigEvent::classify(&event.kind, watched.exists()) {
                        if event_tx.send(change).is_err() {
                            debug!("Config event receiver closed");
                        }
                    }
                }
                Err(e) => error!("Config watch error: {}", e),
            },
            Config::default(),
        )
        .map_err(VaporError::from)?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(VaporError::from)?;

        tokio::spawn(async move {
            while let Some(event) = event_rx.recv().await {
                apply_event(&store, event);
            }
            debug!("Config watcher task finished");
        });

        info!("Watching config file {}", path.display());
        Ok(Self {
            path,
            watcher: Some(watcher),
        })
    }

    /// The file being watched
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the watcher is still running
    pub fn is_active(&self) -> bool {
        self.watcher.is_some()
    }

    /// Stop watching; the event task ends once pending events are applied
    pub fn stop(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            if let Some(dir) = self.path.parent() {
                if let Err(e) = watcher.unwatch(dir) {
                    warn!("Failed to unwatch {}: {}", dir.display(), e);
                }
            }
            info!("Stopped watching config file {}", self.path.display());
        }
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
