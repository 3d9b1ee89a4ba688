/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint.

It exposes three top-level command modules:

- `chat`     — Interactive chat REPL bound to the current session
- `sessions` — One-shot session management and listing
- `config`   — Inspect the resolved configuration

All of them work on an [`Environment`]: the data root and workspace the
command was invoked for.
*/

use crate::config::{self, ConfigStore};
use crate::controller::{workspace_key, SessionController};
use crate::error::{Result, VaporError};
use crate::providers::create_backend;
use crate::storage::StorageLayout;
use anyhow::Context;
use std::path::{Path, PathBuf};

pub mod chat;
pub mod config_cmd;
pub mod sessions;
pub mod special_commands;

/// Where a command reads and writes its state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    data_root: PathBuf,
    workspace_root: Option<PathBuf>,
}

impl Environment {
    /// Build an environment from explicit paths
    pub fn new(data_root: impl Into<PathBuf>, workspace_root: Option<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            workspace_root,
        }
    }

    /// Resolve the environment from the global CLI flags
    ///
    /// The data root defaults to `VAPOR_HOME` or `~/.vapor`. A workspace
    /// directory must exist and is canonicalized so that every spelling of
    /// the same directory maps to the same sessions.
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Config` when no data root can be determined or
    /// the workspace directory does not exist.
    pub fn resolve(data_dir: Option<PathBuf>, workspace: Option<PathBuf>) -> Result<Self> {
        let data_root = data_dir.or_else(config::data_root).ok_or_else(|| {
            VaporError::Config("Cannot determine a home directory; pass --data-dir".to_string())
        })?;

        let workspace_root = match workspace {
            Some(dir) => Some(
                std::fs::canonicalize(&dir)
                    .with_context(|| format!("Workspace {} is not accessible", dir.display()))
                    .map_err(|e| VaporError::Config(format!("{:#}", e)))?,
            ),
            None => None,
        };

        tracing::debug!(
            data_root = %data_root.display(),
            workspace = ?workspace_root,
            "Resolved environment"
        );
        Ok(Self {
            data_root,
            workspace_root,
        })
    }

    /// The data root
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// The workspace directory, if any
    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    /// Session index key for the workspace
    pub fn workspace_key(&self) -> String {
        workspace_key(self.workspace_root())
    }

    /// Session file layout under the data root
    pub fn layout(&self) -> StorageLayout {
        StorageLayout::new(&self.data_root)
    }

    /// Resolve and load the configuration for this environment
    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::open(self.workspace_root(), Some(&self.data_root))
    }

    /// Open the session controller with the HTTP backend
    ///
    /// # Errors
    ///
    /// Returns an error if the session files cannot be initialised or the
    /// HTTP client cannot be built.
    pub fn open_controller(&self, config: ConfigStore) -> Result<SessionController> {
        SessionController::open(&self.layout(), self.workspace_key(), config, create_backend()?)
    }
}
