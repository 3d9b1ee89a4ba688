//! Vapor - chat sessions and configuration for an HTTP chat backend
//!
//! This library keeps chat history partitioned into named sessions per
//! workspace, persists it to disk, and forwards messages to a configurable
//! backend (a generic JSON endpoint or Ollama's generate/chat APIs) whose
//! configuration is reloaded live from a YAML file.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `config`: Configuration file parsing, path resolution and the `ConfigStore`
//! - `watcher`: Filesystem watcher keeping a `ConfigStore` in sync with its file
//! - `storage`: Session index and per-session history files
//! - `providers`: Chat backend abstraction and the HTTP implementation
//! - `controller`: Session controller and the presentation port
//! - `commands`: CLI command handlers (chat REPL, session management)
//! - `cli`: Command-line interface definition
//! - `logging`: Tracing subscriber setup
//! - `error`: Error types and result aliases
//!
//! # Example
//!
//! ```no_run
//! use vapor::config::ConfigStore;
//! use vapor::controller::SessionController;
//! use vapor::providers::create_backend;
//! use vapor::storage::{StorageLayout, NO_WORKSPACE_KEY};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let data_root = vapor::config::data_root().expect("home directory");
//!     let config = ConfigStore::open(None, Some(&data_root));
//!     let mut controller = SessionController::open(
//!         &StorageLayout::new(&data_root),
//!         NO_WORKSPACE_KEY,
//!         config,
//!         create_backend()?,
//!     )?;
//!     let reply = controller.send_user_message("hello").await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod logging;
pub mod providers;
pub mod storage;
pub mod watcher;

// Re-export commonly used types
pub use config::{ConfigStore, Settings};
pub use controller::{ChatView, SessionController};
pub use error::{Result, VaporError};

#[cfg(test)]
pub mod test_utils;
