//! Live reload of the configuration file
//!
//! [`ConfigWatcher`] observes the file a [`crate::config::ConfigStore`] was
//! resolved to and applies each change to the store, which in turn notifies
//! its subscribers.

pub mod config_watcher;

pub use config_watcher::{apply_event, ConfigEvent, ConfigWatcher};
