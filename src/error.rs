//! Error types for Vapor
//!
//! This module defines the error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Vapor operations
///
/// Most failures in the session and configuration subsystem degrade softly
/// (logged and replaced by a default). The variants here cover the ones that
/// are surfaced to the caller as rejected operations.
#[derive(Error, Debug)]
pub enum VaporError {
    /// Configuration-related errors (unresolvable paths, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file exists but could not be parsed
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// A session id was not present in the workspace's session set
    #[error("Session not found: {id} (workspace {workspace})")]
    SessionNotFound {
        /// Workspace key the lookup was made against
        workspace: String,
        /// The session id that was requested
        id: String,
    },

    /// A session id prefix matched more than one session
    #[error("Session id prefix is ambiguous: {0}")]
    AmbiguousSession(String),

    /// Session index or history persistence errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Chat backend errors (request construction, transport)
    #[error("Backend error: {0}")]
    Backend(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Filesystem notification errors
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Result type alias for Vapor operations
///
/// Uses `anyhow::Error` so callers can attach context while still being able
/// to `downcast_ref::<VaporError>()` for the rejected-operation cases.
pub type Result<T> = anyhow::Result<T>;

/// Returns true when the error is a [`VaporError::SessionNotFound`]
pub fn is_session_not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<VaporError>(),
        Some(VaporError::SessionNotFound { .. })
    )
}
