//! Configuration management for Vapor
//!
//! This module handles locating, loading, validating, and publishing the
//! chat backend configuration. The configuration lives in a YAML file that
//! is either workspace-local (`vapor-config.yaml` in the workspace root) or
//! per-user (`~/.vapor/config.yaml`, seeded from a bundled template).
//!
//! [`ConfigStore`] holds the single current [`Settings`] value and notifies
//! subscribers whenever it changes. Filesystem watching lives in
//! [`crate::watcher`].

use crate::error::{Result, VaporError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock, Weak};
use std::time::Duration;

/// File name looked up in the workspace root
pub const WORKSPACE_CONFIG_FILE: &str = "vapor-config.yaml";

/// File name of the per-user configuration inside the data root
pub const USER_CONFIG_FILE: &str = "config.yaml";

/// Directory under the home directory holding config and sessions
pub const DATA_DIR_NAME: &str = ".vapor";

/// Environment variable overriding the data root
pub const DATA_ROOT_ENV: &str = "VAPOR_HOME";

/// Template copied to the per-user configuration on first use
pub const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/config.yaml");

const HOUR_MS: u64 = 60 * 60 * 1000;
const DAY_MS: u64 = 24 * HOUR_MS;

/// On-disk configuration record
///
/// Every field is optional; missing fields take the defaults of
/// [`Settings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VaporConfig {
    /// Chat backend URL
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Untyped backend selector, mapped through [`BackendKind::from_type`]
    #[serde(default, rename = "type")]
    pub backend_type: Option<String>,

    /// Model name for Ollama backends
    #[serde(default)]
    pub model: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_seconds: Option<u64>,

    /// Per-workspace session limits
    #[serde(default)]
    pub workspace: Option<WorkspaceSection>,
}

/// The `workspace:` block of the configuration file
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceSection {
    /// Maximum sessions kept per workspace
    #[serde(default)]
    pub sessions: Option<usize>,

    /// Maximum entries kept per session
    #[serde(default)]
    pub entries: Option<usize>,

    /// Idle time after which a session is pruned, e.g. `30d`
    #[serde(default)]
    pub retention: Option<String>,
}

impl VaporConfig {
    /// Parse a configuration record from YAML text
    ///
    /// An empty document is treated as a record with every field unset.
    ///
    /// # Errors
    ///
    /// Returns `VaporError::ConfigParse` if the YAML is malformed or has
    /// fields of the wrong type.
    pub fn from_yaml(contents: &str) -> Result<Self> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents)
            .map_err(|e| VaporError::ConfigParse(e.to_string()).into())
    }

    /// Read and parse a configuration file
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Config` if the file cannot be read and
    /// `VaporError::ConfigParse` if it cannot be parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            VaporError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_yaml(&contents)
    }

    /// Validate value ranges
    ///
    /// # Errors
    ///
    /// Returns `VaporError::Config` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = self.endpoint.as_deref().map(str::trim) {
            if !endpoint.is_empty()
                && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
            {
                return Err(VaporError::Config(format!(
                    "endpoint must be an http(s) URL, got: {}",
                    endpoint
                ))
                .into());
            }
        }

        if self.timeout_seconds == Some(0) {
            return Err(
                VaporError::Config("timeout_seconds must be greater than 0".to_string()).into(),
            );
        }

        if let Some(workspace) = &self.workspace {
            if workspace.sessions == Some(0) {
                return Err(VaporError::Config(
                    "workspace.sessions must be greater than 0".to_string(),
                )
                .into());
            }
            if workspace.entries == Some(0) {
                return Err(VaporError::Config(
                    "workspace.entries must be greater than 0".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }
}

/// Which wire shape the chat backend speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// `{message}` in, `{reply}` out
    #[default]
    Generic,
    /// Ollama `/api/generate`
    OllamaGenerate,
    /// Ollama `/api/chat`
    OllamaChat,
}

impl BackendKind {
    /// Map the untyped `type` field to a backend kind
    ///
    /// # Examples
    ///
    /// ```
    /// use vapor::config::BackendKind;
    ///
    /// assert_eq!(BackendKind::from_type(Some("ollama")), BackendKind::OllamaGenerate);
    /// assert_eq!(BackendKind::from_type(Some("ollama-chat")), BackendKind::OllamaChat);
    /// assert_eq!(BackendKind::from_type(Some("anything")), BackendKind::Generic);
    /// assert_eq!(BackendKind::from_type(None), BackendKind::Generic);
    /// ```
    pub fn from_type(value: Option<&str>) -> Self {
        match value {
            Some("ollama") | Some("ollama-generate") => Self::OllamaGenerate,
            Some("ollama-chat") => Self::OllamaChat,
            _ => Self::Generic,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generic => write!(f, "generic"),
            Self::OllamaGenerate => write!(f, "ollama-generate"),
            Self::OllamaChat => write!(f, "ollama-chat"),
        }
    }
}

/// Session retention and size limits for a workspace
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkspaceLimits {
    /// Maximum sessions kept per workspace
    pub max_sessions: usize,
    /// Maximum entries kept per session
    pub max_entries: usize,
    /// Idle time after which a session is pruned
    pub retention: Duration,
}

impl Default for WorkspaceLimits {
    fn default() -> Self {
        Self {
            max_sessions: 20,
            max_entries: 300,
            retention: Duration::from_millis(30 * DAY_MS),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

/// Effective settings derived from the configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Chat backend URL; `None` means unconfigured
    pub endpoint: Option<String>,
    /// Wire shape to use
    pub backend_kind: BackendKind,
    /// Model name for Ollama backends
    pub model: Option<String>,
    /// Request timeout for the backend
    pub timeout: Duration,
    /// Session limits
    pub limits: WorkspaceLimits,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: None,
            backend_kind: BackendKind::Generic,
            model: None,
            timeout: default_timeout(),
            limits: WorkspaceLimits::default(),
        }
    }
}

impl Settings {
    /// Apply a parsed configuration record on top of these settings
    ///
    /// Connection fields are replaced wholesale. Workspace limits only
    /// change for the fields the record sets, and an unparsable retention
    /// keeps the current value.
    pub fn apply(&mut self, config: &VaporConfig) {
        self.endpoint = config
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        self.backend_kind = BackendKind::from_type(config.backend_type.as_deref());
        self.model = config.model.clone();
        self.timeout = config
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or_else(default_timeout);

        if let Some(workspace) = &config.workspace {
            self.limits.max_sessions = workspace.sessions.unwrap_or(self.limits.max_sessions);
            self.limits.max_entries = workspace.entries.unwrap_or(self.limits.max_entries);
            self.limits.retention =
                parse_duration(workspace.retention.as_deref(), self.limits.retention);
        }
    }

    /// Clear the connection fields back to "unconfigured"
    pub fn reset_connection(&mut self) {
        self.endpoint = None;
        self.backend_kind = BackendKind::Generic;
        self.model = None;
    }

    /// Whether a backend endpoint is set
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }
}

/// Parse a `<integer><unit>` duration string
///
/// Units are `h`, `d`, `w`, `m` (30 days) and `y` (365 days), case
/// insensitive, with optional whitespace between number and unit. Anything
/// else, including an absent value or an overflowing amount, yields
/// `fallback`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vapor::config::parse_duration;
///
/// let fallback = Duration::from_secs(1);
/// assert_eq!(parse_duration(Some("2h"), fallback), Duration::from_secs(7200));
/// assert_eq!(parse_duration(Some("1w"), fallback), Duration::from_secs(7 * 86400));
/// assert_eq!(parse_duration(Some("soon"), fallback), fallback);
/// assert_eq!(parse_duration(None, fallback), fallback);
/// ```
pub fn parse_duration(value: Option<&str>, fallback: Duration) -> Duration {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

    let Some(value) = value else {
        return fallback;
    };
    let value = value.trim().to_lowercase();
    let Some(pattern) = PATTERN
        .get_or_init(|| Regex::new(r"^(\d+)\s*(h|d|w|m|y)$").ok())
        .as_ref()
    else {
        return fallback;
    };

    let Some(caps) = pattern.captures(&value) else {
        return fallback;
    };
    let Ok(amount) = caps[1].parse::<u64>() else {
        return fallback;
    };
    let unit_ms = match &caps[2] {
        "h" => HOUR_MS,
        "d" => DAY_MS,
        "w" => 7 * DAY_MS,
        "m" => 30 * DAY_MS,
        "y" => 365 * DAY_MS,
        _ => return fallback,
    };

    amount
        .checked_mul(unit_ms)
        .map(Duration::from_millis)
        .unwrap_or(fallback)
}

/// Determine the data root holding the per-user config and sessions
///
/// `VAPOR_HOME` wins when set; otherwise `<home>/.vapor`. Returns `None`
/// if no home directory can be determined.
pub fn data_root() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_ROOT_ENV) {
        if !dir.trim().is_empty() {
            return Some(PathBuf::from(dir));
        }
    }
    directories::BaseDirs::new().map(|dirs| dirs.home_dir().join(DATA_DIR_NAME))
}

/// Resolve the configuration file to use
///
/// Prefers `<workspace_root>/vapor-config.yaml` when it exists. Otherwise
/// falls back to `<data_root>/config.yaml`, creating the data root and
/// seeding the file from [`DEFAULT_CONFIG_TEMPLATE`] if missing. Returns
/// `None` when there is no data root.
pub fn resolve_config_path(
    workspace_root: Option<&Path>,
    data_root: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(root) = workspace_root {
        let candidate = root.join(WORKSPACE_CONFIG_FILE);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let data_root = data_root?;
    let user_config = data_root.join(USER_CONFIG_FILE);

    if let Err(e) = std::fs::create_dir_all(data_root) {
        tracing::warn!(
            "Failed to create data directory {}: {}",
            data_root.display(),
            e
        );
    } else if !user_config.exists() {
        match std::fs::write(&user_config, DEFAULT_CONFIG_TEMPLATE) {
            Ok(()) => tracing::info!("Seeded default config at {}", user_config.display()),
            Err(e) => tracing::warn!(
                "Failed to seed default config at {}: {}",
                user_config.display(),
                e
            ),
        }
    }

    Some(user_config)
}

type ChangeHandler = Arc<dyn Fn(&Settings) + Send + Sync>;

struct ConfigStoreInner {
    path: Option<PathBuf>,
    settings: RwLock<Settings>,
    handlers: Mutex<Vec<(u64, ChangeHandler)>>,
    next_handler_id: AtomicU64,
}

/// Holds the current settings and publishes changes
///
/// Cloning is cheap; clones share the same settings and subscribers.
///
/// # Examples
///
/// ```
/// use vapor::config::{BackendKind, ConfigStore};
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("vapor-config.yaml");
/// std::fs::write(&path, "endpoint: http://localhost:11434/api/chat\ntype: ollama-chat\n").unwrap();
///
/// let store = ConfigStore::new(Some(path));
/// assert!(store.load());
/// assert_eq!(store.settings().backend_kind, BackendKind::OllamaChat);
/// ```
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<ConfigStoreInner>,
}

impl ConfigStore {
    /// Create a store for the given file without loading it
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            inner: Arc::new(ConfigStoreInner {
                path,
                settings: RwLock::new(Settings::default()),
                handlers: Mutex::new(Vec::new()),
                next_handler_id: AtomicU64::new(1),
            }),
        }
    }

    /// Resolve the config path for a workspace and load it
    pub fn open(workspace_root: Option<&Path>, data_root: Option<&Path>) -> Self {
        let path = resolve_config_path(workspace_root, data_root);
        if path.is_none() {
            tracing::warn!("No home directory found; running without a config file");
        }
        let store = Self::new(path);
        store.load();
        store
    }

    /// The resolved configuration file, if any
    pub fn path(&self) -> Option<&Path> {
        self.inner.path.as_deref()
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.inner
            .settings
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Re-read the configuration file
    ///
    /// Returns true when new settings were applied. On any failure the
    /// error is logged and the previous settings stay in place.
    pub fn load(&self) -> bool {
        match self.try_load() {
            Ok(settings) => {
                tracing::info!(
                    path = ?self.path(),
                    backend = %settings.backend_kind,
                    endpoint = ?settings.endpoint,
                    "Vapor config loaded"
                );
                true
            }
            Err(e) => {
                tracing::error!("Failed to load Vapor config: {}", e);
                false
            }
        }
    }

    /// Re-read the configuration file, returning the applied settings
    ///
    /// # Errors
    ///
    /// Returns an error if no path is resolved, the file cannot be read or
    /// parsed, or validation fails. Settings are left untouched on error.
    pub fn try_load(&self) -> Result<Settings> {
        let path = self
            .path()
            .ok_or_else(|| VaporError::Config("No configuration path resolved".to_string()))?;
        let config = VaporConfig::from_file(path)?;
        config.validate()?;

        let updated = {
            let mut settings = self
                .inner
                .settings
                .write()
                .unwrap_or_else(|e| e.into_inner());
            settings.apply(&config);
            settings.clone()
        };
        self.notify(&updated);
        Ok(updated)
    }

    /// Reset connection settings after the config file disappears
    pub fn reset(&self) {
        let updated = {
            let mut settings = self
                .inner
                .settings
                .write()
                .unwrap_or_else(|e| e.into_inner());
            settings.reset_connection();
            settings.clone()
        };
        tracing::warn!("Vapor config deleted, settings reset");
        self.notify(&updated);
    }

    /// Register a handler invoked with the new settings after every change
    ///
    /// The handler stays registered until the returned [`Subscription`] is
    /// dropped or disposed.
    pub fn on_change<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&Settings) + Send + Sync + 'static,
    {
        let id = self.inner.next_handler_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(handler)));
        Subscription {
            id,
            store: Arc::downgrade(&self.inner),
        }
    }

    fn notify(&self, settings: &Settings) {
        // Handlers run outside the lock so they may subscribe or dispose.
        let handlers: Vec<ChangeHandler> = self
            .inner
            .handlers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, handler)| Arc::clone(handler))
            .collect();
        for handler in handlers {
            handler(settings);
        }
    }
}

/// Registration returned by [`ConfigStore::on_change`]
pub struct Subscription {
    id: u64,
    store: Weak<ConfigStoreInner>,
}

impl Subscription {
    /// Unregister the handler
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner
                .handlers
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join(WORKSPACE_CONFIG_FILE);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_backend_kind_mapping() {
        assert_eq!(BackendKind::from_type(Some("ollama")), BackendKind::OllamaGenerate);
        assert_eq!(
            BackendKind::from_type(Some("ollama-generate")),
            BackendKind::OllamaGenerate
        );
        assert_eq!(BackendKind::from_type(Some("ollama-chat")), BackendKind::OllamaChat);
        assert_eq!(BackendKind::from_type(Some("OLLAMA")), BackendKind::Generic);
        assert_eq!(BackendKind::from_type(Some("generic")), BackendKind::Generic);
        assert_eq!(BackendKind::from_type(None), BackendKind::Generic);
    }

    #[test]
    fn test_parse_duration_units() {
        let fallback = Duration::from_millis(1);
        assert_eq!(parse_duration(Some("1h"), fallback).as_millis(), 3_600_000);
        assert_eq!(parse_duration(Some("1d"), fallback).as_millis(), 86_400_000);
        assert_eq!(parse_duration(Some("2w"), fallback).as_millis(), 14 * 86_400_000);
        assert_eq!(parse_duration(Some("1m"), fallback).as_millis(), 30 * 86_400_000);
        assert_eq!(parse_duration(Some("1y"), fallback).as_millis(), 365 * 86_400_000);
    }

    #[test]
    fn test_parse_duration_tolerates_case_and_spacing() {
        let fallback = Duration::from_millis(1);
        assert_eq!(parse_duration(Some(" 3 D "), fallback).as_millis(), 3 * 86_400_000);
    }

    #[test]
    fn test_parse_duration_falls_back() {
        let fallback = Duration::from_secs(42);
        assert_eq!(parse_duration(None, fallback), fallback);
        assert_eq!(parse_duration(Some(""), fallback), fallback);
        assert_eq!(parse_duration(Some("10"), fallback), fallback);
        assert_eq!(parse_duration(Some("10s"), fallback), fallback);
        assert_eq!(parse_duration(Some("-1d"), fallback), fallback);
        assert_eq!(parse_duration(Some("1.5d"), fallback), fallback);
        assert_eq!(
            parse_duration(Some("99999999999999999999y"), fallback),
            fallback
        );
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert!(settings.endpoint.is_none());
        assert_eq!(settings.backend_kind, BackendKind::Generic);
        assert_eq!(settings.limits.max_sessions, 20);
        assert_eq!(settings.limits.max_entries, 300);
        assert_eq!(settings.limits.retention, Duration::from_secs(30 * 86_400));
        assert_eq!(settings.timeout, Duration::from_secs(120));
    }

    #[test]
    fn test_settings_apply_full_record() {
        let config = VaporConfig::from_yaml(
            r#"
endpoint: http://localhost:11434/api/generate
type: ollama
model: llama3.2
timeout_seconds: 30
workspace:
  sessions: 5
  entries: 50
  retention: 2w
"#,
        )
        .unwrap();
        let mut settings = Settings::default();
        settings.apply(&config);

        assert_eq!(
            settings.endpoint.as_deref(),
            Some("http://localhost:11434/api/generate")
        );
        assert_eq!(settings.backend_kind, BackendKind::OllamaGenerate);
        assert_eq!(settings.model.as_deref(), Some("llama3.2"));
        assert_eq!(settings.timeout, Duration::from_secs(30));
        assert_eq!(settings.limits.max_sessions, 5);
        assert_eq!(settings.limits.max_entries, 50);
        assert_eq!(settings.limits.retention, Duration::from_secs(14 * 86_400));
    }

    #[test]
    fn test_settings_apply_keeps_limits_for_missing_fields() {
        let mut settings = Settings::default();
        settings.limits.max_entries = 10;
        let config = VaporConfig::from_yaml("workspace:\n  retention: forever\n").unwrap();
        settings.apply(&config);

        assert_eq!(settings.limits.max_entries, 10);
        assert_eq!(settings.limits.retention, WorkspaceLimits::default().retention);
    }

    #[test]
    fn test_blank_endpoint_is_unconfigured() {
        let mut settings = Settings::default();
        settings.apply(&VaporConfig::from_yaml("endpoint: '  '\n").unwrap());
        assert!(!settings.is_configured());
    }

    #[test]
    fn test_empty_document_parses_as_defaults() {
        assert_eq!(VaporConfig::from_yaml("").unwrap(), VaporConfig::default());
    }

    #[test]
    fn test_malformed_yaml_is_parse_error() {
        let err = VaporConfig::from_yaml("endpoint: [unclosed").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VaporError>(),
            Some(VaporError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_scheme = VaporConfig {
            endpoint: Some("ftp://host".to_string()),
            ..Default::default()
        };
        assert!(bad_scheme.validate().is_err());

        let zero_timeout = VaporConfig {
            timeout_seconds: Some(0),
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let zero_entries = VaporConfig {
            workspace: Some(WorkspaceSection {
                entries: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(zero_entries.validate().is_err());

        assert!(VaporConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bundled_template_parses() {
        let config = VaporConfig::from_yaml(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.endpoint.is_none());
        assert_eq!(config.backend_type.as_deref(), Some("ollama-chat"));
    }

    #[test]
    fn test_resolve_prefers_workspace_file() {
        let workspace = tempdir().unwrap();
        let data = tempdir().unwrap();
        let ws_config = write_config(workspace.path(), "type: generic\n");

        let resolved = resolve_config_path(Some(workspace.path()), Some(data.path()));
        assert_eq!(resolved, Some(ws_config));
        assert!(!data.path().join(USER_CONFIG_FILE).exists());
    }

    #[test]
    fn test_resolve_seeds_user_config() {
        let workspace = tempdir().unwrap();
        let data = tempdir().unwrap();
        let data_root = data.path().join("nested").join(".vapor");

        let resolved = resolve_config_path(Some(workspace.path()), Some(&data_root)).unwrap();
        assert_eq!(resolved, data_root.join(USER_CONFIG_FILE));
        let contents = std::fs::read_to_string(&resolved).unwrap();
        assert_eq!(contents, DEFAULT_CONFIG_TEMPLATE);
    }

    #[test]
    fn test_resolve_does_not_overwrite_user_config() {
        let data = tempdir().unwrap();
        let user_config = data.path().join(USER_CONFIG_FILE);
        std::fs::write(&user_config, "type: generic\n").unwrap();

        resolve_config_path(None, Some(data.path()));
        assert_eq!(
            std::fs::read_to_string(&user_config).unwrap(),
            "type: generic\n"
        );
    }

    #[test]
    fn test_resolve_without_data_root() {
        let workspace = tempdir().unwrap();
        assert!(resolve_config_path(Some(workspace.path()), None).is_none());
    }

    #[test]
    #[serial]
    fn test_data_root_env_override() {
        let dir = tempdir().unwrap();
        std::env::set_var(DATA_ROOT_ENV, dir.path());
        assert_eq!(data_root(), Some(dir.path().to_path_buf()));
        std::env::remove_var(DATA_ROOT_ENV);
    }

    #[test]
    fn test_store_load_failure_keeps_previous_settings() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "endpoint: http://localhost:8080/chat\ntype: ollama-chat\n",
        );
        let store = ConfigStore::new(Some(path.clone()));
        assert!(store.load());

        std::fs::write(&path, "endpoint: [broken").unwrap();
        assert!(!store.load());

        let settings = store.settings();
        assert_eq!(settings.endpoint.as_deref(), Some("http://localhost:8080/chat"));
        assert_eq!(settings.backend_kind, BackendKind::OllamaChat);
    }

    #[test]
    fn test_store_without_path_stays_unconfigured() {
        let store = ConfigStore::new(None);
        assert!(!store.load());
        assert!(!store.settings().is_configured());
    }

    #[test]
    fn test_store_reset_clears_connection_only() {
        let dir = tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "endpoint: http://h/api\ntype: ollama\nmodel: m\nworkspace:\n  entries: 7\n",
        );
        let store = ConfigStore::new(Some(path));
        store.load();
        store.reset();

        let settings = store.settings();
        assert!(settings.endpoint.is_none());
        assert!(settings.model.is_none());
        assert_eq!(settings.backend_kind, BackendKind::Generic);
        assert_eq!(settings.limits.max_entries, 7);
    }

    #[test]
    fn test_on_change_and_dispose() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "endpoint: http://h/api\n");
        let store = ConfigStore::new(Some(path));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = store.on_change(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.load();
        store.reset();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        subscription.dispose();
        store.load();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clones_share_settings() {
        let dir = tempdir().unwrap();
        let path = write_config(dir.path(), "endpoint: http://h/api\n");
        let store = ConfigStore::new(Some(path));
        let clone = store.clone();

        store.load();
        assert!(clone.settings().is_configured());
    }
}
