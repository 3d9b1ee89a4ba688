//! Logging setup
//!
//! Logs go to stderr so they never interleave with chat output on stdout.
//! Output is human readable by default or JSON on request, optionally
//! mirrored to a file.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// How logging should be initialized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of human-readable text
    pub json_format: bool,
    /// Additionally append logs to this file
    pub file_path: Option<PathBuf>,
}

impl Default for LoggingOptions {
    fn default() -> Self {
        Self {
            level: "vapor=info".to_string(),
            json_format: false,
            file_path: None,
        }
    }
}

impl LoggingOptions {
    /// Options derived from the global command-line flags
    ///
    /// # Examples
    ///
    /// ```
    /// use vapor::logging::LoggingOptions;
    ///
    /// let options = LoggingOptions::from_flags(true, false, None);
    /// assert_eq!(options.level, "vapor=debug");
    /// ```
    pub fn from_flags(verbose: bool, json_format: bool, file_path: Option<PathBuf>) -> Self {
        let level = if verbose { "vapor=debug" } else { "vapor=info" };
        Self {
            level: level.to_string(),
            json_format,
            file_path,
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `options.level`.
///
/// # Errors
///
/// Returns an error if the filter is invalid, the log file cannot be
/// opened, or a global subscriber is already installed.
pub fn init_logging(options: &LoggingOptions) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&options.level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    let file = match &options.file_path {
        Some(path) => Some(Arc::new(
            OpenOptions::new().create(true).append(true).open(path)?,
        )),
        None => None,
    };

    if options.json_format {
        let stderr_layer = fmt::layer()
            .json()
            .with_current_span(true)
            .with_writer(std::io::stderr);
        let file_layer = file.map(|file| {
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(file)
        });
        registry.with(stderr_layer).with(file_layer).try_init()?;
    } else {
        let stderr_layer = fmt::layer()
            .with_target(false)
            .with_level(true)
            .with_writer(std::io::stderr);
        let file_layer = file.map(|file| {
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .with_writer(file)
        });
        registry.with(stderr_layer).with(file_layer).try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = LoggingOptions::default();
        assert_eq!(options.level, "vapor=info");
        assert!(!options.json_format);
        assert_eq!(options.file_path, None);
    }

    #[test]
    fn test_from_flags() {
        let options = LoggingOptions::from_flags(false, true, Some(PathBuf::from("/tmp/v.log")));
        assert_eq!(options.level, "vapor=info");
        assert!(options.json_format);
        assert_eq!(options.file_path, Some(PathBuf::from("/tmp/v.log")));
    }

    #[test]
    fn test_init_logging_rejects_unopenable_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be opened for appending
        let options = LoggingOptions::from_flags(false, false, Some(dir.path().to_path_buf()));
        assert!(init_logging(&options).is_err());
    }
}
