//! `vapor config` handlers

use crate::cli::ConfigCommand;
use crate::commands::Environment;
use crate::config::Settings;
use crate::error::Result;
use colored::Colorize;
use std::time::Duration;

/// Render a retention period in the largest whole unit
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use vapor::commands::config_cmd::format_retention;
///
/// assert_eq!(format_retention(Duration::from_secs(30 * 24 * 3600)), "30d");
/// assert_eq!(format_retention(Duration::from_secs(5 * 3600)), "5h");
/// ```
pub fn format_retention(retention: Duration) -> String {
    const HOUR: u64 = 3600;
    const DAY: u64 = 24 * HOUR;
    let secs = retention.as_secs();
    if secs > 0 && secs % DAY == 0 {
        format!("{}d", secs / DAY)
    } else if secs > 0 && secs % HOUR == 0 {
        format!("{}h", secs / HOUR)
    } else {
        format!("{}s", secs)
    }
}

/// Lines describing the effective settings
pub fn describe_settings(settings: &Settings) -> Vec<(&'static str, String)> {
    vec![
        (
            "endpoint",
            settings
                .endpoint
                .clone()
                .unwrap_or_else(|| "(not configured)".to_string()),
        ),
        ("type", settings.backend_kind.to_string()),
        (
            "model",
            settings.model.clone().unwrap_or_else(|| "-".to_string()),
        ),
        ("timeout", format!("{}s", settings.timeout.as_secs())),
        ("sessions", settings.limits.max_sessions.to_string()),
        ("entries", settings.limits.max_entries.to_string()),
        ("retention", format_retention(settings.limits.retention)),
    ]
}

/// Handle config commands
pub fn handle_config(env: &Environment, command: ConfigCommand) -> Result<()> {
    let store = env.config_store();
    match command {
        ConfigCommand::Path => match store.path() {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", "No configuration file could be resolved.".yellow()),
        },
        ConfigCommand::Show => {
            if let Some(path) = store.path() {
                println!("{} {}", "Config:".bold(), path.display());
            }
            for (key, value) in describe_settings(&store.settings()) {
                println!("  {:<10} {}", format!("{}:", key), value);
            }
        }
    }
    Ok(())
}
