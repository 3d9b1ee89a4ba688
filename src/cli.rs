//! Command-line interface definition for Vapor
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the interactive chat, session management and config commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Vapor - chat with an HTTP or Ollama backend, one session at a time
///
/// Conversations are kept as named sessions per workspace directory and
/// survive restarts.
#[derive(Parser, Debug, Clone)]
#[command(name = "vapor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Also append logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Directory holding sessions and the user config (default ~/.vapor)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Workspace directory; sessions and `vapor-config.yaml` are looked up for it
    #[arg(short, long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Vapor
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat in the current session
    Chat {
        /// Do not reload the config file when it changes
        #[arg(long)]
        no_watch: bool,
    },

    /// Manage the sessions of a workspace
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Inspect the configuration
    Config {
        /// Configuration subcommand
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// List sessions, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Create a session and make it current
    New {
        /// Session title
        title: Option<String>,
    },

    /// Make a session current
    Switch {
        /// Session id or unique prefix
        id: String,
    },

    /// Retitle a session
    Rename {
        /// Session id or unique prefix
        id: String,
        /// New title
        title: String,
    },

    /// Delete a session and its history
    Delete {
        /// Session id or unique prefix
        id: String,
    },

    /// Print the history of the current session
    History,

    /// Remove expired sessions and sessions beyond the configured cap
    Prune,
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Print the resolved configuration file path
    Path,
    /// Print the effective settings
    Show,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_chat_command() {
        let cli = Cli::try_parse_from(["vapor", "chat"]).unwrap();
        assert!(matches!(cli.command, Commands::Chat { no_watch: false }));
        assert!(!cli.verbose);
        assert_eq!(cli.workspace, None);
    }

    #[test]
    fn test_cli_parse_chat_with_workspace() {
        let cli = Cli::try_parse_from(["vapor", "chat", "--workspace", "/src/app"]).unwrap();
        assert_eq!(cli.workspace, Some(PathBuf::from("/src/app")));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "vapor",
            "sessions",
            "list",
            "--verbose",
            "--json-logs",
            "--data-dir",
            "/tmp/vapor",
            "--log-file",
            "/tmp/vapor.log",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(cli.json_logs);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/vapor")));
        assert_eq!(cli.log_file, Some(PathBuf::from("/tmp/vapor.log")));
    }

    #[test]
    fn test_cli_parse_sessions_list_json() {
        let cli = Cli::try_parse_from(["vapor", "sessions", "list", "--json"]).unwrap();
        if let Commands::Sessions { command } = cli.command {
            assert_eq!(command, SessionCommand::List { json: true });
        } else {
            panic!("Expected Sessions command");
        }
    }

    #[test]
    fn test_cli_parse_sessions_new_without_title() {
        let cli = Cli::try_parse_from(["vapor", "sessions", "new"]).unwrap();
        if let Commands::Sessions { command } = cli.command {
            assert_eq!(command, SessionCommand::New { title: None });
        } else {
            panic!("Expected Sessions command");
        }
    }

    #[test]
    fn test_cli_parse_sessions_rename() {
        let cli =
            Cli::try_parse_from(["vapor", "sessions", "rename", "ab12", "Release notes"]).unwrap();
        if let Commands::Sessions { command } = cli.command {
            assert_eq!(
                command,
                SessionCommand::Rename {
                    id: "ab12".to_string(),
                    title: "Release notes".to_string()
                }
            );
        } else {
            panic!("Expected Sessions command");
        }
    }

    #[test]
    fn test_cli_sessions_switch_requires_id() {
        assert!(Cli::try_parse_from(["vapor", "sessions", "switch"]).is_err());
    }

    #[test]
    fn test_cli_parse_config_path() {
        let cli = Cli::try_parse_from(["vapor", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                command: ConfigCommand::Path
            }
        ));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["vapor"]).is_err());
    }
}
