//! Special commands parser for interactive chat mode
//!
//! This module parses the slash commands that can be entered during an
//! interactive chat. Special commands allow users to:
//! - Create, list, switch, rename and delete sessions
//! - Clear or reprint the current session's history
//! - Display help information
//! - Exit the chat
//!
//! Command names are case-insensitive; arguments (ids, titles) are kept
//! as typed.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an argument it does not take
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
///
/// These commands act on sessions or the chat itself rather than being
/// sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Create a session, optionally titled, and switch to it
    NewSession(Option<String>),

    /// Show the session list
    ListSessions,

    /// Switch to the session with this id or id prefix
    SwitchSession(String),

    /// Retitle a session
    RenameSession { id: String, title: String },

    /// Delete a session
    DeleteSession(String),

    /// Empty the current session's history
    ClearHistory,

    /// Reprint the current session's history
    ShowHistory,

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent to the backend as a chat message.
    None,
}

fn require_arg(command: &str, usage: &str, rest: &str) -> Result<String, CommandError> {
    if rest.is_empty() {
        Err(CommandError::MissingArgument {
            command: command.to_string(),
            usage: usage.to_string(),
        })
    } else {
        Ok(rest.to_string())
    }
}

fn no_arg(command: &str, rest: &str, parsed: SpecialCommand) -> Result<SpecialCommand, CommandError> {
    if rest.is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg: rest.to_string(),
        })
    }
}

/// Parse a user input string into a special command
///
/// Input that does not start with `/` is a chat message, except for the
/// bare words `exit` and `quit`.
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an argument it does not take.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use vapor::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/new Release planning").unwrap();
/// assert_eq!(cmd, SpecialCommand::NewSession(Some("Release planning".to_string())));
///
/// let cmd = parse_special_command("/rename 3fa9 Bug triage").unwrap();
/// assert_eq!(
///     cmd,
///     SpecialCommand::RenameSession { id: "3fa9".to_string(), title: "Bug triage".to_string() }
/// );
///
/// let cmd = parse_special_command("hello there").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') {
        return Ok(match lower.as_str() {
            "exit" | "quit" => SpecialCommand::Exit,
            _ => SpecialCommand::None,
        });
    }

    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };

    match name.as_str() {
        "/new" => Ok(SpecialCommand::NewSession(
            (!rest.is_empty()).then(|| rest.to_string()),
        )),
        "/sessions" | "/list" => no_arg("/sessions", rest, SpecialCommand::ListSessions),
        "/switch" => {
            require_arg("/switch", "/switch <id>", rest).map(SpecialCommand::SwitchSession)
        }
        "/rename" => {
            let usage = "/rename <id> <title>";
            let args = require_arg("/rename", usage, rest)?;
            match args.split_once(char::is_whitespace) {
                Some((id, title)) if !title.trim().is_empty() => {
                    Ok(SpecialCommand::RenameSession {
                        id: id.to_string(),
                        title: title.trim().to_string(),
                    })
                }
                _ => Err(CommandError::MissingArgument {
                    command: "/rename".to_string(),
                    usage: usage.to_string(),
                }),
            }
        }
        "/delete" => {
            require_arg("/delete", "/delete <id>", rest).map(SpecialCommand::DeleteSession)
        }
        "/clear" => no_arg("/clear", rest, SpecialCommand::ClearHistory),
        "/history" => no_arg("/history", rest, SpecialCommand::ShowHistory),
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(trimmed.to_string())),
    }
}

/// Print the help text for interactive chat mode
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat Mode
===========================================

SESSIONS:
  /new [title]          - Start a new session and switch to it
  /sessions             - List sessions (newest first, * marks current)
  /switch <id>          - Switch to a session
  /rename <id> <title>  - Rename a session
  /delete <id>          - Delete a session and its history

HISTORY:
  /history        - Show the current session's history
  /clear          - Clear the current session's history

OTHER:
  /help           - Show this help message
  /?              - Same as /help
  /exit           - Exit interactive mode
  exit, quit      - Same as /exit

NOTES:
  - Session ids may be shortened to any unique prefix
  - Regular text (not starting with /) is sent to the chat backend
  - Edits to the config file take effect on the next message
"#
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(
            parse_special_command("what is rust?").unwrap(),
            SpecialCommand::None
        );
        assert_eq!(
            parse_special_command("  exit now please").unwrap(),
            SpecialCommand::None
        );
    }

    #[test]
    fn test_exit_aliases() {
        for input in ["exit", "QUIT", "/exit", "/quit", "  /Exit  "] {
            assert_eq!(
                parse_special_command(input).unwrap(),
                SpecialCommand::Exit,
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_new_session() {
        assert_eq!(
            parse_special_command("/new").unwrap(),
            SpecialCommand::NewSession(None)
        );
        assert_eq!(
            parse_special_command("/NEW  My Title ").unwrap(),
            SpecialCommand::NewSession(Some("My Title".to_string()))
        );
    }

    #[test]
    fn test_list_sessions() {
        assert_eq!(
            parse_special_command("/sessions").unwrap(),
            SpecialCommand::ListSessions
        );
        assert_eq!(
            parse_special_command("/list").unwrap(),
            SpecialCommand::ListSessions
        );
        assert!(matches!(
            parse_special_command("/sessions all"),
            Err(CommandError::UnsupportedArgument { .. })
        ));
    }

    #[test]
    fn test_switch_keeps_id_case() {
        assert_eq!(
            parse_special_command("/switch AbC123").unwrap(),
            SpecialCommand::SwitchSession("AbC123".to_string())
        );
    }

    #[test]
    fn test_switch_requires_id() {
        let err = parse_special_command("/switch").unwrap_err();
        assert_eq!(
            err,
            CommandError::MissingArgument {
                command: "/switch".to_string(),
                usage: "/switch <id>".to_string(),
            }
        );
    }

    #[test]
    fn test_rename() {
        assert_eq!(
            parse_special_command("/rename ab12 Weekly Sync").unwrap(),
            SpecialCommand::RenameSession {
                id: "ab12".to_string(),
                title: "Weekly Sync".to_string(),
            }
        );
        assert!(parse_special_command("/rename ab12").is_err());
        assert!(parse_special_command("/rename").is_err());
    }

    #[test]
    fn test_delete() {
        assert_eq!(
            parse_special_command("/delete ab12").unwrap(),
            SpecialCommand::DeleteSession("ab12".to_string())
        );
        assert!(parse_special_command("/delete").is_err());
    }

    #[test]
    fn test_history_commands() {
        assert_eq!(
            parse_special_command("/clear").unwrap(),
            SpecialCommand::ClearHistory
        );
        assert_eq!(
            parse_special_command("/history").unwrap(),
            SpecialCommand::ShowHistory
        );
        assert!(parse_special_command("/clear everything").is_err());
    }

    #[test]
    fn test_help_aliases() {
        assert_eq!(parse_special_command("/help").unwrap(), SpecialCommand::Help);
        assert_eq!(parse_special_command("/?").unwrap(), SpecialCommand::Help);
    }

    #[test]
    fn test_unknown_command() {
        let err = parse_special_command("/frobnicate now").unwrap_err();
        assert_eq!(
            err,
            CommandError::UnknownCommand("/frobnicate now".to_string())
        );
        assert!(err.to_string().contains("/help"));
    }
}
