use crate::cli::SessionCommand;
use crate::commands::Environment;
use crate::controller::SessionController;
use crate::error::{is_session_not_found, Result};
use crate::storage::{ChatEntry, Sender, SessionSummary};
use colored::Colorize;
use prettytable::{format, Table};

const ID_WIDTH: usize = 8;
const TITLE_WIDTH: usize = 40;

fn short_id(id: &str) -> &str {
    id.get(..ID_WIDTH).unwrap_or(id)
}

fn truncate_title(title: &str) -> String {
    if title.chars().count() > TITLE_WIDTH {
        let head: String = title.chars().take(TITLE_WIDTH - 3).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// Print sessions as a table, marking the current one
pub fn print_sessions(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("{}", "No sessions found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);

    table.add_row(prettytable::row![
        "".bold(),
        "ID".bold(),
        "Title".bold(),
        "Created".bold(),
        "Last Updated".bold()
    ]);

    for summary in sessions {
        let session = &summary.session;
        let marker = if summary.is_current { "*" } else { "" };
        table.add_row(prettytable::row![
            marker.green(),
            short_id(&session.id).cyan(),
            truncate_title(&session.title),
            session.created_at.format("%Y-%m-%d %H:%M").to_string(),
            session.updated_at.format("%Y-%m-%d %H:%M").to_string()
        ]);
    }

    println!("\nSessions:");
    table.printstd();
    println!();
}

/// Print a session transcript
pub fn print_history(history: &[ChatEntry]) {
    if history.is_empty() {
        println!("{}", "(no messages yet)".dimmed());
        return;
    }
    for entry in history {
        match entry.sender {
            Sender::User => println!("{} {}", "you>".cyan().bold(), entry.text),
            Sender::Bot => println!("{} {}", "bot>".green().bold(), entry.text),
        }
    }
    println!();
}

/// Handle session management commands
pub fn handle_sessions(env: &Environment, command: SessionCommand) -> Result<()> {
    let mut controller = env.open_controller(env.config_store())?;
    run_session_command(&mut controller, command)
}

/// Run one session command against an open controller
pub fn run_session_command(
    controller: &mut SessionController,
    command: SessionCommand,
) -> Result<()> {
    match command {
        SessionCommand::List { json } => {
            let sessions = controller.list_sessions();
            if json {
                println!("{}", serde_json::to_string_pretty(&sessions)?);
            } else {
                print_sessions(&sessions);
                println!(
                    "Use {} to continue a session.",
                    "vapor sessions switch <ID>".cyan()
                );
                println!();
            }
        }
        SessionCommand::New { title } => {
            let session = controller.new_session(title.as_deref())?;
            println!(
                "{}",
                format!("Created session {} ({})", short_id(&session.id), session.title).green()
            );
        }
        SessionCommand::Switch { id } => {
            let id = controller.resolve_session_id(&id)?;
            controller.switch_session(&id)?;
            println!("{}", format!("Switched to session {}", short_id(&id)).green());
        }
        SessionCommand::Rename { id, title } => {
            let renamed = match controller.resolve_session_id(&id) {
                Ok(id) => controller.rename_session(&id, &title)?.then_some(id),
                Err(e) if is_session_not_found(&e) => None,
                Err(e) => return Err(e),
            };
            match renamed {
                Some(id) => println!(
                    "{}",
                    format!("Renamed session {} to {}", short_id(&id), title).green()
                ),
                None => println!(
                    "{}",
                    format!("No session matches {}; nothing renamed.", id).yellow()
                ),
            }
        }
        SessionCommand::Delete { id } => {
            let id = controller.resolve_session_id(&id)?;
            let removed = controller.delete_session(&id)?;
            println!(
                "{}",
                format!("Deleted session {} ({})", short_id(&removed.id), removed.title).green()
            );
        }
        SessionCommand::History => {
            print_history(&controller.get_history());
        }
        SessionCommand::Prune => {
            let removed = controller.prune()?;
            if removed.is_empty() {
                println!("{}", "Nothing to prune.".yellow());
            } else {
                println!(
                    "{}",
                    format!("Removed {} session(s)", removed.len()).green()
                );
            }
        }
    }

    Ok(())
}
