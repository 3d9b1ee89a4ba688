//! Interactive chat mode handler.
//!
//! Opens the workspace's current session, starts the config watcher, and
//! runs a readline-based loop. Plain lines are sent to the backend; lines
//! starting with `/` are session commands.

use crate::commands::sessions::{print_history, print_sessions};
use crate::commands::special_commands::{parse_special_command, print_help, SpecialCommand};
use crate::commands::Environment;
use crate::config::Settings;
use crate::controller::{ChatView, SessionController};
use crate::error::{is_session_not_found, Result};
use crate::storage::{ChatEntry, SessionSummary};
use crate::watcher::ConfigWatcher;
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, ExternalPrinter};
use std::sync::{Arc, Mutex};

/// Presentation layer writing to the terminal
#[derive(Debug, Default)]
pub struct TerminalView;

impl ChatView for TerminalView {
    fn reply(&self, entry: &ChatEntry) {
        println!("\n{}\n", entry.text);
    }

    fn restore_history(&self, history: &[ChatEntry]) {
        print_history(history);
    }

    fn show_sessions(&self, sessions: &[SessionSummary]) {
        print_sessions(sessions);
    }

    fn session_changed(&self, session_id: &str) {
        println!("{}", format!("Now in session {}", session_id).cyan());
    }
}

/// What the loop should do after a special command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    /// Keep reading input
    Continue,
    /// Leave the chat
    Exit,
}

/// Execute a parsed special command against the controller
///
/// Session ids may be given as unique prefixes.
///
/// # Errors
///
/// Returns the controller's error, e.g. `SessionNotFound` for an unknown
/// id; the loop reports it and keeps going.
pub fn execute_special_command(
    controller: &mut SessionController,
    command: SpecialCommand,
) -> Result<LoopAction> {
    match command {
        SpecialCommand::NewSession(title) => {
            controller.new_session(title.as_deref())?;
        }
        SpecialCommand::ListSessions => {
            controller.show_session_list();
        }
        SpecialCommand::SwitchSession(prefix) => {
            let id = controller.resolve_session_id(&prefix)?;
            controller.switch_session(&id)?;
        }
        SpecialCommand::RenameSession { id, title } => {
            let renamed = match controller.resolve_session_id(&id) {
                Ok(resolved) => controller.rename_session(&resolved, &title)?,
                Err(e) if is_session_not_found(&e) => false,
                Err(e) => return Err(e),
            };
            if !renamed {
                println!(
                    "{}",
                    format!("No session matches {}; nothing renamed.", id).yellow()
                );
            }
        }
        SpecialCommand::DeleteSession(prefix) => {
            let id = controller.resolve_session_id(&prefix)?;
            let removed = controller.delete_session(&id)?;
            println!("{}", format!("Deleted session \"{}\"", removed.title).green());
        }
        SpecialCommand::ClearHistory => {
            controller.clear_history()?;
            println!("{}", "History cleared.".green());
        }
        SpecialCommand::ShowHistory => {
            print_history(&controller.get_history());
        }
        SpecialCommand::Help => print_help(),
        SpecialCommand::Exit => return Ok(LoopAction::Exit),
        SpecialCommand::None => {}
    }
    Ok(LoopAction::Continue)
}

fn print_welcome_banner(controller: &SessionController) {
    let settings = controller.config().settings();
    let title = controller
        .current_session()
        .map(|s| s.title)
        .unwrap_or_default();

    println!("\n{}", "Vapor Interactive Chat".bold());
    println!("Workspace: {}", controller.workspace_key());
    println!("Session:   {} ({})", title.cyan(), controller.current_session_id());
    match settings.endpoint.as_deref() {
        Some(endpoint) => println!("Backend:   {} {}", settings.backend_kind, endpoint),
        None => println!("Backend:   {}", "not configured".yellow()),
    }
    println!("Type '/help' for available commands, '/exit' to quit\n");
}

/// One-line summary shown when the config file is reloaded
fn reload_notice(settings: &Settings) -> String {
    let backend = match settings.endpoint.as_deref() {
        Some(endpoint) => format!("{} {}", settings.backend_kind, endpoint),
        None => "not configured".to_string(),
    };
    format!("[config reloaded: {}]", backend)
}

/// Start interactive chat mode
///
/// # Arguments
///
/// * `env` - Data root and workspace to chat in
/// * `watch` - Reload the config file when it changes on disk
///
/// # Errors
///
/// Returns an error if the session files cannot be opened or the terminal
/// cannot be initialised.
pub async fn run_chat(env: &Environment, watch: bool) -> Result<()> {
    let config = env.config_store();

    let _watcher = if watch {
        match ConfigWatcher::start(config.clone()) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                tracing::warn!("Config file will not be reloaded: {:#}", e);
                None
            }
        }
    } else {
        None
    };

    let mut rl = DefaultEditor::new()?;

    // Reload notices arrive on the watcher task; print them without
    // clobbering the line being edited.
    let _subscription = match rl.create_external_printer() {
        Ok(printer) => {
            let printer = Mutex::new(printer);
            config.on_change(move |settings| {
                let mut printer = printer.lock().unwrap_or_else(|e| e.into_inner());
                if let Err(e) = printer.print(reload_notice(settings).dimmed().to_string()) {
                    tracing::debug!("Failed to print reload notice: {}", e);
                }
            })
        }
        Err(e) => {
            tracing::debug!("No external printer available: {}", e);
            config.on_change(|settings| tracing::info!("{}", reload_notice(settings)))
        }
    };

    let mut controller = env.open_controller(config)?;
    let pruned = controller.prune()?;
    if !pruned.is_empty() {
        tracing::info!("Pruned {} stale session(s)", pruned.len());
    }

    let view: Arc<dyn ChatView> = Arc::new(TerminalView);
    controller.set_view(&view);

    print_welcome_banner(&controller);
    let history = controller.get_history();
    if !history.is_empty() {
        print_history(&history);
    }

    loop {
        match rl.readline(&format!("{} ", "vapor>".bold())) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(trimmed) {
                    tracing::debug!("Failed to record line history: {}", e);
                }

                match parse_special_command(trimmed) {
                    Ok(SpecialCommand::None) => {}
                    Ok(command) => {
                        match execute_special_command(&mut controller, command) {
                            Ok(LoopAction::Exit) => break,
                            Ok(LoopAction::Continue) => {}
                            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
                        }
                        continue;
                    }
                    Err(e) => {
                        eprintln!("{}", e.to_string().red());
                        continue;
                    }
                }

                // The reply is printed by the view
                if let Err(e) = controller.send_user_message(trimmed).await {
                    eprintln!("{}", format!("Error: {}", e).red());
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
