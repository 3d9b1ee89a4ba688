//! Vapor - chat sessions for an HTTP chat backend
//!
#![doc = "Main entry point for the Vapor CLI."]

use anyhow::Result;

use vapor::cli::{Cli, Commands};
use vapor::commands::{self, Environment};
use vapor::logging::{init_logging, LoggingOptions};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_logging(&LoggingOptions::from_flags(
        cli.verbose,
        cli.json_logs,
        cli.log_file.clone(),
    ))?;

    let env = Environment::resolve(cli.data_dir.clone(), cli.workspace.clone())?;

    // Execute command
    match cli.command {
        Commands::Chat { no_watch } => {
            tracing::info!("Starting interactive chat mode");
            if no_watch {
                tracing::debug!("Config watching disabled");
            }
            commands::chat::run_chat(&env, !no_watch).await?;
            Ok(())
        }
        Commands::Sessions { command } => {
            tracing::debug!("Running session command: {:?}", command);
            commands::sessions::handle_sessions(&env, command)?;
            Ok(())
        }
        Commands::Config { command } => {
            commands::config_cmd::handle_config(&env, command)?;
            Ok(())
        }
    }
}
