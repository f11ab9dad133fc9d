//! intone - CLI entry point

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigCommands};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("INTONE_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            script,
            pretty,
            config,
        } => commands::replay::handle(&script, pretty, config.as_deref()),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { config } => commands::config::handle_show(config.as_deref()),
            ConfigCommands::Init { force, path } => {
                commands::config::handle_init(force, path.as_deref())
            }
            ConfigCommands::Path => commands::config::handle_path(),
        },
    }
}
