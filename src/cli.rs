//! CLI definitions for intone
//!
//! The clap structure lives here, separate from main.rs, so tests can
//! parse argument lists without spawning the binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "intone")]
#[command(about = "Pitch-track re-analysis and candidate splicing")]
#[command(
    long_about = "intone - pitch-track re-analysis and candidate splicing.

Replays scripted annotation sessions against an in-memory document and a
simulated analysis engine, and manages the analysis configuration.

QUICK START:
    intone replay session.toml          Run a session script
    intone config show                  Show the effective configuration
    intone config init                  Write the default configuration"
)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Replay a session script and print the result as JSON
    #[command(long_about = "Replay a session script and print the result as JSON.

The script is TOML: the recording length, initial pitch and note tracks,
what the simulated engine produces, and a list of [[steps]] with an
`action` such as reanalyse, switch, abandon, clear, shift-octave,
take-from or record-to-end.

EXAMPLES:
    intone replay session.toml
    intone replay session.toml --pretty")]
    Replay {
        /// Path to the script
        script: PathBuf,
        /// Pretty-print the JSON report
        #[arg(long)]
        pretty: bool,
        /// Use this config file instead of ~/.config/intone/config.toml
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration as TOML
    Show {
        /// Read this config file instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Write the default configuration
    #[command(long_about = "Write the default configuration file.

Config file location: ~/.config/intone/config.toml

EXAMPLES:
    intone config init
    intone config init --force          Overwrite an existing file")]
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
        /// Write to this path instead of the default location
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Print the config file location
    Path,
}
