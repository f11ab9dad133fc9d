//! Command handlers for the intone CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod config;
pub mod replay;

use anyhow::Result;
use std::path::Path;

use intone::Config;

/// Load the config from an explicit path, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}
