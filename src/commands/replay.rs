//! Replay command handler

use anyhow::{Context, Result};
use std::path::Path;

use intone::replay::{self, Script};

/// Run a session script and print the report as JSON.
pub fn handle(script_path: &Path, pretty: bool, config_path: Option<&Path>) -> Result<()> {
    let config = super::load_config(config_path)?;
    let script = Script::from_path(script_path)?;

    let report = replay::run(&script, &config)
        .with_context(|| format!("Replay of {} failed", script_path.display()))?;

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", json);
    Ok(())
}
