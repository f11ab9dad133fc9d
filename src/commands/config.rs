//! Config subcommands handler

use anyhow::{bail, Context, Result};
use std::path::Path;

use intone::Config;

/// Show current configuration as TOML.
pub fn handle_show(path: Option<&Path>) -> Result<()> {
    let config = super::load_config(path)?;
    let toml_str = toml::to_string_pretty(&config).context("Failed to serialize config")?;
    print!("{}", toml_str);
    Ok(())
}

/// Write the default configuration.
pub fn handle_init(force: bool, path: Option<&Path>) -> Result<()> {
    let target = match path {
        Some(path) => path.to_path_buf(),
        None => Config::config_path()?,
    };

    if target.exists() && !force {
        bail!(
            "Config file already exists: {}\nUse --force to overwrite it.",
            target.display()
        );
    }

    Config::default().save_to(&target)?;
    println!("Wrote default config to {}", target.display());
    Ok(())
}

/// Print the config file location.
pub fn handle_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}
