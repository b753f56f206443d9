//! Show where configuration comes from and what is in effect

use anyhow::{Context, Result};
use clap::Parser;

use claimdesk_core::DeskConfig;

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Print only the config file path
    #[arg(long)]
    pub path: bool,
}

/// Effective config with the anon key masked
pub fn render_config(config: &DeskConfig) -> Result<String> {
    let mut shown = config.clone();
    if let Some(key) = shown.backend.anon_key.as_mut() {
        *key = "<redacted>".to_string();
    }
    toml::to_string_pretty(&shown).context("Failed to serialize config")
}

pub fn run_config(args: ConfigArgs, config: &DeskConfig) -> Result<()> {
    let path = DeskConfig::config_path();
    if args.path {
        println!("{}", path.display());
        return Ok(());
    }

    let status = if path.exists() { "" } else { " (not found)" };
    println!("# config file: {}{}", path.display(), status);
    print!("{}", render_config(config)?);
    Ok(())
}
