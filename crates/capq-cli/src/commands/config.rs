//! Configuration management commands

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;

use crate::settings::Config;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

pub fn run(cmd: ConfigCommands, config: &Config) -> Result<()> {
    match cmd {
        ConfigCommands::Show => show(config),
        ConfigCommands::Init { force } => init(force),
    }
}

fn show(config: &Config) -> Result<()> {
    println!("Current Configuration");
    println!("=====================\n");
    println!("{}", config.to_toml()?);
    Ok(())
}

fn init(force: bool) -> Result<()> {
    let config_path = "capq.toml";

    if Path::new(config_path).exists() && !force {
        println!("Configuration file already exists: {config_path}");
        println!("Use --force to overwrite");
        return Ok(());
    }

    std::fs::write(config_path, Config::default().to_toml()?)?;
    println!("Configuration file created: {config_path}");

    Ok(())
}
