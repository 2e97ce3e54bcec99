//! CAPQ CLI - learn a capacity planning policy with tabular Q-learning
//!
//! Enumerates every machine configuration of a pool, links configurations
//! one unit apart, and trains a Q-table that moves any configuration toward
//! the target capacity.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::too_many_lines)]

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;
mod settings;

use commands::{run::RunArgs, states::StatesArgs};
use settings::Config;

#[derive(Parser)]
#[command(name = "capq")]
#[command(author, version, about = "CAPQ - capacity planning with Q-learning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./capq.toml or ~/.config/capq/capq.toml)
    #[arg(short, long, global = true, env = "CAPQ_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a policy and write the result files
    Run(RunArgs),

    /// List states, actions and the capacity index
    States(StatesArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(commands::config::ConfigCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("capq={log_level},capq_core={log_level},capq_rl={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => commands::run::run(args, config),
        Commands::States(args) => commands::states::run(args, config),
        Commands::Config(cmd) => commands::config::run(cmd, &config),
    }
}
