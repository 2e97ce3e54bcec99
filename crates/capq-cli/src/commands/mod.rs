//! CLI command modules

use clap::Args;

use crate::settings::Config;

pub mod config;
pub mod run;
pub mod states;

/// Machine pool flags shared by commands that build a state space
#[derive(Args, Debug, Default)]
pub struct PoolArgs {
    /// Machine kind names, comma separated (e.g. M1,M2,M3,M4)
    #[arg(long, value_delimiter = ',')]
    pub types: Option<Vec<String>>,

    /// Maximum units per kind, comma separated, same length as --types
    #[arg(long, value_delimiter = ',')]
    pub max_units: Option<Vec<u32>>,

    /// Per-unit capacity of each kind, comma separated
    #[arg(long, value_delimiter = ',')]
    pub weights: Option<Vec<u32>>,

    /// Link every state to itself in the action graph
    #[arg(long)]
    pub self_loops: bool,
}

impl PoolArgs {
    pub fn apply(self, config: &mut Config) {
        if let Some(types) = self.types {
            config.pool.types = types;
        }
        if let Some(max_units) = self.max_units {
            config.pool.max_units = max_units;
        }
        if let Some(weights) = self.weights {
            config.pool.weights = Some(weights);
        }
        if self.self_loops {
            config.graph.self_loops = true;
        }
    }
}
