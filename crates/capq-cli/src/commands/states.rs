//! Inspect the state space and action graph without training

use std::io::Write;

use anyhow::{Context, Result};
use capq_core::{Adjacency, StateSpace};
use clap::Args;
use serde::Serialize;

use super::PoolArgs;
use crate::settings::Config;

#[derive(Args, Debug, Default)]
pub struct StatesArgs {
    #[command(flatten)]
    pub pool: PoolArgs,

    /// Print as JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct StatesReport<'a> {
    space: &'a StateSpace,
    adjacency: &'a Adjacency,
}

pub fn run(args: StatesArgs, mut config: Config) -> Result<()> {
    let json = args.json;
    args.pool.apply(&mut config);

    let space = StateSpace::build(config.machine_pool()?).context("Failed to build state space")?;
    let adjacency = Adjacency::build(&space, config.graph);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        let report = StatesReport {
            space: &space,
            adjacency: &adjacency,
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        print_text(&mut out, &space, &adjacency)?;
    }
    Ok(())
}

fn print_text<W: Write>(mut w: W, space: &StateSpace, adjacency: &Adjacency) -> Result<()> {
    writeln!(w, "{} states, {} edges", space.len(), adjacency.graph.edge_count())?;
    writeln!(w)?;

    for state in space.states() {
        let actions = adjacency.graph.actions(state.id);
        let targets: Vec<String> = actions.iter().map(ToString::to_string).collect();
        writeln!(w, "{} -> [{}]", space.describe(state), targets.join(", "))?;
    }

    writeln!(w)?;
    writeln!(w, "By capacity:")?;
    for capacity in adjacency.capacity_index.capacities() {
        let ids: Vec<String> = adjacency
            .capacity_index
            .states_with(capacity)
            .iter()
            .map(ToString::to_string)
            .collect();
        writeln!(w, "  {capacity}: {}", ids.join(", "))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use capq_core::{build_states, GraphOptions};

    #[test]
    fn test_text_listing() {
        let space = build_states(&["M1", "M2"], &[1, 1]).unwrap();
        let adjacency = Adjacency::build(&space, GraphOptions::default());

        let mut buf = Vec::new();
        print_text(&mut buf, &space, &adjacency).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.starts_with("3 states, 4 edges\n"));
        assert!(text.contains("State 1: capacity=1 [M1*1] -> [3]\n"));
        assert!(text.contains("State 3: capacity=3 [M1*1, M2*1] -> [1, 2]\n"));
        assert!(text.contains("  2: 2\n"));
    }

    #[test]
    fn test_json_report_fields() {
        let space = build_states(&["M1"], &[2]).unwrap();
        let adjacency = Adjacency::build(&space, GraphOptions::default());
        let report = StatesReport {
            space: &space,
            adjacency: &adjacency,
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["space"]["states"].as_array().unwrap().len(), 3);
        assert!(json["adjacency"]["graph"].is_object());
    }
}
