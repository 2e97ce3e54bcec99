//! Build the state space, train, and write results

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use capq_core::{Adjacency, StateSpace};
use capq_rl::QLearningEngine;
use chrono::Utc;
use clap::Args;
use tracing::info;

use super::PoolArgs;
use crate::output::{self, RunSummary};
use crate::settings::Config;

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub pool: PoolArgs,

    /// Target capacity
    #[arg(long)]
    pub goal_capacity: Option<u32>,

    /// Reward penalization factor
    #[arg(long)]
    pub penalization: Option<u32>,

    /// Reward only the edges entering goal states
    #[arg(long)]
    pub only_goal: bool,

    /// Number of training episodes
    #[arg(long)]
    pub episodes: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory for the result files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Also write a JSON run summary to this file
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl RunArgs {
    pub fn apply(self, config: &mut Config) {
        self.pool.apply(config);
        if let Some(goal_capacity) = self.goal_capacity {
            config.learning.goal_capacity = goal_capacity;
        }
        if let Some(penalization) = self.penalization {
            config.learning.penalization = penalization;
        }
        if self.only_goal {
            config.learning.only_goal = true;
        }
        if let Some(episodes) = self.episodes {
            config.learning.episodes = episodes;
        }
        if let Some(seed) = self.seed {
            config.learning.seed = Some(seed);
        }
        if let Some(dir) = self.output_dir {
            config.output.dir = dir;
        }
        if let Some(summary) = self.summary {
            config.output.summary_file = Some(summary);
        }
    }
}

pub fn run(args: RunArgs, mut config: Config) -> Result<()> {
    args.apply(&mut config);

    println!("Starting with the following parameters:");
    println!("- types = {{{}}}", config.pool.types.join(", "));
    println!("- maxmachine = {:?}", config.pool.max_units);
    println!("- goalcpu = {}", config.learning.goal_capacity);
    println!("- penalization = {}", config.learning.penalization);
    println!("- onlygoal = {}", config.learning.only_goal);

    let started_at = Utc::now();
    let begin = Instant::now();

    let pool = config.machine_pool()?;
    let space = StateSpace::build(pool).context("Failed to build state space")?;
    let adjacency = Adjacency::build(&space, config.graph);

    for capacity in adjacency.capacity_index.capacities() {
        tracing::debug!(
            capacity,
            states = ?adjacency.capacity_index.states_with(capacity),
            "States for capacity"
        );
    }

    let mut engine = QLearningEngine::new(
        &space,
        &adjacency,
        config.learning.goal_capacity,
        config.learning_params(),
    )
    .context("Failed to set up Q-learning")?
    .with_estimator(config.estimator);

    let trace = engine.run().context("Training failed")?;
    let policy = engine.policy_table();

    let out = &config.output;
    std::fs::create_dir_all(&out.dir)
        .with_context(|| format!("Failed to create {}", out.dir.display()))?;
    output::to_file(&out.trace_path(), |w| Ok(output::write_trace(w, &trace)?))?;
    output::to_file(&out.q_matrix_path(), |w| Ok(output::write_q_matrix(w, &engine)?))?;
    output::to_file(&out.policy_path(), |w| Ok(output::write_policy(w, &policy)?))?;

    for entry in &policy {
        if let (Some(from), Some(to)) = (space.get(entry.from), space.get(entry.to)) {
            info!("from {} goto {}", space.describe(from), space.describe(to));
        }
    }

    if let Some(path) = &out.summary_file {
        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            types: config.pool.types.clone(),
            max_units: config.pool.max_units.clone(),
            goal_capacity: config.learning.goal_capacity,
            penalization: config.learning.penalization,
            reward_mode: engine.params().reward_mode,
            states: space.len(),
            edges: adjacency.graph.edge_count(),
            goal_states: engine.goal_states().to_vec(),
            final_mean_steps: trace.last().map(|s| s.mean_steps),
            tail_mean_steps: trace.tail_mean(output::SUMMARY_TAIL_WINDOW),
            stats: engine.stats().clone(),
            policy,
        };
        output::to_file(path, |w| output::write_summary(w, &summary))?;
    }

    info!("Time: {:.3} sec.", begin.elapsed().as_secs_f64());
    Ok(())
}
