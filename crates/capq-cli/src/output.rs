//! Result file writers

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use capq_core::StateId;
use capq_rl::{ConvergenceTrace, EngineStats, PolicyEntry, QLearningEngine, RewardMode};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Episodes averaged into [`RunSummary::tail_mean_steps`]
pub const SUMMARY_TAIL_WINDOW: usize = 100;

/// Machine-readable record of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub types: Vec<String>,
    pub max_units: Vec<u32>,
    pub goal_capacity: u32,
    pub penalization: u32,
    pub reward_mode: RewardMode,
    pub states: usize,
    pub edges: usize,
    pub goal_states: Vec<StateId>,
    pub final_mean_steps: Option<f64>,
    /// Mean of the last [`SUMMARY_TAIL_WINDOW`] trace samples
    pub tail_mean_steps: Option<f64>,
    pub stats: EngineStats,
    pub policy: Vec<PolicyEntry>,
}

/// One `episode<TAB>mean` line per sample, means always carrying a decimal point
pub fn write_trace<W: Write>(mut w: W, trace: &ConvergenceTrace) -> std::io::Result<()> {
    for sample in trace.iter() {
        writeln!(w, "{}\t{:?}", sample.episode, sample.mean_steps)?;
    }
    w.flush()
}

/// One row per state: its description followed by every Q-value
pub fn write_q_matrix<W: Write>(mut w: W, engine: &QLearningEngine<'_>) -> std::io::Result<()> {
    let space = engine.space();
    for state in space.states() {
        write!(w, "out from {}:", space.describe(state))?;
        for value in engine.q_table().row(state.id) {
            write!(w, "\t{value:.2}")?;
        }
        writeln!(w)?;
    }
    w.flush()
}

/// `from<TAB>to` for every state in the policy table
pub fn write_policy<W: Write>(mut w: W, policy: &[PolicyEntry]) -> std::io::Result<()> {
    writeln!(w, "from\tto")?;
    for entry in policy {
        writeln!(w, "{}\t{}", entry.from, entry.to)?;
    }
    w.flush()
}

pub fn write_summary<W: Write>(w: W, summary: &RunSummary) -> Result<()> {
    serde_json::to_writer_pretty(w, summary).context("Failed to serialize run summary")
}

/// Create `path` and hand a buffered writer to `write`
pub fn to_file<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(BufWriter<File>) -> Result<()>,
{
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write(BufWriter::new(file)).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}
