//! Configuration loading for the CAPQ CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use capq_core::{GraphOptions, MachinePool};
use capq_rl::{EstimatorParams, LearningParams, RewardMode};
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

/// Configuration for a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pool: PoolConfig,
    pub learning: LearningConfig,
    pub graph: GraphOptions,
    pub estimator: EstimatorParams,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub types: Vec<String>,
    pub max_units: Vec<u32>,
    /// Per-unit capacity of each kind; defaults to the 1-based position
    pub weights: Option<Vec<u32>>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            types: ["M1", "M2", "M3", "M4"].map(String::from).to_vec(),
            max_units: vec![3, 3, 3, 3],
            weights: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub goal_capacity: u32,
    pub penalization: u32,
    /// Reward only the edges entering goal states
    pub only_goal: bool,
    pub episodes: usize,
    pub alpha: f64,
    pub gamma: f64,
    pub seed: Option<u64>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        let params = LearningParams::default();
        Self {
            goal_capacity: 20,
            penalization: params.penalization,
            only_goal: false,
            episodes: params.episodes,
            alpha: params.alpha,
            gamma: params.gamma,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub trace_file: String,
    pub q_matrix_file: String,
    pub policy_file: String,
    pub summary_file: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            trace_file: "res.csv".to_string(),
            q_matrix_file: "q_matrix.tsv".to_string(),
            policy_file: "policy.tsv".to_string(),
            summary_file: None,
        }
    }
}

impl OutputConfig {
    pub fn trace_path(&self) -> PathBuf {
        self.dir.join(&self.trace_file)
    }

    pub fn q_matrix_path(&self) -> PathBuf {
        self.dir.join(&self.q_matrix_file)
    }

    pub fn policy_path(&self) -> PathBuf {
        self.dir.join(&self.policy_file)
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// An explicit `path` must exist; otherwise the standard locations are
    /// searched and a missing file falls back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ConfigBuilder::<config::builder::DefaultState>::default();

        match path {
            Some(path) => {
                tracing::info!("Loading config from: {:?}", path);
                builder = builder.add_source(File::from(path.to_path_buf()).required(true));
            }
            None => {
                if let Some(path) = Self::find_config_file() {
                    tracing::info!("Loading config from: {:?}", path);
                    builder = builder.add_source(File::from(path).required(false));
                } else {
                    tracing::debug!("No config file found, using defaults");
                }
            }
        }

        // Add environment variables with CAPQ__ prefix
        builder = builder.add_source(
            Environment::with_prefix("CAPQ")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("pool.types")
                .with_list_parse_key("pool.max_units")
                .with_list_parse_key("pool.weights"),
        );

        let config = builder.build()?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Find the configuration file
    fn find_config_file() -> Option<PathBuf> {
        // Check in order: ./capq.toml, ~/.config/capq/capq.toml
        let local = PathBuf::from("capq.toml");
        if local.exists() {
            return Some(local);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("capq").join("capq.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }

    /// Validated machine pool for the configured kinds
    pub fn machine_pool(&self) -> Result<MachinePool> {
        let pool = match &self.pool.weights {
            Some(weights) => {
                MachinePool::with_weights(&self.pool.types, &self.pool.max_units, weights)
            }
            None => MachinePool::new(&self.pool.types, &self.pool.max_units),
        };
        pool.context("Invalid machine pool")
    }

    pub fn learning_params(&self) -> LearningParams {
        LearningParams {
            alpha: self.learning.alpha,
            gamma: self.learning.gamma,
            episodes: self.learning.episodes,
            penalization: self.learning.penalization,
            reward_mode: if self.learning.only_goal {
                RewardMode::GoalOnly
            } else {
                RewardMode::Shaped
            },
            seed: self.learning.seed,
        }
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_run() {
        let config = Config::default();
        assert_eq!(config.pool.types, vec!["M1", "M2", "M3", "M4"]);
        assert_eq!(config.pool.max_units, vec![3, 3, 3, 3]);
        assert_eq!(config.learning.goal_capacity, 20);
        assert_eq!(config.learning.penalization, 10);
        assert_eq!(config.learning.episodes, 2000);
        assert!(!config.learning.only_goal);
        assert!(!config.graph.self_loops);
        assert_eq!(config.estimator.max_depth, 50);
        assert_eq!(config.output.trace_path(), PathBuf::from("./res.csv"));
    }

    #[test]
    fn test_learning_params_mode() {
        let mut config = Config::default();
        assert_eq!(config.learning_params().reward_mode, RewardMode::Shaped);

        config.learning.only_goal = true;
        assert_eq!(config.learning_params().reward_mode, RewardMode::GoalOnly);
    }

    #[test]
    fn test_machine_pool_from_config() {
        let mut config = Config::default();
        let pool = config.machine_pool().unwrap();
        assert_eq!(pool.total_units(), 12);

        config.pool.weights = Some(vec![5, 5, 5, 5]);
        let pool = config.machine_pool().unwrap();
        assert!(pool.kinds().iter().all(|k| k.weight() == 5));

        config.pool.max_units = vec![1];
        assert!(config.machine_pool().is_err());
    }

    #[test]
    fn test_toml_roundtrip_keeps_sections() {
        let config = Config::default();
        let rendered = config.to_toml().unwrap();
        assert!(rendered.contains("[pool]"));
        assert!(rendered.contains("[learning]"));
        assert!(rendered.contains("goal_capacity = 20"));

        let parsed: Config = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed.pool.max_units, config.pool.max_units);
        assert_eq!(parsed.learning.goal_capacity, 20);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capq.toml");
        std::fs::write(
            &path,
            "[pool]\ntypes = [\"A\", \"B\"]\nmax_units = [2, 1]\n\n[learning]\ngoal_capacity = 3\nonly_goal = true\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.pool.types, vec!["A", "B"]);
        assert_eq!(config.pool.max_units, vec![2, 1]);
        assert_eq!(config.learning.goal_capacity, 3);
        assert!(config.learning.only_goal);
        // Untouched sections keep their defaults
        assert_eq!(config.learning.episodes, 2000);
        assert_eq!(config.output.trace_file, "res.csv");
    }

    #[test]
    fn test_load_missing_explicit_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("absent.toml"))).is_err());
    }
}
