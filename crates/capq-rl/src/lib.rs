//! CAPQ RL - Tabular Q-learning toward a target capacity
//!
//! This crate trains a Q-table over the action graph built by `capq-core`
//! and exposes the learned policy along with convergence diagnostics.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::float_cmp)]
#![allow(clippy::similar_names)]
#![allow(clippy::module_name_repetitions)]

pub mod algorithm;
pub mod engine;
pub mod estimator;
pub mod reward;
pub mod trace;

pub use algorithm::{LearningParams, QTable};
pub use engine::{EngineStats, PolicyEntry, QLearningEngine};
pub use estimator::{EstimatorParams, StepEstimator};
pub use reward::{RewardMatrix, RewardMode};
pub use trace::{ConvergenceTrace, TraceSample};
