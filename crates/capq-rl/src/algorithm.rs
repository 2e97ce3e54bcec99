//! Q-table and the tabular Q-learning update rule

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use capq_core::{CapqError, Result, StateId};

use crate::reward::RewardMode;

/// Learning rate used by the reference configuration
pub const DEFAULT_ALPHA: f64 = 0.1;
/// Discount factor used by the reference configuration
pub const DEFAULT_GAMMA: f64 = 0.9;
/// Number of training episodes per run
pub const DEFAULT_EPISODES: usize = 2000;
/// Default reward penalization factor
pub const DEFAULT_PENALIZATION: u32 = 10;

/// Floor of the best next-action value, and its value for a state with no actions
pub const DEAD_END_MAX_Q: f64 = 0.0;

/// Parameters of a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningParams {
    /// Learning rate
    pub alpha: f64,
    /// Discount factor
    pub gamma: f64,
    /// Number of training episodes
    pub episodes: usize,
    /// Scales the maximum reward; its rounded square root divides the shaping slope
    pub penalization: u32,
    pub reward_mode: RewardMode,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            gamma: DEFAULT_GAMMA,
            episodes: DEFAULT_EPISODES,
            penalization: DEFAULT_PENALIZATION,
            reward_mode: RewardMode::default(),
            seed: None,
        }
    }
}

impl LearningParams {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(CapqError::InvalidParameter(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(CapqError::InvalidParameter(format!(
                "gamma must be within [0, 1], got {}",
                self.gamma
            )));
        }
        if self.episodes == 0 {
            return Err(CapqError::InvalidParameter(
                "at least one episode is required".to_string(),
            ));
        }
        if self.penalization == 0 {
            return Err(CapqError::InvalidParameter(
                "penalization factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Square table of learned values indexed by (state, action)
#[derive(Debug, Clone, PartialEq)]
pub struct QTable {
    values: Array2<f64>,
}

impl QTable {
    /// All-zero table for `states` states
    pub fn new(states: usize) -> Self {
        Self {
            values: Array2::zeros((states, states)),
        }
    }

    pub fn get(&self, state: StateId, action: StateId) -> f64 {
        self.values[[state.index(), action.index()]]
    }

    pub fn set(&mut self, state: StateId, action: StateId, value: f64) {
        self.values[[state.index(), action.index()]] = value;
    }

    /// Best value over the given actions of `state`, floored at [`DEAD_END_MAX_Q`].
    ///
    /// Returns the floor when `actions` is empty.
    pub fn max_q(&self, state: StateId, actions: &[StateId]) -> f64 {
        actions
            .iter()
            .map(|&a| self.get(state, a))
            .fold(DEAD_END_MAX_Q, f64::max)
    }

    /// Action with the highest value, first one wins on ties
    pub fn best_action(&self, state: StateId, actions: &[StateId]) -> Option<StateId> {
        let mut best: Option<(StateId, f64)> = None;
        for &action in actions {
            let value = self.get(state, action);
            match best {
                Some((_, best_value)) if value <= best_value => {}
                _ => best = Some((action, value)),
            }
        }
        best.map(|(action, _)| action)
    }

    /// Apply `Q(s,a) += alpha * (r + gamma * max_q - Q(s,a))` and return the new value
    pub fn update(
        &mut self,
        state: StateId,
        action: StateId,
        reward: i64,
        max_q: f64,
        alpha: f64,
        gamma: f64,
    ) -> f64 {
        let q = self.get(state, action);
        let value = q + alpha * (reward as f64 + gamma * max_q - q);
        self.set(state, action, value);
        value
    }

    /// Values for every action of `state`
    pub fn row(&self, state: StateId) -> ArrayView1<'_, f64> {
        self.values.row(state.index())
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Number of states covered by the table
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }
}
