//! Reward matrix initialization

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use capq_core::{ActionGraph, CapqError, Result, StateId, StateSpace};

/// How rewards are assigned to the edges of the action graph
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardMode {
    /// Every edge is rewarded by how close its destination is to the target capacity
    #[default]
    Shaped,
    /// Only edges entering a goal state are rewarded
    GoalOnly,
}

/// Frozen integer rewards indexed by (state, action)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardMatrix {
    values: Array2<i64>,
    goal_capacity: u32,
    max_reward: i64,
    penalty: i64,
}

impl RewardMatrix {
    /// Build the reward matrix for a target capacity.
    ///
    /// `max_reward = (goal_capacity - 1) * penalization` and
    /// `penalty = round(sqrt(penalization))`. Entries not in the graph stay 0.
    pub fn build(
        space: &StateSpace,
        graph: &ActionGraph,
        goal_states: &[StateId],
        goal_capacity: u32,
        penalization: u32,
        mode: RewardMode,
    ) -> Result<Self> {
        let penalty = f64::from(penalization).sqrt().round() as i64;
        if penalty < 1 {
            return Err(CapqError::InvalidParameter(
                "penalization factor must be at least 1".to_string(),
            ));
        }

        let max_reward = (i64::from(goal_capacity) - 1)
            .checked_mul(i64::from(penalization))
            .ok_or_else(|| {
                CapqError::InvalidParameter(format!(
                    "maximum reward overflows for target {goal_capacity} and penalization {penalization}"
                ))
            })?;

        let n = space.len();
        let mut matrix = Self {
            values: Array2::zeros((n, n)),
            goal_capacity,
            max_reward,
            penalty,
        };

        match mode {
            RewardMode::GoalOnly => {
                for &goal in goal_states {
                    for &s in graph.actions(goal) {
                        matrix.values[[s.index(), goal.index()]] = matrix.max_reward;
                    }
                }
            }
            RewardMode::Shaped => {
                for (state, actions) in graph.iter() {
                    for &action in actions {
                        let capacity = space.state(action)?.capacity;
                        let reward = matrix.shaped_reward(capacity)?;
                        matrix.values[[state.index(), action.index()]] = reward;
                        debug!(from = %state, to = %action, reward, "Reward");
                    }
                }
            }
        }

        info!(
            ?mode,
            max_reward = matrix.max_reward,
            penalty = matrix.penalty,
            "Initialized reward matrix"
        );

        Ok(matrix)
    }

    /// Shaped reward for moving into a state with `capacity`.
    ///
    /// Integer arithmetic: `max_reward / penalty` truncates before scaling, so
    /// destinations far from the target get negative rewards. Fails with
    /// `InvalidParameter` when the result does not fit in an `i64`.
    pub fn shaped_reward(&self, capacity: u32) -> Result<i64> {
        let gap = (i64::from(self.goal_capacity) - i64::from(capacity)).abs();
        (self.max_reward / self.penalty)
            .checked_mul(gap)
            .and_then(|scaled| self.max_reward.checked_sub(scaled))
            .ok_or_else(|| {
                CapqError::InvalidParameter(format!(
                    "shaped reward overflows for capacity {capacity}"
                ))
            })
    }

    pub fn get(&self, state: StateId, action: StateId) -> i64 {
        self.values[[state.index(), action.index()]]
    }

    pub fn max_reward(&self) -> i64 {
        self.max_reward
    }

    pub fn penalty(&self) -> i64 {
        self.penalty
    }

    pub fn values(&self) -> &Array2<i64> {
        &self.values
    }
}
