//! Q-learning engine - Coordinates training episodes and policy queries

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, trace};

use capq_core::{ActionGraph, Adjacency, CapqError, Result, StateId, StateSpace};

use crate::algorithm::{LearningParams, QTable};
use crate::estimator::{EstimatorParams, StepEstimator};
use crate::reward::RewardMatrix;
use crate::trace::ConvergenceTrace;

/// Greedy transition chosen for a state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PolicyEntry {
    pub from: StateId,
    pub to: StateId,
}

/// Engine statistics
#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineStats {
    pub episodes: usize,
    pub total_steps: u64,
    pub last_mean_steps: Option<f64>,
}

/// Tabular Q-learning over a fixed state space and action graph.
///
/// The reward matrix is frozen at construction; the Q-table is the only
/// state mutated by training.
pub struct QLearningEngine<'a> {
    space: &'a StateSpace,
    graph: &'a ActionGraph,
    goal_capacity: u32,
    goal_states: Vec<StateId>,
    is_goal: Vec<bool>,
    touched: Vec<bool>,
    rewards: RewardMatrix,
    q: QTable,
    params: LearningParams,
    estimator: EstimatorParams,
    stats: EngineStats,
}

impl<'a> QLearningEngine<'a> {
    /// Set up rewards and an all-zero Q-table for `goal_capacity`.
    ///
    /// Fails with `NoGoalStates` when no state has exactly that capacity.
    pub fn new(
        space: &'a StateSpace,
        adjacency: &'a Adjacency,
        goal_capacity: u32,
        params: LearningParams,
    ) -> Result<Self> {
        info!("Creating Q-learning engine");
        params.validate()?;

        let goal_states = adjacency.capacity_index.states_with(goal_capacity).to_vec();
        if goal_states.is_empty() {
            return Err(CapqError::NoGoalStates {
                capacity: goal_capacity,
            });
        }

        let mut is_goal = vec![false; space.len()];
        for goal in &goal_states {
            is_goal[goal.index()] = true;
        }

        let rewards = RewardMatrix::build(
            space,
            &adjacency.graph,
            &goal_states,
            goal_capacity,
            params.penalization,
            params.reward_mode,
        )?;

        Ok(Self {
            space,
            graph: &adjacency.graph,
            goal_capacity,
            touched: is_goal.clone(),
            goal_states,
            is_goal,
            rewards,
            q: QTable::new(space.len()),
            params,
            estimator: EstimatorParams::default(),
            stats: EngineStats::default(),
        })
    }

    /// Replace the step estimator bounds
    pub fn with_estimator(mut self, estimator: EstimatorParams) -> Self {
        self.estimator = estimator;
        self
    }

    /// Train for the configured number of episodes, seeding the RNG from
    /// `params.seed` when set.
    pub fn run(&mut self) -> Result<ConvergenceTrace> {
        let mut rng = match self.params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        self.run_with_rng(&mut rng)
    }

    /// Train for the configured number of episodes.
    ///
    /// After each episode the mean steps-to-near-goal over all states is
    /// recorded in the returned trace.
    pub fn run_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<ConvergenceTrace> {
        info!(
            states = self.space.len(),
            goals = self.goal_states.len(),
            episodes = self.params.episodes,
            "Q-learning is running"
        );

        let mut trace = ConvergenceTrace::with_capacity(self.params.episodes);
        for episode in 0..self.params.episodes {
            let start = StateId::from_index(rng.gen_range(0..self.space.len()));
            let steps = self.train_episode(start, rng)?;

            let mean = self.mean_steps_to_near_goal(rng)?;
            trace.push(episode, mean);
            self.stats.last_mean_steps = Some(mean);

            debug!(episode, start = %start, steps, mean, "Episode complete");
        }

        info!(
            episodes = self.stats.episodes,
            total_steps = self.stats.total_steps,
            final_mean = ?self.stats.last_mean_steps,
            "Training complete"
        );

        Ok(trace)
    }

    /// Run one episode from `start` until a goal state is reached.
    ///
    /// Returns the number of transitions taken. Entering a non-goal state
    /// without actions fails with `EmptyActionSet`.
    pub fn train_episode<R: Rng + ?Sized>(&mut self, start: StateId, rng: &mut R) -> Result<usize> {
        self.space.state(start)?;
        let graph = self.graph;
        let (alpha, gamma) = (self.params.alpha, self.params.gamma);

        let mut state = start;
        let mut steps = 0;
        while !self.is_goal(state) {
            self.touched[state.index()] = true;

            let action = *graph
                .actions(state)
                .choose(rng)
                .ok_or(CapqError::EmptyActionSet { state })?;

            let max_q = self.q.max_q(action, graph.actions(action));
            let reward = self.rewards.get(state, action);
            let value = self.q.update(state, action, reward, max_q, alpha, gamma);
            trace!(state = %state, action = %action, reward, max_q, value, "Q update");

            state = action;
            steps += 1;
        }

        self.stats.episodes += 1;
        self.stats.total_steps += steps as u64;
        Ok(steps)
    }

    /// Mean of `step_to_near_goal` over all states, counting 0 as 1
    pub fn mean_steps_to_near_goal<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        let estimator = self.estimator();
        let mut sum = 0.0;
        for id in self.space.ids() {
            let steps = estimator.step_to_near_goal(None, id, 0, rng)?.max(1);
            sum += f64::from(steps);
        }
        Ok(sum / self.space.len() as f64)
    }

    /// Policy-driven hops from `state` to a goal state
    pub fn step_to_goal<R: Rng + ?Sized>(&self, state: StateId, rng: &mut R) -> Result<u32> {
        self.space.state(state)?;
        self.estimator().step_to_goal(None, state, 0, rng)
    }

    /// Policy-driven hops from `state` to a state near the target capacity
    pub fn step_to_near_goal<R: Rng + ?Sized>(&self, state: StateId, rng: &mut R) -> Result<u32> {
        self.space.state(state)?;
        self.estimator().step_to_near_goal(None, state, 0, rng)
    }

    /// Action with the highest Q-value, or `state` itself when it has no actions
    pub fn policy(&self, state: StateId) -> Result<StateId> {
        self.space.state(state)?;
        Ok(self.estimator().policy(state))
    }

    /// Policy of every goal state and every state visited during training
    pub fn policy_table(&self) -> Vec<PolicyEntry> {
        let estimator = self.estimator();
        self.space
            .ids()
            .filter(|id| self.touched[id.index()])
            .map(|from| PolicyEntry {
                from,
                to: estimator.policy(from),
            })
            .collect()
    }

    pub fn is_goal(&self, state: StateId) -> bool {
        self.is_goal.get(state.index()).copied().unwrap_or(false)
    }

    /// Whether the state is a goal or was visited during training
    pub fn is_touched(&self, state: StateId) -> bool {
        self.touched.get(state.index()).copied().unwrap_or(false)
    }

    pub fn goal_states(&self) -> &[StateId] {
        &self.goal_states
    }

    pub fn goal_capacity(&self) -> u32 {
        self.goal_capacity
    }

    pub fn q_table(&self) -> &QTable {
        &self.q
    }

    pub fn rewards(&self) -> &RewardMatrix {
        &self.rewards
    }

    pub fn params(&self) -> &LearningParams {
        &self.params
    }

    pub fn space(&self) -> &StateSpace {
        self.space
    }

    pub fn graph(&self) -> &ActionGraph {
        self.graph
    }

    pub fn stats(&self) -> &EngineStats {
        &self.stats
    }

    fn estimator(&self) -> StepEstimator<'_> {
        StepEstimator::new(
            self.space,
            self.graph,
            &self.q,
            &self.is_goal,
            self.goal_capacity,
            self.estimator,
        )
    }
}
