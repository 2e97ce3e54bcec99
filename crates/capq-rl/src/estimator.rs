//! Policy-driven step estimators used as convergence diagnostics
//!
//! Both estimators follow the greedy policy from a state and count hops,
//! giving up after `max_depth` hops with the `sentinel` value.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use capq_core::{ActionGraph, CapqError, Result, StateId, StateSpace};

use crate::algorithm::QTable;

/// Bounds and thresholds for the step estimators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorParams {
    /// Hops followed before giving up
    pub max_depth: usize,
    /// Returned when `max_depth` is exceeded
    pub sentinel: u32,
    /// A state is near the goal when `|capacity - target| < near_band`
    pub near_band: u32,
}

impl Default for EstimatorParams {
    fn default() -> Self {
        Self {
            max_depth: 50,
            sentinel: 1000,
            near_band: 3,
        }
    }
}

/// Read-only view over a trained (or training) Q-table
pub struct StepEstimator<'a> {
    space: &'a StateSpace,
    graph: &'a ActionGraph,
    q: &'a QTable,
    is_goal: &'a [bool],
    goal_capacity: u32,
    params: EstimatorParams,
}

impl<'a> StepEstimator<'a> {
    pub fn new(
        space: &'a StateSpace,
        graph: &'a ActionGraph,
        q: &'a QTable,
        is_goal: &'a [bool],
        goal_capacity: u32,
        params: EstimatorParams,
    ) -> Self {
        Self {
            space,
            graph,
            q,
            is_goal,
            goal_capacity,
            params,
        }
    }

    /// Greedy action of `state`, or `state` itself when it has no actions
    pub fn policy(&self, state: StateId) -> StateId {
        self.q
            .best_action(state, self.graph.actions(state))
            .unwrap_or(state)
    }

    /// Hops until a goal state is reached.
    ///
    /// Reaching `from` again counts as done.
    pub fn step_to_goal<R: Rng + ?Sized>(
        &self,
        from: Option<StateId>,
        state: StateId,
        count: usize,
        rng: &mut R,
    ) -> Result<u32> {
        if count > self.params.max_depth {
            return Ok(self.params.sentinel);
        }
        if from == Some(state) || self.is_goal(state) {
            return Ok(0);
        }

        let to = self.next_hop(from, state, rng)?;
        Ok(1 + self.step_to_goal(Some(state), to, count + 1, rng)?)
    }

    /// Hops until a state within `near_band` of the target capacity is reached.
    pub fn step_to_near_goal<R: Rng + ?Sized>(
        &self,
        from: Option<StateId>,
        state: StateId,
        count: usize,
        rng: &mut R,
    ) -> Result<u32> {
        if self.is_near_goal(state)? {
            return Ok(0);
        }
        if count > self.params.max_depth {
            return Ok(self.params.sentinel);
        }
        if from == Some(state) || self.is_goal(state) {
            return Ok(0);
        }

        let to = self.next_hop(from, state, rng)?;
        Ok(1 + self.step_to_near_goal(Some(state), to, count + 1, rng)?)
    }

    fn is_goal(&self, state: StateId) -> bool {
        self.is_goal.get(state.index()).copied().unwrap_or(false)
    }

    fn is_near_goal(&self, state: StateId) -> Result<bool> {
        let capacity = self.space.state(state)?.capacity;
        Ok(capacity.abs_diff(self.goal_capacity) < self.params.near_band)
    }

    /// Follow the policy unless it leads back to `from` or stays put; then pick
    /// uniformly among the actions that do neither.
    fn next_hop<R: Rng + ?Sized>(
        &self,
        from: Option<StateId>,
        state: StateId,
        rng: &mut R,
    ) -> Result<StateId> {
        let to = self.policy(state);
        if from != Some(to) && to != state {
            return Ok(to);
        }

        let alternatives: Vec<StateId> = self
            .graph
            .actions(state)
            .iter()
            .copied()
            .filter(|&a| from != Some(a) && a != state)
            .collect();

        alternatives
            .choose(rng)
            .copied()
            .ok_or(CapqError::NoAlternativeAction { state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use capq_core::{build_states, Adjacency, GraphOptions};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixture {
        space: StateSpace,
        adjacency: Adjacency,
        q: QTable,
    }

    impl Fixture {
        fn new(names: &[&str], max_units: &[u32]) -> Self {
            let space = build_states(names, max_units).unwrap();
            let adjacency = Adjacency::build(&space, GraphOptions::default());
            let q = QTable::new(space.len());
            Self {
                space,
                adjacency,
                q,
            }
        }

        fn goals(&self, capacity: u32) -> Vec<bool> {
            let mut goals = vec![false; self.space.len()];
            for id in self.adjacency.capacity_index.states_with(capacity) {
                goals[id.index()] = true;
            }
            goals
        }

        fn estimator<'a>(
            &'a self,
            goals: &'a [bool],
            capacity: u32,
            params: EstimatorParams,
        ) -> StepEstimator<'a> {
            StepEstimator::new(&self.space, &self.adjacency.graph, &self.q, goals, capacity, params)
        }
    }

    #[test]
    fn test_goal_state_needs_no_steps() {
        let fixture = Fixture::new(&["M1", "M2"], &[1, 1]);
        let goals = fixture.goals(2);
        let estimator = fixture.estimator(&goals, 2, EstimatorParams::default());
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(estimator.step_to_goal(None, StateId(2), 0, &mut rng).unwrap(), 0);
    }

    #[test]
    fn test_step_to_goal_detours_around_predecessor() {
        let mut fixture = Fixture::new(&["M1", "M2"], &[1, 1]);
        // Policy of state 3 points back to state 1
        fixture.q.set(StateId(3), StateId(1), 5.0);
        let goals = fixture.goals(2);
        let estimator = fixture.estimator(&goals, 2, EstimatorParams::default());
        let mut rng = StdRng::seed_from_u64(1);

        // 1 -> 3, then 3 -> 2 instead of returning to 1
        assert_eq!(estimator.step_to_goal(None, StateId(1), 0, &mut rng).unwrap(), 2);
    }

    #[test]
    fn test_step_to_goal_reaching_predecessor_counts_as_done() {
        let fixture = Fixture::new(&["M1", "M2"], &[1, 1]);
        let goals = fixture.goals(2);
        let estimator = fixture.estimator(&goals, 2, EstimatorParams::default());
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(
            estimator.step_to_goal(Some(StateId(1)), StateId(1), 0, &mut rng).unwrap(),
            0
        );
    }

    #[test]
    fn test_depth_bound_returns_sentinel() {
        let fixture = Fixture::new(&["M1", "M2"], &[1, 1]);
        let goals = fixture.goals(2);
        let params = EstimatorParams {
            max_depth: 0,
            ..Default::default()
        };
        let estimator = fixture.estimator(&goals, 2, params);
        let mut rng = StdRng::seed_from_u64(1);

        // One hop from 1 to 3, then the bound is exceeded
        assert_eq!(estimator.step_to_goal(None, StateId(1), 0, &mut rng).unwrap(), 1001);
        assert_eq!(estimator.step_to_goal(None, StateId(1), 1, &mut rng).unwrap(), 1000);
    }

    #[test]
    fn test_dead_end_without_alternative() {
        let fixture = Fixture::new(&["M1", "M2"], &[1, 1]);
        // The only action of state 1 leads back to state 3
        let goals = vec![false; 3];
        let estimator = fixture.estimator(&goals, 3, EstimatorParams::default());
        let mut rng = StdRng::seed_from_u64(1);

        let err = estimator
            .step_to_goal(Some(StateId(3)), StateId(1), 0, &mut rng)
            .unwrap_err();
        assert!(matches!(err, CapqError::NoAlternativeAction { state: StateId(1) }));
    }

    #[test]
    fn test_near_goal_band() {
        let fixture = Fixture::new(&["M1", "M2", "M3"], &[2, 2, 2]);
        let goals = fixture.goals(12);
        let estimator = fixture.estimator(&goals, 12, EstimatorParams::default());
        let mut rng = StdRng::seed_from_u64(3);

        for state in fixture.space.states() {
            let steps = estimator
                .step_to_near_goal(None, state.id, 0, &mut rng)
                .unwrap();
            if state.capacity.abs_diff(12) < 3 {
                assert_eq!(steps, 0, "state {}", state.id);
            } else {
                assert!(steps > 0, "state {}", state.id);
            }
        }
    }

    #[test]
    fn test_near_goal_checked_before_depth() {
        let fixture = Fixture::new(&["M1", "M2"], &[1, 1]);
        let goals = fixture.goals(3);
        let estimator = fixture.estimator(&goals, 3, EstimatorParams::default());
        let mut rng = StdRng::seed_from_u64(1);

        // Capacity 1 is within the band of 3 even past the depth bound
        assert_eq!(
            estimator.step_to_near_goal(None, StateId(1), 100, &mut rng).unwrap(),
            0
        );
        assert_eq!(estimator.step_to_goal(None, StateId(1), 100, &mut rng).unwrap(), 1000);
    }

    #[test]
    fn test_policy_without_actions_is_self() {
        let fixture = Fixture::new(&["M1"], &[1]);
        let goals = fixture.goals(1);
        let estimator = fixture.estimator(&goals, 1, EstimatorParams::default());
        assert_eq!(estimator.policy(StateId(1)), StateId(1));
    }
}
