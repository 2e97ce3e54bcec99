//! Action graph over the state space
//!
//! Two configurations are "near" when they differ by at most one unit of one
//! machine kind. Every near pair of states becomes a directed action.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::machine::Configuration;
use crate::state::{State, StateId, StateSpace};

/// Check whether two configurations are at most one unit apart.
///
/// Sums per-kind count differences, first over the kinds of `a` and then over
/// the kinds only present in `b`, and stops as soon as the sum exceeds 1.
pub fn are_near(a: &Configuration, b: &Configuration) -> bool {
    let mut distance = 0u32;

    for (kind, &count) in a.units() {
        distance += count.abs_diff(b.count(*kind));
        if distance > 1 {
            return false;
        }
    }

    for (kind, &count) in b.units() {
        if a.count(*kind) == 0 {
            distance += count;
        }
        if distance > 1 {
            return false;
        }
    }

    true
}

/// Options for action graph construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphOptions {
    /// Link every state to itself
    pub self_loops: bool,
}

/// Directly reachable states for every state, indexed by state id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionGraph {
    actions: Vec<Vec<StateId>>,
}

impl ActionGraph {
    /// Actions available from `state`, empty for unknown ids
    pub fn actions(&self, state: StateId) -> &[StateId] {
        state
            .0
            .checked_sub(1)
            .and_then(|i| self.actions.get(i))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of states with an entry
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Total number of directed edges
    pub fn edge_count(&self) -> usize {
        self.actions.iter().map(Vec::len).sum()
    }

    pub fn contains(&self, from: StateId, to: StateId) -> bool {
        self.actions(from).contains(&to)
    }

    /// Iterate over `(state, actions)` in state id order
    pub fn iter(&self) -> impl Iterator<Item = (StateId, &[StateId])> + '_ {
        self.actions
            .iter()
            .enumerate()
            .map(|(i, a)| (StateId::from_index(i), a.as_slice()))
    }
}

/// States grouped by capacity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapacityIndex {
    by_capacity: BTreeMap<u32, Vec<StateId>>,
}

impl CapacityIndex {
    pub fn insert(&mut self, state: &State) {
        self.by_capacity
            .entry(state.capacity)
            .or_default()
            .push(state.id);
    }

    /// States with exactly this capacity, in state id order
    pub fn states_with(&self, capacity: u32) -> &[StateId] {
        self.by_capacity
            .get(&capacity)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Distinct capacities in ascending order
    pub fn capacities(&self) -> impl Iterator<Item = u32> + '_ {
        self.by_capacity.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.by_capacity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_capacity.is_empty()
    }
}

/// Action graph and capacity index produced in one pass over the states
#[derive(Debug, Clone, Serialize)]
pub struct Adjacency {
    pub graph: ActionGraph,
    pub capacity_index: CapacityIndex,
}

impl Adjacency {
    /// Evaluate the near predicate for every ordered pair of states.
    pub fn build(space: &StateSpace, options: GraphOptions) -> Self {
        let states = space.states();
        let mut actions = Vec::with_capacity(states.len());
        let mut capacity_index = CapacityIndex::default();

        for from in states {
            capacity_index.insert(from);

            let reachable: Vec<StateId> = states
                .iter()
                .filter(|to| options.self_loops || to.id != from.id)
                .filter(|to| are_near(&from.configuration, &to.configuration))
                .map(|to| to.id)
                .collect();

            debug!(state = %from.id, actions = reachable.len(), "Inserted actions");
            actions.push(reachable);
        }

        let graph = ActionGraph { actions };
        info!(
            states = graph.len(),
            edges = graph.edge_count(),
            capacities = capacity_index.len(),
            "Built action graph"
        );

        Self {
            graph,
            capacity_index,
        }
    }
}
