//! States and the state-space builder

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::error::{CapqError, Result};
use crate::machine::{Configuration, MachineKind, MachinePool};

/// 1-based, dense state identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateId(pub usize);

impl StateId {
    /// State id for a 0-based row/column index
    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    /// 0-based row/column index into per-state tables
    pub fn index(self) -> usize {
        self.0 - 1
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A distinct resource configuration in the enumerated space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub id: StateId,
    pub configuration: Configuration,
    /// Copied from the configuration
    pub capacity: u32,
}

impl State {
    pub fn new(id: StateId, configuration: Configuration) -> Self {
        let capacity = configuration.capacity();
        Self {
            id,
            configuration,
            capacity,
        }
    }
}

/// Every non-empty sub-multiset of a machine pool, one state each
#[derive(Debug, Clone, Serialize)]
pub struct StateSpace {
    pool: MachinePool,
    states: Vec<State>,
}

impl StateSpace {
    /// Enumerate the power set of the pool's units.
    ///
    /// Subsets are produced by a binary counter over the unit list where bit
    /// `i` selects unit `i`. Counter value 0 (the empty subset) is skipped, so
    /// counter value `k` becomes state `k`.
    pub fn build(pool: MachinePool) -> Result<Self> {
        let units = pool.units();
        let subsets: u64 = 1 << units.len();
        let mut states = Vec::with_capacity((subsets - 1) as usize);

        for mask in 1..subsets {
            let mut counts: BTreeMap<usize, u32> = BTreeMap::new();
            for (bit, &kind) in units.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    *counts.entry(kind).or_insert(0) += 1;
                }
            }
            let configuration = Configuration::new(counts, pool.kinds())?;
            let state = State::new(StateId(mask as usize), configuration);
            trace!(
                state = %state.id,
                capacity = state.capacity,
                "Built state"
            );
            states.push(state);
        }

        info!(
            states = states.len(),
            units = units.len(),
            kinds = pool.kinds().len(),
            "Built state space"
        );

        Ok(Self { pool, states })
    }

    pub fn pool(&self) -> &MachinePool {
        &self.pool
    }

    pub fn kinds(&self) -> &[MachineKind] {
        self.pool.kinds()
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn get(&self, id: StateId) -> Option<&State> {
        id.0.checked_sub(1).and_then(|i| self.states.get(i))
    }

    /// Like [`StateSpace::get`], failing with `UnknownState`
    pub fn state(&self, id: StateId) -> Result<&State> {
        self.get(id).ok_or(CapqError::UnknownState(id))
    }

    /// Iterate over all state ids in order
    pub fn ids(&self) -> impl Iterator<Item = StateId> + '_ {
        self.states.iter().map(|s| s.id)
    }

    /// Render as `State 3: capacity=3 [M1*1, M2*1]`
    pub fn describe(&self, state: &State) -> String {
        format!(
            "State {}: capacity={} {}",
            state.id,
            state.capacity,
            state.configuration.describe(self.kinds())
        )
    }
}

/// Build the state space for parallel lists of kind names and max unit counts.
pub fn build_states<S: AsRef<str>>(names: &[S], max_units: &[u32]) -> Result<StateSpace> {
    StateSpace::build(MachinePool::new(names, max_units)?)
}
