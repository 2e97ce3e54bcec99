//! Machine kinds, unit pools and configurations

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CapqError, Result};

/// Largest number of individual units a pool may hold.
///
/// The state space has `2^n - 1` states for `n` units, and the learning
/// tables are square in the state count: 14 units give 16383 states and
/// about 2 GiB per `f64` table.
pub const MAX_TOTAL_UNITS: u32 = 14;

/// A resource unit type and the capacity each unit contributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineKind {
    name: String,
    weight: u32,
}

impl MachineKind {
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Capacity contributed by a single unit of this kind
    pub fn weight(&self) -> u32 {
        self.weight
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Machine {}: weight={}", self.name, self.weight)
    }
}

/// Validated set of machine kinds together with the maximum unit count of each.
///
/// Kinds are identified by their position in the pool, so two kinds may
/// share a name and still be distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachinePool {
    kinds: Vec<MachineKind>,
    max_units: Vec<u32>,
}

impl MachinePool {
    /// Build a pool where the kind at position `i` gets weight `i + 1`.
    pub fn new<S: AsRef<str>>(names: &[S], max_units: &[u32]) -> Result<Self> {
        let weights: Vec<u32> = (1..).take(names.len()).collect();
        Self::with_weights(names, max_units, &weights)
    }

    /// Build a pool with explicit per-unit weights.
    pub fn with_weights<S: AsRef<str>>(
        names: &[S],
        max_units: &[u32],
        weights: &[u32],
    ) -> Result<Self> {
        if names.is_empty() {
            return Err(CapqError::InvalidSpec(
                "at least one machine kind is required".to_string(),
            ));
        }
        if names.len() != max_units.len() {
            return Err(CapqError::InvalidSpec(format!(
                "{} machine kinds but {} max unit counts",
                names.len(),
                max_units.len()
            )));
        }
        if names.len() != weights.len() {
            return Err(CapqError::InvalidSpec(format!(
                "{} machine kinds but {} weights",
                names.len(),
                weights.len()
            )));
        }

        let mut kinds = Vec::with_capacity(names.len());
        for ((name, &max), &weight) in names.iter().zip(max_units).zip(weights) {
            let name = name.as_ref();
            if max == 0 {
                return Err(CapqError::InvalidSpec(format!(
                    "machine kind {name} must allow at least one unit"
                )));
            }
            if weight == 0 {
                return Err(CapqError::InvalidSpec(format!(
                    "machine kind {name} must have a positive weight"
                )));
            }
            kinds.push(MachineKind::new(name, weight));
        }

        let total: u64 = max_units.iter().map(|&m| u64::from(m)).sum();
        if total > u64::from(MAX_TOTAL_UNITS) {
            return Err(CapqError::InvalidSpec(format!(
                "pool holds {total} units, at most {MAX_TOTAL_UNITS} can be enumerated"
            )));
        }

        Ok(Self {
            kinds,
            max_units: max_units.to_vec(),
        })
    }

    pub fn kinds(&self) -> &[MachineKind] {
        &self.kinds
    }

    pub fn max_units(&self) -> &[u32] {
        &self.max_units
    }

    /// Total number of individual units across all kinds
    pub fn total_units(&self) -> usize {
        self.max_units.iter().map(|&m| m as usize).sum()
    }

    /// Flatten the pool into one entry per unit, holding the unit's kind index.
    ///
    /// Units of a kind are contiguous and kinds keep their input order.
    pub fn units(&self) -> Vec<usize> {
        self.max_units
            .iter()
            .enumerate()
            .flat_map(|(kind, &max)| std::iter::repeat(kind).take(max as usize))
            .collect()
    }
}

/// A multiset of machine units, stored as kind index -> unit count.
///
/// Every stored count is at least one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Configuration {
    units: BTreeMap<usize, u32>,
    capacity: u32,
}

impl Configuration {
    /// Create a configuration, dropping zero counts and computing its capacity.
    pub fn new(units: BTreeMap<usize, u32>, kinds: &[MachineKind]) -> Result<Self> {
        let mut capacity = 0u32;
        let mut kept = BTreeMap::new();
        for (kind, count) in units {
            if count == 0 {
                continue;
            }
            let machine = kinds.get(kind).ok_or_else(|| {
                CapqError::InvalidSpec(format!("unknown machine kind index {kind}"))
            })?;
            capacity = machine
                .weight()
                .checked_mul(count)
                .and_then(|c| capacity.checked_add(c))
                .ok_or_else(|| CapqError::InvalidSpec("capacity overflow".to_string()))?;
            kept.insert(kind, count);
        }
        Ok(Self {
            units: kept,
            capacity,
        })
    }

    /// Units per kind index
    pub fn units(&self) -> &BTreeMap<usize, u32> {
        &self.units
    }

    /// Number of units of the given kind, zero when absent
    pub fn count(&self, kind: usize) -> u32 {
        self.units.get(&kind).copied().unwrap_or(0)
    }

    /// Sum of `count * weight` over all kinds
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn total_units(&self) -> u32 {
        self.units.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Render as `[M1*2, M3*1]` using the kind names of the pool.
    pub fn describe(&self, kinds: &[MachineKind]) -> String {
        let parts: Vec<String> = self
            .units
            .iter()
            .map(|(&kind, count)| {
                let name = kinds.get(kind).map_or("?", MachineKind::name);
                format!("{name}*{count}")
            })
            .collect();
        format!("[{}]", parts.join(", "))
    }
}
