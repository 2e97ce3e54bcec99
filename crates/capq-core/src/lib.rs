//! CAPQ Core - Machine pools, state space and action graph
//!
//! This crate enumerates every resource configuration reachable from a pool
//! of machine units and links configurations that are one unit apart.

// Clippy pedantic allows - these are intentional design choices
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]

pub mod adjacency;
pub mod error;
pub mod machine;
pub mod state;

pub use adjacency::{are_near, ActionGraph, Adjacency, CapacityIndex, GraphOptions};
pub use error::{CapqError, Result};
pub use machine::{Configuration, MachineKind, MachinePool, MAX_TOTAL_UNITS};
pub use state::{build_states, State, StateId, StateSpace};
