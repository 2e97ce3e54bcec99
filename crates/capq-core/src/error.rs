//! Error types for CAPQ

use thiserror::Error;

use crate::state::StateId;

/// Main error type for CAPQ
#[derive(Error, Debug)]
pub enum CapqError {
    #[error("Invalid machine specification: {0}")]
    InvalidSpec(String),

    #[error("Invalid learning parameter: {0}")]
    InvalidParameter(String),

    #[error("State {state} has no outgoing actions and is not a goal state")]
    EmptyActionSet { state: StateId },

    #[error("State {state} has no action other than returning to its predecessor")]
    NoAlternativeAction { state: StateId },

    #[error("No state has the target capacity {capacity}")]
    NoGoalStates { capacity: u32 },

    #[error("Unknown state: {0}")]
    UnknownState(StateId),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CAPQ operations
pub type Result<T> = std::result::Result<T, CapqError>;
