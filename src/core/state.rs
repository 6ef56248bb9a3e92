// core/state.rs

// Execution state of the mission executor. Only the executor moves between states;
// everything else sees a copy through the status query.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mission execution states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionState {
    /// No targets, motors stopped
    #[default]
    Idle,
    /// Mission installed, waiting for a first path
    Planning,
    /// Draining the command queue
    Executing,
    /// Position changed or queue drained, next path pending
    Replanning,
    /// Mission aborted, waiting for a new mission
    Failed,
}

impl ExecutionState {
    /// States in which `step()` runs the planner
    pub fn wants_plan(self) -> bool {
        matches!(self, ExecutionState::Planning | ExecutionState::Replanning)
    }

    /// Whether a mission is in progress
    pub fn is_active(self) -> bool {
        !matches!(self, ExecutionState::Idle | ExecutionState::Failed)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
