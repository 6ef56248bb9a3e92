//! Navigation system for the cart AGV
//!
//! This module turns "current cell + remaining targets" into drive commands:
//! breadth-first path planning over the occupancy grid, translation of paths into
//! robot-relative commands, and the mission executor that drains them.

pub mod controller;
pub mod executor;
pub mod planner;
pub mod resolver;

pub use controller::MissionController;
pub use executor::{ExecutorConfig, MissionCapabilities, MissionExecutor, MissionStatus};
pub use planner::{PathPlanner, PlannedRoute};
pub use resolver::DirectionResolver;

use std::time::Duration;

use crate::core::Cell;
use crate::interface::TransportError;

/// Ordered run of 4-connected cells from a start cell to a goal cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    cells: Vec<Cell>,
}

impl Path {
    /// Wraps `cells` as-is; `DirectionResolver` rejects anything that is not a chain of
    /// unit steps
    pub fn new(cells: Vec<Cell>) -> Self {
        Path { cells }
    }

    /// Zero-move path
    pub fn single(cell: Cell) -> Self {
        Path { cells: vec![cell] }
    }

    /// Cells in travel order, `cells()[0]` is the start
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// First cell
    pub fn start(&self) -> Option<Cell> {
        self.cells.first().copied()
    }

    /// Last cell
    pub fn goal(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    /// Number of cells, start included
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the path has no cells at all
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of unit moves
    pub fn moves(&self) -> usize {
        self.cells.len().saturating_sub(1)
    }
}

/// Navigation error types
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    /// No remaining target is reachable from the current cell
    #[error("no path from {start} to any of {goals} target(s)")]
    NotFound {
        /// Cell the search started from
        start: Cell,
        /// Number of candidate goals tried
        goals: usize,
    },

    /// Consecutive path cells are not a unit 4-connected step
    #[error("invalid path: step {index} from {from} to {to} is not a unit move")]
    InvalidPath {
        /// Index of the offending step
        index: usize,
        /// Cell the step leaves
        from: Cell,
        /// Cell the step enters
        to: Cell,
    },

    /// Line tracer never reported the AGV centred
    #[error("line alignment timed out after {0:?}")]
    AlignmentTimeout(Duration),

    /// Drive link failure
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Mission aborted
    #[error("mission failed: {0}")]
    MissionFailed(String),
}
