// core/mod.rs

// Leaf data model shared by the planner, the executor and the interfaces: grid cells
// and the occupancy map, compass headings and drive commands, the target list, and
// execution states.

pub mod grid;
pub mod heading;
pub mod state;
pub mod targets;

pub use grid::{Cell, GridMap};
pub use heading::{Command, Heading};
pub use state::ExecutionState;
pub use targets::TargetSet;
