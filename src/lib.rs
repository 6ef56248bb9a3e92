//! Cart AGV - grid navigation and mission execution
//!
//! This library drives a line-following shopping-cart AGV across a grid floor:
//! breadth-first path planning to the nearest remaining target, translation of the
//! path into robot-relative drive commands, and a mission executor that reacts to
//! position fixes from floor markers and feeds the drive controller.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod core;
pub mod interface;
pub mod navigation;

// Re-export commonly used items for easier access
pub use crate::core::{Cell, Command, ExecutionState, GridMap, Heading, TargetSet};
pub use interface::{
    Actuator, ConsoleRequest, LineCorrection, LineDirection, LineFollower, PositionFix,
    SerialActuator, SharedLineSignal, TransportError,
};
pub use navigation::{
    DirectionResolver, ExecutorConfig, MissionCapabilities, MissionController, MissionExecutor,
    MissionStatus, NavigationError, Path, PathPlanner, PlannedRoute,
};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Main configuration structure, usually loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgvConfig {
    /// Occupancy rows, `0` free and `1` blocked
    pub grid: Vec<Vec<u8>>,
    /// Cell the AGV is parked on at startup
    pub initial_cell: Cell,
    /// Heading at startup
    pub initial_heading: Heading,
    /// Targets installed at startup; empty leaves the executor idle
    pub initial_mission: Vec<Cell>,
    /// Control loop period
    pub cycle_ms: u64,
    /// Command pacing and planning limits
    pub executor: ExecutorConfig,
    /// Optional robot behaviours
    pub capabilities: MissionCapabilities,
    /// Drive link settings
    pub actuator: ActuatorConfig,
}

/// Drive link configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    /// Device node the command tokens are written to; stdout when absent
    pub device: Option<String>,
}

impl Default for AgvConfig {
    fn default() -> Self {
        AgvConfig {
            grid: vec![
                vec![0, 0, 0, 0, 0, 0, 0],
                vec![0, 1, 0, 1, 0, 1, 0],
                vec![0, 0, 0, 0, 0, 0, 0],
                vec![0, 1, 0, 1, 0, 1, 0],
                vec![0, 0, 0, 0, 0, 0, 0],
                vec![0, 1, 1, 1, 1, 1, 0],
                vec![0, 0, 0, 0, 0, 0, 0],
            ],
            initial_cell: Cell::new(6, 0),
            initial_heading: Heading::Up,
            initial_mission: vec![Cell::new(0, 1), Cell::new(0, 3), Cell::new(0, 5)],
            cycle_ms: 50,
            executor: ExecutorConfig::default(),
            capabilities: MissionCapabilities::default(),
            actuator: ActuatorConfig::default(),
        }
    }
}

impl AgvConfig {
    /// Parses and validates a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AgvConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a YAML file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Checks the grid shape and that the AGV starts inside it
    pub fn validate(&self) -> Result<()> {
        let grid = self.grid_map()?;
        if !grid.contains(self.initial_cell) {
            return Err(AgvError::Config(format!(
                "initial cell {} is outside the {}x{} grid",
                self.initial_cell,
                grid.rows(),
                grid.cols()
            )));
        }
        if !grid.free(self.initial_cell) {
            log::warn!("Initial cell {} is marked blocked", self.initial_cell);
        }
        Ok(())
    }

    /// Builds the occupancy grid
    pub fn grid_map(&self) -> Result<GridMap> {
        GridMap::from_rows(&self.grid)
    }

    /// Builds an executor parked at the initial cell, with the configured pacing and
    /// capabilities and the initial mission installed
    pub fn build_executor<A, L>(&self, actuator: A, follower: L) -> Result<MissionExecutor<A, L>>
    where
        A: Actuator,
        L: LineFollower,
    {
        self.validate()?;
        let grid = Arc::new(self.grid_map()?);
        let mut executor = MissionExecutor::new(
            grid,
            self.initial_cell,
            self.initial_heading,
            actuator,
            follower,
        )
        .with_config(self.executor.clone())
        .with_capabilities(self.capabilities.clone());

        if !self.initial_mission.is_empty() {
            executor.on_mission_start(self.initial_mission.clone());
        }
        Ok(executor)
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AgvError>;

/// Top-level error types
#[derive(Debug, thiserror::Error)]
pub enum AgvError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed YAML
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File or device I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed console request
    #[error("Parse error: {0}")]
    Parse(String),

    /// Navigation failure
    #[error("Navigation error: {0}")]
    Navigation(#[from] NavigationError),
}
