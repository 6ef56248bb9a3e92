// src/interface/perception.rs
// Signals consumed from the perception subsystem: authoritative position fixes from
// floor markers, and line-centering corrections from the line tracer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::Cell;

/// Decoded floor marker: the AGV is on `cell`. Overrides any dead-reckoned position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionFix {
    /// Confirmed cell
    pub cell: Cell,
}

impl PositionFix {
    /// Fix at `(row, col)`
    pub fn new(row: usize, col: usize) -> Self {
        PositionFix {
            cell: Cell::new(row, col),
        }
    }
}

/// Which way the line tracer wants the AGV to steer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineDirection {
    /// Centred, keep going
    Forward,
    /// Drifted right of the line
    Left,
    /// Drifted left of the line
    Right,
}

impl LineDirection {
    /// Nudge token sent to the drive controller
    pub fn token(self) -> &'static str {
        match self {
            LineDirection::Forward => "F",
            LineDirection::Left => "L",
            LineDirection::Right => "R",
        }
    }
}

impl fmt::Display for LineDirection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for LineDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "F" => Ok(LineDirection::Forward),
            "L" => Ok(LineDirection::Left),
            "R" => Ok(LineDirection::Right),
            other => Err(format!("unknown line direction '{}'", other)),
        }
    }
}

/// One reading of the line tracer
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCorrection {
    /// Suggested steering
    pub direction: LineDirection,
    /// Whether the AGV is centred on the line
    pub aligned: bool,
}

impl LineCorrection {
    /// Reading where the tracer only reports a direction; centred means `Forward`
    pub fn from_direction(direction: LineDirection) -> Self {
        LineCorrection {
            direction,
            aligned: direction == LineDirection::Forward,
        }
    }
}

/// Source of line corrections polled during a forward command
#[cfg_attr(test, mockall::automock)]
pub trait LineFollower {
    /// Latest reading, `None` when no line is visible or no frame is available
    fn poll(&mut self) -> Option<LineCorrection>;
}

/// Latest-value mailbox between a line tracer running elsewhere and the executor.
/// Cloning shares the same slot.
#[derive(Clone, Default)]
pub struct SharedLineSignal {
    latest: Arc<Mutex<Option<LineCorrection>>>,
}

impl SharedLineSignal {
    /// Empty mailbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a new reading, replacing the previous one
    pub fn publish(&self, correction: LineCorrection) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Some(correction);
    }

    /// Forgets the last reading (line lost)
    pub fn clear(&self) {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl LineFollower for SharedLineSignal {
    fn poll(&mut self) -> Option<LineCorrection> {
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
