//! Boundaries to the rest of the AGV
//!
//! This module holds everything the navigation core talks to but does not own:
//! - the drive controller, which receives newline-terminated ASCII command tokens
//! - the perception subsystem, which delivers position fixes and line corrections
//! - the operator console, a line-based request protocol used by the binary

mod actuator;
mod console;
mod perception;

pub use actuator::*;
pub use console::*;
pub use perception::*;

/// Failure to hand a token to the drive layer
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Underlying writer failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The drive link has been shut down
    #[error("drive link closed")]
    Closed,
}
