// src/interface/actuator.rs
// Outbound command stream to the drive controller. Commands are fire-and-forget:
// nothing is read back, so pacing is left to the executor.

use log::{debug, error};
use std::io::Write;

use super::{LineDirection, TransportError};
use crate::core::Command;

/// Capability to drive the physical chassis
#[cfg_attr(test, mockall::automock)]
pub trait Actuator {
    /// Emits one drive command
    fn send(&mut self, command: Command) -> Result<(), TransportError>;

    /// Emits a line-centering nudge during a forward correction loop
    fn correct(&mut self, direction: LineDirection) -> Result<(), TransportError>;
}

/// Writes command tokens, one per line, to any byte sink (a serial device node,
/// stdout, or a buffer in tests)
pub struct SerialActuator<W: Write> {
    writer: W,
    closed: bool,
    sent: usize,
}

impl<W: Write> SerialActuator<W> {
    /// Wraps `writer`
    pub fn new(writer: W) -> Self {
        SerialActuator {
            writer,
            closed: false,
            sent: 0,
        }
    }

    /// Number of tokens written so far
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Borrow the underlying writer
    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Refuses further tokens; later sends fail with `TransportError::Closed`
    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Unwraps the writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_token(&mut self, token: &str) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        let result = self
            .writer
            .write_all(token.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .and_then(|_| self.writer.flush());

        match result {
            Ok(()) => {
                self.sent += 1;
                debug!("Sent token {}", token);
                Ok(())
            }
            Err(e) => {
                error!("Failed to send token {}: {}", token, e);
                Err(e.into())
            }
        }
    }
}

impl<W: Write> Actuator for SerialActuator<W> {
    fn send(&mut self, command: Command) -> Result<(), TransportError> {
        self.write_token(command.token())
    }

    fn correct(&mut self, direction: LineDirection) -> Result<(), TransportError> {
        self.write_token(direction.token())
    }
}
