// src/navigation/resolver.rs
// Translates cell paths into absolute compass moves, and absolute moves into
// robot-relative drive commands.

use super::{NavigationError, Path};
use crate::core::{Command, Heading};

/// Stateless path-to-command translator
pub struct DirectionResolver;

impl DirectionResolver {
    /// One heading per consecutive cell pair.
    ///
    /// Fails with `InvalidPath` on any pair that is not a unit 4-connected step.
    pub fn to_absolute_moves(path: &Path) -> Result<Vec<Heading>, NavigationError> {
        path.cells()
            .windows(2)
            .enumerate()
            .map(|(index, pair)| {
                let (from, to) = (pair[0], pair[1]);
                let dr = to.row as isize - from.row as isize;
                let dc = to.col as isize - from.col as isize;
                Heading::from_delta(dr, dc).ok_or(NavigationError::InvalidPath { index, from, to })
            })
            .collect()
    }

    /// One command per move, starting while facing `start_heading`.
    ///
    /// After each command the running heading is committed to the move's heading, so a
    /// turn is assumed to be followed by the forward motion onto the next cell. The
    /// executor takes care of sequencing the turn and the motion.
    pub fn to_relative_commands(moves: &[Heading], start_heading: Heading) -> Vec<Command> {
        let mut facing = start_heading;
        moves
            .iter()
            .map(|&next| {
                let command = facing.command_towards(next);
                facing = next;
                command
            })
            .collect()
    }

    /// Both steps at once
    pub fn resolve(path: &Path, start_heading: Heading) -> Result<Vec<Command>, NavigationError> {
        let moves = Self::to_absolute_moves(path)?;
        Ok(Self::to_relative_commands(&moves, start_heading))
    }
}
