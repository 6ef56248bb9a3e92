// core/heading.rs

// Compass headings on the grid and the robot-relative drive commands that move
// between them. Headings are cyclic in clockwise order Up -> Right -> Down -> Left.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Absolute facing direction of the AGV on the grid
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    /// Towards row 0
    #[default]
    Up,
    /// Towards higher columns
    Right,
    /// Towards higher rows
    Down,
    /// Towards column 0
    Left,
}

impl Heading {
    /// All headings in clockwise order, which is also the planner's neighbour order
    pub const ALL: [Heading; 4] = [Heading::Up, Heading::Right, Heading::Down, Heading::Left];

    /// Position in the clockwise cycle
    pub fn index(self) -> usize {
        match self {
            Heading::Up => 0,
            Heading::Right => 1,
            Heading::Down => 2,
            Heading::Left => 3,
        }
    }

    /// Heading at `index` mod 4 in the clockwise cycle
    pub fn from_index(index: usize) -> Heading {
        Heading::ALL[index % 4]
    }

    /// Unit `(row, col)` step for moving one cell this way
    pub fn delta(self) -> (isize, isize) {
        match self {
            Heading::Up => (-1, 0),
            Heading::Right => (0, 1),
            Heading::Down => (1, 0),
            Heading::Left => (0, -1),
        }
    }

    /// Heading for a unit step, `None` for anything that is not 4-connected
    pub fn from_delta(dr: isize, dc: isize) -> Option<Heading> {
        match (dr, dc) {
            (-1, 0) => Some(Heading::Up),
            (1, 0) => Some(Heading::Down),
            (0, 1) => Some(Heading::Right),
            (0, -1) => Some(Heading::Left),
            _ => None,
        }
    }

    /// Quarter turn clockwise
    pub fn right(self) -> Heading {
        Heading::from_index(self.index() + 1)
    }

    /// Quarter turn counter-clockwise
    pub fn left(self) -> Heading {
        Heading::from_index(self.index() + 3)
    }

    /// Half turn
    pub fn reversed(self) -> Heading {
        Heading::from_index(self.index() + 2)
    }

    /// Heading after executing `command` while facing `self`
    pub fn apply(self, command: Command) -> Heading {
        match command {
            Command::TurnLeft90 => self.left(),
            Command::TurnRight90 => self.right(),
            Command::Reverse => self.reversed(),
            Command::Forward | Command::Stop => self,
        }
    }

    /// Relative command that takes the robot from facing `self` to moving `target`
    pub fn command_towards(self, target: Heading) -> Command {
        match (target.index() + 4 - self.index()) % 4 {
            0 => Command::Forward,
            1 => Command::TurnRight90,
            2 => Command::Reverse,
            _ => Command::TurnLeft90,
        }
    }
}

impl fmt::Display for Heading {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Heading::Up => "U",
            Heading::Right => "R",
            Heading::Down => "D",
            Heading::Left => "L",
        };
        f.write_str(name)
    }
}

impl FromStr for Heading {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "u" | "up" => Ok(Heading::Up),
            "r" | "right" => Ok(Heading::Right),
            "d" | "down" => Ok(Heading::Down),
            "l" | "left" => Ok(Heading::Left),
            other => Err(format!("unknown heading '{}'", other)),
        }
    }
}

/// Robot-relative drive command. Duration and speed belong to the drive layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// Drive to the next line crossing
    Forward,
    /// Pivot a quarter turn counter-clockwise
    TurnLeft90,
    /// Pivot a quarter turn clockwise
    TurnRight90,
    /// Turn around
    Reverse,
    /// Halt the motors
    Stop,
}

impl Command {
    /// ASCII token the drive controller understands (sent newline-terminated)
    pub fn token(self) -> &'static str {
        match self {
            Command::Forward => "F",
            Command::TurnLeft90 => "L90",
            Command::TurnRight90 => "R90",
            Command::Reverse => "B",
            Command::Stop => "S",
        }
    }

    /// Whether the command changes the heading
    pub fn is_turn(self) -> bool {
        matches!(
            self,
            Command::TurnLeft90 | Command::TurnRight90 | Command::Reverse
        )
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "F" => Ok(Command::Forward),
            "L90" => Ok(Command::TurnLeft90),
            "R90" => Ok(Command::TurnRight90),
            "B" => Ok(Command::Reverse),
            "S" => Ok(Command::Stop),
            other => Err(format!("unknown command token '{}'", other)),
        }
    }
}
