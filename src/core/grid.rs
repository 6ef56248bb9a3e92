// core/grid.rs

// Occupancy grid for the shop floor. Each cell is either free (a line crossing the AGV
// can stop on) or blocked (a shelf). The grid is fixed at construction; a different
// layout means constructing a new GridMap.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::heading::Heading;
use crate::AgvError;

/// One grid position, 0-indexed `(row, col)`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    /// Row index, grows downwards (towards `Heading::Down`)
    pub row: usize,
    /// Column index, grows to the right
    pub col: usize,
}

impl Cell {
    /// Creates a cell from its row and column
    pub const fn new(row: usize, col: usize) -> Self {
        Cell { row, col }
    }

    /// The adjacent cell one step towards `heading`, or `None` when that would leave the
    /// non-negative quadrant. Upper bounds are the grid's business.
    pub fn neighbor(self, heading: Heading) -> Option<Cell> {
        let (dr, dc) = heading.delta();
        Some(Cell {
            row: self.row.checked_add_signed(dr)?,
            col: self.col.checked_add_signed(dc)?,
        })
    }

    /// Manhattan distance, ignoring obstacles
    pub fn manhattan(self, other: Cell) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Cell { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Immutable free/blocked table the planner searches over
#[derive(Clone, Debug, PartialEq)]
pub struct GridMap {
    // true = free
    cells: DMatrix<bool>,
}

impl GridMap {
    /// Builds a grid from occupancy rows where `0` is free and anything else is blocked.
    /// Rows must be non-empty and all of the same length.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, AgvError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(AgvError::Config("occupancy grid is empty".to_string()));
        }
        if let Some((index, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(AgvError::Config(format!(
                "occupancy grid is not rectangular: row {} has {} columns, expected {}",
                index,
                row.len(),
                width
            )));
        }

        Ok(GridMap {
            cells: DMatrix::from_fn(height, width, |r, c| rows[r][c] == 0),
        })
    }

    /// A grid with every cell free
    pub fn open(rows: usize, cols: usize) -> Self {
        GridMap {
            cells: DMatrix::from_element(rows, cols, true),
        }
    }

    /// An open grid with the listed cells blocked; out-of-range cells are ignored
    pub fn with_blocked(rows: usize, cols: usize, blocked: &[Cell]) -> Self {
        let mut cells = DMatrix::from_element(rows, cols, true);
        for cell in blocked {
            if let Some(slot) = cells.get_mut((cell.row, cell.col)) {
                *slot = false;
            }
        }
        GridMap { cells }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cells.ncols()
    }

    /// Whether `cell` lies inside the grid
    pub fn contains(&self, cell: Cell) -> bool {
        cell.row < self.rows() && cell.col < self.cols()
    }

    /// Whether the AGV may occupy `cell`. Out-of-bounds cells are reported as blocked.
    pub fn free(&self, cell: Cell) -> bool {
        self.cells.get((cell.row, cell.col)).copied().unwrap_or(false)
    }

    /// Free 4-connected neighbours of `cell`, visited Up, Right, Down, Left
    pub fn free_neighbors(&self, cell: Cell) -> impl Iterator<Item = (Heading, Cell)> + '_ {
        Heading::ALL.into_iter().filter_map(move |heading| {
            cell.neighbor(heading)
                .filter(|next| self.free(*next))
                .map(|next| (heading, next))
        })
    }

    /// Every free cell in row-major order
    pub fn free_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        let cols = self.cols();
        (0..self.rows() * cols)
            .map(move |i| Cell::new(i / cols, i % cols))
            .filter(|cell| self.free(*cell))
    }
}
