// core/targets.rs

// The shopping list: cells the mission still has to visit. Order is kept and
// duplicates are separate visits.

use serde::{Deserialize, Serialize};

use super::grid::Cell;

/// Ordered multiset of cells still to be visited
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSet {
    cells: Vec<Cell>,
}

impl TargetSet {
    /// Target set holding `cells` in the given order
    pub fn new(cells: Vec<Cell>) -> Self {
        TargetSet { cells }
    }

    /// Removes the first occurrence of `cell`; returns whether one was found
    pub fn remove_one(&mut self, cell: Cell) -> bool {
        match self.cells.iter().position(|c| *c == cell) {
            Some(index) => {
                self.cells.remove(index);
                true
            }
            None => false,
        }
    }

    /// Whether `cell` is still to be visited
    pub fn contains(&self, cell: Cell) -> bool {
        self.cells.contains(&cell)
    }

    /// Remaining cells in mission order
    pub fn as_slice(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of remaining visits
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the mission has nothing left to visit
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Drops every remaining visit
    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

impl From<Vec<Cell>> for TargetSet {
    fn from(cells: Vec<Cell>) -> Self {
        TargetSet::new(cells)
    }
}
