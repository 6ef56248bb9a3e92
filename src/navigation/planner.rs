// src/navigation/planner.rs
// Breadth-first shortest paths on the occupancy grid and greedy selection of the
// nearest remaining target.

use log::{Level, debug, log};
use std::collections::VecDeque;
use std::sync::Arc;

use super::{NavigationError, Path};
use crate::core::{Cell, GridMap};

/// Chosen target and the path that reaches it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedRoute {
    /// Shortest path, `path.cells()[0]` is the start cell
    pub path: Path,
    /// The target the path ends on
    pub goal: Cell,
}

/// Path planner over a shared, read-only grid
#[derive(Debug, Clone)]
pub struct PathPlanner {
    grid: Arc<GridMap>,
}

impl PathPlanner {
    /// Creates a planner for `grid`
    pub fn new(grid: Arc<GridMap>) -> Self {
        PathPlanner { grid }
    }

    /// The grid being searched
    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// Shortest 4-connected path from `start` to `goal`.
    ///
    /// Neighbours are expanded Up, Right, Down, Left so that among equal-length paths
    /// the result is always the same. Returns `None` when `goal` is blocked, either
    /// cell is off the grid, or no path exists. `start == goal` yields `[start]`.
    pub fn shortest_path(&self, start: Cell, goal: Cell) -> Option<Path> {
        let grid = &*self.grid;
        if !grid.contains(start) || !grid.free(goal) {
            return None;
        }
        if start == goal {
            return Some(Path::single(start));
        }

        let cols = grid.cols();
        let index = |cell: Cell| cell.row * cols + cell.col;
        let mut visited = vec![false; grid.rows() * cols];
        let mut prev: Vec<Option<Cell>> = vec![None; grid.rows() * cols];
        let mut queue = VecDeque::new();

        visited[index(start)] = true;
        queue.push_back(start);

        while let Some(cell) = queue.pop_front() {
            if cell == goal {
                let mut cells = vec![goal];
                let mut cursor = goal;
                while let Some(parent) = prev[index(cursor)] {
                    cells.push(parent);
                    cursor = parent;
                }
                cells.reverse();
                return Some(Path::new(cells));
            }

            for (_, next) in grid.free_neighbors(cell) {
                if !visited[index(next)] {
                    visited[index(next)] = true;
                    prev[index(next)] = Some(cell);
                    queue.push_back(next);
                }
            }
        }

        None
    }

    /// Path to the nearest reachable goal.
    ///
    /// Every goal is searched on its own and the shortest path wins; ties go to the goal
    /// listed first. This is greedy nearest-target selection, not an optimal tour through
    /// all goals. Fails with `NotFound` when no goal is reachable.
    pub fn find_path(&self, start: Cell, goals: &[Cell]) -> Result<PlannedRoute, NavigationError> {
        let mut best: Option<PlannedRoute> = None;

        for &goal in goals {
            match self.shortest_path(start, goal) {
                Some(path) => {
                    debug!("Path {} -> {}: {} cells", start, goal, path.len());
                    if best.as_ref().map_or(true, |b| path.len() < b.path.len()) {
                        best = Some(PlannedRoute { path, goal });
                    }
                }
                None => debug!("Target {} unreachable from {}", goal, start),
            }
        }

        match best {
            Some(route) => {
                let level = if route.path.moves() == 0 {
                    Level::Debug
                } else {
                    Level::Info
                };
                log!(
                    level,
                    "Nearest target {} from {} ({} moves)",
                    route.goal,
                    start,
                    route.path.moves()
                );
                Ok(route)
            }
            None => Err(NavigationError::NotFound {
                start,
                goals: goals.len(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn planner(grid: GridMap) -> PathPlanner {
        PathPlanner::new(Arc::new(grid))
    }

    #[test]
    fn start_equals_goal_is_single_cell() {
        let p = planner(GridMap::open(3, 3));
        let path = p.shortest_path(Cell::new(1, 1), Cell::new(1, 1)).unwrap();
        assert_eq!(path.cells(), &[Cell::new(1, 1)]);
    }

    #[test]
    fn equal_length_paths_prefer_up_then_right() {
        // From (1,0) to (0,1) both Up-Right and Right-Up are two moves; Up is expanded first.
        let p = planner(GridMap::open(2, 2));
        let path = p.shortest_path(Cell::new(1, 0), Cell::new(0, 1)).unwrap();
        assert_eq!(
            path.cells(),
            &[Cell::new(1, 0), Cell::new(0, 0), Cell::new(0, 1)]
        );
    }

    #[test]
    fn detours_around_a_wall() {
        // . # .
        // . # .
        // . . .
        let grid = GridMap::with_blocked(3, 3, &[Cell::new(0, 1), Cell::new(1, 1)]);
        let path = planner(grid)
            .shortest_path(Cell::new(0, 0), Cell::new(0, 2))
            .unwrap();
        assert_eq!(path.moves(), 6);
        assert_eq!(path.goal(), Some(Cell::new(0, 2)));
    }

    #[rstest]
    #[case(Cell::new(1, 1))]
    #[case(Cell::new(5, 5))]
    fn blocked_or_outside_goal_is_unreachable(#[case] goal: Cell) {
        let grid = GridMap::with_blocked(3, 3, &[Cell::new(1, 1)]);
        assert!(planner(grid).shortest_path(Cell::new(0, 0), goal).is_none());
    }

    #[test]
    fn blocked_goal_equal_to_start_is_unreachable() {
        let grid = GridMap::with_blocked(2, 2, &[Cell::new(0, 0)]);
        let err = planner(grid)
            .find_path(Cell::new(0, 0), &[Cell::new(0, 0)])
            .unwrap_err();
        assert!(matches!(err, NavigationError::NotFound { .. }));
    }

    #[test]
    fn ties_go_to_first_listed_goal() {
        let p = planner(GridMap::open(3, 3));
        let route = p
            .find_path(Cell::new(1, 1), &[Cell::new(1, 2), Cell::new(0, 1)])
            .unwrap();
        assert_eq!(route.goal, Cell::new(1, 2));

        let route = p
            .find_path(Cell::new(1, 1), &[Cell::new(0, 1), Cell::new(1, 2)])
            .unwrap();
        assert_eq!(route.goal, Cell::new(0, 1));
    }

    #[test]
    fn unreachable_goals_are_skipped() {
        let grid = GridMap::with_blocked(3, 3, &[Cell::new(1, 1)]);
        let route = planner(grid)
            .find_path(Cell::new(0, 0), &[Cell::new(1, 1), Cell::new(2, 2)])
            .unwrap();
        assert_eq!(route.goal, Cell::new(2, 2));
        assert_eq!(route.path.moves(), 4);
    }

    #[test]
    fn no_goals_is_not_found() {
        let err = planner(GridMap::open(2, 2))
            .find_path(Cell::new(0, 0), &[])
            .unwrap_err();
        assert!(matches!(err, NavigationError::NotFound { goals: 0, .. }));
    }
}
