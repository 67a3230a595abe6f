use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::domain::grid::Grid;
use crate::domain::types::{Cell, Path};
use crate::error::PathError;
use crate::utils::manhattan;

use super::types::{FrontierEntry, SearchStats};

/// Shortest-path search over a borrowed grid.
///
/// Every move costs 1, diagonals included, and the heuristic is Manhattan
/// distance. That heuristic can overestimate on an 8-connected unit-cost grid,
/// so a returned path is not guaranteed to be the shortest one.
pub struct AStarPlanner<'a> {
    grid: &'a Grid,
    max_expansions: usize,
}

impl<'a> AStarPlanner<'a> {
    pub fn new(grid: &'a Grid, max_expansions: usize) -> Self {
        Self {
            grid,
            max_expansions,
        }
    }

    pub fn find_path(&self, source: Cell, destination: Cell) -> Result<Path, PathError> {
        self.find_path_with_stats(source, destination)
            .map(|(path, _)| path)
    }

    pub fn find_path_with_stats(
        &self,
        source: Cell,
        destination: Cell,
    ) -> Result<(Path, SearchStats), PathError> {
        trace!("find_path: {} -> {}", source, destination);

        for endpoint in [source, destination] {
            if !self.grid.in_bounds(endpoint) {
                debug!("Search endpoint {} is out of bounds", endpoint);
                return Err(PathError::OutOfBounds(endpoint));
            }
        }

        let size = self.grid.rows() * self.grid.cols();
        let mut g_scores: Vec<Option<usize>> = vec![None; size];
        let mut came_from: Vec<Option<Cell>> = vec![None; size];
        let mut in_frontier = vec![false; size];
        let mut frontier = BinaryHeap::new();

        g_scores[self.grid.index(source)] = Some(0);
        in_frontier[self.grid.index(source)] = true;
        frontier.push(FrontierEntry {
            f_cost: 0,
            cell: source,
        });

        let mut nodes_expanded = 0;

        while let Some(FrontierEntry { cell: current, .. }) = frontier.pop() {
            let current_idx = self.grid.index(current);
            in_frontier[current_idx] = false;
            let current_g = g_scores[current_idx].unwrap_or_default();

            if current == destination {
                let path = self.reconstruct(&came_from, destination);
                trace!(
                    "Path {} -> {} found: {} steps, {} expansions",
                    source,
                    destination,
                    path.len(),
                    nodes_expanded
                );
                let stats = SearchStats {
                    nodes_expanded,
                    path_cost: current_g,
                };
                return Ok((path, stats));
            }

            nodes_expanded += 1;
            if nodes_expanded > self.max_expansions {
                debug!(
                    "Search {} -> {} gave up after {} expansions",
                    source, destination, self.max_expansions
                );
                return Err(PathError::BudgetExceeded {
                    from: source,
                    to: destination,
                    budget: self.max_expansions,
                });
            }

            for neighbor in self.grid.neighbors(current) {
                let idx = self.grid.index(neighbor);
                let tentative_g = current_g + 1;
                if g_scores[idx].map_or(true, |g| tentative_g < g) {
                    came_from[idx] = Some(current);
                    g_scores[idx] = Some(tentative_g);
                    // A queued cell keeps the f-cost it was queued with
                    if !in_frontier[idx] {
                        in_frontier[idx] = true;
                        frontier.push(FrontierEntry {
                            f_cost: tentative_g + manhattan(neighbor, destination),
                            cell: neighbor,
                        });
                    }
                }
            }
        }

        debug!(
            "No path {} -> {} after expanding {} cells",
            source, destination, nodes_expanded
        );
        Err(PathError::NoPath {
            from: source,
            to: destination,
        })
    }

    fn reconstruct(&self, came_from: &[Option<Cell>], destination: Cell) -> Path {
        let mut cells = Vec::new();
        let mut current = destination;

        while let Some(prev) = came_from[self.grid.index(current)] {
            cells.push(current);
            current = prev;
        }
        cells.reverse();

        Path { cells }
    }
}

/// One-shot search with the given expansion budget.
pub fn find_path(
    grid: &Grid,
    source: Cell,
    destination: Cell,
    max_expansions: usize,
) -> Result<Path, PathError> {
    AStarPlanner::new(grid, max_expansions).find_path(source, destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::adjacent;

    const BUDGET: usize = 10_000;

    fn grid(rows: &[&str]) -> Grid {
        let raw: Vec<Vec<&str>> = rows.iter().map(|r| r.split_whitespace().collect()).collect();
        Grid::from_tokens(&raw).unwrap()
    }

    fn assert_valid(grid: &Grid, source: Cell, destination: Cell, path: &Path) {
        assert_eq!(path.destination(), Some(destination));
        assert!(!path.cells.contains(&source));
        let mut previous = source;
        for &cell in path.iter() {
            assert!(adjacent(previous, cell), "{previous} -> {cell} is not a step");
            assert!(!grid.is_blocked(cell));
            previous = cell;
        }
    }

    #[test]
    fn straight_line_excludes_source() {
        let g = grid(&["S . P1", ". . .", ". . E"]);
        let path = find_path(&g, Cell::new(0, 0), Cell::new(0, 2), BUDGET).unwrap();
        assert_eq!(path.cells, vec![Cell::new(0, 1), Cell::new(0, 2)]);
    }

    #[test]
    fn diagonal_moves_cost_one() {
        let g = grid(&["S . . .", ". . . .", ". . . .", ". . . E"]);
        let path = find_path(&g, Cell::new(0, 0), Cell::new(3, 3), BUDGET).unwrap();
        assert_eq!(path.len(), 3);
        assert_valid(&g, Cell::new(0, 0), Cell::new(3, 3), &path);
    }

    #[test]
    fn routes_around_walls() {
        let g = grid(&[
            "S . X . .",
            ". . X . .",
            ". . X . .",
            ". . . . E",
        ]);
        let source = g.start();
        let destination = g.depot();
        let path = find_path(&g, source, destination, BUDGET).unwrap();
        assert_valid(&g, source, destination, &path);
        assert!(path.cells.contains(&Cell::new(3, 2)));
    }

    #[test]
    fn enclosed_destination_has_no_path() {
        let g = grid(&[
            "S . . . .",
            ". X X X .",
            ". X E X .",
            ". X X X .",
        ]);
        let err = find_path(&g, g.start(), g.depot(), BUDGET).unwrap_err();
        assert_eq!(
            err,
            PathError::NoPath {
                from: Cell::new(0, 0),
                to: Cell::new(2, 2)
            }
        );
    }

    #[test]
    fn same_source_and_destination_is_empty() {
        let g = grid(&["S . E"]);
        let path = find_path(&g, Cell::new(0, 1), Cell::new(0, 1), BUDGET).unwrap();
        assert!(path.is_empty());
    }

    #[test]
    fn out_of_bounds_endpoint_is_rejected() {
        let g = grid(&["S . E"]);
        assert_eq!(
            find_path(&g, g.start(), Cell::new(4, 0), BUDGET),
            Err(PathError::OutOfBounds(Cell::new(4, 0)))
        );
    }

    #[test]
    fn budget_stops_search() {
        let g = grid(&[
            "S . . . . . . .",
            ". . . . . . . .",
            ". . . . . . . .",
            ". . . . . . . E",
        ]);
        let err = find_path(&g, g.start(), g.depot(), 2).unwrap_err();
        assert!(matches!(err, PathError::BudgetExceeded { budget: 2, .. }));
    }

    #[test]
    fn repeated_searches_agree() {
        let g = grid(&[
            "S . . X . . .",
            ". X . X . X .",
            ". X . . . X .",
            ". X X X . X .",
            ". . . . . X E",
        ]);
        let planner = AStarPlanner::new(&g, BUDGET);
        let first = planner.find_path(g.start(), g.depot()).unwrap();
        for _ in 0..10 {
            assert_eq!(planner.find_path(g.start(), g.depot()).unwrap(), first);
        }
        assert_valid(&g, g.start(), g.depot(), &first);
    }

    #[test]
    fn stats_report_cost_equal_to_length() {
        let g = grid(&["S . . . E"]);
        let (path, stats) = AStarPlanner::new(&g, BUDGET)
            .find_path_with_stats(g.start(), g.depot())
            .unwrap();
        assert_eq!(stats.path_cost, path.len());
        assert!(stats.nodes_expanded >= 1);
    }
}
