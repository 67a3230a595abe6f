use std::collections::HashMap;

use tracing::{debug, trace};

use crate::domain::types::{Cell, CellKind};
use crate::error::{GridError, LoadError};

/// Offsets in expansion order: cardinal first, then diagonal.
const DIRECTIONS: [(isize, isize); 8] = [
    (-1, 0),
    (1, 0),
    (0, -1),
    (0, 1),
    (-1, -1),
    (-1, 1),
    (1, -1),
    (1, 1),
];

/// Fixed-size road map. Only package markers change after load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    cells: Vec<CellKind>,
    start: Cell,
    depot: Cell,
}

impl Grid {
    /// Parse a row-major token matrix.
    pub fn from_tokens<S: AsRef<str>>(raw: &[Vec<S>]) -> Result<Self, LoadError> {
        let rows = raw.len();
        let cols = raw.first().map(Vec::len).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(LoadError::MalformedGrid("grid has no cells".to_string()));
        }
        if let Some((i, row)) = raw.iter().enumerate().find(|(_, row)| row.len() != cols) {
            return Err(LoadError::MalformedGrid(format!(
                "row {} has {} cells, expected {}",
                i,
                row.len(),
                cols
            )));
        }

        let mut cells = Vec::with_capacity(rows * cols);
        let mut seen: HashMap<String, Cell> = HashMap::new();
        let mut start = None;
        let mut depot = None;

        for (i, row) in raw.iter().enumerate() {
            for (j, token) in row.iter().enumerate() {
                let token = token.as_ref().trim();
                let cell = Cell::new(i, j);
                let kind = match token {
                    "." => CellKind::Free,
                    "X" => CellKind::Blocked,
                    "S" => CellKind::Start,
                    "E" => CellKind::Depot,
                    t if t.starts_with('P') => CellKind::PackageMarker(t.to_string()),
                    other => {
                        return Err(LoadError::UnknownToken {
                            token: other.to_string(),
                            cell,
                        })
                    }
                };

                if !matches!(kind, CellKind::Free | CellKind::Blocked) {
                    if let Some(&first) = seen.get(token) {
                        return Err(LoadError::DuplicateToken {
                            token: token.to_string(),
                            first,
                            again: cell,
                        });
                    }
                    seen.insert(token.to_string(), cell);
                }

                match kind {
                    CellKind::Start => start = Some(cell),
                    CellKind::Depot => depot = Some(cell),
                    _ => {}
                }
                cells.push(kind);
            }
        }

        let start = start.ok_or(LoadError::MissingEndpoint("start (S)"))?;
        let depot = depot.ok_or(LoadError::MissingEndpoint("depot (E)"))?;

        debug!(
            "Loaded {}x{} grid, start {}, depot {}, {} markers",
            rows,
            cols,
            start,
            depot,
            seen.len() - 2
        );

        Ok(Self {
            rows,
            cols,
            cells,
            start,
            depot,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn start(&self) -> Cell {
        self.start
    }

    pub fn depot(&self) -> Cell {
        self.depot
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.cols
    }

    /// Row-major index of an in-bounds cell.
    pub fn index(&self, cell: Cell) -> usize {
        cell.row * self.cols + cell.col
    }

    pub fn kind(&self, cell: Cell) -> Option<&CellKind> {
        if self.in_bounds(cell) {
            Some(&self.cells[self.index(cell)])
        } else {
            None
        }
    }

    pub fn is_blocked(&self, cell: Cell) -> bool {
        matches!(self.kind(cell), Some(CellKind::Blocked) | None)
    }

    /// In-bounds, unblocked cells one king's move away. Diagonals are allowed
    /// even when both orthogonal cells beside them are blocked.
    pub fn neighbors(&self, cell: Cell) -> Vec<Cell> {
        DIRECTIONS
            .iter()
            .filter_map(|&(dr, dc)| {
                let row = cell.row.checked_add_signed(dr)?;
                let col = cell.col.checked_add_signed(dc)?;
                let next = Cell::new(row, col);
                (!self.is_blocked(next)).then_some(next)
            })
            .collect()
    }

    /// Package markers in row-major order.
    pub fn markers(&self) -> impl Iterator<Item = (&str, Cell)> + '_ {
        self.cells.iter().enumerate().filter_map(|(idx, kind)| match kind {
            CellKind::PackageMarker(id) => {
                Some((id.as_str(), Cell::new(idx / self.cols, idx % self.cols)))
            }
            _ => None,
        })
    }

    /// Turn a collected package's marker into free road, returning its id.
    pub fn clear_marker(&mut self, cell: Cell) -> Result<String, GridError> {
        if !self.in_bounds(cell) {
            return Err(GridError::InvalidCell(cell));
        }
        let idx = self.index(cell);
        match std::mem::replace(&mut self.cells[idx], CellKind::Free) {
            CellKind::PackageMarker(id) => {
                trace!("Cleared marker {} at {}", id, cell);
                Ok(id)
            }
            other => {
                self.cells[idx] = other;
                Err(GridError::InvalidCell(cell))
            }
        }
    }

    /// Current token matrix, for rendering.
    pub fn layout(&self) -> Vec<Vec<String>> {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|kind| kind.token().to_string()).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn grid(rows: &[&str]) -> Grid {
        let raw: Vec<Vec<&str>> = rows.iter().map(|r| r.split_whitespace().collect()).collect();
        Grid::from_tokens(&raw).unwrap()
    }

    #[test]
    fn parses_endpoints_and_markers() {
        let g = grid(&["S . P1", ". X .", "P2 . E"]);
        assert_eq!(g.start(), Cell::new(0, 0));
        assert_eq!(g.depot(), Cell::new(2, 2));
        let markers: Vec<_> = g.markers().collect();
        assert_eq!(markers, vec![("P1", Cell::new(0, 2)), ("P2", Cell::new(2, 0))]);
        assert!(g.is_blocked(Cell::new(1, 1)));
    }

    #[test]
    fn missing_depot_is_rejected() {
        let raw = vec![vec!["S", "."], vec![".", "."]];
        let err = Grid::from_tokens(&raw).unwrap_err();
        assert!(matches!(err, LoadError::MissingEndpoint(_)));
    }

    #[test]
    fn missing_start_is_rejected() {
        let raw = vec![vec!["E", "."]];
        assert!(matches!(
            Grid::from_tokens(&raw),
            Err(LoadError::MissingEndpoint(_))
        ));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let raw = vec![vec!["S", "E"], vec!["."]];
        assert!(matches!(
            Grid::from_tokens(&raw),
            Err(LoadError::MalformedGrid(_))
        ));
    }

    #[test]
    fn duplicate_start_is_rejected() {
        let raw = vec![vec!["S", "E", "S"]];
        match Grid::from_tokens(&raw) {
            Err(LoadError::DuplicateToken { token, first, again }) => {
                assert_eq!(token, "S");
                assert_eq!(first, Cell::new(0, 0));
                assert_eq!(again, Cell::new(0, 2));
            }
            other => panic!("expected duplicate error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        let raw = vec![vec!["S", "E", "?"]];
        assert!(matches!(
            Grid::from_tokens(&raw),
            Err(LoadError::UnknownToken { .. })
        ));
    }

    #[test]
    fn corner_has_three_neighbours() {
        let g = grid(&["S . .", ". . .", ". . E"]);
        assert_eq!(
            g.neighbors(Cell::new(0, 0)),
            vec![Cell::new(1, 0), Cell::new(0, 1), Cell::new(1, 1)]
        );
    }

    #[test]
    fn diagonal_passes_between_blocked_cells() {
        let g = grid(&["S X", "X E"]);
        assert_eq!(g.neighbors(Cell::new(0, 0)), vec![Cell::new(1, 1)]);
    }

    #[test]
    fn clear_marker_frees_cell_once() {
        let mut g = grid(&["S P1 E"]);
        assert_eq!(g.clear_marker(Cell::new(0, 1)), Ok("P1".to_string()));
        assert_eq!(g.kind(Cell::new(0, 1)), Some(&CellKind::Free));
        assert_eq!(
            g.clear_marker(Cell::new(0, 1)),
            Err(GridError::InvalidCell(Cell::new(0, 1)))
        );
        assert_eq!(g.kind(Cell::new(0, 0)), Some(&CellKind::Start));
        assert!(g.clear_marker(Cell::new(0, 0)).is_err());
        assert_eq!(g.kind(Cell::new(0, 0)), Some(&CellKind::Start));
    }

    #[test]
    fn layout_round_trips_tokens() {
        let g = grid(&["S X P7", ". . E"]);
        assert_eq!(
            g.layout(),
            vec![vec!["S", "X", "P7"], vec![".", ".", "E"]]
        );
    }
}
