use itertools::Itertools;

use crate::domain::types::Cell;

/// Manhattan distance between two cells.
pub fn manhattan(a: Cell, b: Cell) -> usize {
    a.row.abs_diff(b.row) + a.col.abs_diff(b.col)
}

/// Whether two cells are one king's move apart.
pub fn adjacent(a: Cell, b: Cell) -> bool {
    a != b && a.row.abs_diff(b.row) <= 1 && a.col.abs_diff(b.col) <= 1
}

pub fn format_cells(cells: &[Cell]) -> String {
    format!("[{}]", cells.iter().join(", "))
}
