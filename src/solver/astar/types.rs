//! A* frontier types.

use std::cmp::Ordering;

use crate::domain::types::Cell;

/// A frontier entry. The f-cost is fixed when the entry is pushed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct FrontierEntry {
    pub f_cost: usize,
    pub cell: Cell,
}

impl Ord for FrontierEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behaviour; equal f pops the row-major smaller cell
        other
            .f_cost
            .cmp(&self.f_cost)
            .then_with(|| other.cell.cmp(&self.cell))
    }
}

impl PartialOrd for FrontierEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Outcome statistics of one search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_expanded: usize,
    pub path_cost: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn heap_pops_lowest_cost_then_smallest_cell() {
        let mut heap = BinaryHeap::new();
        heap.push(FrontierEntry { f_cost: 4, cell: Cell::new(0, 0) });
        heap.push(FrontierEntry { f_cost: 2, cell: Cell::new(3, 1) });
        heap.push(FrontierEntry { f_cost: 2, cell: Cell::new(1, 7) });

        let order: Vec<Cell> = std::iter::from_fn(|| heap.pop().map(|e| e.cell)).collect();
        assert_eq!(order, vec![Cell::new(1, 7), Cell::new(3, 1), Cell::new(0, 0)]);
    }
}
