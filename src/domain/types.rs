use std::fmt;

use serde::{Deserialize, Serialize};

/// A (row, col) grid coordinate. Orders row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl From<(usize, usize)> for Cell {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellKind {
    Free,
    Blocked,
    Start,
    Depot,
    PackageMarker(String),
}

impl CellKind {
    /// Token used in scenario files.
    pub fn token(&self) -> &str {
        match self {
            CellKind::Free => ".",
            CellKind::Blocked => "X",
            CellKind::Start => "S",
            CellKind::Depot => "E",
            CellKind::PackageMarker(id) => id,
        }
    }
}

/// A package record as it appears in scenario input, before its location is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub id: String,
    pub urgency: i64,
    pub weight: f64,
    pub description: String,
}

impl PackageRecord {
    pub fn new(id: &str, urgency: i64, weight: f64, description: &str) -> Self {
        Self {
            id: id.to_string(),
            urgency,
            weight,
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Package {
    pub id: String,
    /// Lower is more urgent.
    pub urgency: i64,
    pub weight: f64,
    pub description: String,
    pub location: Cell,
}

/// Cells from a source (excluded) to a destination (included).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Path {
    pub cells: Vec<Cell>,
}

impl Path {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn destination(&self) -> Option<Cell> {
        self.cells.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleState {
    pub position: Cell,
    pub capacity: f64,
    pub remaining: f64,
    pub held: Vec<Package>,
}

impl VehicleState {
    pub fn new(position: Cell, capacity: f64) -> Self {
        Self {
            position,
            capacity,
            remaining: capacity,
            held: vec![],
        }
    }

    pub fn load(&self) -> f64 {
        self.capacity - self.remaining
    }

    pub fn fits(&self, package: &Package) -> bool {
        package.weight <= self.remaining
    }

    pub fn pick_up(&mut self, package: Package) {
        self.remaining -= package.weight;
        self.position = package.location;
        self.held.push(package);
    }

    /// Empty the vehicle at `depot`, returning what it carried.
    pub fn unload_at(&mut self, depot: Cell) -> Vec<Package> {
        self.position = depot;
        self.remaining = self.capacity;
        std::mem::take(&mut self.held)
    }
}
