use thiserror::Error;

use crate::domain::types::Cell;
use crate::sink::Snapshot;

/// Failures while building a grid or package registry. All are fatal at load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("grid must contain a start (S) and a depot (E); missing {0}")]
    MissingEndpoint(&'static str),
    #[error("malformed grid: {0}")]
    MalformedGrid(String),
    #[error("unknown token {token:?} at {cell}")]
    UnknownToken { token: String, cell: Cell },
    #[error("token {token:?} appears more than once (first at {first}, again at {again})")]
    DuplicateToken { token: String, first: Cell, again: Cell },
    #[error("package {0} has no marker on the grid")]
    NotFound(String),
    #[error("package {0} is listed more than once")]
    DuplicatePackage(String),
    #[error("package {0} must have a positive, finite weight")]
    InvalidWeight(String),
    #[error("vehicle capacity must be a finite positive number, got {0}")]
    InvalidCapacity(f64),
    #[error("package {id} weighs {weight}, more than the vehicle capacity {capacity}")]
    Overweight { id: String, weight: f64, capacity: f64 },
    #[error("could not read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse scenario: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Grid mutation failures. These signal a scheduler/grid desync.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("cell {0} does not hold a package marker")]
    InvalidCell(Cell),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("no path from {from} to {to}")]
    NoPath { from: Cell, to: Cell },
    #[error("search from {from} to {to} exceeded {budget} expansions")]
    BudgetExceeded { from: Cell, to: Cell, budget: usize },
    #[error("cell {0} is outside the grid")]
    OutOfBounds(Cell),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("package {0} is not pending")]
    UnknownPackage(String),
    #[error("nothing fits a freshly emptied vehicle with {remaining} packages left")]
    Stalled { remaining: usize },
    #[error("run exceeded {0} transitions")]
    TransitionLimit(usize),
}

/// A failed run: the error plus the last consistent state reached.
#[derive(Debug, Error)]
#[error("simulation halted at {}: {error}", .last_state.position)]
pub struct RunFailure {
    #[source]
    pub error: DispatchError,
    pub last_state: Snapshot,
}
