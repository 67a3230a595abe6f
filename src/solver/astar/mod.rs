//! Grid A* used for every leg of a delivery run.

pub mod search;
mod types;

pub use search::{find_path, AStarPlanner};
pub use types::SearchStats;
