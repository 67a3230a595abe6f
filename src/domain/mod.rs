pub mod grid;
pub mod registry;
pub mod types;
