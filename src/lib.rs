pub mod config;
pub mod domain;
pub mod error;
pub mod evaluation;
pub mod fixtures;
pub mod runner;
pub mod setup;
pub mod sink;
pub mod solver;
pub mod utils;
