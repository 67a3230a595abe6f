//! Capacity-constrained pickup and depot-return scheduling.

pub mod scheduler;
pub mod state;

pub use scheduler::Scheduler;
pub use state::{DispatchState, RunReport};
