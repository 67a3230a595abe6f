pub mod init;
pub mod init_types;

pub use init::{load_scenario, setup};
pub use init_types::Scenario;
