use std::fs;

use tracing::{info, span, Level};

use crate::config::SimConfig;
use crate::domain::grid::Grid;
use crate::domain::registry::PackageRegistry;
use crate::error::LoadError;
use crate::setup::init_types::Scenario;
use crate::solver::dispatch::Scheduler;

/// Reads a scenario JSON file.
pub fn load_scenario(path: &str) -> Result<Scenario, LoadError> {
    let file_content = fs::read_to_string(path)?;
    let scenario: Scenario = serde_json::from_str(&file_content)?;
    info!(
        "Loaded scenario {} ({} rows, {} packages)",
        path,
        scenario.grid.len(),
        scenario.packages.len()
    );
    Ok(scenario)
}

/// Validate a scenario and build a scheduler ready to run.
pub fn setup(scenario: Scenario, config: &SimConfig) -> Result<Scheduler, LoadError> {
    let setup_span = span!(Level::INFO, "setup");
    let _guard = setup_span.enter();

    let config = match scenario.capacity {
        Some(capacity) if !capacity.is_finite() || capacity <= 0.0 => {
            return Err(LoadError::InvalidCapacity(capacity));
        }
        Some(capacity) if capacity != config.capacity => {
            info!("Scenario sets vehicle capacity to {}", capacity);
            config.clone().with_capacity(capacity)
        }
        _ => config.clone(),
    };

    let grid = Grid::from_tokens(&scenario.grid)?;
    let registry = PackageRegistry::load(scenario.packages, &grid)?;
    let scheduler = Scheduler::new(grid, &registry, &config)?;

    info!(
        "Setup completed: {} packages, capacity {}",
        registry.len(),
        config.capacity
    );
    Ok(scheduler)
}
