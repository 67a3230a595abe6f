use std::env;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

pub mod constant {
    pub(crate) const CAPACITY: f64 = 20.0;
    pub(crate) const STEP_TIME: f64 = 0.1;
    pub(crate) const WEIGHT_TIME: f64 = 0.1;
    pub(crate) const MAX_EXPANSIONS: usize = 100_000;
    pub(crate) const MAX_TRANSITIONS: usize = 1_000_000;
    pub(crate) const PACE: f64 = 0.0;
    pub(crate) const SEED: u64 = 12345;
    pub(crate) const TIMELINE_CSV: &str = "timeline.csv";
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Run parameters for one simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Vehicle capacity limit, fixed for the run.
    pub capacity: f64,
    /// Time per step with an empty vehicle.
    pub step_time: f64,
    /// Extra time per step per unit of carried weight, also the pickup time per unit.
    pub weight_time: f64,
    /// Cells the pathfinder may expand per search before giving up.
    pub max_expansions: usize,
    /// Hard cap on scheduler transitions in one run.
    pub max_transitions: usize,
    /// Wall-clock seconds slept per simulated second by the console sink (0 = no pacing).
    pub pace: f64,
    pub scenario_path: Option<String>,
    pub timeline_csv: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            capacity: constant::CAPACITY,
            step_time: constant::STEP_TIME,
            weight_time: constant::WEIGHT_TIME,
            max_expansions: constant::MAX_EXPANSIONS,
            max_transitions: constant::MAX_TRANSITIONS,
            pace: constant::PACE,
            scenario_path: None,
            timeline_csv: constant::TIMELINE_CSV.to_string(),
        }
    }
}

impl SimConfig {
    /// Load from the process environment, falling back to defaults.
    /// Call after `.env` has been loaded.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Missing keys use defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            capacity: read_var(&lookup, "COURIER_CAPACITY", defaults.capacity)?,
            step_time: read_var(&lookup, "COURIER_STEP_TIME", defaults.step_time)?,
            weight_time: read_var(&lookup, "COURIER_WEIGHT_TIME", defaults.weight_time)?,
            max_expansions: read_var(&lookup, "COURIER_MAX_EXPANSIONS", defaults.max_expansions)?,
            max_transitions: read_var(
                &lookup,
                "COURIER_MAX_TRANSITIONS",
                defaults.max_transitions,
            )?,
            pace: read_var(&lookup, "COURIER_PACE", defaults.pace)?,
            scenario_path: lookup("COURIER_SCENARIO"),
            timeline_csv: lookup("COURIER_TIMELINE_CSV").unwrap_or(defaults.timeline_csv),
        };

        config.validate()?;
        info!(
            "Loaded config: capacity {}, step time {}, weight time {}",
            config.capacity, config.step_time, config.weight_time
        );
        Ok(config)
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.capacity.is_finite() || self.capacity <= 0.0 {
            return Err(invalid(
                "COURIER_CAPACITY",
                self.capacity,
                "must be a finite positive number",
            ));
        }
        for (key, value) in [
            ("COURIER_STEP_TIME", self.step_time),
            ("COURIER_WEIGHT_TIME", self.weight_time),
            ("COURIER_PACE", self.pace),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(key, value, "must be a finite non-negative number"));
            }
        }
        if self.max_expansions == 0 {
            return Err(invalid(
                "COURIER_MAX_EXPANSIONS",
                self.max_expansions,
                "must be positive",
            ));
        }
        if self.max_transitions == 0 {
            return Err(invalid(
                "COURIER_MAX_TRANSITIONS",
                self.max_transitions,
                "must be positive",
            ));
        }
        Ok(())
    }
}

fn read_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidValue {
            key,
            value: raw,
            reason: "could not be parsed",
        }),
        None => {
            warn!("{key} not set, using default {default}");
            Ok(default)
        }
    }
}

fn invalid(key: &'static str, value: impl ToString, reason: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_vars_fall_back_to_defaults() {
        let config = SimConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, SimConfig::default());
    }

    #[test]
    fn vars_override_defaults() {
        let config = SimConfig::from_lookup(lookup_from(&[
            ("COURIER_CAPACITY", "12.5"),
            ("COURIER_STEP_TIME", "0.5"),
            ("COURIER_SCENARIO", "map.json"),
        ]))
        .unwrap();
        assert_eq!(config.capacity, 12.5);
        assert_eq!(config.step_time, 0.5);
        assert_eq!(config.scenario_path.as_deref(), Some("map.json"));
    }

    #[test]
    fn malformed_capacity_is_rejected() {
        let err = SimConfig::from_lookup(lookup_from(&[("COURIER_CAPACITY", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "COURIER_CAPACITY", .. }));
    }

    #[test]
    fn zero_capacity_fails_validation() {
        for capacity in [0.0, -3.0, f64::INFINITY, f64::NAN] {
            let config = SimConfig::default().with_capacity(capacity);
            assert!(config.validate().is_err(), "capacity {capacity}");
        }
    }

    #[test]
    fn negative_step_time_fails_validation() {
        let err = SimConfig::from_lookup(lookup_from(&[("COURIER_STEP_TIME", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "COURIER_STEP_TIME", .. }));
    }
}
