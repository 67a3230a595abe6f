use serde::{Deserialize, Serialize};

use crate::domain::types::PackageRecord;

/// Struct to match the scenario JSON structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Row-major map tokens: `.`, `X`, `S`, `E` or a package id starting with `P`.
    pub grid: Vec<Vec<String>>,
    pub packages: Vec<PackageRecord>,
    /// Overrides the configured vehicle capacity when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
}
