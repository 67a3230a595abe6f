use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::domain::grid::Grid;
use crate::domain::types::{Cell, Package, PackageRecord};
use crate::error::LoadError;

/// Sort by ascending urgency, heavier first within the same urgency.
/// Stable, so equal (urgency, weight) pairs keep their input order.
pub fn sort_by_priority(packages: &mut [Package]) {
    packages.sort_by(|a, b| {
        a.urgency
            .cmp(&b.urgency)
            .then_with(|| b.weight.total_cmp(&a.weight))
    });
}

/// Packages with their resolved grid locations, held in priority order.
#[derive(Debug, Clone)]
pub struct PackageRegistry {
    ordered: Vec<Package>,
    locations: HashMap<String, Cell>,
}

impl PackageRegistry {
    pub fn load(records: Vec<PackageRecord>, grid: &Grid) -> Result<Self, LoadError> {
        let markers: HashMap<&str, Cell> = grid.markers().collect();
        let mut seen = HashSet::new();
        let mut packages = Vec::with_capacity(records.len());

        for record in records {
            if !seen.insert(record.id.clone()) {
                return Err(LoadError::DuplicatePackage(record.id));
            }
            if !(record.weight.is_finite() && record.weight > 0.0) {
                return Err(LoadError::InvalidWeight(record.id));
            }
            let location = *markers
                .get(record.id.as_str())
                .ok_or_else(|| LoadError::NotFound(record.id.clone()))?;

            packages.push(Package {
                id: record.id,
                urgency: record.urgency,
                weight: record.weight,
                description: record.description,
                location,
            });
        }

        for (id, cell) in grid.markers() {
            if !seen.contains(id) {
                warn!("Marker {} at {} has no package record, ignoring", id, cell);
            }
        }

        sort_by_priority(&mut packages);
        for package in &packages {
            debug!(
                "Sorted: {} urgency {} weight {} at {}",
                package.id, package.urgency, package.weight, package.location
            );
        }

        let locations = packages
            .iter()
            .map(|p| (p.id.clone(), p.location))
            .collect();

        Ok(Self {
            ordered: packages,
            locations,
        })
    }

    pub fn location_of(&self, id: &str) -> Result<Cell, LoadError> {
        self.locations
            .get(id)
            .copied()
            .ok_or_else(|| LoadError::NotFound(id.to_string()))
    }

    /// Packages in priority order.
    pub fn ordered(&self) -> &[Package] {
        &self.ordered
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    /// Reject any package the vehicle could never carry.
    pub fn check_capacity(&self, capacity: f64) -> Result<(), LoadError> {
        match self.ordered.iter().find(|p| p.weight > capacity) {
            Some(p) => Err(LoadError::Overweight {
                id: p.id.clone(),
                weight: p.weight,
                capacity,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(id: &str, urgency: i64, weight: f64) -> Package {
        Package {
            id: id.to_string(),
            urgency,
            weight,
            description: String::new(),
            location: Cell::new(0, 0),
        }
    }

    fn ids(packages: &[Package]) -> Vec<&str> {
        packages.iter().map(|p| p.id.as_str()).collect()
    }

    fn sample_grid() -> Grid {
        let raw = vec![
            vec!["S", ".", "PKG1"],
            vec!["PKG2", "X", "."],
            vec![".", "PKG3", "E"],
        ];
        Grid::from_tokens(&raw).unwrap()
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let mut packages = vec![package("A", 3, 5.0), package("B", 3, 5.0)];
        sort_by_priority(&mut packages);
        assert_eq!(ids(&packages), vec!["A", "B"]);
    }

    #[test]
    fn urgency_ascending_then_weight_descending() {
        let mut packages = vec![package("a", 2, 13.0), package("b", 3, 15.0), package("c", 2, 12.0)];
        sort_by_priority(&mut packages);
        assert_eq!(ids(&packages), vec!["a", "c", "b"]);
    }

    #[test]
    fn load_resolves_locations_and_sorts() {
        let records = vec![
            PackageRecord::new("PKG1", 3, 2.0, "books"),
            PackageRecord::new("PKG2", 1, 4.0, "water"),
            PackageRecord::new("PKG3", 3, 9.0, "piano"),
        ];
        let registry = PackageRegistry::load(records, &sample_grid()).unwrap();
        assert_eq!(ids(registry.ordered()), vec!["PKG2", "PKG3", "PKG1"]);
        assert_eq!(registry.location_of("PKG3").unwrap(), Cell::new(2, 1));
        assert!(matches!(
            registry.location_of("PKG9"),
            Err(LoadError::NotFound(_))
        ));
    }

    #[test]
    fn unmatched_id_fails_load() {
        let records = vec![PackageRecord::new("PKG7", 1, 1.0, "ghost")];
        let err = PackageRegistry::load(records, &sample_grid()).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(id) if id == "PKG7"));
    }

    #[test]
    fn duplicate_ids_fail_load() {
        let records = vec![
            PackageRecord::new("PKG1", 1, 1.0, "a"),
            PackageRecord::new("PKG1", 2, 1.0, "b"),
        ];
        assert!(matches!(
            PackageRegistry::load(records, &sample_grid()),
            Err(LoadError::DuplicatePackage(_))
        ));
    }

    #[test]
    fn non_positive_weights_fail_load() {
        for weight in [0.0, -1.5, f64::NAN, f64::INFINITY] {
            let records = vec![PackageRecord::new("PKG1", 1, weight, "air")];
            assert!(matches!(
                PackageRegistry::load(records, &sample_grid()),
                Err(LoadError::InvalidWeight(_))
            ));
        }
    }

    #[test]
    fn fractional_weights_sort_heavier_first() {
        let mut packages = vec![package("a", 1, 2.25), package("b", 1, 2.5), package("c", 0, 0.5)];
        sort_by_priority(&mut packages);
        assert_eq!(ids(&packages), vec!["c", "b", "a"]);
    }

    #[test]
    fn marker_without_record_is_ignored() {
        let raw = vec![vec!["S", "P2", "P1"], vec![".", ".", "."], vec![".", ".", "E"]];
        let grid = Grid::from_tokens(&raw).unwrap();
        let records = vec![PackageRecord::new("P1", 1, 1.0, "books")];
        let registry = PackageRegistry::load(records, &grid).unwrap();
        assert_eq!(ids(registry.ordered()), vec!["P1"]);
        assert!(matches!(registry.location_of("P2"), Err(LoadError::NotFound(_))));
        assert_eq!(grid.markers().count(), 2);
    }

    #[test]
    fn overweight_package_is_reported() {
        let records = vec![PackageRecord::new("PKG1", 1, 30.0, "anvil")];
        let registry = PackageRegistry::load(records, &sample_grid()).unwrap();
        assert!(registry.check_capacity(30.0).is_ok());
        match registry.check_capacity(20.0) {
            Err(LoadError::Overweight { weight, capacity, .. }) => {
                assert_eq!((weight, capacity), (30.0, 20.0));
            }
            other => panic!("expected Overweight, got {other:?}"),
        }
    }
}
