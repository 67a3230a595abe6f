use std::collections::VecDeque;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::config::constant::CAPACITY;
use crate::domain::types::PackageRecord;
use crate::error::LoadError;
use crate::setup::init_types::Scenario;

const SAMPLE_MAP: [&str; 10] = [
    "PKG4 . . . X X . X X X",
    ". X . . X . . PKG8 . .",
    ". . PKG7 . . . . . PKG9 .",
    "PKG10 . . . X . . X . X",
    ". . . PKG2 . . . . X .",
    ". . X . . . X . X X",
    ". PKG6 . . . . . . . .",
    "X . X E . . . PKG5 X .",
    "X . . . S X . X X .",
    "X PKG3 . . PKG1 X X . . .",
];

const DESCRIPTIONS: [&str; 8] = [
    "A Live Body",
    "The President",
    "An Elephant",
    "A Secret Letter",
    "Drinking Water",
    "A Bomb",
    "A Feather",
    "A Tiny Elephant",
];

/// The built-in 10x10 demo map with ten packages.
pub fn sample_scenario() -> Scenario {
    let grid = SAMPLE_MAP
        .iter()
        .map(|row| row.split_whitespace().map(str::to_string).collect())
        .collect();

    let packages = vec![
        PackageRecord::new("PKG4", 2, 13.0, "A Live Body"),
        PackageRecord::new("PKG7", 2, 12.0, "The President"),
        PackageRecord::new("PKG6", 3, 15.0, "The President"),
        PackageRecord::new("PKG5", 3, 10.0, "An Elephant"),
        PackageRecord::new("PKG3", 3, 7.0, "A Secret Letter"),
        PackageRecord::new("PKG1", 3, 3.0, "Chinese Propaganda Books"),
        PackageRecord::new("PKG8", 4, 13.0, "The President"),
        PackageRecord::new("PKG9", 5, 13.0, "A Live Body"),
        PackageRecord::new("PKG2", 5, 5.0, "A Bomb"),
        PackageRecord::new("PKG10", 5, 3.0, "A Feather"),
    ];

    Scenario {
        grid,
        packages,
        capacity: Some(CAPACITY),
    }
}

/// Generates a random map where every package, the start and the depot lie
/// in one connected region, so every leg of a run has a path. Weights are
/// multiples of 0.5 up to `capacity`.
pub fn generate_random_scenario(
    rows: usize,
    cols: usize,
    package_count: usize,
    block_ratio: f64,
    capacity: f64,
    seed: u64,
) -> Result<Scenario, LoadError> {
    if rows * cols < 2 {
        return Err(LoadError::MalformedGrid(format!(
            "a {rows}x{cols} map has no room for both a start and a depot"
        )));
    }
    if !capacity.is_finite() || capacity <= 0.0 {
        return Err(LoadError::InvalidCapacity(capacity));
    }
    if !(0.0..=1.0).contains(&block_ratio) {
        return Err(LoadError::MalformedGrid(format!(
            "block ratio {block_ratio} is outside 0..=1"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid: Vec<Vec<String>> = (0..rows)
        .map(|_| {
            (0..cols)
                .map(|_| {
                    if rng.gen_bool(block_ratio) {
                        "X".to_string()
                    } else {
                        ".".to_string()
                    }
                })
                .collect()
        })
        .collect();

    // Depot on a random cell, forced free; everything else picks from its region.
    let depot = (rng.gen_range(0..rows), rng.gen_range(0..cols));
    grid[depot.0][depot.1] = "E".to_string();
    let mut region = reachable_from(&grid, depot);
    region.retain(|&cell| cell != depot);
    region.shuffle(&mut rng);

    let count = package_count.min(region.len().saturating_sub(1));
    let mut spots = region.into_iter();
    let start = match spots.next() {
        Some(start) => start,
        // Walled-in depot: the start takes a neighbouring cell, which exists
        // since the map has at least two cells.
        None if depot.1 + 1 < cols => (depot.0, depot.1 + 1),
        None if depot.1 > 0 => (depot.0, depot.1 - 1),
        None if depot.0 + 1 < rows => (depot.0 + 1, depot.1),
        None => (depot.0 - 1, depot.1),
    };
    grid[start.0][start.1] = "S".to_string();

    let max_halves = ((capacity * 2.0).floor() as u64).max(1);
    let mut packages = Vec::with_capacity(count);
    for (n, cell) in spots.take(count).enumerate() {
        let id = format!("PKG{}", n + 1);
        grid[cell.0][cell.1] = id.clone();
        let weight = (rng.gen_range(1..=max_halves) as f64 / 2.0).min(capacity);
        packages.push(PackageRecord {
            id,
            urgency: rng.gen_range(1..=5),
            weight,
            description: DESCRIPTIONS[rng.gen_range(0..DESCRIPTIONS.len())].to_string(),
        });
    }

    info!(
        "Generated {}x{} scenario with {} packages (seed {})",
        rows,
        cols,
        packages.len(),
        seed
    );
    debug!("Generated grid: {:?}", grid);

    Ok(Scenario {
        grid,
        packages,
        capacity: Some(capacity),
    })
}

/// Free cells reachable from `origin` by king moves, in visit order.
fn reachable_from(grid: &[Vec<String>], origin: (usize, usize)) -> Vec<(usize, usize)> {
    let rows = grid.len();
    let cols = grid[0].len();
    let mut seen = vec![vec![false; cols]; rows];
    let mut queue = VecDeque::from([origin]);
    let mut region = vec![];
    seen[origin.0][origin.1] = true;

    while let Some((r, c)) = queue.pop_front() {
        region.push((r, c));
        for dr in -1isize..=1 {
            for dc in -1isize..=1 {
                let (Some(nr), Some(nc)) = (r.checked_add_signed(dr), c.checked_add_signed(dc))
                else {
                    continue;
                };
                if nr < rows && nc < cols && !seen[nr][nc] && grid[nr][nc] != "X" {
                    seen[nr][nc] = true;
                    queue.push_back((nr, nc));
                }
            }
        }
    }
    region
}
