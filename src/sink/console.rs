use std::thread;
use std::time::Duration;

use colored::*;
use itertools::Itertools;

use crate::domain::types::Path;
use crate::sink::{PresentationSink, SimEvent, Snapshot};
use crate::utils::format_cells;

const PATH_TOKEN: &str = "*";

/// Prints each leg as a grid overlay, optionally pacing output to simulated time.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    /// Wall-clock seconds per simulated second; 0 disables sleeping.
    pace: f64,
    /// Handling time already paced for.
    handled: f64,
}

impl ConsoleSink {
    pub fn new(pace: f64) -> Self {
        Self { pace, handled: 0.0 }
    }

    /// Handling time accrued since the previous pickup or unload.
    fn handling_since_last(&mut self, snapshot: &Snapshot) -> f64 {
        let pause = snapshot.handling_time - self.handled;
        self.handled = snapshot.handling_time;
        pause
    }

    fn sleep_for(&self, simulated: f64) {
        if self.pace > 0.0 && simulated > 0.0 {
            thread::sleep(Duration::from_secs_f64(simulated * self.pace));
        }
    }
}

/// Copy of `layout` with the path drawn over it. Start and depot stay visible.
pub fn overlay_path(layout: &[Vec<String>], path: &Path) -> Vec<Vec<String>> {
    let mut route = layout.to_vec();
    for cell in path.iter() {
        let token = &mut route[cell.row][cell.col];
        if !matches!(token.as_str(), "S" | "E") {
            *token = PATH_TOKEN.to_string();
        }
    }
    route
}

fn paint(token: &str) -> ColoredString {
    match token {
        "X" => token.red(),
        "S" => token.green().bold(),
        "E" => token.blue().bold(),
        PATH_TOKEN => token.cyan().bold(),
        t if t.starts_with('P') => t.yellow(),
        t => t.normal(),
    }
}

fn print_route(route: &[Vec<String>]) {
    for row in route {
        println!("{}", row.iter().map(|t| paint(t)).join(" "));
    }
    println!();
}

fn print_status(snapshot: &Snapshot) {
    if snapshot.held_descriptions.is_empty() {
        println!("Running time: {:.1}s", snapshot.travel_time);
    } else {
        println!(
            "Currently handling: {}\nTotal weight: {}kg\nRunning time: {:.1}s",
            snapshot.held_descriptions.iter().join(", "),
            snapshot.load,
            snapshot.travel_time
        );
    }
}

impl PresentationSink for ConsoleSink {
    fn on_event(&mut self, event: &SimEvent) {
        match event {
            SimEvent::RunStarted { order, .. } => {
                for id in order {
                    println!("Sorted: {}", id);
                }
                println!(
                    "{}",
                    format!("Delivery Simulation Starts with {} packages.", order.len()).bold()
                );
            }
            SimEvent::LegTravelled {
                path,
                departed_at,
                arrivals,
                snapshot,
                ..
            } => {
                println!("Path Taken: {}", format_cells(&path.cells));
                print_route(&overlay_path(&snapshot.layout, path));
                let mut previous = *departed_at;
                for &arrival in arrivals {
                    self.sleep_for(arrival - previous);
                    previous = arrival;
                }
                print_status(snapshot);
            }
            SimEvent::PackagePicked { id, snapshot, .. } => {
                println!(
                    "{}",
                    format!("Picked up Package {} at {}", id, snapshot.position).yellow()
                );
                let pause = self.handling_since_last(snapshot);
                self.sleep_for(pause);
            }
            SimEvent::DepotReached { snapshot, .. } => {
                println!("{}", "Delivered to Warehouse".green());
                let pause = self.handling_since_last(snapshot);
                self.sleep_for(pause);
                print_status(snapshot);
            }
            SimEvent::AllDelivered { snapshot } => {
                println!(
                    "{}",
                    format!(
                        "Packages delivered! All done! Running time: {:.1}s",
                        snapshot.travel_time
                    )
                    .green()
                    .bold()
                );
            }
        }
    }
}
