//! Events the scheduler emits and the sinks that consume them.
//!
//! The scheduler never renders anything itself. It builds a [`SimEvent`] after
//! every transition and hands it to a [`PresentationSink`]; sinks decide
//! whether to draw, log, pace, or record.

pub mod console;
pub mod timeline;

use std::fmt;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::types::{Cell, Path};
use crate::utils::format_cells;

pub use console::ConsoleSink;
pub use timeline::TimelineSink;

/// State of the run at the moment an event is emitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub layout: Vec<Vec<String>>,
    pub position: Cell,
    pub load: f64,
    pub remaining: f64,
    pub held_ids: Vec<String>,
    pub held_descriptions: Vec<String>,
    pub delivered: usize,
    pub travel_time: f64,
    pub handling_time: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Leg {
    Pickup(String),
    Depot,
}

impl fmt::Display for Leg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leg::Pickup(id) => write!(f, "pickup {id}"),
            Leg::Depot => write!(f, "depot"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SimEvent {
    RunStarted {
        order: Vec<String>,
        snapshot: Snapshot,
    },
    LegTravelled {
        leg: Leg,
        from: Cell,
        path: Path,
        departed_at: f64,
        /// Simulated travel time on arrival at each cell of `path`.
        arrivals: Vec<f64>,
        snapshot: Snapshot,
    },
    PackagePicked {
        id: String,
        description: String,
        weight: f64,
        snapshot: Snapshot,
    },
    DepotReached {
        delivered: Vec<String>,
        snapshot: Snapshot,
    },
    AllDelivered {
        snapshot: Snapshot,
    },
}

impl SimEvent {
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            SimEvent::RunStarted { snapshot, .. }
            | SimEvent::LegTravelled { snapshot, .. }
            | SimEvent::PackagePicked { snapshot, .. }
            | SimEvent::DepotReached { snapshot, .. }
            | SimEvent::AllDelivered { snapshot } => snapshot,
        }
    }
}

pub trait PresentationSink {
    fn on_event(&mut self, event: &SimEvent);
}

/// Discards every event.
#[derive(Debug, Default)]
pub struct NullSink;

impl PresentationSink for NullSink {
    fn on_event(&mut self, _event: &SimEvent) {}
}

/// Keeps every event, in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SimEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of all travelled legs, in order.
    pub fn legs(&self) -> Vec<(&Leg, &Path)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::LegTravelled { leg, path, .. } => Some((leg, path)),
                _ => None,
            })
            .collect()
    }

    /// Ids in the order they were picked up.
    pub fn pickups(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                SimEvent::PackagePicked { id, .. } => Some(id.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl PresentationSink for RecordingSink {
    fn on_event(&mut self, event: &SimEvent) {
        self.events.push(event.clone());
    }
}

/// Reports events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl PresentationSink for TracingSink {
    fn on_event(&mut self, event: &SimEvent) {
        match event {
            SimEvent::RunStarted { order, .. } => {
                info!("Delivery simulation starts with {} packages", order.len());
            }
            SimEvent::LegTravelled { leg, from, path, .. } => {
                debug!("Leg to {} from {}: path {}", leg, from, format_cells(&path.cells));
            }
            SimEvent::PackagePicked { id, snapshot, .. } => {
                info!(
                    "Picked up package {} at {} (load {})",
                    id, snapshot.position, snapshot.load
                );
            }
            SimEvent::DepotReached { delivered, snapshot } => {
                info!(
                    "Delivered {} packages to depot, running time {:.1}s",
                    delivered.len(),
                    snapshot.travel_time
                );
            }
            SimEvent::AllDelivered { snapshot } => {
                info!(
                    "All {} packages delivered, running time {:.1}s",
                    snapshot.delivered, snapshot.travel_time
                );
            }
        }
    }
}

/// Fans each event out to several sinks.
#[derive(Default)]
pub struct SinkSet<'a> {
    sinks: Vec<Box<dyn PresentationSink + 'a>>,
}

impl<'a> SinkSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink. Pass `&mut sink` to keep ownership for inspection after the run.
    pub fn with(mut self, sink: impl PresentationSink + 'a) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl PresentationSink for SinkSet<'_> {
    fn on_event(&mut self, event: &SimEvent) {
        for sink in &mut self.sinks {
            sink.on_event(event);
        }
    }
}

impl<S: PresentationSink + ?Sized> PresentationSink for &mut S {
    fn on_event(&mut self, event: &SimEvent) {
        (**self).on_event(event);
    }
}
