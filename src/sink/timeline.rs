use std::error::Error;
use std::io;

use csv::Writer;
use tracing::info;

use crate::sink::{Leg, PresentationSink, SimEvent};

const HEADER: [&str; 8] = [
    "event",
    "target",
    "steps",
    "row",
    "col",
    "load",
    "travel_time",
    "handling_time",
];

/// One line of the run timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineRow {
    pub event: &'static str,
    pub target: String,
    pub steps: usize,
    pub row: usize,
    pub col: usize,
    pub load: f64,
    pub travel_time: f64,
    pub handling_time: f64,
}

impl TimelineRow {
    fn record(&self) -> [String; 8] {
        [
            self.event.to_string(),
            self.target.clone(),
            self.steps.to_string(),
            self.row.to_string(),
            self.col.to_string(),
            self.load.to_string(),
            format!("{:.2}", self.travel_time),
            format!("{:.2}", self.handling_time),
        ]
    }
}

/// Collects a row per leg, pickup and depot visit, for CSV export.
#[derive(Debug, Default)]
pub struct TimelineSink {
    pub rows: Vec<TimelineRow>,
}

impl TimelineSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_to_csv(&self, filename: &str) -> Result<(), Box<dyn Error>> {
        let wtr = Writer::from_path(filename)?;
        self.write(wtr)?;
        info!("Wrote {} timeline rows to {}", self.rows.len(), filename);
        Ok(())
    }

    pub fn write<W: io::Write>(&self, mut wtr: Writer<W>) -> Result<(), Box<dyn Error>> {
        wtr.write_record(HEADER)?;
        for row in &self.rows {
            wtr.write_record(row.record())?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl PresentationSink for TimelineSink {
    fn on_event(&mut self, event: &SimEvent) {
        let snapshot = event.snapshot();
        let (name, target, steps) = match event {
            SimEvent::RunStarted { .. } => ("start", String::new(), 0),
            SimEvent::LegTravelled { leg, path, .. } => {
                let target = match leg {
                    Leg::Pickup(id) => id.clone(),
                    Leg::Depot => "depot".to_string(),
                };
                ("travel", target, path.len())
            }
            SimEvent::PackagePicked { id, .. } => ("pickup", id.clone(), 0),
            SimEvent::DepotReached { delivered, .. } => ("unload", delivered.join(" "), 0),
            SimEvent::AllDelivered { .. } => ("done", String::new(), 0),
        };

        self.rows.push(TimelineRow {
            event: name,
            target,
            steps,
            row: snapshot.position.row,
            col: snapshot.position.col,
            load: snapshot.load,
            travel_time: snapshot.travel_time,
            handling_time: snapshot.handling_time,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{Cell, Path};
    use crate::sink::Snapshot;

    fn snapshot(position: Cell, load: f64, travel_time: f64) -> Snapshot {
        Snapshot {
            layout: vec![],
            position,
            load,
            remaining: 10.0 - load,
            held_ids: vec![],
            held_descriptions: vec![],
            delivered: 0,
            travel_time,
            handling_time: 0.0,
        }
    }

    #[test]
    fn writes_header_and_one_row_per_event() {
        let mut sink = TimelineSink::new();
        sink.on_event(&SimEvent::LegTravelled {
            leg: Leg::Pickup("P1".to_string()),
            from: Cell::new(0, 0),
            path: Path {
                cells: vec![Cell::new(0, 1), Cell::new(0, 2)],
            },
            departed_at: 0.0,
            arrivals: vec![0.1, 0.2],
            snapshot: snapshot(Cell::new(0, 2), 0.0, 0.2),
        });
        sink.on_event(&SimEvent::AllDelivered {
            snapshot: snapshot(Cell::new(2, 2), 0.0, 0.5),
        });

        let mut buffer = Vec::new();
        sink.write(Writer::from_writer(&mut buffer)).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "event,target,steps,row,col,load,travel_time,handling_time");
        assert_eq!(lines[1], "travel,P1,2,0,2,0,0.20,0.00");
        assert_eq!(lines[2], "done,,0,2,2,0,0.50,0.00");
    }
}
