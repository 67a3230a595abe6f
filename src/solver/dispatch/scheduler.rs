use tracing::{debug, info, span, trace, Level};

use crate::config::SimConfig;
use crate::domain::grid::Grid;
use crate::domain::registry::PackageRegistry;
use crate::domain::types::{Cell, Package, Path, VehicleState};
use crate::error::{DispatchError, LoadError, RunFailure};
use crate::evaluation::timing::{SimClock, TimingModel};
use crate::sink::{Leg, PresentationSink, SimEvent, Snapshot};
use crate::solver::astar::AStarPlanner;
use crate::utils::format_cells;

use super::state::{DispatchState, RunReport};

/// Greedy first-fit delivery loop for a single vehicle.
///
/// Owns the grid and vehicle for the whole run. Packages are taken in
/// priority order, skipping any that no longer fit; when nothing fits the
/// vehicle returns to the depot and unloads.
pub struct Scheduler {
    grid: Grid,
    vehicle: VehicleState,
    pending: Vec<Package>,
    delivered: Vec<String>,
    state: DispatchState,
    timing: TimingModel,
    clock: SimClock,
    max_expansions: usize,
    max_transitions: usize,
    transitions: usize,
    legs: usize,
    steps: usize,
    depot_returns: usize,
    announced: bool,
}

impl Scheduler {
    pub fn new(
        grid: Grid,
        registry: &PackageRegistry,
        config: &SimConfig,
    ) -> Result<Self, LoadError> {
        registry.check_capacity(config.capacity)?;

        Ok(Self {
            vehicle: VehicleState::new(grid.start(), config.capacity),
            grid,
            pending: registry.ordered().to_vec(),
            delivered: vec![],
            state: DispatchState::AtDepot,
            timing: TimingModel::from_config(config),
            clock: SimClock::default(),
            max_expansions: config.max_expansions,
            max_transitions: config.max_transitions,
            transitions: 0,
            legs: 0,
            steps: 0,
            depot_returns: 0,
            announced: false,
        })
    }

    pub fn state(&self) -> &DispatchState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn vehicle(&self) -> &VehicleState {
        &self.vehicle
    }

    /// Packages not yet collected, in priority order.
    pub fn pending(&self) -> &[Package] {
        &self.pending
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            layout: self.grid.layout(),
            position: self.vehicle.position,
            load: self.vehicle.load(),
            remaining: self.vehicle.remaining,
            held_ids: self.vehicle.held.iter().map(|p| p.id.clone()).collect(),
            held_descriptions: self
                .vehicle
                .held
                .iter()
                .map(|p| p.description.clone())
                .collect(),
            delivered: self.delivered.len(),
            travel_time: self.clock.travel_time,
            handling_time: self.clock.handling_time,
        }
    }

    /// Drive the state machine to `AllDelivered`.
    ///
    /// On failure the scheduler keeps the last consistent state, which is
    /// also returned inside the [`RunFailure`].
    pub fn run(&mut self, sink: &mut impl PresentationSink) -> Result<RunReport, RunFailure> {
        let run_span = span!(Level::INFO, "dispatch_run", packages = self.pending.len());
        let _run_guard = run_span.enter();

        while !self.state.is_terminal() {
            let outcome = self.step(sink).map(|_| ());
            if let Err(error) = outcome {
                return Err(RunFailure {
                    error,
                    last_state: self.snapshot(),
                });
            }
        }

        info!(
            "Run complete: {} packages, {} depot returns, {} steps, running time {:.1}s",
            self.delivered.len(),
            self.depot_returns,
            self.steps,
            self.clock.travel_time
        );

        Ok(self.report())
    }

    pub fn report(&self) -> RunReport {
        RunReport {
            delivered: self.delivered.clone(),
            depot_returns: self.depot_returns,
            legs: self.legs,
            steps: self.steps,
            transitions: self.transitions,
            travel_time: self.clock.travel_time,
            handling_time: self.clock.handling_time,
        }
    }

    /// Perform a single transition.
    pub fn step(&mut self, sink: &mut impl PresentationSink) -> Result<&DispatchState, DispatchError> {
        if self.state.is_terminal() {
            return Ok(&self.state);
        }
        if self.transitions >= self.max_transitions {
            return Err(DispatchError::TransitionLimit(self.max_transitions));
        }

        if !self.announced {
            self.announced = true;
            sink.on_event(&SimEvent::RunStarted {
                order: self.pending.iter().map(|p| p.id.clone()).collect(),
                snapshot: self.snapshot(),
            });
        }

        let next = match self.state.clone() {
            DispatchState::AtDepot => self.leave_depot(sink)?,
            DispatchState::EnRouteToPickup(id) => self.travel_to_pickup(&id, sink)?,
            DispatchState::AtPickup(id) => self.collect(&id, sink)?,
            DispatchState::EnRouteToDepot => self.return_to_depot(sink)?,
            DispatchState::AllDelivered => DispatchState::AllDelivered,
        };

        trace!("Transition {}: {} -> {}", self.transitions, self.state, next);
        self.transitions += 1;
        self.state = next;
        Ok(&self.state)
    }

    /// First package in priority order that fits the remaining capacity.
    fn scan(&self) -> DispatchState {
        match self.pending.iter().find(|p| self.vehicle.fits(p)) {
            Some(package) => {
                debug!(
                    "Next pickup {} (weight {}, remaining capacity {})",
                    package.id, package.weight, self.vehicle.remaining
                );
                DispatchState::EnRouteToPickup(package.id.clone())
            }
            None => {
                debug!(
                    "Nothing else fits (remaining capacity {}, {} pending), heading to depot",
                    self.vehicle.remaining,
                    self.pending.len()
                );
                DispatchState::EnRouteToDepot
            }
        }
    }

    fn leave_depot(
        &mut self,
        sink: &mut impl PresentationSink,
    ) -> Result<DispatchState, DispatchError> {
        if self.pending.is_empty() {
            sink.on_event(&SimEvent::AllDelivered {
                snapshot: self.snapshot(),
            });
            return Ok(DispatchState::AllDelivered);
        }

        match self.scan() {
            DispatchState::EnRouteToDepot if self.vehicle.held.is_empty() => {
                Err(DispatchError::Stalled {
                    remaining: self.pending.len(),
                })
            }
            next => Ok(next),
        }
    }

    fn travel_to_pickup(
        &mut self,
        id: &str,
        sink: &mut impl PresentationSink,
    ) -> Result<DispatchState, DispatchError> {
        let target = self.pending[self.pending_index(id)?].location;
        let path = self.plan(target)?;
        self.travel(Leg::Pickup(id.to_string()), path, sink);
        Ok(DispatchState::AtPickup(id.to_string()))
    }

    fn collect(
        &mut self,
        id: &str,
        sink: &mut impl PresentationSink,
    ) -> Result<DispatchState, DispatchError> {
        let idx = self.pending_index(id)?;
        // Grid first, so a desync leaves vehicle and pending list untouched
        self.grid.clear_marker(self.pending[idx].location)?;

        let package = self.pending.remove(idx);
        self.clock.handle(self.timing.pickup(package.weight));
        let (id, description, weight) = (
            package.id.clone(),
            package.description.clone(),
            package.weight,
        );
        self.vehicle.pick_up(package);

        sink.on_event(&SimEvent::PackagePicked {
            id,
            description,
            weight,
            snapshot: self.snapshot(),
        });

        Ok(self.scan())
    }

    fn return_to_depot(
        &mut self,
        sink: &mut impl PresentationSink,
    ) -> Result<DispatchState, DispatchError> {
        let depot = self.grid.depot();
        let path = self.plan(depot)?;
        self.travel(Leg::Depot, path, sink);

        self.clock.handle(self.timing.unload(self.vehicle.load()));
        let unloaded: Vec<String> = self
            .vehicle
            .unload_at(depot)
            .into_iter()
            .map(|p| p.id)
            .collect();
        self.delivered.extend(unloaded.iter().cloned());
        self.depot_returns += 1;

        sink.on_event(&SimEvent::DepotReached {
            delivered: unloaded,
            snapshot: self.snapshot(),
        });
        Ok(DispatchState::AtDepot)
    }

    fn pending_index(&self, id: &str) -> Result<usize, DispatchError> {
        self.pending
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| DispatchError::UnknownPackage(id.to_string()))
    }

    fn plan(&self, target: Cell) -> Result<Path, DispatchError> {
        let planner = AStarPlanner::new(&self.grid, self.max_expansions);
        Ok(planner.find_path(self.vehicle.position, target)?)
    }

    fn travel(&mut self, leg: Leg, path: Path, sink: &mut impl PresentationSink) {
        let from = self.vehicle.position;
        let departed_at = self.clock.travel_time;
        let arrivals = self
            .clock
            .travel(&self.timing, path.len(), self.vehicle.load());
        if let Some(destination) = path.destination() {
            self.vehicle.position = destination;
        }
        self.legs += 1;
        self.steps += path.len();
        debug!("Leg to {}: path {}", leg, format_cells(&path.cells));

        sink.on_event(&SimEvent::LegTravelled {
            leg,
            from,
            path,
            departed_at,
            arrivals,
            snapshot: self.snapshot(),
        });
    }
}
