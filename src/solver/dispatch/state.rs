use std::fmt;

/// Where the scheduler is in its pickup / return cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchState {
    /// Ready to scan for the next load. Also the initial state, with the vehicle on the start cell.
    AtDepot,
    EnRouteToPickup(String),
    AtPickup(String),
    EnRouteToDepot,
    AllDelivered,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DispatchState::AllDelivered)
    }
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchState::AtDepot => write!(f, "at depot"),
            DispatchState::EnRouteToPickup(id) => write!(f, "en route to {id}"),
            DispatchState::AtPickup(id) => write!(f, "at {id}"),
            DispatchState::EnRouteToDepot => write!(f, "en route to depot"),
            DispatchState::AllDelivered => write!(f, "all delivered"),
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Package ids in delivery order.
    pub delivered: Vec<String>,
    pub depot_returns: usize,
    pub legs: usize,
    pub steps: usize,
    pub transitions: usize,
    pub travel_time: f64,
    pub handling_time: f64,
}
