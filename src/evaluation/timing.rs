use crate::config::SimConfig;

/// Simulated time accrual. A step takes longer the heavier the vehicle is.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingModel {
    pub step_time: f64,
    pub weight_time: f64,
}

impl TimingModel {
    pub fn new(step_time: f64, weight_time: f64) -> Self {
        Self {
            step_time,
            weight_time,
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.step_time, config.weight_time)
    }

    /// Time for one grid step while carrying `load`.
    pub fn step(&self, load: f64) -> f64 {
        self.step_time + self.weight_time * load
    }

    /// Time to load a package of `weight` onto the vehicle.
    pub fn pickup(&self, weight: f64) -> f64 {
        self.weight_time * weight
    }

    /// Time to unload `load` at the depot.
    pub fn unload(&self, load: f64) -> f64 {
        self.step(load)
    }
}

/// Running totals for one simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SimClock {
    pub travel_time: f64,
    pub handling_time: f64,
}

impl SimClock {
    /// Advance by `steps` moves at `load`, returning the arrival time after each step.
    pub fn travel(&mut self, model: &TimingModel, steps: usize, load: f64) -> Vec<f64> {
        let per_step = model.step(load);
        (0..steps)
            .map(|_| {
                self.travel_time += per_step;
                self.travel_time
            })
            .collect()
    }

    pub fn handle(&mut self, duration: f64) {
        self.handling_time += duration;
    }

    pub fn total(&self) -> f64 {
        self.travel_time + self.handling_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn default_step_matches_load_plus_one_tenths() {
        let model = TimingModel::from_config(&SimConfig::default());
        assert!(close(model.step(0.0), 0.1));
        assert!(close(model.step(13.0), 1.4));
    }

    #[test]
    fn travel_accumulates_per_step() {
        let model = TimingModel::new(0.1, 0.1);
        let mut clock = SimClock::default();
        let arrivals = clock.travel(&model, 3, 4.0);
        assert_eq!(arrivals.len(), 3);
        assert!(close(arrivals[0], 0.5));
        assert!(close(arrivals[2], 1.5));
        assert!(close(clock.travel_time, 1.5));
    }

    #[test]
    fn handling_is_tracked_apart_from_travel() {
        let model = TimingModel::new(0.1, 0.2);
        let mut clock = SimClock::default();
        clock.travel(&model, 2, 0.0);
        clock.handle(model.pickup(5.0));
        assert!(close(clock.travel_time, 0.2));
        assert!(close(clock.handling_time, 1.0));
        assert!(close(clock.total(), 1.2));
    }
}
