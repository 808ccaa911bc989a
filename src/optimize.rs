use crate::state::State;
use crate::worker::Worker;

/// Local search applied to each seed produced by random sampling.
///
/// Implementations may mutate the state through `State::do_move` and must
/// return a state whose cached energy reflects its true cost (or a cost the
/// caller should rank it by).
pub trait Refiner {
    fn refine(&mut self, worker: &mut Worker, state: State, max_age: u32) -> State;
}

/// Greedy single-move hill climbing. Stops after `max_age` consecutive moves
/// that fail to strictly improve the best energy seen.
#[derive(Clone, Copy, Debug, Default)]
pub struct HillClimb;

impl Refiner for HillClimb {
    fn refine(&mut self, worker: &mut Worker, state: State, max_age: u32) -> State {
        hill_climb(worker, state, max_age)
    }
}

pub fn hill_climb(worker: &mut Worker, mut state: State, max_age: u32) -> State {
    profiling::scope!("hill_climb");
    let mut best_energy = state.energy(worker);
    let mut best = state;
    let mut age = 0;
    while age < max_age {
        let undo = state.do_move(worker);
        let energy = state.energy(worker);
        if energy >= best_energy {
            state.undo_move(undo);
            age += 1;
        } else {
            best_energy = energy;
            best = state;
            age = 0;
        }
    }
    best
}

/// Outcome of one hill-climb trial.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrialReport {
    pub trial: u32,
    pub n_random: u32,
    /// energy of the best random seed
    pub before: f64,
    pub max_age: u32,
    /// energy after refinement
    pub after: f64,
}

/// receives one report per trial of `Worker::best_hill_climb_state_with`
pub trait SearchObserver {
    fn trial(&mut self, report: &TrialReport);
}

/// logs each trial at debug level
#[derive(Clone, Copy, Debug, Default)]
pub struct TraceObserver;

impl SearchObserver for TraceObserver {
    fn trial(&mut self, r: &TrialReport) {
        tracing::debug!(
            trial = r.trial,
            "{}x random: {:.6} -> {}x hill climb: {:.6}",
            r.n_random,
            r.before,
            r.max_age,
            r.after
        );
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SilentObserver;

impl SearchObserver for SilentObserver {
    fn trial(&mut self, _report: &TrialReport) {}
}

// collects reports, handy for diagnostics
impl SearchObserver for Vec<TrialReport> {
    fn trial(&mut self, report: &TrialReport) {
        self.push(*report);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::difference_full;
    use crate::shape::ShapeType;
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;

    fn worker(seed: u64) -> Worker {
        let target = Arc::new(RgbaImage::from_fn(40, 40, |x, y| {
            if x < 20 && y < 20 {
                Rgba([230, 30, 30, 255])
            } else {
                Rgba([20, 20, 90, 255])
            }
        }));
        let current = Arc::new(RgbaImage::from_pixel(40, 40, Rgba([20, 20, 90, 255])));
        let score = difference_full(&target, &current);
        let mut w = Worker::with_seed(target, seed);
        w.init(current, score);
        w
    }

    #[test]
    fn test_hill_climb_is_monotone() {
        let mut w = worker(3);
        let mut seed = w.random_state(ShapeType::Rectangle, 255);
        let start = seed.energy(&mut w);
        let mut out = hill_climb(&mut w, seed, 100);
        assert!(out.energy(&mut w) <= start);
        assert_eq!(out.shape().kind(), ShapeType::Rectangle);
    }

    #[test]
    fn test_zero_age_returns_seed() {
        let mut w = worker(4);
        let mut seed = w.random_state(ShapeType::Circle, 128);
        let e = seed.energy(&mut w);
        let before = w.counter();
        let out = hill_climb(&mut w, seed, 0);
        assert_eq!(out.shape(), seed.shape());
        assert_eq!(out.cached_energy(), Some(e));
        assert_eq!(w.counter(), before);
    }

    #[test]
    fn test_stops_after_max_age_failures() {
        // identical canvases and opaque shapes: nothing can beat 0, so exactly max_age moves
        let im = Arc::new(RgbaImage::from_pixel(16, 16, Rgba([50, 60, 70, 255])));
        let mut w = Worker::with_seed(Arc::clone(&im), 5);
        w.init(im, 0.0);
        let seed = w.random_state(ShapeType::Ellipse, 255);
        let out = hill_climb(&mut w, seed, 25);
        assert_eq!(out.shape(), seed.shape());
        assert_eq!(w.counter(), 1 + 25);
    }

    #[test]
    fn test_vec_observer_collects() {
        let mut reports: Vec<TrialReport> = Vec::new();
        reports.trial(&TrialReport { trial: 0, n_random: 1, before: 0.5, max_age: 2, after: 0.4 });
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].after, 0.4);
    }
}
