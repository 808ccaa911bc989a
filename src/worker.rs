// Per-thread search unit.
//
// A Worker owns every scratch resource a cost evaluation needs (scratch canvas,
// rasterizer and its coverage mask, span buffer, rng) and reuses them across evaluations.
// The scratch canvas is never cleared: each evaluation first copies exactly the
// spans of the candidate from `current` and then draws on top, and the partial
// difference only reads those same spans. Whatever sits outside them is a
// leftover from earlier candidates and is never observed.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use image::RgbaImage;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use crate::canvas::{compute_color, copy_lines, difference_partial, draw_lines};
use crate::heatmap::Heatmap;
use crate::optimize::{HillClimb, Refiner, SearchObserver, TraceObserver, TrialReport};
use crate::raster::Rasterizer;
use crate::scanline::Scanline;
use crate::settings::SearchParams;
use crate::shape::{Shape, ShapeType};
use crate::state::State;

/// initial span buffer capacity; grows once if a shape needs more
const LINES_CAPACITY: usize = 4096;

// distinguishes workers created within the same clock tick
static WORKER_SEQ: AtomicU64 = AtomicU64::new(0);

fn time_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let seq = WORKER_SEQ.fetch_add(1, Ordering::Relaxed);
    nanos ^ seq.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

pub struct Worker {
    width: u32,
    height: u32,
    target: Arc<RgbaImage>,
    current: Arc<RgbaImage>,
    buffer: RgbaImage,
    rasterizer: Rasterizer,
    lines: Vec<Scanline>,
    heatmap: Heatmap,
    rng: Pcg32,
    score: f64,
    counter: u64,
}

impl Worker {
    /// worker with a time-based seed
    pub fn new(target: Arc<RgbaImage>) -> Self {
        Self::with_seed(target, time_seed())
    }

    /// worker with an explicit seed, for reproducible searches
    pub fn with_seed(target: Arc<RgbaImage>, seed: u64) -> Self {
        profiling::scope!("Worker::new");
        let (width, height) = target.dimensions();
        Self {
            width,
            height,
            // until the first init the canvas is the target itself (score 0)
            current: Arc::clone(&target),
            buffer: RgbaImage::new(width, height),
            rasterizer: Rasterizer::new(width, height),
            lines: Vec::with_capacity(LINES_CAPACITY),
            heatmap: Heatmap::new(width, height),
            rng: Pcg32::seed_from_u64(seed),
            score: 0.0,
            counter: 0,
            target,
        }
    }

    /// start a new round against `current`, whose difference from the target is `score`
    pub fn init(&mut self, current: Arc<RgbaImage>, score: f64) {
        debug_assert_eq!(current.dimensions(), (self.width, self.height));
        self.current = current;
        self.score = score;
        self.counter = 0;
        self.heatmap.clear();
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn target(&self) -> &Arc<RgbaImage> {
        &self.target
    }

    #[inline]
    pub fn current(&self) -> &Arc<RgbaImage> {
        &self.current
    }

    /// baseline score of the current round
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    /// energy evaluations since the last `init`
    #[inline]
    pub fn counter(&self) -> u64 {
        self.counter
    }

    #[inline]
    pub fn heatmap(&self) -> &Heatmap {
        &self.heatmap
    }

    #[inline]
    pub fn heatmap_mut(&mut self) -> &mut Heatmap {
        &mut self.heatmap
    }

    #[inline]
    pub fn rng(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    /// Score the canvas would have after drawing `shape` with its best-fit color
    /// at opacity `alpha` (1..=255). Only the scratch canvas is written.
    pub fn energy(&mut self, shape: &Shape, alpha: u8) -> f64 {
        profiling::scope!("Worker::energy");
        debug_assert!(alpha > 0, "opacity must be in 1..=255");
        self.counter += 1;

        shape.rasterize(&mut self.rasterizer, &mut self.lines);
        let color = compute_color(&self.target, &self.current, &self.lines, alpha);
        copy_lines(&mut self.buffer, &self.current, &self.lines);
        draw_lines(&mut self.buffer, color, &self.lines);
        difference_partial(&self.target, &self.current, &self.buffer, self.score, &self.lines)
    }

    /// fresh random candidate; `Any` is resolved to a concrete kind first
    pub fn random_state(&mut self, shape_type: ShapeType, alpha: u8) -> State {
        let kind = shape_type.resolve(&mut self.rng);
        let shape = Shape::random(kind, self.width, self.height, &mut self.rng);
        State::new(shape, alpha)
    }

    /// Best of `n` random candidates (at least one). The first candidate with the
    /// lowest energy wins ties.
    pub fn best_random_state(&mut self, shape_type: ShapeType, alpha: u8, n: u32) -> State {
        profiling::scope!("best_random_state");
        let mut best = self.random_state(shape_type, alpha);
        let mut best_energy = best.energy(self);
        for _ in 1..n.max(1) {
            let mut state = self.random_state(shape_type, alpha);
            let energy = state.energy(self);
            if energy < best_energy {
                best_energy = energy;
                best = state;
            }
        }
        best
    }

    /// best hill-climbed candidate using the default refiner, tracing each trial
    pub fn best_hill_climb_state(&mut self, params: &SearchParams) -> State {
        self.best_hill_climb_state_with(params, &mut HillClimb, &mut TraceObserver)
    }

    /// Run `params.trials` independent trials (at least one): seed each with
    /// `best_random_state`, refine it, and keep the lowest refined energy. Earlier
    /// trials win ties. The observer sees every trial's seed and refined energy.
    pub fn best_hill_climb_state_with<F, O>(
        &mut self,
        params: &SearchParams,
        refiner: &mut F,
        observer: &mut O,
    ) -> State
    where
        F: Refiner + ?Sized,
        O: SearchObserver + ?Sized,
    {
        profiling::scope!("best_hill_climb_state");
        let (mut best_energy, mut best) = self.run_trial(0, params, refiner, observer);
        for trial in 1..params.trials.max(1) {
            let (energy, state) = self.run_trial(trial, params, refiner, observer);
            if energy < best_energy {
                best_energy = energy;
                best = state;
            }
        }
        best
    }

    fn run_trial<F, O>(
        &mut self,
        trial: u32,
        params: &SearchParams,
        refiner: &mut F,
        observer: &mut O,
    ) -> (f64, State)
    where
        F: Refiner + ?Sized,
        O: SearchObserver + ?Sized,
    {
        let mut seed = self.best_random_state(params.shape_type, params.alpha, params.n_random);
        let before = seed.energy(self);
        let mut state = refiner.refine(self, seed, params.max_age);
        let after = state.energy(self);
        observer.trial(&TrialReport {
            trial,
            n_random: params.n_random,
            before,
            max_age: params.max_age,
            after,
        });
        (after, state)
    }
}
