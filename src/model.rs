// Model: the committed canvas plus a pool of search workers.
//
// Each step fans the search out over the workers with rayon, commits the
// winning shape, and records the new score.

use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::canvas::{average_color, compute_color, difference_full, difference_partial, draw_lines};
use crate::error::{Error, Result};
use crate::optimize::hill_climb;
use crate::raster::Rasterizer;
use crate::render::{render_shapes, Placed};
use crate::scanline::Scanline;
use crate::settings::SearchParams;
use crate::shape::Shape;
use crate::state::State;
use crate::worker::Worker;

/// failed moves allowed when refining a repeated shape
const REPEAT_MAX_AGE: u32 = 100;

pub struct Model {
    width: u32,
    height: u32,
    target: Arc<RgbaImage>,
    current: Arc<RgbaImage>,
    background: Rgba<u8>,
    score: f64,
    shapes: Vec<Placed>,
    scores: Vec<f64>,
    workers: Vec<Worker>,
    rasterizer: Rasterizer,
    lines: Vec<Scanline>,
}

impl Model {
    /// Start from a canvas filled with the target's average color.
    /// `workers == 0` uses one worker per rayon thread; a `seed` makes every
    /// worker deterministic (worker i uses `seed + i`).
    pub fn new(target: RgbaImage, workers: usize, seed: Option<u64>) -> Result<Self> {
        let (width, height) = target.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::EmptyImage { width, height });
        }

        let background = average_color(&target);
        let current = RgbaImage::from_pixel(width, height, background);
        let score = difference_full(&target, &current);
        let target = Arc::new(target);

        let n = if workers == 0 { rayon::current_num_threads().max(1) } else { workers };
        let workers = (0..n)
            .map(|i| match seed {
                Some(seed) => Worker::with_seed(Arc::clone(&target), seed.wrapping_add(i as u64)),
                None => Worker::new(Arc::clone(&target)),
            })
            .collect();

        tracing::debug!(width, height, workers = n, score, "model ready");

        Ok(Self {
            width,
            height,
            target,
            current: Arc::new(current),
            background,
            score,
            shapes: Vec::new(),
            scores: Vec::new(),
            workers,
            rasterizer: Rasterizer::new(width, height),
            lines: Vec::new(),
        })
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
    pub fn target(&self) -> &RgbaImage {
        &self.target
    }

    #[inline]
    pub fn current(&self) -> &RgbaImage {
        &self.current
    }

    #[inline]
    pub fn background(&self) -> Rgba<u8> {
        self.background
    }

    /// difference between the canvas and the target, 0..=1
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    #[inline]
    pub fn shapes(&self) -> &[Placed] {
        &self.shapes
    }

    /// score after each committed shape
    #[inline]
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    /// Search for one shape, commit it, then commit up to `repeat` hill-climbed
    /// variations of it. Returns the number of energy evaluations spent.
    pub fn step(&mut self, params: &SearchParams, repeat: u32) -> u64 {
        profiling::scope!("Model::step");

        let (state, mut evaluations) = self.run_workers(params);
        self.add(*state.shape(), state.alpha());

        let mut state = state;
        for _ in 0..repeat {
            let current = Arc::clone(&self.current);
            let worker = &mut self.workers[0];
            worker.init(current, self.score);
            state.invalidate();
            let before = state.energy(worker);
            state = hill_climb(worker, state, REPEAT_MAX_AGE);
            let after = state.energy(worker);
            evaluations += worker.counter();
            if before == after {
                break;
            }
            self.add(*state.shape(), state.alpha());
        }

        evaluations
    }

    fn run_workers(&mut self, params: &SearchParams) -> (State, u64) {
        let current = Arc::clone(&self.current);
        let score = self.score;
        let per_worker = SearchParams {
            trials: params.trials.max(1).div_ceil(self.workers.len() as u32),
            ..*params
        };

        let results: Vec<(State, u64)> = self
            .workers
            .par_iter_mut()
            .map(|worker| {
                worker.init(Arc::clone(&current), score);
                let state = worker.best_hill_climb_state(&per_worker);
                (state, worker.counter())
            })
            .collect();

        let evaluations = results.iter().map(|(_, n)| n).sum();
        let energy = |s: &State| s.cached_energy().unwrap_or(f64::INFINITY);
        // earlier workers win ties
        let best = results
            .into_iter()
            .map(|(state, _)| state)
            .reduce(|best, state| if energy(&state) < energy(&best) { state } else { best })
            .expect("model has at least one worker");
        (best, evaluations)
    }

    /// draw `shape` at `alpha` with its best-fit color and commit it; returns the new score
    pub fn add(&mut self, shape: Shape, alpha: u8) -> f64 {
        profiling::scope!("Model::add");

        let before = Arc::clone(&self.current);
        let mut after = (*before).clone();

        shape.rasterize(&mut self.rasterizer, &mut self.lines);
        let color = compute_color(&self.target, &before, &self.lines, alpha);
        draw_lines(&mut after, color, &self.lines);

        self.score = difference_partial(&self.target, &before, &after, self.score, &self.lines);
        self.current = Arc::new(after);
        self.shapes.push(Placed { shape, color });
        self.scores.push(self.score);
        self.score
    }

    /// anti-aliased re-render of every committed shape at `scale` times the working size
    pub fn render(&self, scale: f32) -> Result<RgbaImage> {
        render_shapes(self.width, self.height, self.background, &self.shapes, scale)
    }
}
