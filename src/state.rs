use rand::Rng;

use crate::shape::Shape;
use crate::worker::Worker;

/// opacity a mutable-alpha state starts from
const DEFAULT_ALPHA: u8 = 128;

/// A candidate: a shape, the opacity it will be drawn with, and its energy once
/// computed. Energy is cached until the next move.
#[derive(Clone, Copy, Debug)]
pub struct State {
    shape: Shape,
    alpha: u8,
    mutate_alpha: bool,
    score: Option<f64>,
}

impl State {
    /// `alpha == 0` means "let local search tune the opacity", starting from 128.
    pub fn new(shape: Shape, alpha: u8) -> Self {
        let (alpha, mutate_alpha) = if alpha == 0 { (DEFAULT_ALPHA, true) } else { (alpha, false) };
        Self { shape, alpha, mutate_alpha, score: None }
    }

    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    #[inline]
    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    #[inline]
    pub fn mutates_alpha(&self) -> bool {
        self.mutate_alpha
    }

    /// cached energy, if it has been computed since the last move
    #[inline]
    pub fn cached_energy(&self) -> Option<f64> {
        self.score
    }

    /// energy of this candidate against the worker's current round; evaluated at most once
    pub fn energy(&mut self, worker: &mut Worker) -> f64 {
        if let Some(score) = self.score {
            return score;
        }
        let score = worker.energy(&self.shape, self.alpha);
        self.score = Some(score);
        score
    }

    /// mutate in place and return the previous state for `undo_move`
    pub fn do_move(&mut self, worker: &mut Worker) -> State {
        let undo = *self;
        let (w, h) = (worker.width(), worker.height());
        let rng = worker.rng();
        self.shape.mutate(rng, w, h);
        if self.mutate_alpha {
            let a = self.alpha as i32 + rng.random_range(-10..=10);
            self.alpha = a.clamp(1, 255) as u8;
        }
        self.score = None;
        undo
    }

    pub fn undo_move(&mut self, undo: State) {
        *self = undo;
    }

    /// override the cached energy; used by refiners that score candidates themselves
    #[inline]
    pub fn set_energy(&mut self, score: f64) {
        self.score = Some(score);
    }

    /// drop the cached energy, e.g. after the canvas it was measured against changed
    #[inline]
    pub fn invalidate(&mut self) {
        self.score = None;
    }
}
