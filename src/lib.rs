//! Approximate an image with a sequence of geometric primitives.
//!
//! A [`Model`] owns the committed canvas and a pool of [`Worker`]s. Each step
//! every worker samples random shapes, refines the best ones by hill climbing,
//! and the overall winner is drawn onto the canvas with its best-fit color.

pub mod canvas;
pub mod error;
pub mod geom;
pub mod heatmap;
pub mod model;
pub mod optimize;
pub mod raster;
pub mod render;
pub mod scanline;
pub mod settings;
pub mod shape;
pub mod state;
pub mod worker;

pub use error::{Error, Result};
pub use heatmap::Heatmap;
pub use model::Model;
pub use optimize::{
    hill_climb, HillClimb, Refiner, SearchObserver, SilentObserver, TraceObserver, TrialReport,
};
pub use raster::Rasterizer;
pub use render::Placed;
pub use scanline::Scanline;
pub use settings::{SearchParams, Settings};
pub use shape::{Shape, ShapeType};
pub use state::State;
pub use worker::Worker;
