// run settings for primitrace
// persisted as JSON; command-line flags override individual fields
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::shape::ShapeType;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// number of shapes to commit
    pub count: u32,
    pub shape_type: ShapeType,
    /// shape opacity; 0 lets the search tune it per shape
    pub alpha: u8,

    // search budget per shape
    /// random candidates sampled to seed each trial
    pub n_random: u32,
    /// consecutive failed moves before a hill climb gives up
    pub max_age: u32,
    /// independent trials, split across workers
    pub trials: u32,
    /// extra hill-climbed copies of each committed shape
    pub repeat: u32,

    // image sizes
    /// working resolution (longest side); 0 keeps the input size
    pub resize: u32,
    /// output resolution (longest side); 0 means the working size
    pub output_size: u32,

    // runtime
    /// search workers; 0 uses one per rayon thread
    pub workers: usize,
    /// fixed seed for reproducible runs; each worker uses seed + index
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            count: 100,
            shape_type: ShapeType::Triangle,
            alpha: 128,

            n_random: 1000,
            max_age: 100,
            trials: 16,
            repeat: 0,

            resize: 256,
            output_size: 1024,

            workers: 0,
            seed: None,
        }
    }
}

impl Settings {
    /// read settings from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// load settings from JSON file, or return defaults if it can't be read
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("failed to load {}: {}. using defaults.", path.display(), e);
                Self::default()
            }
        }
    }

    /// save settings to JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// arguments of one hill-climb search
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    pub shape_type: ShapeType,
    pub alpha: u8,
    pub n_random: u32,
    pub max_age: u32,
    pub trials: u32,
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams::from(&Settings::default())
    }
}

impl From<&Settings> for SearchParams {
    fn from(settings: &Settings) -> Self {
        SearchParams {
            shape_type: settings.shape_type,
            alpha: settings.alpha,
            n_random: settings.n_random,
            max_age: settings.max_age,
            trials: settings.trials,
        }
    }
}
