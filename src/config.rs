use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::renderer::DEFAULT_HIT_BUDGET;
use crate::world::GridDims;

/// Engine settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub screen_width: usize,
    pub screen_height: usize,
    pub hit_budget: u32,
    pub map: GridDims,
    /// Starting horizon row.
    pub pitch: f64,
    pub move_speed: f64,  // cells/s
    pub rot_speed: f64,   // rad/s
    pub pitch_speed: f64, // px/s
    pub lift_speed: f64,  // voxels/s
    /// Spread screen columns over the rayon pool.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screen_width: 512,
            screen_height: 384,
            hit_budget: DEFAULT_HIT_BUDGET,
            map: GridDims::default(),
            pitch: 200.0,
            move_speed: 10.0,
            rot_speed: 3.0,
            pitch_speed: 600.0,
            lift_speed: 6.0,
            parallel: true,
        }
    }
}

impl EngineConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
