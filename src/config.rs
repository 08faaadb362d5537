//! Run configuration for the headless driver

use particle_physics::constants::{PARTICLE_RADIUS, RELEASE_INTERVAL};
use particle_simulation::SolverParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenePreset {
    /// Inactive particles released one at a time from above the box
    Dispenser {
        count: usize,
        radius: f32,
        /// Simulated seconds between releases
        release_interval: f32,
    },
    /// A block of active particles dropped into the box
    Cuboid {
        width: usize,
        breadth: usize,
        height: usize,
        radius: f32,
    },
}

impl Default for ScenePreset {
    fn default() -> Self {
        ScenePreset::Dispenser {
            count: 120,
            radius: PARTICLE_RADIUS,
            release_interval: RELEASE_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub scene: ScenePreset,
    /// Frames to simulate
    pub frames: u64,
    /// Container rotation applied before every frame (degrees)
    pub rotation_per_frame: f32,
    /// Log a summary every this many frames (0 disables)
    pub summary_interval: u64,
    pub solver: SolverParams,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            scene: ScenePreset::default(),
            frames: 3600,
            rotation_per_frame: 0.0,
            summary_interval: 60,
            solver: SolverParams::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "could not read config: {}", e),
            ConfigError::Parse(e) => write!(f, "could not parse config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(ConfigError::Parse)
    }
}
