//! Solver parameters for runtime tuning

use glam::Vec3;
use particle_physics::constants::*;
use particle_physics::error::{PhysicsError, Result};
use serde::{Deserialize, Serialize};

/// How pairwise collisions are found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionStrategy {
    /// Test every activated pair. O(n²); kept as the reference result.
    BruteForce,
    /// Query the 27 neighbouring hash cells of each particle.
    #[default]
    SpatialHash,
}

/// Open-top special case for the confinement pass.
///
/// The container has no ceiling, so a particle above the rim is outside the
/// box. Side walls only act on a particle that is below the rim and within
/// `threshold_container` (local units) of the wall it crossed; anything
/// further out has spilled over the edge and is left to fall.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenTopExemption {
    pub threshold_container: f32,
}

impl Default for OpenTopExemption {
    fn default() -> Self {
        Self {
            threshold_container: THRESHOLD_CONTAINER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverParams {
    pub gravity: Vec3,
    /// Length of one frame; `update` advances by exactly this much
    pub step_dt: f32,
    pub substeps: u32,
    pub fluid_restitution: f32,
    pub wall_restitution: f32,
    /// Minimum overlap depth that triggers a correction
    pub overlap_threshold: f32,
    /// Requested hash cell size. Widened at build time to cover the largest
    /// contact distance.
    pub cell_size: f32,
    /// Disjoint index ranges the confinement pass is split into
    pub container_workers: usize,
    pub collision_strategy: CollisionStrategy,
    pub open_top: OpenTopExemption,
    /// Magnitude of the random launch velocity given by `add_particle`
    pub initial_speed: f32,
    /// Seed for launch velocities; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl Default for SolverParams {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, GRAVITY_Y, 0.0),
            step_dt: STEP_DT,
            substeps: SUBSTEPS,
            fluid_restitution: FLUID_RESTITUTION,
            wall_restitution: WALL_RESTITUTION,
            overlap_threshold: OVERLAP_THRESHOLD,
            cell_size: CELL_SIZE_FACTOR * PARTICLE_RADIUS,
            container_workers: CONTAINER_WORKERS,
            collision_strategy: CollisionStrategy::default(),
            open_top: OpenTopExemption::default(),
            initial_speed: INITIAL_SPEED,
            seed: None,
        }
    }
}

impl SolverParams {
    pub fn substep_dt(&self) -> f32 {
        self.step_dt / self.substeps as f32
    }

    pub fn validate(&self) -> Result<()> {
        if self.substeps == 0 {
            return Err(PhysicsError::InvalidParams("substeps must be at least 1"));
        }
        if !self.step_dt.is_finite() || self.step_dt <= 0.0 {
            return Err(PhysicsError::InvalidParams("step_dt must be positive"));
        }
        if !self.cell_size.is_finite() || self.cell_size <= 0.0 {
            return Err(PhysicsError::InvalidParams("cell_size must be positive"));
        }
        if !self.gravity.is_finite() {
            return Err(PhysicsError::InvalidParams("gravity must be finite"));
        }
        if self.overlap_threshold < 0.0 {
            return Err(PhysicsError::InvalidParams("overlap_threshold must not be negative"));
        }
        Ok(())
    }
}
