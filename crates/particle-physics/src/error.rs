//! Error type shared by the physics and simulation crates

use glam::Vec3;

/// Rejected input at the physics API boundary.
///
/// Numerical degeneracies that can arise mid-simulation (coincident
/// particles) are guarded in place and never surface here.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicsError {
    /// Particle radius was zero, negative or not finite
    InvalidRadius(f32),
    /// Container half-extents must all be positive and finite
    InvalidProportions(Vec3),
    /// No particle exists at this index
    ParticleIndexOutOfRange { index: usize, len: usize },
    /// A solver parameter is out of range
    InvalidParams(&'static str),
}

impl std::fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhysicsError::InvalidRadius(r) => {
                write!(f, "particle radius must be positive and finite, got {}", r)
            }
            PhysicsError::InvalidProportions(p) => {
                write!(f, "container proportions must be positive and finite, got {}", p)
            }
            PhysicsError::ParticleIndexOutOfRange { index, len } => {
                write!(f, "particle index {} out of range ({} particles)", index, len)
            }
            PhysicsError::InvalidParams(msg) => write!(f, "invalid solver parameters: {}", msg),
        }
    }
}

impl std::error::Error for PhysicsError {}

pub type Result<T> = std::result::Result<T, PhysicsError>;
