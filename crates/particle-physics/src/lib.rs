//! # Particle Physics
//!
//! Value types for the particle solver: Verlet particles, the oriented
//! container they are confined to, and the spatial hash used for broad-phase
//! collision queries.

pub mod constants;
pub mod container;
pub mod error;
pub mod particle;
pub mod spatial_hash;

pub use constants::*;
pub use container::*;
pub use error::PhysicsError;
pub use particle::*;
pub use spatial_hash::*;
