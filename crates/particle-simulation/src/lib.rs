//! # Particle Simulation
//!
//! CPU solver for spherical particles under gravity, with pairwise collision
//! response and confinement to a movable, rotatable open-top box.

pub mod confinement;
pub mod params;
pub mod release;
pub mod scene;
pub mod solver;

pub use confinement::*;
pub use params::*;
pub use release::*;
pub use scene::*;
pub use solver::*;
