//! Verlet point-mass particle and its render-side representation

use bytemuck::{Pod, Zeroable};
use glam::Vec3;

use crate::constants::VELOCITY_DAMPING;
use crate::error::{PhysicsError, Result};

/// Spherical point mass integrated with position Verlet.
///
/// Velocity is never stored: it is the displacement `position - position_last`
/// and persists for as long as `position_last` is not overwritten.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    position: Vec3,
    position_last: Vec3,
    acceleration: Vec3,
    radius: f32,
    activated: bool,
}

impl Particle {
    /// Create a particle at rest.
    pub fn new(position: Vec3, radius: f32, activated: bool) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(PhysicsError::InvalidRadius(radius));
        }

        Ok(Self {
            position,
            position_last: position,
            acceleration: Vec3::ZERO,
            radius,
            activated,
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn position_last(&self) -> Vec3 {
        self.position_last
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Mass used by collision response. There is no density; mass scales with
    /// the cross-section.
    pub fn mass(&self) -> f32 {
        self.radius * self.radius
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Include the particle in every simulation phase from now on.
    pub fn activate_particle(&mut self) {
        self.activated = true;
    }

    /// Accumulate an acceleration for the next `update`.
    pub fn accelerate(&mut self, a: Vec3) {
        self.acceleration += a;
    }

    /// Advance one Verlet step and clear the accumulator.
    pub fn update(&mut self, dt: f32) {
        let displacement = self.position - self.position_last;
        self.position_last = self.position;
        self.position = self.position + displacement + self.acceleration * (dt * dt);
        self.acceleration = Vec3::ZERO;
    }

    /// Move the particle without touching `position_last`.
    ///
    /// The implied velocity changes by the same amount as the position.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// Set the implied velocity by rewriting `position_last`.
    ///
    /// `v` is damped by [`VELOCITY_DAMPING`] first; there is no undamped path.
    pub fn set_velocity(&mut self, v: Vec3, dt: f32) {
        let damped = v * VELOCITY_DAMPING;
        self.position_last = self.position - damped * dt;
    }

    /// Displacement over the last step.
    pub fn velocity(&self) -> Vec3 {
        self.position - self.position_last
    }

    pub fn instance(&self) -> ParticleInstance {
        ParticleInstance {
            position: self.position.to_array(),
            radius: self.radius,
        }
    }
}

/// What a renderer needs per particle, laid out for a GPU storage buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ParticleInstance {
    pub position: [f32; 3],
    pub radius: f32,
}
