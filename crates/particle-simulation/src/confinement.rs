//! Keeping particles inside the oriented container
//!
//! Each particle is moved into the container's local space, where the box is
//! the unit cube, clamped there, and moved back out only if something changed.

use glam::Vec3;
use particle_physics::{ContainerFrame, Particle};

use crate::params::OpenTopExemption;

/// Wall response shared by every worker of a confinement pass.
#[derive(Debug, Clone, Copy)]
pub struct Confinement {
    pub wall_restitution: f32,
    pub open_top: OpenTopExemption,
}

impl Confinement {
    /// Push an activated particle back inside and reflect its velocity on
    /// every face it crossed. Returns whether anything was corrected.
    ///
    /// The local +Y face is never tested: the container is open at the top.
    pub fn confine(&self, particle: &mut Particle, frame: &ContainerFrame) -> bool {
        if !particle.is_activated() {
            return false;
        }

        let mut pos = frame.to_local_point(particle.position());
        let mut vel = frame.to_local_vector(particle.velocity());
        let r = frame.local_radius(particle.radius());
        let mut collided = false;

        // Floor
        if pos.y - r.y < frame.lower.y {
            pos.y = frame.lower.y + r.y;
            vel.y *= -self.wall_restitution;
            collided = true;
        }

        // Side walls
        if self.within_y_max(pos, frame) {
            for axis in [0, 2] {
                if !self.near_wall(pos[axis], frame.upper[axis]) {
                    continue;
                }
                if pos[axis] - r[axis] < frame.lower[axis] {
                    pos[axis] = frame.lower[axis] + r[axis];
                    vel[axis] *= -self.wall_restitution;
                    collided = true;
                }
                if pos[axis] + r[axis] > frame.upper[axis] {
                    pos[axis] = frame.upper[axis] - r[axis];
                    vel[axis] *= -self.wall_restitution;
                    collided = true;
                }
            }
        }

        if collided {
            particle.set_position(frame.to_world_point(pos));
            particle.set_velocity(frame.to_world_vector(vel), 1.0);
        }

        collided
    }

    /// Below the rim of the open top.
    fn within_y_max(&self, local_pos: Vec3, frame: &ContainerFrame) -> bool {
        local_pos.y < frame.upper.y
    }

    /// Close enough to the side wall to still count as inside the box.
    fn near_wall(&self, local_coord: f32, extent: f32) -> bool {
        local_coord.abs() <= extent + self.open_top.threshold_container
    }
}
