//! Oriented box that confines the particles
//!
//! The box is always the unit cube `[-1, 1]³` in its own local space. Size and
//! orientation live entirely in the world transform, so a single fixed bounds
//! test works for any proportions and rotation.

use glam::{Mat4, Quat, Vec3};

use crate::error::{PhysicsError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Container {
    position: Vec3,
    /// Half-extents along each local axis
    proportions: Vec3,
    /// Rotation about the world Z axis in degrees, unbounded
    rotation_z: f32,
}

impl Container {
    pub fn new(position: Vec3, proportions: Vec3) -> Result<Self> {
        if !proportions.is_finite() || proportions.min_element() <= 0.0 {
            return Err(PhysicsError::InvalidProportions(proportions));
        }

        Ok(Self {
            position,
            proportions,
            rotation_z: 0.0,
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn proportions(&self) -> Vec3 {
        self.proportions
    }

    pub fn rotation_z(&self) -> f32 {
        self.rotation_z
    }

    /// Rotate about Z by `delta` degrees. Accumulates without wrapping.
    pub fn update_rotation_z(&mut self, delta: f32) {
        self.rotation_z += delta;
    }

    /// Local-to-world matrix: translate · rotate_z · scale.
    pub fn transform(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            self.proportions,
            Quat::from_rotation_z(self.rotation_z.to_radians()),
            self.position,
        )
    }

    /// Column-major transform, ready for a uniform buffer.
    pub fn transform_cols(&self) -> [f32; 16] {
        self.transform().to_cols_array()
    }

    /// Lower corner of the local-space bounds.
    pub fn lower_boundaries(&self) -> Vec3 {
        Vec3::NEG_ONE
    }

    /// Upper corner of the local-space bounds.
    pub fn upper_boundaries(&self) -> Vec3 {
        Vec3::ONE
    }
}

/// A container's transforms, computed once per confinement pass.
#[derive(Debug, Clone, Copy)]
pub struct ContainerFrame {
    pub world: Mat4,
    pub local: Mat4,
    pub lower: Vec3,
    pub upper: Vec3,
    /// `1 / proportions`, used to express a world radius per local axis
    pub inv_proportions: Vec3,
}

impl ContainerFrame {
    pub fn new(container: &Container) -> Self {
        // Proportions are validated positive, so the inverse exists.
        let world = container.transform();
        Self {
            world,
            local: world.inverse(),
            lower: container.lower_boundaries(),
            upper: container.upper_boundaries(),
            inv_proportions: container.proportions().recip(),
        }
    }

    pub fn to_local_point(&self, p: Vec3) -> Vec3 {
        self.local.transform_point3(p)
    }

    pub fn to_local_vector(&self, v: Vec3) -> Vec3 {
        self.local.transform_vector3(v)
    }

    pub fn to_world_point(&self, p: Vec3) -> Vec3 {
        self.world.transform_point3(p)
    }

    pub fn to_world_vector(&self, v: Vec3) -> Vec3 {
        self.world.transform_vector3(v)
    }

    /// A world-space radius measured along each local axis.
    pub fn local_radius(&self, radius: f32) -> Vec3 {
        self.inv_proportions * radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn rejects_degenerate_proportions() {
        assert!(Container::new(Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0)).is_err());
        assert!(Container::new(Vec3::ZERO, Vec3::new(1.0, -2.0, 1.0)).is_err());
        assert!(Container::new(Vec3::ZERO, Vec3::new(f32::INFINITY, 1.0, 1.0)).is_err());
    }

    #[test]
    fn bounds_are_unit_cube() {
        let c = Container::new(Vec3::new(3.0, 1.0, 0.0), Vec3::new(2.0, 4.0, 1.0)).unwrap();
        assert_eq!(c.lower_boundaries(), Vec3::splat(-1.0));
        assert_eq!(c.upper_boundaries(), Vec3::splat(1.0));
    }

    #[test]
    fn transform_scales_then_rotates_then_translates() {
        let mut c = Container::new(Vec3::new(10.0, 0.0, 0.0), Vec3::new(2.0, 3.0, 4.0)).unwrap();
        c.update_rotation_z(90.0);

        // Local +X corner: scaled to (2,0,0), rotated to (0,2,0), translated.
        let p = c.transform().transform_point3(Vec3::X);
        assert!((p - Vec3::new(10.0, 2.0, 0.0)).length() < EPS);

        let z = c.transform().transform_point3(Vec3::Z);
        assert!((z - Vec3::new(10.0, 0.0, 4.0)).length() < EPS);
    }

    #[test]
    fn rotation_accumulates_without_wrapping() {
        let mut c = Container::new(Vec3::ZERO, Vec3::ONE).unwrap();
        for _ in 0..4 {
            c.update_rotation_z(100.0);
        }
        c.update_rotation_z(-1.0);
        assert_eq!(c.rotation_z(), 399.0);
    }

    #[test]
    fn frame_round_trips_points_and_vectors() {
        let mut c = Container::new(Vec3::new(1.0, -2.0, 0.5), Vec3::new(2.0, 1.0, 3.0)).unwrap();
        c.update_rotation_z(33.0);
        let frame = ContainerFrame::new(&c);

        let p = Vec3::new(0.3, 1.7, -2.2);
        assert!((frame.to_world_point(frame.to_local_point(p)) - p).length() < EPS);

        // Vectors ignore translation.
        let v = Vec3::new(1.0, 0.0, 0.0);
        let local = frame.to_local_vector(v);
        assert!((frame.to_world_vector(local) - v).length() < EPS);
        assert!((frame.to_local_vector(Vec3::ZERO)).length() < EPS);
    }

    #[test]
    fn local_radius_is_per_axis() {
        let c = Container::new(Vec3::ZERO, Vec3::new(2.0, 4.0, 0.5)).unwrap();
        let frame = ContainerFrame::new(&c);
        assert_eq!(frame.local_radius(1.0), Vec3::new(0.5, 0.25, 2.0));
    }
}
