//! Scene presets: a solver together with the container it runs in

use glam::Vec3;
use particle_physics::constants::{
    BOX_HALF_EXTENT, CUBOID_CENTER_Y, CUBOID_SPACING_FACTOR, SPAWN_POINT,
};
use particle_physics::error::Result;
use particle_physics::Container;

use crate::params::SolverParams;
use crate::solver::Solver;

pub struct Scene {
    solver: Solver,
    container: Container,
}

impl Scene {
    pub fn new(solver: Solver, container: Container) -> Self {
        Self { solver, container }
    }

    /// Box at the origin with half-extents of [`BOX_HALF_EXTENT`].
    pub fn default_container() -> Result<Container> {
        Container::new(Vec3::ZERO, Vec3::splat(BOX_HALF_EXTENT))
    }

    /// `count` inactive particles waiting at the spawn point above the open
    /// top, to be released one at a time.
    pub fn dispenser(params: SolverParams, count: usize, radius: f32) -> Result<Self> {
        let mut solver = Solver::new(params)?;
        let spawn = Vec3::from_array(SPAWN_POINT);
        for _ in 0..count {
            solver.add_particle(spawn, radius, false)?;
        }

        log::info!("✓ Dispenser scene: {} particles (r={}) at {}", count, radius, spawn);
        Ok(Self::new(solver, Self::default_container()?))
    }

    /// A `width × height × breadth` block of active particles centred above the
    /// container floor.
    pub fn cuboid(
        params: SolverParams,
        width: usize,
        breadth: usize,
        height: usize,
        radius: f32,
    ) -> Result<Self> {
        let mut solver = Solver::new(params)?;
        let spacing = radius * CUBOID_SPACING_FACTOR;

        let extent = |n: usize| n.saturating_sub(1) as f32 * spacing;
        let origin = Vec3::new(
            -extent(width) / 2.0,
            CUBOID_CENTER_Y - extent(height) / 2.0,
            -extent(breadth) / 2.0,
        );

        for i in 0..width {
            for j in 0..height {
                for k in 0..breadth {
                    let offset = Vec3::new(i as f32, j as f32, k as f32) * spacing;
                    solver.add_particle(origin + offset, radius, true)?;
                }
            }
        }

        log::info!(
            "✓ Cuboid scene: {}x{}x{} particles (r={})",
            width,
            breadth,
            height,
            radius
        );
        Ok(Self::new(solver, Self::default_container()?))
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn rotate_container_z(&mut self, delta: f32) {
        self.container.update_rotation_z(delta);
    }

    /// Advance the solver one frame inside the current container.
    pub fn step(&mut self, frame_counter: u64) {
        self.solver.update(&self.container, frame_counter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SolverParams {
        SolverParams {
            seed: Some(11),
            ..Default::default()
        }
    }

    #[test]
    fn dispenser_particles_wait_inactive_at_spawn() {
        let scene = Scene::dispenser(params(), 5, 0.2).unwrap();
        let particles = scene.solver().particles();
        assert_eq!(particles.len(), 5);
        assert!(particles.iter().all(|p| !p.is_activated()));
        assert!(particles
            .iter()
            .all(|p| p.position() == Vec3::new(0.0, 6.0, 0.0)));
        assert_eq!(scene.container().proportions(), Vec3::splat(2.0));
    }

    #[test]
    fn cuboid_is_centred_and_spaced() {
        let scene = Scene::cuboid(params(), 3, 2, 4, 0.1).unwrap();
        let particles = scene.solver().particles();
        assert_eq!(particles.len(), 24);
        assert!(particles.iter().all(|p| p.is_activated()));

        let centroid = particles.iter().map(|p| p.position()).sum::<Vec3>() / 24.0;
        assert!((centroid - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-4);

        // Neighbours along the innermost (breadth) loop
        let gap = particles[1].position().distance(particles[0].position());
        assert!((gap - 0.205).abs() < 1e-5);
    }

    #[test]
    fn rejects_invalid_radius() {
        assert!(Scene::dispenser(params(), 3, 0.0).is_err());
    }

    #[test]
    fn rotation_reaches_container() {
        let mut scene = Scene::dispenser(params(), 0, 0.2).unwrap();
        scene.rotate_container_z(15.0);
        scene.rotate_container_z(-5.0);
        assert_eq!(scene.container().rotation_z(), 10.0);
    }
}
