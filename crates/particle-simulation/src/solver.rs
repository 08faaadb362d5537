//! CPU particle solver
//!
//! Every `update` advances one frame in `substeps` fixed substeps:
//! gravity → Verlet integration → confinement → collisions → confinement.
//! The second confinement pass catches particles a collision pushed through a
//! wall, since collision correction knows nothing about the container.
//!
//! The spatial hash is built once per frame. Particles drift out of their
//! bucket over that frame's substeps; the cell size is kept at least one
//! contact distance wide so the drift stays small relative to a cell.

use glam::Vec3;
use particle_physics::constants::{FALLBACK_NORMAL, LAUNCH_CONE_ANGLE};
use particle_physics::error::{PhysicsError, Result};
use particle_physics::{Container, ContainerFrame, Particle, ParticleInstance, SpatialHashGrid};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::confinement::Confinement;
use crate::params::{CollisionStrategy, SolverParams};

/// Pairs resolved by one collision pass, in resolution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionReport {
    pub resolved_pairs: Vec<(usize, usize)>,
}

impl CollisionReport {
    pub fn len(&self) -> usize {
        self.resolved_pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolved_pairs.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolverStats {
    pub particles: usize,
    pub active: usize,
    /// Collision pairs resolved during the last `update`, over all substeps
    pub resolved_pairs: usize,
    /// Wall corrections during the last `update`, both confinement passes
    pub wall_contacts: usize,
    pub frames: u64,
}

pub struct Solver {
    params: SolverParams,

    /// Insertion order is the particle's identity
    particles: Vec<Particle>,
    max_radius: f32,

    grid: SpatialHashGrid,

    // Snapshots the collision math reads instead of the live particles
    cached_positions: Vec<Vec3>,
    cached_masses: Vec<f32>,
    cached_radii: Vec<f32>,
    cached_activation: Vec<bool>,

    /// Partners already resolved in the current collision pass
    resolved: FxHashMap<usize, FxHashSet<usize>>,
    candidates: Vec<usize>,

    rng: StdRng,
    stats: SolverStats,
}

impl Solver {
    pub fn new(params: SolverParams) -> Result<Self> {
        params.validate()?;
        log::info!(
            "Initializing Solver: {} substeps of {:.5}s, {:?} collisions, {} container workers",
            params.substeps,
            params.substep_dt(),
            params.collision_strategy,
            params.container_workers
        );

        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Ok(Self {
            grid: SpatialHashGrid::new(params.cell_size),
            params,
            particles: Vec::new(),
            max_radius: 0.0,
            cached_positions: Vec::new(),
            cached_masses: Vec::new(),
            cached_radii: Vec::new(),
            cached_activation: Vec::new(),
            resolved: FxHashMap::default(),
            candidates: Vec::new(),
            rng,
            stats: SolverStats::default(),
        })
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    /// Add a particle with a random downward launch velocity and return its
    /// index. The velocity is set whether or not the particle starts active.
    pub fn add_particle(&mut self, position: Vec3, radius: f32, activated: bool) -> Result<usize> {
        let mut particle = Particle::new(position, radius, activated)?;
        particle.set_velocity(self.launch_velocity(), self.params.substep_dt());

        let index = self.particles.len();
        self.particles.push(particle);
        self.max_radius = self.max_radius.max(radius);
        log::trace!("Added particle {} at {} (r={}, active={})", index, position, radius, activated);
        Ok(index)
    }

    /// Random direction within a cone around straight down.
    fn launch_velocity(&mut self) -> Vec3 {
        let theta = self.rng.random::<f32>() * std::f32::consts::TAU;
        let phi = self.rng.random::<f32>() * LAUNCH_CONE_ANGLE;
        let speed = self.params.initial_speed;

        Vec3::new(
            speed * phi.sin() * theta.cos(),
            -speed * phi.cos(),
            speed * phi.sin() * theta.sin(),
        )
    }

    /// Release a particle into the simulation.
    pub fn activate_new_particle(&mut self, index: usize) -> Result<()> {
        let len = self.particles.len();
        let particle = self
            .particles
            .get_mut(index)
            .ok_or(PhysicsError::ParticleIndexOutOfRange { index, len })?;
        particle.activate_particle();
        log::debug!("Activated particle {}", index);
        Ok(())
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index)
    }

    /// Per-particle render data in index order.
    pub fn instances(&self) -> Vec<ParticleInstance> {
        self.particles.iter().map(Particle::instance).collect()
    }

    pub fn stats(&self) -> SolverStats {
        SolverStats {
            particles: self.particles.len(),
            active: self.particles.iter().filter(|p| p.is_activated()).count(),
            ..self.stats
        }
    }

    /// Advance one frame. Call exactly once per simulated frame.
    pub fn update(&mut self, container: &Container, frame_counter: u64) {
        let dt = self.params.substep_dt();
        let mut resolved_pairs = 0;
        let mut wall_contacts = 0;

        self.build_spatial_map();

        for _ in 0..self.params.substeps {
            self.apply_gravity();
            self.integrate(dt);
            wall_contacts += self.apply_container(container);
            resolved_pairs += match self.params.collision_strategy {
                CollisionStrategy::SpatialHash => self.check_collisions_with_spatial_hashing().len(),
                CollisionStrategy::BruteForce => self.check_collisions_brute_force().len(),
            };
            wall_contacts += self.apply_container(container);
        }

        self.stats.resolved_pairs = resolved_pairs;
        self.stats.wall_contacts = wall_contacts;
        self.stats.frames += 1;

        self.log_state(frame_counter);
    }

    pub fn apply_gravity(&mut self) {
        let gravity = self.params.gravity;
        for particle in self.particles.iter_mut().filter(|p| p.is_activated()) {
            particle.accelerate(gravity);
        }
    }

    pub fn integrate(&mut self, dt: f32) {
        for particle in self.particles.iter_mut().filter(|p| p.is_activated()) {
            particle.update(dt);
        }
    }

    /// Confinement pass over disjoint index ranges, one per worker, joined
    /// before returning. Returns how many particles were corrected.
    pub fn apply_container(&mut self, container: &Container) -> usize {
        let frame = ContainerFrame::new(container);
        let confinement = Confinement {
            wall_restitution: self.params.wall_restitution,
            open_top: self.params.open_top,
        };

        let workers = self.params.container_workers.max(1);
        if workers == 1 || self.particles.len() < workers {
            return self
                .particles
                .iter_mut()
                .map(|p| usize::from(confinement.confine(p, &frame)))
                .sum();
        }

        let range_len = self.particles.len().div_ceil(workers);
        self.particles
            .par_chunks_mut(range_len)
            .map(|range| {
                range
                    .iter_mut()
                    .map(|p| usize::from(confinement.confine(p, &frame)))
                    .sum::<usize>()
            })
            .sum()
    }

    fn refresh_caches(&mut self) {
        self.cached_positions.clear();
        self.cached_masses.clear();
        self.cached_radii.clear();
        self.cached_activation.clear();

        for particle in &self.particles {
            self.cached_positions.push(particle.position());
            self.cached_masses.push(particle.mass());
            self.cached_radii.push(particle.radius());
            self.cached_activation.push(particle.is_activated());
        }
    }

    /// Re-bucket every particle by its current position.
    pub fn build_spatial_map(&mut self) {
        self.refresh_caches();

        // A 3×3×3 query only reaches one cell out, so a cell must span the
        // largest contact distance.
        let cell_size = self.params.cell_size.max(2.0 * self.max_radius);
        if cell_size != self.grid.cell_size() {
            log::debug!(
                "Spatial hash cell size {} -> {} (max radius {})",
                self.grid.cell_size(),
                cell_size,
                self.max_radius
            );
            self.grid.set_cell_size(cell_size);
        }

        self.grid.build(&self.cached_positions);
    }

    /// Indices near `position` according to the current spatial map.
    pub fn get_potential_collisions(&self, position: Vec3, radius: f32, self_index: usize) -> Vec<usize> {
        self.grid
            .potential_collisions(position, radius, self_index, &self.cached_positions)
    }

    /// Narrow phase over spatial hash candidates. Each pair is resolved at most
    /// once per call.
    pub fn check_collisions_with_spatial_hashing(&mut self) -> CollisionReport {
        self.refresh_caches();
        self.resolved.clear();

        let mut report = CollisionReport::default();
        let mut candidates = std::mem::take(&mut self.candidates);

        for i in 0..self.particles.len() {
            if !self.cached_activation[i] {
                continue;
            }

            let search_radius = self.cached_radii[i] + self.max_radius;
            self.grid.potential_collisions_into(
                self.cached_positions[i],
                search_radius,
                i,
                &self.cached_positions,
                &mut candidates,
            );

            for &j in &candidates {
                if !self.cached_activation[j] || self.already_resolved(i, j) {
                    continue;
                }
                if self.resolve_pair(i, j) {
                    self.mark_resolved(i, j);
                    report.resolved_pairs.push((i, j));
                }
            }
        }

        self.candidates = candidates;
        report
    }

    /// Narrow phase over every activated pair. Reference for the hashed pass.
    pub fn check_collisions_brute_force(&mut self) -> CollisionReport {
        self.refresh_caches();
        self.resolved.clear();

        let mut report = CollisionReport::default();
        let n = self.particles.len();

        for i in 0..n {
            if !self.cached_activation[i] {
                continue;
            }
            for j in 0..n {
                if i == j || !self.cached_activation[j] || self.already_resolved(i, j) {
                    continue;
                }
                if self.resolve_pair(i, j) {
                    self.mark_resolved(i, j);
                    report.resolved_pairs.push((i, j));
                }
            }
        }

        report
    }

    fn already_resolved(&self, i: usize, j: usize) -> bool {
        self.resolved.get(&i).is_some_and(|partners| partners.contains(&j))
    }

    fn mark_resolved(&mut self, i: usize, j: usize) {
        self.resolved.entry(i).or_default().insert(j);
        self.resolved.entry(j).or_default().insert(i);
    }

    /// Separate an overlapping pair and exchange an impulse along the contact
    /// normal. Returns false if the pair does not overlap past the threshold.
    fn resolve_pair(&mut self, i: usize, j: usize) -> bool {
        let delta = self.cached_positions[i] - self.cached_positions[j];
        let dist = delta.length();
        let min_dist = self.cached_radii[i] + self.cached_radii[j];
        let overlap = min_dist - dist;

        if !(dist < min_dist && overlap > self.params.overlap_threshold) {
            return false;
        }

        let normal = if dist > f32::EPSILON {
            delta / dist
        } else {
            Vec3::from_array(FALLBACK_NORMAL)
        };

        let mass_i = self.cached_masses[i];
        let mass_j = self.cached_masses[j];
        let mass_ratio = mass_i / (mass_i + mass_j);

        // Applied every substep, so each application covers a share of it.
        let correction = 0.5 * overlap / self.params.substeps as f32;
        let new_i = self.cached_positions[i] + normal * ((1.0 - mass_ratio) * correction);
        let new_j = self.cached_positions[j] - normal * (mass_ratio * correction);

        self.particles[i].set_position(new_i);
        self.particles[j].set_position(new_j);
        self.cached_positions[i] = new_i;
        self.cached_positions[j] = new_j;

        let v_i = self.particles[i].velocity();
        let v_j = self.particles[j].velocity();
        let velocity_along_normal = (v_i - v_j).dot(normal);

        if velocity_along_normal < 0.0 {
            let inv_mass_i = 1.0 / mass_i;
            let inv_mass_j = 1.0 / mass_j;
            let impulse = -(1.0 + self.params.fluid_restitution) * velocity_along_normal
                / (inv_mass_i + inv_mass_j);

            self.particles[i].set_velocity(v_i + normal * (impulse * inv_mass_i), 1.0);
            self.particles[j].set_velocity(v_j - normal * (impulse * inv_mass_j), 1.0);
        }

        log::trace!("Collision {} <-> {} (overlap {:.4})", i, j, overlap);
        true
    }

    /// Dump every particle's state at trace level.
    pub fn log_state(&self, frame_counter: u64) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }

        log::trace!("-------- frame {} particles --------", frame_counter);
        for (i, p) in self.particles.iter().enumerate() {
            log::trace!(
                "particle {}: position={} velocity={} acceleration={} active={}",
                i,
                p.position(),
                p.velocity(),
                p.acceleration(),
                p.is_activated()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn still_params() -> SolverParams {
        SolverParams {
            gravity: Vec3::ZERO,
            initial_speed: 0.0,
            seed: Some(7),
            ..Default::default()
        }
    }

    #[test]
    fn add_particle_returns_sequential_indices() {
        let mut solver = Solver::new(still_params()).unwrap();
        assert_eq!(solver.add_particle(Vec3::ZERO, 0.2, true).unwrap(), 0);
        assert_eq!(solver.add_particle(Vec3::ONE, 0.2, false).unwrap(), 1);
        assert_eq!(solver.particles().len(), 2);
        assert!(solver.add_particle(Vec3::ZERO, -0.2, true).is_err());
        assert_eq!(solver.particles().len(), 2);
    }

    #[test]
    fn launch_velocity_points_down_with_requested_speed() {
        let params = SolverParams {
            seed: Some(3),
            ..Default::default()
        };
        let substep_dt = params.substep_dt();
        let mut solver = Solver::new(params).unwrap();

        for _ in 0..32 {
            let index = solver.add_particle(Vec3::ZERO, 0.2, false).unwrap();
            let v = solver.particles()[index].velocity() / substep_dt;
            assert!((v.length() - 7.0 * 0.7).abs() < 1e-2);
            assert!(v.y < 0.0);
        }
    }

    #[test]
    fn activate_rejects_unknown_index() {
        let mut solver = Solver::new(still_params()).unwrap();
        solver.add_particle(Vec3::ZERO, 0.2, false).unwrap();
        assert_eq!(
            solver.activate_new_particle(5),
            Err(PhysicsError::ParticleIndexOutOfRange { index: 5, len: 1 })
        );
        solver.activate_new_particle(0).unwrap();
        assert!(solver.particles()[0].is_activated());
    }

    #[test]
    fn gravity_only_reaches_active_particles() {
        let mut solver = Solver::new(SolverParams {
            initial_speed: 0.0,
            ..Default::default()
        })
        .unwrap();
        solver.add_particle(Vec3::ZERO, 0.2, true).unwrap();
        solver.add_particle(Vec3::ONE, 0.2, false).unwrap();

        solver.apply_gravity();
        assert_eq!(solver.particles()[0].acceleration(), Vec3::new(0.0, -100.0, 0.0));
        assert_eq!(solver.particles()[1].acceleration(), Vec3::ZERO);
    }

    #[test]
    fn coincident_particles_use_fallback_normal() {
        let mut solver = Solver::new(SolverParams {
            substeps: 1,
            ..still_params()
        })
        .unwrap();
        solver.add_particle(Vec3::new(0.0, 5.0, 0.0), 1.0, true).unwrap();
        solver.add_particle(Vec3::new(0.0, 5.0, 0.0), 1.0, true).unwrap();
        solver.build_spatial_map();

        let report = solver.check_collisions_with_spatial_hashing();
        assert_eq!(report.resolved_pairs, vec![(0, 1)]);

        let a = solver.particles()[0].position();
        let b = solver.particles()[1].position();
        assert!(a.is_finite() && b.is_finite());
        assert!((a - Vec3::new(0.5, 5.0, 0.0)).length() < 1e-6);
        assert!((b - Vec3::new(-0.5, 5.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn cell_size_widens_to_contact_distance() {
        let mut solver = Solver::new(still_params()).unwrap();
        solver.add_particle(Vec3::ZERO, 1.0, true).unwrap();
        solver.build_spatial_map();
        assert_eq!(solver.grid.cell_size(), 2.0);
    }

    #[test]
    fn container_workers_partition_gives_same_result() {
        let container = Container::new(Vec3::ZERO, Vec3::splat(2.0)).unwrap();
        let run = |workers: usize| {
            let mut solver = Solver::new(SolverParams {
                container_workers: workers,
                ..still_params()
            })
            .unwrap();
            for i in 0..9 {
                let x = -3.0 + i as f32 * 0.75;
                solver.add_particle(Vec3::new(x, -2.5, x * 0.5), 0.2, true).unwrap();
            }
            let corrected = solver.apply_container(&container);
            (corrected, solver.instances())
        };

        let (serial_count, serial) = run(1);
        let (parallel_count, parallel) = run(4);
        assert_eq!(serial_count, 9);
        assert_eq!(serial_count, parallel_count);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn stats_track_last_frame() {
        let container = Container::new(Vec3::ZERO, Vec3::splat(2.0)).unwrap();
        let mut solver = Solver::new(still_params()).unwrap();
        solver.add_particle(Vec3::new(0.0, -1.0, 0.0), 0.2, true).unwrap();
        solver.add_particle(Vec3::new(0.0, -1.0, 0.3), 0.2, true).unwrap();
        solver.add_particle(Vec3::new(0.0, 1.0, 0.0), 0.2, false).unwrap();

        solver.update(&container, 0);
        let stats = solver.stats();
        assert_eq!(stats.particles, 3);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.frames, 1);
        assert!(stats.resolved_pairs > 0);
    }
}
