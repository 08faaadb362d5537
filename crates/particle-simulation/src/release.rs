//! Staged particle release
//!
//! Activates particles one index at a time on a fixed interval of simulated
//! time, so a dispenser scene fills its container gradually.

use particle_physics::error::Result;

use crate::solver::Solver;

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseSchedule {
    /// Simulated seconds between releases
    interval: f32,
    elapsed: f32,
    next_index: usize,
    end: usize,
}

impl ReleaseSchedule {
    /// Release indices `start..end`, the first one after one full interval.
    pub fn new(interval: f32, start: usize, end: usize) -> Self {
        Self {
            interval,
            elapsed: 0.0,
            next_index: start,
            end,
        }
    }

    /// Schedule every particle currently inactive in the solver's tail.
    pub fn for_inactive(solver: &Solver, interval: f32) -> Self {
        let particles = solver.particles();
        let start = particles
            .iter()
            .rposition(|p| p.is_activated())
            .map_or(0, |last_active| last_active + 1);
        Self::new(interval, start, particles.len())
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn remaining(&self) -> usize {
        self.end.saturating_sub(self.next_index)
    }

    pub fn is_finished(&self) -> bool {
        self.remaining() == 0
    }

    /// Let `dt` seconds pass and activate every particle that came due.
    /// Returns the number released.
    pub fn advance(&mut self, dt: f32, solver: &mut Solver) -> Result<usize> {
        if self.is_finished() {
            return Ok(0);
        }

        self.elapsed += dt;
        let mut released = 0;
        while self.elapsed >= self.interval && self.next_index < self.end {
            solver.activate_new_particle(self.next_index)?;
            self.next_index += 1;
            self.elapsed -= self.interval;
            released += 1;
        }

        if self.is_finished() {
            log::info!("Released all particles (last index {})", self.end.saturating_sub(1));
        }
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::SolverParams;
    use glam::Vec3;

    fn solver_with(active: usize, inactive: usize) -> Solver {
        let mut solver = Solver::new(SolverParams {
            seed: Some(1),
            ..Default::default()
        })
        .unwrap();
        for _ in 0..active {
            solver.add_particle(Vec3::ZERO, 0.2, true).unwrap();
        }
        for _ in 0..inactive {
            solver.add_particle(Vec3::new(0.0, 6.0, 0.0), 0.2, false).unwrap();
        }
        solver
    }

    #[test]
    fn releases_one_per_interval_in_index_order() {
        let mut solver = solver_with(0, 3);
        let mut schedule = ReleaseSchedule::new(0.5, 0, 3);

        assert_eq!(schedule.advance(0.25, &mut solver).unwrap(), 0);
        assert!(!solver.particles()[0].is_activated());

        assert_eq!(schedule.advance(0.25, &mut solver).unwrap(), 1);
        assert!(solver.particles()[0].is_activated());
        assert!(!solver.particles()[1].is_activated());
        assert_eq!(schedule.next_index(), 1);
    }

    #[test]
    fn catches_up_after_long_step_and_stops_at_end() {
        let mut solver = solver_with(0, 3);
        let mut schedule = ReleaseSchedule::new(0.5, 0, 3);

        assert_eq!(schedule.advance(1.0, &mut solver).unwrap(), 2);
        assert_eq!(schedule.advance(5.0, &mut solver).unwrap(), 1);
        assert!(schedule.is_finished());
        assert_eq!(schedule.advance(5.0, &mut solver).unwrap(), 0);
        assert!(solver.particles().iter().all(|p| p.is_activated()));
    }

    #[test]
    fn for_inactive_skips_leading_active_particles() {
        let solver = solver_with(2, 4);
        let schedule = ReleaseSchedule::for_inactive(&solver, 0.5);
        assert_eq!(schedule.next_index(), 2);
        assert_eq!(schedule.remaining(), 4);
    }

    #[test]
    fn out_of_range_schedule_reports_error() {
        let mut solver = solver_with(0, 1);
        let mut schedule = ReleaseSchedule::new(0.5, 0, 2);
        assert_eq!(schedule.advance(0.5, &mut solver).unwrap(), 1);
        assert!(schedule.advance(0.5, &mut solver).is_err());
    }
}
