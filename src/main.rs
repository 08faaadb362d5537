//! Headless particle solver driver
//!
//! Builds a scene preset, runs it for a fixed number of frames with staged
//! release and optional container rotation, and logs progress.
//!
//! Usage: `particles [config.json]` (RUST_LOG=debug for verbose output)

mod config;

use config::{RunConfig, ScenePreset};
use glam::Vec3;
use particle_physics::PhysicsError;
use particle_simulation::{ReleaseSchedule, Scene};
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

fn build_scene(config: &RunConfig) -> Result<(Scene, Option<ReleaseSchedule>), PhysicsError> {
    let params = config.solver.clone();
    match config.scene {
        ScenePreset::Dispenser {
            count,
            radius,
            release_interval,
        } => {
            let scene = Scene::dispenser(params, count, radius)?;
            let schedule = ReleaseSchedule::for_inactive(scene.solver(), release_interval);
            Ok((scene, Some(schedule)))
        }
        ScenePreset::Cuboid {
            width,
            breadth,
            height,
            radius,
        } => Ok((Scene::cuboid(params, width, breadth, height, radius)?, None)),
    }
}

fn log_summary(scene: &Scene, frame: u64) {
    let stats = scene.solver().stats();
    let active: Vec<Vec3> = scene
        .solver()
        .particles()
        .iter()
        .filter(|p| p.is_activated())
        .map(|p| p.position())
        .collect();
    let mean_height = if active.is_empty() {
        0.0
    } else {
        active.iter().map(|p| p.y).sum::<f32>() / active.len() as f32
    };

    log::info!(
        "frame {:>5}: {}/{} active, {} pairs, {} wall contacts, mean height {:.3}, box rotation {:.1}°",
        frame,
        stats.active,
        stats.particles,
        stats.resolved_pairs,
        stats.wall_contacts,
        mean_height,
        scene.container().rotation_z()
    );
}

fn run(config: &RunConfig) -> Result<(), PhysicsError> {
    let (mut scene, mut schedule) = build_scene(config)?;
    let step_dt = config.solver.step_dt;
    let started = Instant::now();

    for frame in 0..config.frames {
        if let Some(schedule) = schedule.as_mut() {
            schedule.advance(step_dt, scene.solver_mut())?;
        }
        if config.rotation_per_frame != 0.0 {
            scene.rotate_container_z(config.rotation_per_frame);
        }

        scene.step(frame);

        if config.summary_interval > 0 && (frame + 1) % config.summary_interval == 0 {
            log_summary(&scene, frame);
        }
    }

    let elapsed = started.elapsed();
    log::info!(
        "✓ Simulated {} frames ({:.1}s of simulated time) in {:.2?}",
        config.frames,
        config.frames as f32 * step_dt,
        elapsed
    );
    log_summary(&scene, config.frames.saturating_sub(1));
    Ok(())
}

fn main() -> ExitCode {
    // Initialize logger (RUST_LOG=debug for verbose output)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting particle solver...");

    let config = match std::env::args().nth(1) {
        Some(path) => match RunConfig::load(Path::new(&path)) {
            Ok(config) => {
                log::info!("✓ Loaded run configuration from {}", path);
                config
            }
            Err(e) => {
                log::error!("{}: {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => RunConfig::default(),
    };
    log::debug!("Run configuration: {:?}", config);

    match run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Simulation failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
