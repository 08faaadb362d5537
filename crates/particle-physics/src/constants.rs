//! Physical constants and scene defaults for the particle simulation
//!
//! These are tuned for a real-time scene of a few hundred particles in a
//! box a few units across, not for physical accuracy.

/// Factor applied to every velocity written through `Particle::set_velocity`.
///
/// Baked into wall bounces and collision responses alike, so every velocity
/// write loses 30% of its magnitude.
pub const VELOCITY_DAMPING: f32 = 0.7;

/// Downward gravitational acceleration in simulation units
pub const GRAVITY_Y: f32 = -100.0;

/// Length of one simulated frame (seconds)
pub const STEP_DT: f32 = 1.0 / 60.0;

/// Number of substeps each frame is divided into
pub const SUBSTEPS: u32 = 8;

/// Restitution used for particle-particle impulses
pub const FLUID_RESTITUTION: f32 = 0.1;

/// Scale applied to the reflected velocity component on a wall hit
pub const WALL_RESTITUTION: f32 = 1.2;

/// Overlaps at or below this depth are left alone
pub const OVERLAP_THRESHOLD: f32 = 0.01;

/// Default particle radius
pub const PARTICLE_RADIUS: f32 = 0.2;

/// Spatial hash cell size relative to the particle radius
pub const CELL_SIZE_FACTOR: f32 = 1.5;

/// Speed of the randomized launch velocity given to new particles
pub const INITIAL_SPEED: f32 = 7.0;

/// Maximum angle (radians) between the launch direction and straight down
pub const LAUNCH_CONE_ANGLE: f32 = std::f32::consts::FRAC_PI_4;

/// Lateral slack (local units) beyond a side wall before the open-top
/// exemption stops snapping a particle back inside
pub const THRESHOLD_CONTAINER: f32 = 0.25;

/// Number of disjoint index ranges the confinement pass is split into
pub const CONTAINER_WORKERS: usize = 2;

/// Where dispenser particles wait before release (above the open top)
pub const SPAWN_POINT: [f32; 3] = [0.0, 6.0, 0.0];

/// Half-extents of the default container
pub const BOX_HALF_EXTENT: f32 = 2.0;

/// Simulated time between two staged releases (seconds)
pub const RELEASE_INTERVAL: f32 = 0.5;

/// Lattice spacing of the cuboid preset relative to the particle radius
pub const CUBOID_SPACING_FACTOR: f32 = 2.05;

/// Height the cuboid preset is centred at
pub const CUBOID_CENTER_Y: f32 = 5.0;

/// Normal used when two particle centres coincide
pub const FALLBACK_NORMAL: [f32; 3] = [1.0, 0.0, 0.0];
