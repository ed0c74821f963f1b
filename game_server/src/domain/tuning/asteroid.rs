// Gameplay tuning for the asteroid lifecycle.

pub const LARGE_RADIUS_MIN: f32 = 34.0;
pub const LARGE_RADIUS_MAX: f32 = 46.0;
pub const SMALL_RADIUS_MIN: f32 = 15.0;
pub const SMALL_RADIUS_MAX: f32 = 22.0;

pub const ORANGE_LARGE_HP: u32 = 2;
pub const ORANGE_SMALL_HP: u32 = 1;
pub const GREY_LARGE_HP: u32 = 4;
pub const GREY_SMALL_HP: u32 = 2;

pub const LARGE_CHANCE: f32 = 0.6;

pub const DRIFT_SPEED_MIN: f32 = 15.0;
pub const DRIFT_SPEED_MAX: f32 = 55.0;
pub const MAX_ANGULAR_SPEED: f32 = 1.2;

// Polygon shape.
pub const VERTEX_COUNT_MIN: u32 = 8;
pub const VERTEX_COUNT_MAX: u32 = 12;
pub const VERTEX_RADIUS_MIN: f32 = 0.72;
pub const VERTEX_RADIUS_MAX: f32 = 1.08;

// Splitting.
pub const SPLIT_COUNT: usize = 2;
pub const SPLIT_VELOCITY_DAMPING: f32 = 0.6;
pub const SPLIT_SPEED_MIN: f32 = 40.0;
pub const SPLIT_SPEED_MAX: f32 = 90.0;

/// Chance that a destroyed small orange asteroid drops a pickup.
pub const DROP_CHANCE: f32 = 0.35;

// Initial placement.
pub const SPAWN_CENTER_FRACTION: f32 = 0.32;
pub const SPAWN_PADDING: f32 = 8.0;
pub const SPAWN_MAX_ATTEMPTS: u32 = 20;

// Continuous spawning (SPAWN density).
pub const SPAWN_INTERVAL_MIN_MS: f64 = 2400.0;
pub const SPAWN_INTERVAL_MAX_MS: f64 = 4200.0;
pub const SPAWN_SCALE_FIRST_ROUND: f32 = 3.0;
pub const SPAWN_SCALE_LATE_ROUNDS: f32 = 1.0 / 1.5;
/// Rounds over which the interval scale ramps down.
pub const SPAWN_SCALE_RAMP_ROUNDS: u32 = 4;
pub const SPAWN_BATCH_MIN: u32 = 1;
pub const SPAWN_BATCH_MAX: u32 = 3;
pub const EDGE_SPEED_MIN: f32 = 50.0;
pub const EDGE_SPEED_MAX: f32 = 110.0;
pub const EDGE_AIM_JITTER: f32 = 0.35;
/// Half extent of the central target region, as a fraction of the arena size.
pub const EDGE_AIM_REGION: f32 = 0.25;
pub const MAX_ASTEROIDS: usize = 24;
