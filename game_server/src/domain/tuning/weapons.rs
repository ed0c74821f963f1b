// Gameplay tuning for weapons and power-ups.

// Base weapon.
pub const PROJECTILE_SPEED: f32 = 560.0;
pub const PROJECTILE_RADIUS: f32 = 4.0;
pub const PROJECTILE_LIFETIME_MS: f64 = 1600.0;

// Scatter shots are faster but short lived.
pub const SCATTER_SPEED: f32 = 600.0;
pub const SCATTER_RADIUS: f32 = 3.5;
pub const SCATTER_LIFETIME_MS: f64 = 520.0;
pub const SCATTER_SPREAD: f32 = 0.26;
pub const SCATTER_CHARGES: u32 = 3;
pub const SCATTER_COOLDOWN_MS: f64 = 350.0;

pub const LASER_LENGTH: f32 = 900.0;
pub const LASER_CHARGES: u32 = 2;
pub const LASER_COOLDOWN_MS: f64 = 500.0;
/// How long the beam stays visible to clients.
pub const LASER_BEAM_LIFETIME_MS: f64 = 160.0;

pub const MINE_CHARGES: u32 = 2;
pub const MINE_COOLDOWN_MS: f64 = 400.0;
pub const MINE_ARM_MS: f64 = 700.0;
pub const MINE_LIFETIME_MS: f64 = 15_000.0;
pub const MINE_TRIGGER_RADIUS: f32 = 38.0;
pub const MINE_BLAST_RADIUS: f32 = 90.0;
/// Distance behind the ship's centre where the mine is dropped.
pub const MINE_DROP_OFFSET: f32 = 30.0;

pub const HOMING_CHARGES: u32 = 2;
pub const HOMING_COOLDOWN_MS: f64 = 600.0;
pub const HOMING_SPEED: f32 = 330.0;
pub const HOMING_TURN_RATE: f32 = 3.2;
pub const HOMING_RADIUS: f32 = 6.0;
pub const HOMING_LIFETIME_MS: f64 = 4500.0;

pub const POWERUP_SHIELD_HITS: u32 = 2;
/// Brief protection after a shield soaks a hit, so one contact is not counted every tick.
pub const SHIELD_HIT_GRACE_MS: f64 = 400.0;
pub const POWERUP_JOUST_DURATION_MS: f64 = 8000.0;
/// Extra reach of the joust blades beyond plain hull contact.
pub const JOUST_REACH: f32 = 6.0;
pub const POWERUP_REVERSE_DURATION_MS: f64 = 6000.0;

// World pickups.
pub const POWERUP_PICKUP_RADIUS: f32 = 14.0;
pub const POWERUP_PICKUP_LIFETIME_MS: f64 = 12_000.0;
