// Simulation entities. Cross references are ids only, never borrows.

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub type PlayerId = u64;
pub type SessionId = u64;
pub type EntityId = u64;

#[derive(Debug, Clone)]
pub struct Ship {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    /// Residual spin from collisions; cleared while the player rotates.
    pub angular_velocity: f32,
    pub alive: bool,
    pub ammo: u32,
    pub max_ammo: u32,
    /// Time left until the next ammo unit, meaningful while `ammo < max_ammo`.
    pub reload_timer_ms: f64,
    pub last_shot_ms: Option<f64>,
    pub invulnerable_until_ms: f64,
}

impl Ship {
    pub fn new(pos: Vec2, angle: f32, max_ammo: u32) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            angle,
            angular_velocity: 0.0,
            alive: true,
            ammo: max_ammo,
            max_ammo,
            reload_timer_ms: 0.0,
            last_shot_ms: None,
            invulnerable_until_ms: 0.0,
        }
    }

    /// Placeholder for a player that has no ship in the current round.
    pub fn inactive() -> Self {
        let mut ship = Self::new(Vec2::ZERO, 0.0, 0);
        ship.alive = false;
        ship
    }

    pub fn heading(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    pub fn is_invulnerable(&self, now_ms: f64) -> bool {
        now_ms < self.invulnerable_until_ms
    }
}

#[derive(Debug, Clone)]
pub struct Pilot {
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub alive: bool,
    pub spawned_at_ms: f64,
}

impl Pilot {
    pub fn heading(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }
}

/// Base-weapon bullets and scatter shots share this shape.
#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub spawned_at_ms: f64,
    pub lifetime_ms: f64,
}

#[derive(Debug, Clone)]
pub struct HomingMissile {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub target_id: Option<PlayerId>,
    pub spawned_at_ms: f64,
    pub lifetime_ms: f64,
}

/// Visual record of an instant-hit laser; damage is applied when it is fired.
#[derive(Debug, Clone)]
pub struct LaserBeam {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub origin: Vec2,
    pub angle: f32,
    pub length: f32,
    pub spawned_at_ms: f64,
    pub lifetime_ms: f64,
}

#[derive(Debug, Clone)]
pub struct Mine {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub pos: Vec2,
    pub spawned_at_ms: f64,
    pub arms_at_ms: f64,
    pub lifetime_ms: f64,
}

impl Mine {
    pub fn is_armed(&self, now_ms: f64) -> bool {
        now_ms >= self.arms_at_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AsteroidTier {
    Large,
    Small,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AsteroidVariant {
    Orange,
    Grey,
}

#[derive(Debug, Clone)]
pub struct Asteroid {
    pub id: EntityId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub radius: f32,
    /// Convex outline relative to `pos`, before rotation.
    pub vertices: Vec<Vec2>,
    pub hp: u32,
    pub max_hp: u32,
    pub tier: AsteroidTier,
    pub variant: AsteroidVariant,
    pub alive: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerUpKind {
    Laser,
    Shield,
    Scatter,
    Mine,
    Reverse,
    Joust,
    HomingMissile,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 7] = [
        PowerUpKind::Laser,
        PowerUpKind::Shield,
        PowerUpKind::Scatter,
        PowerUpKind::Mine,
        PowerUpKind::Reverse,
        PowerUpKind::Joust,
        PowerUpKind::HomingMissile,
    ];

    /// Relative drop weight for pickups and starting grants.
    pub fn drop_weight(self) -> u32 {
        match self {
            PowerUpKind::Laser | PowerUpKind::Shield | PowerUpKind::Scatter => 3,
            PowerUpKind::Mine | PowerUpKind::Joust | PowerUpKind::HomingMissile => 2,
            PowerUpKind::Reverse => 1,
        }
    }
}

/// Power-up lying in the arena, waiting to be collected.
#[derive(Debug, Clone)]
pub struct PowerUpPickup {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub spawned_at_ms: f64,
    pub lifetime_ms: f64,
}

/// Per-type monotonic id counters. Ids start at 1.
#[derive(Debug, Clone, Default)]
pub struct EntityIds {
    player: u64,
    projectile: u64,
    scatter: u64,
    missile: u64,
    laser: u64,
    mine: u64,
    asteroid: u64,
    pickup: u64,
}

macro_rules! next_id {
    ($name:ident, $field:ident) => {
        pub fn $name(&mut self) -> u64 {
            self.$field += 1;
            self.$field
        }
    };
}

impl EntityIds {
    next_id!(next_player, player);
    next_id!(next_projectile, projectile);
    next_id!(next_scatter, scatter);
    next_id!(next_missile, missile);
    next_id!(next_laser, laser);
    next_id!(next_mine, mine);
    next_id!(next_asteroid, asteroid);
    next_id!(next_pickup, pickup);
}
