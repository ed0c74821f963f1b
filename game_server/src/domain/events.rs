// Discrete things that happened during a step. Drained into `SimHooks` after each step.

use super::entities::PlayerId;
use super::state::Phase;
use glam::Vec2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SoundCue {
    Fire,
    Laser,
    Scatter,
    MineDrop,
    MineExplode,
    MissileLaunch,
    ShipExplode,
    PilotKilled,
    ShieldHit,
    ShieldBreak,
    AsteroidHit,
    AsteroidBreak,
    PowerUpPickup,
    Dash,
    Respawn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageSource {
    Projectile,
    Scatter,
    Laser,
    Mine,
    Missile,
    Joust,
    Asteroid,
}

/// Result of applying one hit to a ship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShipDamage {
    /// Owner, invulnerable, already dead, or unknown id.
    Ignored,
    ShieldAbsorbed { hits_left: u32 },
    /// The last shield hit: the shield is gone and the ship survives.
    ShieldBroken,
    Destroyed,
}

impl ShipDamage {
    pub fn landed(self) -> bool {
        self != ShipDamage::Ignored
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ShipHit {
        target_id: PlayerId,
        attacker_id: Option<PlayerId>,
        source: DamageSource,
        outcome: ShipDamage,
    },
    PilotKilled {
        pilot_id: PlayerId,
        killer_id: Option<PlayerId>,
    },
    Sound(SoundCue),
    ScreenShake {
        intensity: f32,
        duration_ms: f64,
    },
    DashParticles {
        player_id: PlayerId,
        pos: Vec2,
        angle: f32,
    },
    PhaseChanged {
        phase: Phase,
        winner_id: Option<PlayerId>,
    },
    /// Whole seconds left before the round starts.
    CountdownTick(u32),
    RoundEnded {
        winner_id: Option<PlayerId>,
    },
}
