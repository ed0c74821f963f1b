/// Gameplay tuning for player-controlled ships.
///
/// Keep this separate from runtime/server configuration (tick rates, buffer sizes, etc.).
/// Mode-dependent handling (speed, restitution, friction) lives in `modes::PhysicsProfile`.

#[derive(Debug, Clone, Copy)]
pub struct ShipTuning {
    /// World-space collision radius in pixels.
    pub radius: f32,

    /// Mass used by the pairwise collision solver.
    pub mass: f32,

    /// Rotation speed in radians per second while the rotate button is held.
    pub rotate_speed: f32,

    /// Magazine size for the base weapon.
    pub max_ammo: u32,

    /// Time to refill one ammo unit.
    pub reload_ms: f64,

    /// Minimum time between two base-weapon shots.
    pub fire_cooldown_ms: f64,

    /// Spawn protection granted when a ship (re)enters the arena.
    pub spawn_invulnerable_ms: f64,

    /// Minimum time between two dashes.
    pub dash_cooldown_ms: f64,

    /// Upper bound for collision-induced spin in radians per second.
    pub max_spin: f32,

    /// Fraction of tangential contact speed converted into spin.
    pub spin_transfer: f32,
}

impl Default for ShipTuning {
    fn default() -> Self {
        Self {
            radius: 18.0,
            mass: 1.0,
            rotate_speed: 4.4,
            max_ammo: 3,
            reload_ms: 1400.0,
            fire_cooldown_ms: 180.0,
            spawn_invulnerable_ms: 1500.0,
            dash_cooldown_ms: 900.0,
            max_spin: 9.0,
            spin_transfer: 0.35,
        }
    }
}

/// Gameplay tuning for the ejected pilot.

#[derive(Debug, Clone, Copy)]
pub struct PilotTuning {
    pub radius: f32,
    pub rotate_speed: f32,
    /// Acceleration in pixels per second squared while the move button is held.
    pub thrust: f32,
    pub max_speed: f32,
    pub air_friction: f32,
    /// Fraction of the ship's velocity the pilot keeps when ejected.
    pub eject_velocity_scale: f32,
    /// A pilot that survives this long gets a new ship.
    pub respawn_ms: f64,
}

impl Default for PilotTuning {
    fn default() -> Self {
        Self {
            radius: 9.0,
            rotate_speed: 5.2,
            thrust: 260.0,
            max_speed: 130.0,
            air_friction: 2.2,
            eject_velocity_scale: 0.5,
            respawn_ms: 8000.0,
        }
    }
}
