// Rule presets: base modes, advanced settings, and the resolved physics profile.

use serde::{Deserialize, Serialize};

/// Physics/rules preset a match is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseMode {
    #[default]
    Standard,
    Sane,
    Chaotic,
}

/// Mode selected in the lobby. `Custom` keeps the current base mode and uses
/// the advanced settings verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    #[default]
    Standard,
    Sane,
    Chaotic,
    Custom,
}

impl GameMode {
    pub fn base(self) -> Option<BaseMode> {
        match self {
            GameMode::Standard => Some(BaseMode::Standard),
            GameMode::Sane => Some(BaseMode::Sane),
            GameMode::Chaotic => Some(BaseMode::Chaotic),
            GameMode::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Preset {
    Low,
    Medium,
    High,
}

impl Preset {
    fn pick(self, low: f32, medium: f32, high: f32) -> f32 {
        match self {
            Preset::Low => low,
            Preset::Medium => medium,
            Preset::High => high,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AsteroidDensity {
    None,
    Some,
    Many,
    /// Initial field plus continuous border spawning.
    Spawn,
}

impl AsteroidDensity {
    /// Multiplier applied to the map's initial asteroid count.
    pub fn initial_multiplier(self) -> u32 {
        match self {
            AsteroidDensity::None => 0,
            AsteroidDensity::Some | AsteroidDensity::Spawn => 1,
            AsteroidDensity::Many => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvancedSettings {
    pub ship_restitution: Preset,
    pub ship_friction: Preset,
    pub ship_angular_damping: Preset,
    pub wall_restitution: Preset,
    pub wall_friction: Preset,
    pub asteroid_density: AsteroidDensity,
    pub starting_powerups: bool,
}

impl AdvancedSettings {
    pub fn for_base(base: BaseMode) -> Self {
        match base {
            BaseMode::Standard => Self {
                ship_restitution: Preset::Medium,
                ship_friction: Preset::Medium,
                ship_angular_damping: Preset::Medium,
                wall_restitution: Preset::Medium,
                wall_friction: Preset::Medium,
                asteroid_density: AsteroidDensity::Some,
                starting_powerups: false,
            },
            BaseMode::Sane => Self {
                ship_restitution: Preset::Low,
                ship_friction: Preset::Medium,
                ship_angular_damping: Preset::High,
                wall_restitution: Preset::Low,
                wall_friction: Preset::High,
                asteroid_density: AsteroidDensity::Some,
                starting_powerups: false,
            },
            BaseMode::Chaotic => Self {
                ship_restitution: Preset::High,
                ship_friction: Preset::Low,
                ship_angular_damping: Preset::Low,
                wall_restitution: Preset::High,
                wall_friction: Preset::Low,
                asteroid_density: AsteroidDensity::Spawn,
                starting_powerups: true,
            },
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self::for_base(BaseMode::Standard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Propulsion {
    /// Velocity eases toward `heading * target_speed`.
    Smoothed { target_speed: f32, response: f32 },
    /// Constant acceleration along the heading, capped at `max_speed`.
    Thrust { accel: f32, max_speed: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashStyle {
    /// Timed multiplier on the smoothed target speed.
    Boost { multiplier: f32, duration_ms: f64 },
    Impulse { speed: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RecoilStyle {
    /// Timed multiplier on the smoothed target speed.
    SpeedPenalty { factor: f32, duration_ms: f64 },
    Impulse { speed: f32 },
}

/// Numbers the physics integrator reads every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsProfile {
    pub propulsion: Propulsion,
    pub dash: DashStyle,
    pub recoil: RecoilStyle,
    pub air_friction: f32,
    pub ship_restitution: f32,
    pub ship_friction: f32,
    pub ship_angular_damping: f32,
    pub wall_restitution: f32,
    pub wall_friction: f32,
}

impl PhysicsProfile {
    pub fn resolve(base: BaseMode, advanced: &AdvancedSettings) -> Self {
        let (propulsion, dash, recoil, air_friction) = match base {
            BaseMode::Standard => (
                Propulsion::Smoothed {
                    target_speed: 210.0,
                    response: 5.0,
                },
                DashStyle::Boost {
                    multiplier: 2.1,
                    duration_ms: 220.0,
                },
                RecoilStyle::SpeedPenalty {
                    factor: 0.55,
                    duration_ms: 140.0,
                },
                0.0,
            ),
            BaseMode::Sane => (
                Propulsion::Thrust {
                    accel: 380.0,
                    max_speed: 240.0,
                },
                DashStyle::Impulse { speed: 300.0 },
                RecoilStyle::Impulse { speed: 60.0 },
                1.1,
            ),
            BaseMode::Chaotic => (
                Propulsion::Thrust {
                    accel: 520.0,
                    max_speed: 360.0,
                },
                DashStyle::Impulse { speed: 380.0 },
                RecoilStyle::Impulse { speed: 90.0 },
                0.35,
            ),
        };

        Self {
            propulsion,
            dash,
            recoil,
            air_friction,
            ship_restitution: advanced.ship_restitution.pick(0.3, 0.6, 0.9),
            ship_friction: advanced.ship_friction.pick(0.05, 0.2, 0.45),
            ship_angular_damping: advanced.ship_angular_damping.pick(1.5, 4.0, 8.0),
            wall_restitution: advanced.wall_restitution.pick(0.25, 0.5, 0.85),
            wall_friction: advanced.wall_friction.pick(0.02, 0.1, 0.3),
        }
    }
}
