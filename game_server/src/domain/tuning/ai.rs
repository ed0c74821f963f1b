/// Bot behaviour tuning per difficulty.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotDifficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

#[derive(Debug, Clone, Copy)]
pub struct AiProfile {
    /// Bots only re-decide this often; cached actions are replayed in between.
    pub reaction_delay_ms: f64,
    /// Uniform aim error in radians added to the lead heading.
    pub aim_error: f32,
    /// Heading difference that counts as "aimed".
    pub aim_tolerance: f32,
    pub fire_chance_aimed: f32,
    pub fire_chance_unaimed: f32,
    /// Chance to invert the rotate decision.
    pub overreact_chance: f32,
    pub dash_chance: f32,
    pub close_dash_chance: f32,
    /// Seconds of target velocity added to the aim point.
    pub lead_factor: f32,
    pub close_range: f32,
}

impl AiProfile {
    pub fn for_difficulty(difficulty: BotDifficulty) -> Self {
        match difficulty {
            BotDifficulty::Easy => Self {
                reaction_delay_ms: 320.0,
                aim_error: 0.45,
                aim_tolerance: 0.22,
                fire_chance_aimed: 0.45,
                fire_chance_unaimed: 0.05,
                overreact_chance: 0.2,
                dash_chance: 0.01,
                close_dash_chance: 0.08,
                lead_factor: 0.12,
                close_range: 140.0,
            },
            BotDifficulty::Normal => Self {
                reaction_delay_ms: 200.0,
                aim_error: 0.25,
                aim_tolerance: 0.16,
                fire_chance_aimed: 0.65,
                fire_chance_unaimed: 0.05,
                overreact_chance: 0.1,
                dash_chance: 0.02,
                close_dash_chance: 0.15,
                lead_factor: 0.28,
                close_range: 140.0,
            },
            BotDifficulty::Hard => Self {
                reaction_delay_ms: 120.0,
                aim_error: 0.1,
                aim_tolerance: 0.1,
                fire_chance_aimed: 0.85,
                fire_chance_unaimed: 0.03,
                overreact_chance: 0.04,
                dash_chance: 0.04,
                close_dash_chance: 0.25,
                lead_factor: 0.38,
                close_range: 160.0,
            },
        }
    }
}

/// Chances used while the bot only has a pilot left, or no one to chase.
pub const WANDER_ROTATE_CHANCE: f32 = 0.35;
pub const PILOT_ROTATE_CHANCE: f32 = 0.5;
pub const PILOT_MOVE_CHANCE: f32 = 0.6;
