// Per-player runtime state: identity, input buffer, held power-up, bot brain.

use super::entities::{Pilot, PlayerId, PowerUpKind, SessionId, Ship};
use super::tuning::ai::{AiProfile, BotDifficulty};
use super::tuning::weapons::{
    HOMING_CHARGES, LASER_CHARGES, MINE_CHARGES, POWERUP_JOUST_DURATION_MS,
    POWERUP_REVERSE_DURATION_MS, SCATTER_CHARGES,
};

/// Buffered buttons from the latest accepted input message.
///
/// Button A rotates. Button B fires while in a ship and moves the pilot once ejected.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub button_a: bool,
    pub button_b: bool,
    /// Set on a rising edge of button B; consumed by the next fire attempt.
    pub fire_pending: bool,
    pub last_sequence: Option<u64>,
    pub client_timestamp: f64,
    pub rtt_ms: f64,
}

impl InputState {
    /// Applies an input frame. Frames older than the last accepted sequence are dropped.
    /// Returns whether the frame was accepted.
    pub fn apply(
        &mut self,
        button_a: bool,
        button_b: bool,
        sequence: u64,
        timestamp: f64,
        rtt_ms: f64,
    ) -> bool {
        if self.last_sequence.is_some_and(|last| sequence <= last) {
            return false;
        }
        if button_b && !self.button_b {
            self.fire_pending = true;
        }
        self.button_a = button_a;
        self.button_b = button_b;
        self.last_sequence = Some(sequence);
        self.client_timestamp = timestamp;
        self.rtt_ms = rtt_ms;
        true
    }

    /// Forgets held buttons between rounds. The sequence watermark is kept.
    pub fn release_buttons(&mut self) {
        self.button_a = false;
        self.button_b = false;
        self.fire_pending = false;
    }
}

/// The single power-up effect a player can hold.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerPowerUp {
    pub kind: PowerUpKind,
    pub charges: u32,
    pub cooldown_until_ms: f64,
    pub shield_hits: u32,
    /// Only timed effects (JOUST, REVERSE) expire.
    pub expires_at_ms: Option<f64>,
}

impl PlayerPowerUp {
    pub fn new(kind: PowerUpKind, now_ms: f64) -> Self {
        let (charges, expires_at_ms) = match kind {
            PowerUpKind::Laser => (LASER_CHARGES, None),
            PowerUpKind::Scatter => (SCATTER_CHARGES, None),
            PowerUpKind::Mine => (MINE_CHARGES, None),
            PowerUpKind::HomingMissile => (HOMING_CHARGES, None),
            PowerUpKind::Shield => (0, None),
            PowerUpKind::Joust => (0, Some(now_ms + POWERUP_JOUST_DURATION_MS)),
            PowerUpKind::Reverse => (0, Some(now_ms + POWERUP_REVERSE_DURATION_MS)),
        };
        Self {
            kind,
            charges,
            cooldown_until_ms: 0.0,
            shield_hits: 0,
            expires_at_ms,
        }
    }

    pub fn is_expired(&self, now_ms: f64) -> bool {
        self.expires_at_ms.is_some_and(|t| now_ms >= t)
    }
}

/// Buttons a bot decided to hold until its next decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AiAction {
    pub rotate: bool,
    pub fire: bool,
    pub dash: bool,
    pub thrust: bool,
}

/// Which branch produced the current bot action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiDecision {
    Cached,
    Pilot,
    Wander,
    Engage,
}

#[derive(Debug, Clone)]
pub struct AiState {
    pub difficulty: BotDifficulty,
    pub profile: AiProfile,
    pub next_decision_ms: f64,
    pub action: AiAction,
    pub last_decision: AiDecision,
    pub target_id: Option<PlayerId>,
}

impl AiState {
    pub fn new(difficulty: BotDifficulty) -> Self {
        Self {
            difficulty,
            profile: AiProfile::for_difficulty(difficulty),
            next_decision_ms: 0.0,
            action: AiAction::default(),
            last_decision: AiDecision::Cached,
            target_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerKind {
    /// Owns a network session.
    Human,
    /// Extra player sharing a human's session (couch co-op).
    Local,
    Bot,
}

#[derive(Debug, Clone)]
pub struct RuntimePlayer {
    pub id: PlayerId,
    pub name: String,
    pub color_index: usize,
    pub kind: PlayerKind,
    /// Session that controls this player. Bots are owned by the session that added them.
    pub session_id: SessionId,
    pub bot_name_index: Option<usize>,
    pub bot: Option<AiState>,

    pub ship: Ship,
    pub pilot: Option<Pilot>,
    pub input: InputState,
    pub dash_queued: bool,
    pub dash_until_ms: f64,
    pub dash_ready_at_ms: f64,
    pub recoil_until_ms: f64,
    pub fired_this_tick: bool,
    pub power_up: Option<PlayerPowerUp>,

    pub round_wins: u32,
    pub kills: u32,
    /// Players who join mid-round sit out until the next countdown.
    pub in_round: bool,
}

impl RuntimePlayer {
    pub fn new(
        id: PlayerId,
        name: String,
        color_index: usize,
        kind: PlayerKind,
        session_id: SessionId,
    ) -> Self {
        Self {
            id,
            name,
            color_index,
            kind,
            session_id,
            bot_name_index: None,
            bot: None,
            ship: Ship::inactive(),
            pilot: None,
            input: InputState::default(),
            dash_queued: false,
            dash_until_ms: 0.0,
            dash_ready_at_ms: 0.0,
            recoil_until_ms: 0.0,
            fired_this_tick: false,
            power_up: None,
            round_wins: 0,
            kills: 0,
            in_round: false,
        }
    }

    pub fn is_bot(&self) -> bool {
        self.kind == PlayerKind::Bot
    }

    /// Still has a ship or a living pilot this round.
    pub fn is_contending(&self) -> bool {
        self.in_round && (self.ship.alive || self.pilot.as_ref().is_some_and(|p| p.alive))
    }

    pub fn holds(&self, kind: PowerUpKind) -> bool {
        self.power_up.as_ref().is_some_and(|p| p.kind == kind)
    }

    /// Overwrites whatever effect was held before.
    pub fn grant_power_up(&mut self, kind: PowerUpKind, now_ms: f64) {
        self.power_up = Some(PlayerPowerUp::new(kind, now_ms));
    }
}
