// Root aggregate for one room's simulation.

use super::entities::{
    Asteroid, EntityIds, HomingMissile, LaserBeam, Mine, PlayerId, PowerUpKind, PowerUpPickup,
    Projectile, SessionId,
};
use super::events::{SimEvent, SoundCue};
use super::identity::{BOT_NAMES, IdentityAllocator};
use super::player::{PlayerKind, RuntimePlayer};
use super::rng::RngStreams;
use super::tuning::arena::{ArenaBounds, MapDefinition, MAPS, map_by_id};
use super::tuning::modes::{AdvancedSettings, BaseMode, GameMode, PhysicsProfile};
use super::tuning::ship::{PilotTuning, ShipTuning};
use super::tuning::{DEFAULT_ROUNDS_TO_WIN, MAX_PLAYERS_LIMIT};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Lobby,
    Countdown,
    RoundActive,
    RoundResult,
    GameEnd,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomSettings {
    pub mode: GameMode,
    pub base_mode: BaseMode,
    pub map_id: u32,
    pub advanced: AdvancedSettings,
    pub max_players: usize,
    pub rounds_to_win: u32,
    pub dev_mode: bool,
}

impl RoomSettings {
    pub fn new(max_players: usize) -> Self {
        Self {
            max_players: max_players.clamp(2, MAX_PLAYERS_LIMIT),
            ..Self::default()
        }
    }
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            mode: GameMode::Standard,
            base_mode: BaseMode::Standard,
            map_id: 0,
            advanced: AdvancedSettings::default(),
            max_players: MAX_PLAYERS_LIMIT,
            rounds_to_win: DEFAULT_ROUNDS_TO_WIN,
            dev_mode: false,
        }
    }
}

#[derive(Debug)]
pub struct SimState {
    pub arena: ArenaBounds,
    pub ship_tuning: ShipTuning,
    pub pilot_tuning: PilotTuning,
    pub settings: RoomSettings,
    /// Resolved from `settings` whenever they change.
    pub physics: PhysicsProfile,

    pub phase: Phase,
    /// Deadline of a timed phase (countdown, round result).
    pub phase_ends_at_ms: Option<f64>,
    /// Whole seconds left on the countdown, as last announced.
    pub countdown_remaining: u32,
    pub round: u32,
    pub leader_session: Option<SessionId>,
    pub match_winner: Option<PlayerId>,

    /// Iteration and UI order.
    pub players: Vec<RuntimePlayer>,
    pub projectiles: Vec<Projectile>,
    pub scatter_shots: Vec<Projectile>,
    pub missiles: Vec<HomingMissile>,
    pub lasers: Vec<LaserBeam>,
    pub mines: Vec<Mine>,
    pub asteroids: Vec<Asteroid>,
    pub pickups: Vec<PowerUpPickup>,
    pub next_asteroid_spawn_ms: Option<f64>,

    pub rng: RngStreams,
    pub ids: EntityIds,
    pub colors: IdentityAllocator,
    pub bot_names: IdentityAllocator,

    pub now_ms: f64,
    pub tick: u64,
    pub events: Vec<SimEvent>,
}

impl SimState {
    pub fn new(settings: RoomSettings, seed: u64) -> Self {
        let physics = PhysicsProfile::resolve(settings.base_mode, &settings.advanced);
        Self {
            arena: ArenaBounds::default(),
            ship_tuning: ShipTuning::default(),
            pilot_tuning: PilotTuning::default(),
            physics,
            phase: Phase::Lobby,
            phase_ends_at_ms: None,
            countdown_remaining: 0,
            round: 0,
            leader_session: None,
            match_winner: None,
            players: Vec::new(),
            projectiles: Vec::new(),
            scatter_shots: Vec::new(),
            missiles: Vec::new(),
            lasers: Vec::new(),
            mines: Vec::new(),
            asteroids: Vec::new(),
            pickups: Vec::new(),
            next_asteroid_spawn_ms: None,
            rng: RngStreams::new(seed),
            ids: EntityIds::default(),
            colors: IdentityAllocator::new(settings.max_players),
            bot_names: IdentityAllocator::new(BOT_NAMES.len()),
            settings,
            now_ms: 0.0,
            tick: 0,
            events: Vec::new(),
        }
    }

    pub fn refresh_physics(&mut self) {
        self.physics = PhysicsProfile::resolve(self.settings.base_mode, &self.settings.advanced);
    }

    pub fn map(&self) -> &'static MapDefinition {
        map_by_id(self.settings.map_id).unwrap_or(&MAPS[0])
    }

    pub fn player_index(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id == id)
    }

    pub fn player(&self, id: PlayerId) -> Option<&RuntimePlayer> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut RuntimePlayer> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// The human player that owns `session_id`, not its local or bot players.
    pub fn session_player(&self, session_id: SessionId) -> Option<&RuntimePlayer> {
        self.players
            .iter()
            .find(|p| p.session_id == session_id && p.kind == PlayerKind::Human)
    }

    pub fn is_leader(&self, session_id: SessionId) -> bool {
        self.leader_session == Some(session_id)
    }

    /// True while another player holds an unexpired REVERSE.
    pub fn is_reversed_for(&self, player_id: PlayerId) -> bool {
        self.players.iter().any(|p| {
            p.id != player_id
                && p.is_contending()
                && p.power_up
                    .as_ref()
                    .is_some_and(|pu| pu.kind == PowerUpKind::Reverse && !pu.is_expired(self.now_ms))
        })
    }

    /// Ids of players that still have a ship or a living pilot this round.
    pub fn contenders(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_contending())
            .map(|p| p.id)
            .collect()
    }

    pub fn push_event(&mut self, event: SimEvent) {
        self.events.push(event);
    }

    pub fn sound(&mut self, cue: SoundCue) {
        self.events.push(SimEvent::Sound(cue));
    }

    pub fn shake(&mut self, intensity: f32, duration_ms: f64) {
        self.events.push(SimEvent::ScreenShake {
            intensity,
            duration_ms,
        });
    }

    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drops every transient entity. Players and scores are untouched.
    pub fn clear_arena(&mut self) {
        self.projectiles.clear();
        self.scatter_shots.clear();
        self.missiles.clear();
        self.lasers.clear();
        self.mines.clear();
        self.asteroids.clear();
        self.pickups.clear();
        self.next_asteroid_spawn_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contender(id: PlayerId, session_id: SessionId) -> RuntimePlayer {
        let mut player = RuntimePlayer::new(
            id,
            format!("p{id}"),
            id as usize,
            PlayerKind::Human,
            session_id,
        );
        player.in_round = true;
        player.ship.alive = true;
        player
    }

    fn duel() -> SimState {
        let mut state = SimState::new(RoomSettings::new(4), 3);
        state.players.push(contender(1, 10));
        state.players.push(contender(2, 20));
        state.players[0].grant_power_up(PowerUpKind::Reverse, 0.0);
        state
    }

    #[test]
    fn when_rival_holds_reverse_then_controls_are_reversed() {
        let state = duel();

        assert!(state.is_reversed_for(2));
        assert!(!state.is_reversed_for(1));
    }

    #[test]
    fn when_reverse_holder_is_out_of_the_round_then_nobody_is_reversed() {
        let mut state = duel();
        state.players[0].ship.alive = false;
        state.players[0].pilot = None;

        assert!(!state.is_reversed_for(2));
    }

    #[test]
    fn when_reverse_holder_sits_out_then_nobody_is_reversed() {
        let mut state = duel();
        state.players[0].in_round = false;

        assert!(!state.is_reversed_for(2));
    }
}
