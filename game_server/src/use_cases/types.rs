// Use-case level inputs/outputs for a room.

use crate::domain::tuning::ai::BotDifficulty;
use crate::domain::tuning::modes::{AdvancedSettings, BaseMode, GameMode};
use crate::domain::{Phase, PlayerId, PlayerKind, PowerUpKind, SessionId, Snapshot, SoundCue};
use glam::Vec2;
use std::sync::Arc;

/// One command from a session, buffered into the room task.
#[derive(Debug, Clone)]
pub struct RoomCommand {
    pub session_id: SessionId,
    pub kind: CommandKind,
}

impl RoomCommand {
    pub fn new(session_id: SessionId, kind: CommandKind) -> Self {
        Self { session_id, kind }
    }
}

#[derive(Debug, Clone)]
pub enum CommandKind {
    AddHuman {
        name: String,
    },
    RemoveSession,
    SetName {
        name: String,
    },
    /// `player_id` selects a local player owned by the same session.
    SendInput {
        button_a: bool,
        button_b: bool,
        sequence: u64,
        timestamp: f64,
        rtt_ms: f64,
        player_id: Option<PlayerId>,
    },
    QueueDash {
        player_id: Option<PlayerId>,
    },
    StartMatch,
    RestartToLobby,
    SetMode {
        mode: GameMode,
    },
    SetMap {
        map_id: u32,
    },
    SetAdvancedSettings {
        settings: AdvancedSettings,
    },
    SetDevMode {
        enabled: bool,
    },
    DevGrantPowerUp {
        player_id: Option<PlayerId>,
        power_up: PowerUpKind,
    },
    AddAiBot {
        difficulty: BotDifficulty,
    },
    AddLocalPlayer {
        name: String,
    },
    RemoveBot {
        player_id: PlayerId,
    },
    KickPlayer {
        player_id: PlayerId,
    },
}

impl CommandKind {
    /// Stable name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::AddHuman { .. } => "add_human",
            CommandKind::RemoveSession => "remove_session",
            CommandKind::SetName { .. } => "set_name",
            CommandKind::SendInput { .. } => "send_input",
            CommandKind::QueueDash { .. } => "queue_dash",
            CommandKind::StartMatch => "start_match",
            CommandKind::RestartToLobby => "restart_to_lobby",
            CommandKind::SetMode { .. } => "set_mode",
            CommandKind::SetMap { .. } => "set_map",
            CommandKind::SetAdvancedSettings { .. } => "set_advanced_settings",
            CommandKind::SetDevMode { .. } => "set_dev_mode",
            CommandKind::DevGrantPowerUp { .. } => "dev_grant_power_up",
            CommandKind::AddAiBot { .. } => "add_ai_bot",
            CommandKind::AddLocalPlayer { .. } => "add_local_player",
            CommandKind::RemoveBot { .. } => "remove_bot",
            CommandKind::KickPlayer { .. } => "kick_player",
        }
    }
}

/// Lobby-facing view of one player.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub color_index: usize,
    pub kind: PlayerKind,
    pub bot_difficulty: Option<BotDifficulty>,
    pub session_id: SessionId,
    pub round_wins: u32,
    pub kills: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomMeta {
    pub phase: Phase,
    pub round: u32,
    pub mode: GameMode,
    pub base_mode: BaseMode,
    pub map_id: u32,
    pub advanced: AdvancedSettings,
    pub max_players: usize,
    pub rounds_to_win: u32,
    pub dev_mode: bool,
    pub leader_session: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseChange {
    pub phase: Phase,
    pub winner_id: Option<PlayerId>,
    pub winner_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub player_id: PlayerId,
    pub name: String,
    pub kills: u32,
    pub round_wins: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoundResult {
    pub round: u32,
    pub winner_id: Option<PlayerId>,
    pub winner_name: Option<String>,
    pub standings: Vec<Standing>,
}

/// Everything a room publishes. `Error` and `SessionRemoved` target one session.
#[derive(Debug, Clone)]
pub enum RoomEvent {
    PlayersChanged(Arc<[PlayerInfo]>),
    RoomMeta(RoomMeta),
    PhaseChanged(PhaseChange),
    Countdown(u32),
    RoundResult(RoundResult),
    Snapshot(Arc<Snapshot>),
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
    DevMode(bool),
    Error {
        session_id: SessionId,
        code: &'static str,
        message: String,
    },
    SessionRemoved(SessionId),
}

impl RoomEvent {
    /// `None` means every session receives it.
    pub fn target(&self) -> Option<SessionId> {
        match self {
            RoomEvent::Error { session_id, .. } | RoomEvent::SessionRemoved(session_id) => {
                Some(*session_id)
            }
            _ => None,
        }
    }
}
