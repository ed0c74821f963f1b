// Wire protocol DTOs and conversions for public game server messages.
// Internal service-to-service DTOs should live outside this module.

use crate::domain::tuning::ai::BotDifficulty;
use crate::domain::tuning::modes::{AdvancedSettings, BaseMode, GameMode};
use crate::domain::{Phase, PlayerId, PlayerKind, PowerUpKind, Snapshot, SoundCue};
use crate::use_cases::types::{PhaseChange, PlayerInfo, RoomMeta, RoundResult, Standing};
use crate::use_cases::{CommandKind, RoomEvent};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Assigned session for the connection after Join is accepted.
    Welcome {
        session_id: String,
        room_code: String,
    },
    Players(Vec<PlayerDto>),
    RoomMeta(RoomMetaDto),
    Phase(PhaseDto),
    Countdown {
        seconds_left: u32,
    },
    RoundResult(RoundResultDto),
    Snapshot(Arc<Snapshot>),
    Sound {
        cue: SoundCue,
    },
    ScreenShake {
        intensity: f32,
        duration_ms: f64,
    },
    DashParticles {
        player_id: PlayerId,
        x: f32,
        y: f32,
        angle: f32,
    },
    DevMode {
        enabled: bool,
    },
    // Only ever sent to the session whose command was rejected.
    Error {
        code: String,
        message: String,
    },
    // The session has no player in the room anymore; the socket closes after this.
    Removed,
}

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    // Initial handshake message; must be the first message on a socket.
    Join(JoinPayload),
    SetName {
        name: String,
    },
    Input(InputDto),
    Dash {
        #[serde(default)]
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
    SetAdvancedSettings(AdvancedSettings),
    SetDevMode {
        enabled: bool,
    },
    DevGrantPowerUp {
        #[serde(default)]
        player_id: Option<PlayerId>,
        power_up: PowerUpKind,
    },
    AddAiBot {
        #[serde(default)]
        difficulty: BotDifficulty,
    },
    AddLocalPlayer {
        #[serde(default)]
        name: String,
    },
    RemoveBot {
        player_id: PlayerId,
    },
    KickPlayer {
        player_id: PlayerId,
    },
    Leave,
}

/// Payload for the Join handshake.
#[derive(Debug, Clone, Deserialize)]
pub struct JoinPayload {
    #[serde(default)]
    pub name: String,
}

/// Button state sent by the client whenever it changes.
#[derive(Debug, Clone, Deserialize)]
pub struct InputDto {
    #[serde(default)]
    pub button_a: bool,
    #[serde(default)]
    pub button_b: bool,
    pub sequence: u64,
    #[serde(default)]
    pub timestamp: f64,
    #[serde(default)]
    pub rtt: f64,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
}

impl ClientMessage {
    /// Room command for this message. `Join` is handled by the handshake and has none.
    pub fn into_command(self) -> Option<CommandKind> {
        let kind = match self {
            ClientMessage::Join(_) => return None,
            ClientMessage::SetName { name } => CommandKind::SetName { name },
            ClientMessage::Input(input) => CommandKind::SendInput {
                button_a: input.button_a,
                button_b: input.button_b,
                sequence: input.sequence,
                timestamp: input.timestamp,
                rtt_ms: input.rtt,
                player_id: input.player_id,
            },
            ClientMessage::Dash { player_id } => CommandKind::QueueDash { player_id },
            ClientMessage::StartMatch => CommandKind::StartMatch,
            ClientMessage::RestartToLobby => CommandKind::RestartToLobby,
            ClientMessage::SetMode { mode } => CommandKind::SetMode { mode },
            ClientMessage::SetMap { map_id } => CommandKind::SetMap { map_id },
            ClientMessage::SetAdvancedSettings(settings) => {
                CommandKind::SetAdvancedSettings { settings }
            }
            ClientMessage::SetDevMode { enabled } => CommandKind::SetDevMode { enabled },
            ClientMessage::DevGrantPowerUp {
                player_id,
                power_up,
            } => CommandKind::DevGrantPowerUp {
                player_id,
                power_up,
            },
            ClientMessage::AddAiBot { difficulty } => CommandKind::AddAiBot { difficulty },
            ClientMessage::AddLocalPlayer { name } => CommandKind::AddLocalPlayer { name },
            ClientMessage::RemoveBot { player_id } => CommandKind::RemoveBot { player_id },
            ClientMessage::KickPlayer { player_id } => CommandKind::KickPlayer { player_id },
            ClientMessage::Leave => CommandKind::RemoveSession,
        };
        Some(kind)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlayerKindDto {
    Human,
    Local,
    Bot,
}

impl From<PlayerKind> for PlayerKindDto {
    fn from(kind: PlayerKind) -> Self {
        match kind {
            PlayerKind::Human => PlayerKindDto::Human,
            PlayerKind::Local => PlayerKindDto::Local,
            PlayerKind::Bot => PlayerKindDto::Bot,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayerDto {
    pub id: PlayerId,
    pub name: String,
    pub color_index: usize,
    pub kind: PlayerKindDto,
    pub bot_difficulty: Option<BotDifficulty>,
    pub session_id: String,
    pub round_wins: u32,
    pub kills: u32,
}

impl From<&PlayerInfo> for PlayerDto {
    fn from(p: &PlayerInfo) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            color_index: p.color_index,
            kind: p.kind.into(),
            bot_difficulty: p.bot_difficulty,
            session_id: p.session_id.to_string(),
            round_wins: p.round_wins,
            kills: p.kills,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomMetaDto {
    pub phase: Phase,
    pub round: u32,
    pub mode: GameMode,
    pub base_mode: BaseMode,
    pub map_id: u32,
    pub advanced: AdvancedSettings,
    pub max_players: usize,
    pub rounds_to_win: u32,
    pub dev_mode: bool,
    pub leader_session_id: Option<String>,
}

impl From<&RoomMeta> for RoomMetaDto {
    fn from(m: &RoomMeta) -> Self {
        Self {
            phase: m.phase,
            round: m.round,
            mode: m.mode,
            base_mode: m.base_mode,
            map_id: m.map_id,
            advanced: m.advanced,
            max_players: m.max_players,
            rounds_to_win: m.rounds_to_win,
            dev_mode: m.dev_mode,
            leader_session_id: m.leader_session.map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseDto {
    pub phase: Phase,
    pub winner_id: Option<PlayerId>,
    pub winner_name: Option<String>,
}

impl From<&PhaseChange> for PhaseDto {
    fn from(c: &PhaseChange) -> Self {
        Self {
            phase: c.phase,
            winner_id: c.winner_id,
            winner_name: c.winner_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StandingDto {
    pub player_id: PlayerId,
    pub name: String,
    pub kills: u32,
    pub round_wins: u32,
}

impl From<&Standing> for StandingDto {
    fn from(s: &Standing) -> Self {
        Self {
            player_id: s.player_id,
            name: s.name.clone(),
            kills: s.kills,
            round_wins: s.round_wins,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundResultDto {
    pub round: u32,
    pub winner_id: Option<PlayerId>,
    pub winner_name: Option<String>,
    pub standings: Vec<StandingDto>,
}

impl From<&RoundResult> for RoundResultDto {
    fn from(r: &RoundResult) -> Self {
        Self {
            round: r.round,
            winner_id: r.winner_id,
            winner_name: r.winner_name.clone(),
            standings: r.standings.iter().map(StandingDto::from).collect(),
        }
    }
}

impl From<RoomEvent> for ServerMessage {
    fn from(event: RoomEvent) -> Self {
        match event {
            RoomEvent::PlayersChanged(players) => {
                ServerMessage::Players(players.iter().map(PlayerDto::from).collect())
            }
            RoomEvent::RoomMeta(meta) => ServerMessage::RoomMeta(RoomMetaDto::from(&meta)),
            RoomEvent::PhaseChanged(change) => ServerMessage::Phase(PhaseDto::from(&change)),
            RoomEvent::Countdown(seconds_left) => ServerMessage::Countdown { seconds_left },
            RoomEvent::RoundResult(result) => {
                ServerMessage::RoundResult(RoundResultDto::from(&result))
            }
            RoomEvent::Snapshot(snapshot) => ServerMessage::Snapshot(snapshot),
            RoomEvent::Sound(cue) => ServerMessage::Sound { cue },
            RoomEvent::ScreenShake {
                intensity,
                duration_ms,
            } => ServerMessage::ScreenShake {
                intensity,
                duration_ms,
            },
            RoomEvent::DashParticles {
                player_id,
                pos,
                angle,
            } => ServerMessage::DashParticles {
                player_id,
                x: pos.x,
                y: pos.y,
                angle,
            },
            RoomEvent::DevMode(enabled) => ServerMessage::DevMode { enabled },
            RoomEvent::Error { code, message, .. } => ServerMessage::Error {
                code: code.to_string(),
                message,
            },
            RoomEvent::SessionRemoved(_) => ServerMessage::Removed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_client_sends_input_then_it_maps_to_a_send_input_command() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"Input","data":{"button_a":true,"button_b":false,"sequence":7,"timestamp":12.5,"rtt":40}}"#,
        )
        .expect("parse");

        match msg.into_command() {
            Some(CommandKind::SendInput {
                button_a,
                sequence,
                player_id,
                ..
            }) => {
                assert!(button_a);
                assert_eq!(sequence, 7);
                assert_eq!(player_id, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn when_client_sends_unit_command_then_no_data_is_needed() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type":"StartMatch"}"#).expect("parse");
        assert!(matches!(msg.into_command(), Some(CommandKind::StartMatch)));
    }

    #[test]
    fn when_join_is_parsed_then_it_is_not_a_room_command() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"Join","data":{"name":"ann"}}"#).expect("parse");
        assert!(msg.into_command().is_none());
    }

    #[test]
    fn when_error_is_serialized_then_it_uses_the_tagged_layout() {
        let msg = ServerMessage::from(RoomEvent::Error {
            session_id: 3,
            code: "NOT_LEADER",
            message: "only the room leader can do that".to_string(),
        });

        let json = serde_json::to_value(&msg).expect("serialize");

        assert_eq!(json["type"], "Error");
        assert_eq!(json["data"]["code"], "NOT_LEADER");
    }

    #[test]
    fn when_advanced_settings_arrive_then_enums_use_screaming_case() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type":"SetAdvancedSettings","data":{
                "ship_restitution":"HIGH","ship_friction":"LOW","ship_angular_damping":"MEDIUM",
                "wall_restitution":"MEDIUM","wall_friction":"MEDIUM",
                "asteroid_density":"SPAWN","starting_powerups":true}}"#,
        )
        .expect("parse");

        assert!(matches!(
            msg.into_command(),
            Some(CommandKind::SetAdvancedSettings { settings }) if settings.starting_powerups
        ));
    }
}
