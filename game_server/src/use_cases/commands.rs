// Inbound commands: validation and the state changes they cause.
//
// A rejected command returns before touching the state. Stale player ids are not errors;
// the command simply does nothing.

use super::types::{CommandKind, RoomCommand};
use crate::domain::identity::BOT_NAMES;
use crate::domain::player::AiState;
use crate::domain::systems::{powerups, round};
use crate::domain::tuning::MIN_PLAYERS_TO_START;
use crate::domain::tuning::ai::BotDifficulty;
use crate::domain::tuning::arena::map_by_id;
use crate::domain::tuning::modes::{AdvancedSettings, GameMode};
use crate::domain::{Phase, PlayerId, PlayerKind, RuntimePlayer, SessionId, SimState};
use std::fmt;
use tracing::{debug, info};

pub const MAX_NAME_LEN: usize = 16;

/// Why a command was rejected. Surfaced to the sender as `code()` plus the `Display` text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    NotLeader,
    WrongPhase { phase: Phase },
    NotEnoughPlayers { have: usize, need: usize },
    RoomFull,
    NotJoined,
    AlreadyJoined,
    InvalidName,
    UnknownMap(u32),
    DevModeDisabled,
    CannotKickSelf,
}

impl CommandError {
    pub fn code(&self) -> &'static str {
        match self {
            CommandError::NotLeader => "NOT_LEADER",
            CommandError::WrongPhase { .. } => "WRONG_PHASE",
            CommandError::NotEnoughPlayers { .. } => "NOT_ENOUGH_PLAYERS",
            CommandError::RoomFull => "ROOM_FULL",
            CommandError::NotJoined => "NOT_JOINED",
            CommandError::AlreadyJoined => "ALREADY_JOINED",
            CommandError::InvalidName => "INVALID_NAME",
            CommandError::UnknownMap(_) => "UNKNOWN_MAP",
            CommandError::DevModeDisabled => "DEV_MODE_DISABLED",
            CommandError::CannotKickSelf => "CANNOT_KICK_SELF",
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::NotLeader => write!(f, "only the room leader can do that"),
            CommandError::WrongPhase { phase } => write!(f, "not allowed during {phase:?}"),
            CommandError::NotEnoughPlayers { have, need } => {
                write!(f, "need at least {need} players, have {have}")
            }
            CommandError::RoomFull => write!(f, "room is full"),
            CommandError::NotJoined => write!(f, "session has not joined this room"),
            CommandError::AlreadyJoined => write!(f, "session already joined this room"),
            CommandError::InvalidName => write!(f, "name must not be empty"),
            CommandError::UnknownMap(id) => write!(f, "unknown map {id}"),
            CommandError::DevModeDisabled => write!(f, "dev mode is off"),
            CommandError::CannotKickSelf => write!(f, "cannot kick yourself"),
        }
    }
}

impl std::error::Error for CommandError {}

/// What an accepted command changed, so the caller knows what to publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    pub players_changed: bool,
    pub meta_changed: bool,
    pub dev_mode: Option<bool>,
    pub removed_sessions: Vec<SessionId>,
}

impl Outcome {
    fn players() -> Self {
        Self {
            players_changed: true,
            ..Self::default()
        }
    }

    fn meta() -> Self {
        Self {
            meta_changed: true,
            ..Self::default()
        }
    }

    fn everything() -> Self {
        Self {
            players_changed: true,
            meta_changed: true,
            ..Self::default()
        }
    }
}

fn clean_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect()
}

fn require_leader(state: &SimState, session_id: SessionId) -> Result<(), CommandError> {
    if state.is_leader(session_id) {
        Ok(())
    } else {
        Err(CommandError::NotLeader)
    }
}

fn require_phase(state: &SimState, phase: Phase) -> Result<(), CommandError> {
    if state.phase == phase {
        Ok(())
    } else {
        Err(CommandError::WrongPhase { phase: state.phase })
    }
}

fn require_joined(state: &SimState, session_id: SessionId) -> Result<PlayerId, CommandError> {
    state
        .session_player(session_id)
        .map(|p| p.id)
        .ok_or(CommandError::NotJoined)
}

/// Creates a player with a free color. Players joining mid-match sit out until the next round.
fn add_player(
    state: &mut SimState,
    name: String,
    kind: PlayerKind,
    session_id: SessionId,
) -> Result<PlayerId, CommandError> {
    if state.players.len() >= state.settings.max_players {
        return Err(CommandError::RoomFull);
    }
    let color = state.colors.allocate().ok_or(CommandError::RoomFull)?;
    let id = state.ids.next_player();
    let name = if name.is_empty() {
        format!("Player {}", color + 1)
    } else {
        name
    };
    state
        .players
        .push(RuntimePlayer::new(id, name, color, kind, session_id));
    Ok(id)
}

/// Drops one player and returns its identity slots to the pools.
fn remove_player(state: &mut SimState, player_id: PlayerId) -> bool {
    let Some(index) = state.player_index(player_id) else {
        return false;
    };
    let player = state.players.remove(index);
    state.colors.release(player.color_index);
    if let Some(slot) = player.bot_name_index {
        state.bot_names.release(slot);
    }
    debug!(player_id, kind = ?player.kind, "player removed");
    true
}

/// Leadership passes to the next human in player order. Bots follow the leader.
fn hand_off_leadership(state: &mut SimState) {
    let next = state
        .players
        .iter()
        .find(|p| p.kind == PlayerKind::Human)
        .map(|p| p.session_id);
    if next != state.leader_session {
        info!(from = ?state.leader_session, to = ?next, "leader changed");
    }
    state.leader_session = next;
    if let Some(leader) = next {
        for bot in state.players.iter_mut().filter(|p| p.is_bot()) {
            bot.session_id = leader;
        }
    }
}

/// Removes the session's human and local players. Returns false for unknown sessions.
fn remove_session(state: &mut SimState, session_id: SessionId) -> bool {
    let ids: Vec<PlayerId> = state
        .players
        .iter()
        .filter(|p| p.session_id == session_id && !p.is_bot())
        .map(|p| p.id)
        .collect();
    if ids.is_empty() {
        return false;
    }
    for id in ids {
        remove_player(state, id);
    }
    if state.leader_session == Some(session_id) || state.leader_session.is_none() {
        hand_off_leadership(state);
    }
    info!(session_id, remaining = state.players.len(), "session left");
    true
}

/// A player the session may steer: its own human, or one of its local players.
fn controlled_player(
    state: &SimState,
    session_id: SessionId,
    player_id: Option<PlayerId>,
) -> Option<usize> {
    match player_id {
        Some(id) => state.players.iter().position(|p| {
            p.id == id && p.session_id == session_id && p.kind != PlayerKind::Bot
        }),
        None => state
            .players
            .iter()
            .position(|p| p.session_id == session_id && p.kind == PlayerKind::Human),
    }
}

/// Validates and applies one command.
pub fn execute(state: &mut SimState, command: &RoomCommand) -> Result<Outcome, CommandError> {
    let session_id = command.session_id;
    match &command.kind {
        CommandKind::AddHuman { name } => {
            if state.session_player(session_id).is_some() {
                return Err(CommandError::AlreadyJoined);
            }
            let player_id = add_player(state, clean_name(name), PlayerKind::Human, session_id)?;
            if state.leader_session.is_none() {
                hand_off_leadership(state);
            }
            info!(session_id, player_id, "human joined");
            Ok(Outcome::everything())
        }

        CommandKind::RemoveSession => {
            if !remove_session(state, session_id) {
                return Ok(Outcome::default());
            }
            let mut outcome = Outcome::everything();
            outcome.removed_sessions.push(session_id);
            Ok(outcome)
        }

        CommandKind::SetName { name } => {
            let player_id = require_joined(state, session_id)?;
            let name = clean_name(name);
            if name.is_empty() {
                return Err(CommandError::InvalidName);
            }
            if let Some(player) = state.player_mut(player_id) {
                player.name = name;
            }
            Ok(Outcome::players())
        }

        CommandKind::SendInput {
            button_a,
            button_b,
            sequence,
            timestamp,
            rtt_ms,
            player_id,
        } => {
            if let Some(index) = controlled_player(state, session_id, *player_id) {
                state.players[index]
                    .input
                    .apply(*button_a, *button_b, *sequence, *timestamp, *rtt_ms);
            }
            Ok(Outcome::default())
        }

        CommandKind::QueueDash { player_id } => {
            if state.phase == Phase::RoundActive
                && let Some(index) = controlled_player(state, session_id, *player_id)
            {
                state.players[index].dash_queued = true;
            }
            Ok(Outcome::default())
        }

        CommandKind::StartMatch => {
            require_leader(state, session_id)?;
            require_phase(state, Phase::Lobby)?;
            let have = state.players.len();
            if have < MIN_PLAYERS_TO_START {
                return Err(CommandError::NotEnoughPlayers {
                    have,
                    need: MIN_PLAYERS_TO_START,
                });
            }
            round::start_match(state);
            Ok(Outcome::everything())
        }

        CommandKind::RestartToLobby => {
            require_leader(state, session_id)?;
            if state.phase == Phase::Lobby {
                return Err(CommandError::WrongPhase { phase: state.phase });
            }
            round::return_to_lobby(state);
            Ok(Outcome::everything())
        }

        CommandKind::SetMode { mode } => {
            require_leader(state, session_id)?;
            require_phase(state, Phase::Lobby)?;
            state.settings.mode = *mode;
            if let Some(base) = mode.base() {
                state.settings.base_mode = base;
                state.settings.advanced = AdvancedSettings::for_base(base);
            }
            state.refresh_physics();
            Ok(Outcome::meta())
        }

        CommandKind::SetMap { map_id } => {
            require_leader(state, session_id)?;
            require_phase(state, Phase::Lobby)?;
            if map_by_id(*map_id).is_none() {
                return Err(CommandError::UnknownMap(*map_id));
            }
            state.settings.map_id = *map_id;
            Ok(Outcome::meta())
        }

        CommandKind::SetAdvancedSettings { settings } => {
            require_leader(state, session_id)?;
            require_phase(state, Phase::Lobby)?;
            state.settings.advanced = *settings;
            state.settings.mode = GameMode::Custom;
            state.refresh_physics();
            Ok(Outcome::meta())
        }

        CommandKind::SetDevMode { enabled } => {
            require_leader(state, session_id)?;
            state.settings.dev_mode = *enabled;
            Ok(Outcome {
                meta_changed: true,
                dev_mode: Some(*enabled),
                ..Outcome::default()
            })
        }

        CommandKind::DevGrantPowerUp {
            player_id,
            power_up,
        } => {
            if !state.settings.dev_mode {
                return Err(CommandError::DevModeDisabled);
            }
            require_leader(state, session_id)?;
            let target = match player_id {
                Some(id) => Some(*id),
                None => state.session_player(session_id).map(|p| p.id),
            };
            if let Some(id) = target {
                powerups::grant_power_up(state, id, *power_up);
            }
            Ok(Outcome::default())
        }

        CommandKind::AddAiBot { difficulty } => {
            require_leader(state, session_id)?;
            require_phase(state, Phase::Lobby)?;
            add_bot(state, session_id, *difficulty)?;
            Ok(Outcome::players())
        }

        CommandKind::AddLocalPlayer { name } => {
            require_joined(state, session_id)?;
            let player_id = add_player(state, clean_name(name), PlayerKind::Local, session_id)?;
            info!(session_id, player_id, "local player joined");
            Ok(Outcome::players())
        }

        CommandKind::RemoveBot { player_id } => {
            require_leader(state, session_id)?;
            let is_bot = state.player(*player_id).is_some_and(|p| p.is_bot());
            if is_bot {
                remove_player(state, *player_id);
                return Ok(Outcome::players());
            }
            Ok(Outcome::default())
        }

        CommandKind::KickPlayer { player_id } => {
            require_leader(state, session_id)?;
            let Some(target) = state.player(*player_id) else {
                return Ok(Outcome::default());
            };
            match target.kind {
                PlayerKind::Human if target.session_id == session_id => {
                    Err(CommandError::CannotKickSelf)
                }
                PlayerKind::Human => {
                    let kicked = target.session_id;
                    remove_session(state, kicked);
                    info!(session_id = kicked, "session kicked");
                    let mut outcome = Outcome::everything();
                    outcome.removed_sessions.push(kicked);
                    Ok(outcome)
                }
                PlayerKind::Local | PlayerKind::Bot => {
                    remove_player(state, *player_id);
                    Ok(Outcome::players())
                }
            }
        }
    }
}

fn add_bot(
    state: &mut SimState,
    session_id: SessionId,
    difficulty: BotDifficulty,
) -> Result<PlayerId, CommandError> {
    if state.players.len() >= state.settings.max_players {
        return Err(CommandError::RoomFull);
    }
    let name_index = state.bot_names.allocate().ok_or(CommandError::RoomFull)?;
    let name = BOT_NAMES[name_index % BOT_NAMES.len()].to_string();
    let player_id = match add_player(state, name, PlayerKind::Bot, session_id) {
        Ok(id) => id,
        Err(e) => {
            state.bot_names.release(name_index);
            return Err(e);
        }
    };
    if let Some(bot) = state.player_mut(player_id) {
        bot.bot_name_index = Some(name_index);
        bot.bot = Some(AiState::new(difficulty));
    }
    info!(player_id, ?difficulty, "bot added");
    Ok(player_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PowerUpKind;
    use crate::domain::state::RoomSettings;

    fn cmd(session_id: SessionId, kind: CommandKind) -> RoomCommand {
        RoomCommand::new(session_id, kind)
    }

    fn join(state: &mut SimState, session_id: SessionId, name: &str) -> PlayerId {
        execute(
            state,
            &cmd(
                session_id,
                CommandKind::AddHuman {
                    name: name.to_string(),
                },
            ),
        )
        .expect("join");
        state.session_player(session_id).expect("player").id
    }

    fn room() -> SimState {
        SimState::new(RoomSettings::new(4), 1)
    }

    #[test]
    fn when_first_human_joins_then_they_lead_the_room() {
        let mut state = room();
        join(&mut state, 10, "ann");
        join(&mut state, 20, "bob");

        assert_eq!(state.leader_session, Some(10));
        assert_eq!(state.players.len(), 2);
        assert_ne!(state.players[0].color_index, state.players[1].color_index);
    }

    #[test]
    fn when_non_leader_starts_match_then_it_is_rejected_without_changes() {
        let mut state = room();
        join(&mut state, 10, "ann");
        join(&mut state, 20, "bob");

        let err = execute(&mut state, &cmd(20, CommandKind::StartMatch)).unwrap_err();

        assert_eq!(err.code(), "NOT_LEADER");
        assert_eq!(state.phase, Phase::Lobby);
        assert_eq!(state.round, 0);
    }

    #[test]
    fn when_leader_starts_alone_then_not_enough_players() {
        let mut state = room();
        join(&mut state, 10, "ann");

        let err = execute(&mut state, &cmd(10, CommandKind::StartMatch)).unwrap_err();

        assert_eq!(
            err,
            CommandError::NotEnoughPlayers { have: 1, need: 2 }
        );
    }

    #[test]
    fn when_leader_starts_with_a_bot_then_countdown_begins() {
        let mut state = room();
        join(&mut state, 10, "ann");
        execute(
            &mut state,
            &cmd(
                10,
                CommandKind::AddAiBot {
                    difficulty: BotDifficulty::Hard,
                },
            ),
        )
        .expect("bot");

        execute(&mut state, &cmd(10, CommandKind::StartMatch)).expect("start");

        assert_eq!(state.phase, Phase::Countdown);
        assert_eq!(state.players[1].name, BOT_NAMES[0]);
    }

    #[test]
    fn when_settings_change_outside_lobby_then_wrong_phase() {
        let mut state = room();
        join(&mut state, 10, "ann");
        join(&mut state, 20, "bob");
        execute(&mut state, &cmd(10, CommandKind::StartMatch)).expect("start");

        let err = execute(&mut state, &cmd(10, CommandKind::SetMap { map_id: 1 })).unwrap_err();

        assert_eq!(err.code(), "WRONG_PHASE");
        assert_eq!(state.settings.map_id, 0);
    }

    #[test]
    fn when_mode_is_set_then_advanced_settings_follow_the_base() {
        let mut state = room();
        join(&mut state, 10, "ann");

        execute(
            &mut state,
            &cmd(
                10,
                CommandKind::SetMode {
                    mode: GameMode::Chaotic,
                },
            ),
        )
        .expect("mode");

        assert_eq!(
            state.settings.advanced,
            AdvancedSettings::for_base(crate::domain::tuning::modes::BaseMode::Chaotic)
        );
    }

    #[test]
    fn when_room_is_full_then_join_is_rejected() {
        let mut state = SimState::new(RoomSettings::new(2), 1);
        join(&mut state, 10, "ann");
        join(&mut state, 20, "bob");

        let err = execute(
            &mut state,
            &cmd(
                30,
                CommandKind::AddHuman {
                    name: "cy".to_string(),
                },
            ),
        )
        .unwrap_err();

        assert_eq!(err, CommandError::RoomFull);
        assert_eq!(state.players.len(), 2);
    }

    #[test]
    fn when_leader_leaves_then_next_human_leads_and_colors_are_freed() {
        let mut state = room();
        join(&mut state, 10, "ann");
        join(&mut state, 20, "bob");
        let freed = state.players[0].color_index;

        let outcome = execute(&mut state, &cmd(10, CommandKind::RemoveSession)).expect("leave");

        assert_eq!(outcome.removed_sessions, vec![10]);
        assert_eq!(state.leader_session, Some(20));
        assert!(!state.colors.is_taken(freed));
    }

    #[test]
    fn when_human_joins_a_leaderless_room_then_orphaned_bots_follow_them() {
        let mut state = room();
        join(&mut state, 10, "ann");
        execute(
            &mut state,
            &cmd(
                10,
                CommandKind::AddAiBot {
                    difficulty: BotDifficulty::Easy,
                },
            ),
        )
        .expect("bot");
        execute(&mut state, &cmd(10, CommandKind::RemoveSession)).expect("leave");
        assert_eq!(state.leader_session, None);

        join(&mut state, 30, "cat");

        assert_eq!(state.leader_session, Some(30));
        let bot = state.players.iter().find(|p| p.is_bot()).expect("bot kept");
        assert_eq!(bot.session_id, 30);
    }

    #[test]
    fn when_input_targets_someone_elses_player_then_it_is_ignored() {
        let mut state = room();
        join(&mut state, 10, "ann");
        let bob = join(&mut state, 20, "bob");

        let outcome = execute(
            &mut state,
            &cmd(
                10,
                CommandKind::SendInput {
                    button_a: true,
                    button_b: false,
                    sequence: 1,
                    timestamp: 0.0,
                    rtt_ms: 0.0,
                    player_id: Some(bob),
                },
            ),
        )
        .expect("silent");

        assert_eq!(outcome, Outcome::default());
        assert!(!state.player(bob).expect("bob").input.button_a);
    }

    #[test]
    fn when_dev_mode_is_off_then_grants_are_rejected() {
        let mut state = room();
        join(&mut state, 10, "ann");

        let grant = cmd(
            10,
            CommandKind::DevGrantPowerUp {
                player_id: None,
                power_up: PowerUpKind::Laser,
            },
        );
        assert_eq!(
            execute(&mut state, &grant).unwrap_err(),
            CommandError::DevModeDisabled
        );

        execute(&mut state, &cmd(10, CommandKind::SetDevMode { enabled: true })).expect("dev");
        execute(&mut state, &grant).expect("grant");
        assert!(state.players[0].holds(PowerUpKind::Laser));
    }

    #[test]
    fn when_kicking_a_stale_id_then_nothing_happens() {
        let mut state = room();
        join(&mut state, 10, "ann");

        let outcome =
            execute(&mut state, &cmd(10, CommandKind::KickPlayer { player_id: 999 })).expect("noop");

        assert_eq!(outcome, Outcome::default());
        assert_eq!(state.players.len(), 1);
    }

    #[test]
    fn when_leader_kicks_a_human_then_their_local_players_go_too() {
        let mut state = room();
        join(&mut state, 10, "ann");
        let bob = join(&mut state, 20, "bob");
        execute(
            &mut state,
            &cmd(
                20,
                CommandKind::AddLocalPlayer {
                    name: "bob2".to_string(),
                },
            ),
        )
        .expect("local");

        let outcome =
            execute(&mut state, &cmd(10, CommandKind::KickPlayer { player_id: bob })).expect("kick");

        assert_eq!(outcome.removed_sessions, vec![20]);
        assert_eq!(state.players.len(), 1);
    }

    #[test]
    fn when_name_is_blank_then_set_name_is_rejected() {
        let mut state = room();
        join(&mut state, 10, "ann");

        let err = execute(
            &mut state,
            &cmd(
                10,
                CommandKind::SetName {
                    name: "   ".to_string(),
                },
            ),
        )
        .unwrap_err();

        assert_eq!(err, CommandError::InvalidName);
        assert_eq!(state.players[0].name, "ann");
    }
}
