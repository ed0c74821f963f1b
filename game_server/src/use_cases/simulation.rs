// A room's simulation: state, fixed-step clock, and the hooks it reports through.

use super::commands::{self, CommandError};
use super::hooks::SimHooks;
use super::scheduler::FixedStepScheduler;
use super::types::{PhaseChange, PlayerInfo, RoomCommand, RoomMeta, RoundResult, Standing};
use crate::domain::systems;
use crate::domain::{PlayerId, RoomSettings, SimEvent, SimState, Snapshot};
use tracing::{debug, trace};

pub struct Simulation<H: SimHooks> {
    state: SimState,
    scheduler: FixedStepScheduler,
    hooks: H,
}

impl<H: SimHooks> Simulation<H> {
    pub fn new(settings: RoomSettings, seed: u64, tick_ms: f64, hooks: H) -> Self {
        Self {
            state: SimState::new(settings, seed),
            scheduler: FixedStepScheduler::new(tick_ms),
            hooks,
        }
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    pub fn hooks_mut(&mut self) -> &mut H {
        &mut self.hooks
    }

    pub fn is_empty(&self) -> bool {
        self.state.players.is_empty()
    }

    /// Applies one command. Rejections go back to the sender through `SimHooks::error`.
    pub fn apply(&mut self, command: RoomCommand) -> Result<(), CommandError> {
        let name = command.kind.name();
        match commands::execute(&mut self.state, &command) {
            Ok(outcome) => {
                if name != "send_input" {
                    debug!(session_id = command.session_id, command = name, "command applied");
                }
                // Match starts and restarts queue phase events of their own.
                self.flush_events();
                if outcome.players_changed {
                    self.publish_players();
                }
                if outcome.meta_changed {
                    self.publish_meta();
                }
                if let Some(enabled) = outcome.dev_mode {
                    self.hooks.dev_mode_changed(enabled);
                }
                for session_id in outcome.removed_sessions {
                    self.hooks.session_removed(session_id);
                }
                Ok(())
            }
            Err(err) => {
                debug!(
                    session_id = command.session_id,
                    command = name,
                    code = err.code(),
                    "command rejected"
                );
                self.hooks
                    .error(command.session_id, err.code(), &err.to_string());
                Err(err)
            }
        }
    }

    /// Feeds one wall-clock frame to the scheduler. Returns the number of ticks run.
    pub fn advance(&mut self, frame_ms: f64) -> u32 {
        let Self {
            state,
            scheduler,
            ..
        } = self;
        let mut events = Vec::new();
        let steps = scheduler.advance(frame_ms, |dt_ms| {
            systems::step(state, dt_ms);
            events.append(&mut state.take_events());
        });
        self.dispatch(events);
        steps
    }

    /// Runs exactly one tick, bypassing the frame clock.
    pub fn step_once(&mut self) {
        let tick_ms = self.scheduler.tick_ms();
        systems::step(&mut self.state, tick_ms);
        self.flush_events();
    }

    pub fn publish_snapshot(&mut self) {
        let snapshot = Snapshot::capture(&self.state);
        self.hooks.snapshot(&snapshot);
    }

    pub fn player_infos(&self) -> Vec<PlayerInfo> {
        self.state
            .players
            .iter()
            .map(|p| PlayerInfo {
                id: p.id,
                name: p.name.clone(),
                color_index: p.color_index,
                kind: p.kind,
                bot_difficulty: p.bot.as_ref().map(|b| b.difficulty),
                session_id: p.session_id,
                round_wins: p.round_wins,
                kills: p.kills,
            })
            .collect()
    }

    pub fn room_meta(&self) -> RoomMeta {
        let s = &self.state;
        RoomMeta {
            phase: s.phase,
            round: s.round,
            mode: s.settings.mode,
            base_mode: s.settings.base_mode,
            map_id: s.settings.map_id,
            advanced: s.settings.advanced,
            max_players: s.settings.max_players,
            rounds_to_win: s.settings.rounds_to_win,
            dev_mode: s.settings.dev_mode,
            leader_session: s.leader_session,
        }
    }

    fn publish_players(&mut self) {
        let players = self.player_infos();
        self.hooks.players_changed(&players);
    }

    fn publish_meta(&mut self) {
        let meta = self.room_meta();
        self.hooks.room_meta_changed(&meta);
    }

    fn player_name(&self, id: Option<PlayerId>) -> Option<String> {
        id.and_then(|id| self.state.player(id)).map(|p| p.name.clone())
    }

    fn flush_events(&mut self) {
        let events = self.state.take_events();
        self.dispatch(events);
    }

    fn dispatch(&mut self, events: Vec<SimEvent>) {
        for event in events {
            match event {
                SimEvent::ShipHit {
                    target_id,
                    attacker_id,
                    source,
                    outcome,
                } => {
                    trace!(target_id, ?attacker_id, ?source, ?outcome, "ship hit");
                }
                SimEvent::PilotKilled {
                    pilot_id,
                    killer_id,
                } => {
                    trace!(pilot_id, ?killer_id, "pilot killed");
                    if killer_id.is_some() {
                        self.publish_players();
                    }
                }
                SimEvent::Sound(cue) => self.hooks.sound(cue),
                SimEvent::ScreenShake {
                    intensity,
                    duration_ms,
                } => self.hooks.screen_shake(intensity, duration_ms),
                SimEvent::DashParticles {
                    player_id,
                    pos,
                    angle,
                } => self.hooks.dash_particles(player_id, pos, angle),
                SimEvent::PhaseChanged { phase, winner_id } => {
                    let change = PhaseChange {
                        phase,
                        winner_id,
                        winner_name: self.player_name(winner_id),
                    };
                    self.hooks.phase_changed(&change);
                    self.publish_meta();
                }
                SimEvent::CountdownTick(seconds) => self.hooks.countdown(seconds),
                SimEvent::RoundEnded { winner_id } => {
                    let result = RoundResult {
                        round: self.state.round,
                        winner_id,
                        winner_name: self.player_name(winner_id),
                        standings: self
                            .state
                            .players
                            .iter()
                            .map(|p| Standing {
                                player_id: p.id,
                                name: p.name.clone(),
                                kills: p.kills,
                                round_wins: p.round_wins,
                            })
                            .collect(),
                    };
                    self.hooks.round_result(&result);
                    self.publish_players();
                }
            }
        }
    }
}
