// Round lifecycle: countdown, live round, results, match end.

use super::asteroids::{schedule_next_spawn, spawn_initial_asteroids};
use super::powerups::grant_starting_power_ups;
use crate::domain::entities::{PlayerId, Ship};
use crate::domain::events::{SimEvent, SoundCue};
use crate::domain::state::{Phase, SimState};
use crate::domain::tuning::{COUNTDOWN_MS, ROUND_RESULT_MS};
use tracing::{debug, info};

const COUNTDOWN_SECONDS: u32 = 3;

fn set_phase(state: &mut SimState, phase: Phase, winner_id: Option<PlayerId>) {
    debug!(from = ?state.phase, to = ?phase, round = state.round, "phase change");
    state.phase = phase;
    state.push_event(SimEvent::PhaseChanged { phase, winner_id });
}

fn reset_players_for_round(state: &mut SimState) {
    let map = state.map();
    let arena = state.arena;
    let max_ammo = state.ship_tuning.max_ammo;
    let count = state.players.len();
    for (slot, player) in state.players.iter_mut().enumerate() {
        let (pos, facing) = map.spawn_point(&arena, slot, count);
        player.ship = Ship::new(pos, facing, max_ammo);
        player.pilot = None;
        player.power_up = None;
        player.in_round = true;
        player.input.release_buttons();
        player.dash_queued = false;
        player.dash_until_ms = 0.0;
        player.dash_ready_at_ms = 0.0;
        player.recoil_until_ms = 0.0;
        player.fired_this_tick = false;
        if let Some(brain) = player.bot.as_mut() {
            brain.next_decision_ms = 0.0;
            brain.target_id = None;
        }
    }
}

/// Starts the first round of a new match.
pub fn start_match(state: &mut SimState) {
    state.round = 0;
    state.match_winner = None;
    for player in &mut state.players {
        player.round_wins = 0;
        player.kills = 0;
    }
    info!(players = state.players.len(), "match started");
    start_countdown(state);
}

/// Resets the arena for the next round and freezes it for the countdown.
pub fn start_countdown(state: &mut SimState) {
    state.round += 1;
    state.clear_arena();
    reset_players_for_round(state);
    spawn_initial_asteroids(state);
    grant_starting_power_ups(state);
    schedule_next_spawn(state);

    state.phase_ends_at_ms = Some(state.now_ms + COUNTDOWN_MS);
    state.countdown_remaining = COUNTDOWN_SECONDS;
    set_phase(state, Phase::Countdown, None);
    state.push_event(SimEvent::CountdownTick(COUNTDOWN_SECONDS));
}

/// Drives the timed phases. Live rounds end through `check_round_end` instead.
pub fn advance_phase_timers(state: &mut SimState) {
    let Some(ends_at) = state.phase_ends_at_ms else {
        return;
    };
    let now = state.now_ms;
    match state.phase {
        Phase::Countdown => {
            if now >= ends_at {
                state.phase_ends_at_ms = None;
                state.countdown_remaining = 0;
                set_phase(state, Phase::RoundActive, None);
                return;
            }
            let remaining = ((ends_at - now) / 1000.0).ceil() as u32;
            if remaining < state.countdown_remaining {
                state.countdown_remaining = remaining;
                state.push_event(SimEvent::CountdownTick(remaining));
            }
        }
        Phase::RoundResult => {
            if now < ends_at {
                return;
            }
            state.phase_ends_at_ms = None;
            let target = state.settings.rounds_to_win;
            let champion = state
                .players
                .iter()
                .find(|p| p.round_wins >= target)
                .map(|p| p.id);
            match champion {
                Some(winner_id) => {
                    state.match_winner = Some(winner_id);
                    info!(winner_id, rounds = state.round, "match won");
                    set_phase(state, Phase::GameEnd, Some(winner_id));
                }
                None => start_countdown(state),
            }
        }
        Phase::Lobby | Phase::RoundActive | Phase::GameEnd => {}
    }
}

/// Pilots that survived long enough climb back into a fresh, briefly protected ship.
pub fn respawn_pilots(state: &mut SimState) {
    let now = state.now_ms;
    let respawn_ms = state.pilot_tuning.respawn_ms;
    let tuning = state.ship_tuning;
    let mut respawned = 0;
    for player in &mut state.players {
        let Some(pilot) = player.pilot.as_ref().filter(|p| p.alive) else {
            continue;
        };
        if now - pilot.spawned_at_ms < respawn_ms {
            continue;
        }
        let mut ship = Ship::new(pilot.pos, pilot.angle, tuning.max_ammo);
        ship.invulnerable_until_ms = now + tuning.spawn_invulnerable_ms;
        player.ship = ship;
        player.pilot = None;
        debug!(player_id = player.id, "pilot respawned");
        respawned += 1;
    }
    for _ in 0..respawned {
        state.sound(SoundCue::Respawn);
    }
}

/// Ends the round once at most one player still has a ship or a pilot.
pub fn check_round_end(state: &mut SimState) {
    if state.phase != Phase::RoundActive {
        return;
    }
    let contenders = state.contenders();
    if contenders.len() > 1 {
        return;
    }
    let winner_id = contenders.first().copied();
    if let Some(id) = winner_id
        && let Some(winner) = state.player_mut(id)
    {
        winner.round_wins += 1;
    }
    info!(round = state.round, ?winner_id, "round ended");
    state.phase_ends_at_ms = Some(state.now_ms + ROUND_RESULT_MS);
    state.push_event(SimEvent::RoundEnded { winner_id });
    set_phase(state, Phase::RoundResult, winner_id);
}

/// Back to the lobby from any phase. Scores and the arena are wiped; players stay.
pub fn return_to_lobby(state: &mut SimState) {
    state.clear_arena();
    state.round = 0;
    state.match_winner = None;
    state.phase_ends_at_ms = None;
    state.countdown_remaining = 0;
    for player in &mut state.players {
        player.ship = Ship::inactive();
        player.pilot = None;
        player.power_up = None;
        player.in_round = false;
        player.round_wins = 0;
        player.kills = 0;
        player.input.release_buttons();
        player.dash_queued = false;
    }
    set_phase(state, Phase::Lobby, None);
}
