// Per-tick systems. `step` is the only entry point the room drives.

pub mod ai;
pub mod asteroids;
pub mod collisions;
pub mod combat;
pub mod damage;
pub mod movement;
pub mod powerups;
pub mod projectiles;
pub mod round;

use super::state::{Phase, SimState};

/// Advances the simulation by one fixed tick.
///
/// Only a live round runs the full pipeline; countdown and results just watch their timers.
pub fn step(state: &mut SimState, dt_ms: f64) {
    state.tick += 1;
    state.now_ms += dt_ms;
    let dt = (dt_ms / 1000.0) as f32;

    match state.phase {
        Phase::RoundActive => {
            ai::update_bots(state);
            movement::update_ships(state, dt);
            movement::update_pilots(state, dt);
            collisions::resolve_ship_collisions(state);
            combat::update_combat(state, dt_ms);
            asteroids::update_asteroids(state, dt);
            powerups::update_power_ups(state, dt);
            projectiles::tick_projectiles(state, dt);
            collisions::detect_contacts(state);
            round::respawn_pilots(state);
            round::check_round_end(state);
            state.asteroids.retain(|a| a.alive);
        }
        Phase::Countdown | Phase::RoundResult => round::advance_phase_timers(state),
        Phase::Lobby | Phase::GameEnd => {}
    }
}
