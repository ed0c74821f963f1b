// Bot decision loop. Bots write into the same input buffer humans do.

use crate::domain::entities::PlayerId;
use crate::domain::geometry::wrap_angle;
use crate::domain::player::{AiAction, AiDecision, RuntimePlayer};
use crate::domain::rng::SimRng;
use crate::domain::state::SimState;
use crate::domain::tuning::ai::{
    AiProfile, PILOT_MOVE_CHANCE, PILOT_ROTATE_CHANCE, WANDER_ROTATE_CHANCE,
};
use glam::Vec2;
use tracing::trace;

struct Decision {
    action: AiAction,
    kind: AiDecision,
    target_id: Option<PlayerId>,
}

struct Target {
    id: PlayerId,
    pos: Vec2,
    vel: Vec2,
}

/// Nearest living enemy ship or pilot, by squared distance.
fn nearest_enemy(players: &[RuntimePlayer], me: usize, from: Vec2) -> Option<Target> {
    let my_id = players[me].id;
    players
        .iter()
        .filter(|p| p.id != my_id && p.in_round)
        .filter_map(|p| {
            if p.ship.alive {
                Some(Target {
                    id: p.id,
                    pos: p.ship.pos,
                    vel: p.ship.vel,
                })
            } else {
                p.pilot.as_ref().filter(|pl| pl.alive).map(|pl| Target {
                    id: p.id,
                    pos: pl.pos,
                    vel: pl.vel,
                })
            }
        })
        .min_by(|a, b| {
            a.pos
                .distance_squared(from)
                .total_cmp(&b.pos.distance_squared(from))
        })
}

fn decide(players: &[RuntimePlayer], me: usize, profile: &AiProfile, rng: &mut SimRng) -> Decision {
    let player = &players[me];

    if !player.ship.alive {
        return Decision {
            action: AiAction {
                rotate: rng.chance(PILOT_ROTATE_CHANCE),
                thrust: rng.chance(PILOT_MOVE_CHANCE),
                ..AiAction::default()
            },
            kind: AiDecision::Pilot,
            target_id: None,
        };
    }

    let ship = &player.ship;
    let Some(target) = nearest_enemy(players, me, ship.pos) else {
        return Decision {
            action: AiAction {
                rotate: rng.chance(WANDER_ROTATE_CHANCE),
                fire: rng.chance(profile.fire_chance_unaimed),
                dash: rng.chance(profile.dash_chance),
                thrust: false,
            },
            kind: AiDecision::Wander,
            target_id: None,
        };
    };

    let lead = target.pos + target.vel * profile.lead_factor;
    let desired = (lead - ship.pos).to_angle() + rng.signed(profile.aim_error);
    let aimed = wrap_angle(desired - ship.angle).abs() <= profile.aim_tolerance;

    let mut rotate = !aimed;
    if rng.chance(profile.overreact_chance) {
        rotate = !rotate;
    }
    let fire_chance = if aimed {
        profile.fire_chance_aimed
    } else {
        profile.fire_chance_unaimed
    };
    let fire = rng.chance(fire_chance);
    let close = ship.pos.distance(target.pos) <= profile.close_range;
    let dash = rng.chance(if close {
        profile.close_dash_chance
    } else {
        profile.dash_chance
    });

    Decision {
        action: AiAction {
            rotate,
            fire,
            dash,
            thrust: false,
        },
        kind: AiDecision::Engage,
        target_id: Some(target.id),
    }
}

/// Button A rotates; button B fires in a ship and moves a pilot. One-shot intents
/// (fire, dash) are only queued on the tick the decision is made.
fn write_input(player: &mut RuntimePlayer, action: AiAction, fresh: bool) {
    player.input.button_a = action.rotate;
    if player.ship.alive {
        player.input.button_b = action.fire;
        if fresh {
            player.input.fire_pending |= action.fire;
            player.dash_queued |= action.dash;
        }
    } else {
        player.input.button_b = action.thrust;
    }
}

/// Runs every bot that is in the round. Draws only from the AI stream.
pub fn update_bots(state: &mut SimState) {
    let now = state.now_ms;
    for index in 0..state.players.len() {
        let player = &state.players[index];
        if !player.is_contending() {
            continue;
        }
        let Some(brain) = player.bot.as_ref() else {
            continue;
        };

        if now < brain.next_decision_ms {
            let cached = brain.action;
            let player = &mut state.players[index];
            if let Some(brain) = player.bot.as_mut() {
                brain.last_decision = AiDecision::Cached;
            }
            write_input(player, cached, false);
            continue;
        }

        let profile = brain.profile;
        let decision = decide(&state.players, index, &profile, &mut state.rng.ai);
        let player = &mut state.players[index];
        trace!(
            player_id = player.id,
            decision = ?decision.kind,
            target_id = ?decision.target_id,
            "bot decided"
        );
        if let Some(brain) = player.bot.as_mut() {
            brain.next_decision_ms = now + profile.reaction_delay_ms;
            brain.action = decision.action;
            brain.last_decision = decision.kind;
            brain.target_id = decision.target_id;
        }
        write_input(player, decision.action, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Pilot, Ship};
    use crate::domain::player::{AiState, PlayerKind};
    use crate::domain::state::RoomSettings;
    use crate::domain::tuning::ai::BotDifficulty;

    fn bot(id: PlayerId, pos: Vec2) -> RuntimePlayer {
        let mut p = RuntimePlayer::new(id, format!("bot{id}"), id as usize, PlayerKind::Bot, 1);
        p.bot = Some(AiState::new(BotDifficulty::Normal));
        p.ship = Ship::new(pos, 0.0, 3);
        p.in_round = true;
        p
    }

    fn human(id: PlayerId, pos: Vec2) -> RuntimePlayer {
        let mut p = RuntimePlayer::new(id, format!("p{id}"), id as usize, PlayerKind::Human, id);
        p.ship = Ship::new(pos, 0.0, 3);
        p.in_round = true;
        p
    }

    fn state(seed: u64, players: Vec<RuntimePlayer>) -> SimState {
        let mut state = SimState::new(RoomSettings::default(), seed);
        state.players = players;
        state.now_ms = 1_000.0;
        state
    }

    #[test]
    fn when_bot_has_no_enemies_then_it_wanders_without_a_target() {
        let mut state = state(3, vec![bot(1, Vec2::new(300.0, 300.0))]);

        update_bots(&mut state);

        let brain = state.players[0].bot.as_ref().expect("bot");
        assert_eq!(brain.last_decision, AiDecision::Wander);
        assert_eq!(brain.target_id, None);
        assert!(!brain.action.thrust);
    }

    #[test]
    fn when_enemy_is_alive_then_bot_engages_the_nearest_one() {
        let mut state = state(
            5,
            vec![
                bot(1, Vec2::new(300.0, 300.0)),
                human(2, Vec2::new(900.0, 300.0)),
                human(3, Vec2::new(400.0, 300.0)),
            ],
        );

        update_bots(&mut state);

        let brain = state.players[0].bot.as_ref().expect("bot");
        assert_eq!(brain.last_decision, AiDecision::Engage);
        assert_eq!(brain.target_id, Some(3));
    }

    #[test]
    fn when_reaction_delay_has_not_passed_then_cached_action_is_replayed() {
        let mut state = state(7, vec![bot(1, Vec2::new(300.0, 300.0)), human(2, Vec2::new(600.0, 300.0))]);
        update_bots(&mut state);
        let first = state.players[0].bot.as_ref().expect("bot").action;

        state.now_ms += 16.0;
        state.players[0].input.fire_pending = false;
        state.players[0].dash_queued = false;
        update_bots(&mut state);

        let brain = state.players[0].bot.as_ref().expect("bot");
        assert_eq!(brain.last_decision, AiDecision::Cached);
        assert_eq!(brain.action, first);
        assert_eq!(state.players[0].input.button_a, first.rotate);
        assert!(!state.players[0].input.fire_pending);
        assert!(!state.players[0].dash_queued);
    }

    #[test]
    fn when_ship_is_dead_then_bot_steers_its_pilot() {
        let mut b = bot(1, Vec2::ZERO);
        b.ship.alive = false;
        b.pilot = Some(Pilot {
            pos: Vec2::new(200.0, 200.0),
            vel: Vec2::ZERO,
            angle: 0.0,
            alive: true,
            spawned_at_ms: 0.0,
        });
        let mut state = state(9, vec![b, human(2, Vec2::new(600.0, 300.0))]);

        update_bots(&mut state);

        let p = &state.players[0];
        assert_eq!(p.bot.as_ref().expect("bot").last_decision, AiDecision::Pilot);
        assert_eq!(p.input.button_b, p.bot.as_ref().expect("bot").action.thrust);
        assert!(!p.input.fire_pending);
    }

    #[test]
    fn when_seed_is_the_same_then_bots_decide_the_same() {
        let run = |seed| {
            let mut s = state(seed, vec![bot(1, Vec2::new(300.0, 300.0)), bot(2, Vec2::new(700.0, 420.0))]);
            let mut actions = Vec::new();
            for _ in 0..20 {
                update_bots(&mut s);
                actions.push(s.players.iter().map(|p| p.bot.as_ref().expect("bot").action).collect::<Vec<_>>());
                s.now_ms += 250.0;
            }
            actions
        };
        assert_eq!(run(42), run(42));
    }
}
