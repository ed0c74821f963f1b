use super::asteroids::{self, AsteroidDamage, hit_asteroid};
use super::damage::{damage_ship, kill_pilot};
use crate::domain::entities::{Mine, PlayerId, PowerUpKind, PowerUpPickup};
use crate::domain::events::{DamageSource, SoundCue};
use crate::domain::geometry::wrap_angle;
use crate::domain::rng::SimRng;
use crate::domain::state::SimState;
use crate::domain::tuning::weapons::*;
use glam::Vec2;
use tracing::{debug, trace};

/// Weighted pick over every kind.
pub fn roll_power_up(rng: &mut SimRng) -> PowerUpKind {
    let weights = PowerUpKind::ALL.map(PowerUpKind::drop_weight);
    rng.weighted(&weights)
        .map(|i| PowerUpKind::ALL[i])
        .unwrap_or(PowerUpKind::Shield)
}

pub fn spawn_pickup(state: &mut SimState, kind: PowerUpKind, pos: Vec2) {
    let id = state.ids.next_pickup();
    trace!(pickup_id = id, ?kind, "power-up dropped");
    state.pickups.push(PowerUpPickup {
        id,
        kind,
        pos,
        spawned_at_ms: state.now_ms,
        lifetime_ms: POWERUP_PICKUP_LIFETIME_MS,
    });
}

/// Replaces whatever the player held. Unknown ids are ignored.
pub fn grant_power_up(state: &mut SimState, player_id: PlayerId, kind: PowerUpKind) -> bool {
    let now = state.now_ms;
    let Some(player) = state.player_mut(player_id) else {
        return false;
    };
    player.grant_power_up(kind, now);
    debug!(player_id, ?kind, "power-up granted");
    true
}

/// Round-start grant for every ship when the setting is on.
pub fn grant_starting_power_ups(state: &mut SimState) {
    if !state.settings.advanced.starting_powerups {
        return;
    }
    let now = state.now_ms;
    for player in state.players.iter_mut().filter(|p| p.ship.alive) {
        let kind = roll_power_up(&mut state.rng.power_up);
        player.grant_power_up(kind, now);
    }
}

fn expire_timed_effects(state: &mut SimState) {
    let now = state.now_ms;
    for player in &mut state.players {
        if player.power_up.as_ref().is_some_and(|p| p.is_expired(now)) {
            trace!(player_id = player.id, "power-up expired");
            player.power_up = None;
        }
    }
}

fn update_pickups(state: &mut SimState) {
    let now = state.now_ms;
    let reach = state.ship_tuning.radius + POWERUP_PICKUP_RADIUS;
    let pickups = std::mem::take(&mut state.pickups);
    let mut kept = Vec::with_capacity(pickups.len());

    for pickup in pickups {
        if now - pickup.spawned_at_ms >= pickup.lifetime_ms {
            continue;
        }
        let collector = state
            .players
            .iter()
            .find(|p| p.ship.alive && p.ship.pos.distance_squared(pickup.pos) <= reach * reach)
            .map(|p| p.id);
        match collector {
            Some(player_id) => {
                grant_power_up(state, player_id, pickup.kind);
                state.sound(SoundCue::PowerUpPickup);
            }
            None => kept.push(pickup),
        }
    }
    state.pickups = kept;
}

fn mine_triggered(state: &SimState, mine: &Mine) -> bool {
    let ship_reach = MINE_TRIGGER_RADIUS + state.ship_tuning.radius;
    let pilot_reach = MINE_TRIGGER_RADIUS + state.pilot_tuning.radius;
    state.players.iter().filter(|p| p.id != mine.owner_id).any(|p| {
        (p.ship.alive && p.ship.pos.distance_squared(mine.pos) <= ship_reach * ship_reach)
            || p.pilot.as_ref().is_some_and(|pl| {
                pl.alive && pl.pos.distance_squared(mine.pos) <= pilot_reach * pilot_reach
            })
    })
}

/// Damages everything inside the blast, measured before any of it is applied.
fn detonate(state: &mut SimState, mine: &Mine) {
    let ship_reach = MINE_BLAST_RADIUS + state.ship_tuning.radius;
    let pilot_reach = MINE_BLAST_RADIUS + state.pilot_tuning.radius;

    let ships: Vec<PlayerId> = state
        .players
        .iter()
        .filter(|p| p.ship.alive && p.ship.pos.distance(mine.pos) <= ship_reach)
        .map(|p| p.id)
        .collect();
    let pilots: Vec<PlayerId> = state
        .players
        .iter()
        .filter(|p| {
            p.pilot
                .as_ref()
                .is_some_and(|pl| pl.alive && pl.pos.distance(mine.pos) <= pilot_reach)
        })
        .map(|p| p.id)
        .collect();
    let rocks: Vec<usize> = state
        .asteroids
        .iter()
        .enumerate()
        .filter(|(_, a)| a.alive && asteroids::touches(a, mine.pos, MINE_BLAST_RADIUS))
        .map(|(i, _)| i)
        .collect();

    debug!(mine_id = mine.id, owner_id = mine.owner_id, ?ships, ?pilots, "mine detonated");
    for id in ships {
        damage_ship(state, id, Some(mine.owner_id), DamageSource::Mine);
    }
    for id in pilots {
        kill_pilot(state, id, Some(mine.owner_id));
    }
    for idx in rocks {
        hit_asteroid(state, idx, AsteroidDamage::Chip(1));
    }
    state.sound(SoundCue::MineExplode);
    state.shake(10.0, 300.0);
}

fn update_mines(state: &mut SimState) {
    let now = state.now_ms;
    let mines = std::mem::take(&mut state.mines);
    let mut kept = Vec::with_capacity(mines.len());
    for mine in mines {
        if now - mine.spawned_at_ms >= mine.lifetime_ms {
            continue;
        }
        if mine.is_armed(now) && mine_triggered(state, &mine) {
            detonate(state, &mine);
            continue;
        }
        kept.push(mine);
    }
    state.mines = kept;
}

/// Nearest living enemy ship, by squared distance.
pub fn nearest_enemy_ship(state: &SimState, owner_id: PlayerId, from: Vec2) -> Option<(PlayerId, Vec2)> {
    state
        .players
        .iter()
        .filter(|p| p.id != owner_id && p.ship.alive)
        .map(|p| (p.id, p.ship.pos))
        .min_by(|a, b| {
            a.1.distance_squared(from)
                .total_cmp(&b.1.distance_squared(from))
        })
}

/// Steers missiles toward the nearest enemy, re-acquired every tick.
fn update_missiles(state: &mut SimState, dt: f32) {
    let now = state.now_ms;
    let arena = state.arena;
    let mut missiles = std::mem::take(&mut state.missiles);
    for m in &mut missiles {
        let target = nearest_enemy_ship(state, m.owner_id, m.pos);
        m.target_id = target.map(|(id, _)| id);
        if let Some((_, target_pos)) = target {
            let desired = (target_pos - m.pos).to_angle();
            let max_turn = HOMING_TURN_RATE * dt;
            m.angle = wrap_angle(m.angle + wrap_angle(desired - m.angle).clamp(-max_turn, max_turn));
        }
        m.vel = Vec2::from_angle(m.angle) * HOMING_SPEED;
        m.pos += m.vel * dt;
    }
    missiles.retain(|m| {
        now - m.spawned_at_ms < m.lifetime_ms && arena.contains(m.pos, HOMING_RADIUS * 2.0)
    });
    state.missiles = missiles;
}

fn expire_lasers(state: &mut SimState) {
    let now = state.now_ms;
    state
        .lasers
        .retain(|l| now - l.spawned_at_ms < l.lifetime_ms);
}

/// Power-up upkeep for one tick: timed effects, pickups, mines, missiles, beam visuals.
pub fn update_power_ups(state: &mut SimState, dt: f32) {
    expire_timed_effects(state);
    update_pickups(state);
    update_mines(state);
    update_missiles(state, dt);
    expire_lasers(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{HomingMissile, Ship};
    use crate::domain::player::{PlayerKind, RuntimePlayer};
    use crate::domain::state::RoomSettings;

    fn state_with_players(positions: &[Vec2]) -> SimState {
        let mut state = SimState::new(RoomSettings::default(), 3);
        for (i, pos) in positions.iter().enumerate() {
            let id = i as u64 + 1;
            let mut p = RuntimePlayer::new(id, format!("p{id}"), i, PlayerKind::Human, id);
            p.ship = Ship::new(*pos, 0.0, 3);
            p.in_round = true;
            state.players.push(p);
        }
        state.now_ms = 1000.0;
        state
    }

    #[test]
    fn when_weights_are_rolled_many_times_then_every_kind_can_appear() {
        let mut rng = SimRng::from_seed(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..2000 {
            seen.insert(roll_power_up(&mut rng));
        }
        assert_eq!(seen.len(), PowerUpKind::ALL.len());
    }

    #[test]
    fn when_ship_touches_pickup_then_it_is_collected_and_replaces_held_power_up() {
        let mut state = state_with_players(&[Vec2::new(200.0, 200.0)]);
        state.players[0].grant_power_up(PowerUpKind::Laser, 0.0);
        spawn_pickup(&mut state, PowerUpKind::Mine, Vec2::new(205.0, 200.0));

        update_power_ups(&mut state, 1.0 / 60.0);

        assert!(state.pickups.is_empty());
        assert!(state.players[0].holds(PowerUpKind::Mine));
    }

    #[test]
    fn when_timed_effect_runs_out_then_it_is_removed() {
        let mut state = state_with_players(&[Vec2::new(200.0, 200.0)]);
        state.players[0].grant_power_up(PowerUpKind::Reverse, 0.0);
        state.now_ms = POWERUP_REVERSE_DURATION_MS + 1.0;

        update_power_ups(&mut state, 1.0 / 60.0);

        assert!(state.players[0].power_up.is_none());
    }

    #[test]
    fn when_enemy_enters_armed_mine_then_it_detonates_and_destroys_the_ship() {
        let mut state = state_with_players(&[Vec2::new(100.0, 100.0), Vec2::new(400.0, 400.0)]);
        let id = state.ids.next_mine();
        state.mines.push(Mine {
            id,
            owner_id: 1,
            pos: Vec2::new(410.0, 400.0),
            spawned_at_ms: 0.0,
            arms_at_ms: 0.0,
            lifetime_ms: MINE_LIFETIME_MS,
        });

        update_power_ups(&mut state, 1.0 / 60.0);

        assert!(state.mines.is_empty());
        assert!(!state.players[1].ship.alive);
        assert!(state.players[0].ship.alive);
    }

    #[test]
    fn when_mine_is_not_armed_then_owner_and_enemies_pass_safely() {
        let mut state = state_with_players(&[Vec2::new(100.0, 100.0), Vec2::new(400.0, 400.0)]);
        let id = state.ids.next_mine();
        state.mines.push(Mine {
            id,
            owner_id: 1,
            pos: Vec2::new(400.0, 400.0),
            spawned_at_ms: state.now_ms,
            arms_at_ms: state.now_ms + MINE_ARM_MS,
            lifetime_ms: MINE_LIFETIME_MS,
        });

        update_power_ups(&mut state, 1.0 / 60.0);

        assert_eq!(state.mines.len(), 1);
        assert!(state.players[1].ship.alive);
    }

    #[test]
    fn when_missile_has_a_target_then_it_turns_toward_it() {
        let mut state = state_with_players(&[Vec2::new(100.0, 360.0), Vec2::new(600.0, 100.0)]);
        let id = state.ids.next_missile();
        state.missiles.push(HomingMissile {
            id,
            owner_id: 1,
            pos: Vec2::new(300.0, 360.0),
            vel: Vec2::ZERO,
            angle: 0.0,
            target_id: None,
            spawned_at_ms: state.now_ms,
            lifetime_ms: HOMING_LIFETIME_MS,
        });

        update_power_ups(&mut state, 0.1);

        let m = &state.missiles[0];
        assert_eq!(m.target_id, Some(2));
        // target is up-right, so the heading swings toward negative y
        assert!(m.angle < 0.0);
    }
}
