// Ship-ship impulse resolution and the contact pass (rocks, rams, joust blades).

use super::asteroids::{self, AsteroidDamage, hit_asteroid};
use super::damage::{damage_ship, kill_pilot};
use crate::domain::entities::{PlayerId, PowerUpKind, Ship};
use crate::domain::events::DamageSource;
use crate::domain::state::SimState;
use crate::domain::tuning::weapons::JOUST_REACH;
use glam::Vec2;

/// Extra separation so resolved pairs do not touch again next tick.
pub const SEPARATION_EPSILON: f32 = 0.01;

#[derive(Debug, Clone, Copy)]
pub struct ContactParams {
    pub radius: f32,
    pub mass: f32,
    pub restitution: f32,
    pub friction: f32,
    pub spin_transfer: f32,
    pub max_spin: f32,
}

/// Resolves one overlapping ship pair in place. Returns false if they do not touch.
///
/// Positions are separated along the normal in proportion to inverse mass. A normal impulse
/// uses restitution; the tangential impulse is bounded by `|jn| * friction`. Tangential
/// relative speed becomes opposing spin on both ships.
pub fn resolve_ship_pair(a: &mut Ship, b: &mut Ship, p: &ContactParams) -> bool {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = p.radius * 2.0;
    if dist >= min_dist {
        return false;
    }
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };
    let inv_a = 1.0 / p.mass;
    let inv_b = 1.0 / p.mass;
    let inv_sum = inv_a + inv_b;

    // positional correction
    let correction = (min_dist - dist + SEPARATION_EPSILON) / inv_sum;
    a.pos -= normal * correction * inv_a;
    b.pos += normal * correction * inv_b;

    // normal impulse, only while approaching
    let vn = (b.vel - a.vel).dot(normal);
    let mut jn = 0.0;
    if vn < 0.0 {
        jn = -(1.0 + p.restitution) * vn / inv_sum;
        a.vel -= normal * jn * inv_a;
        b.vel += normal * jn * inv_b;
    }

    // friction
    let tangent = normal.perp();
    let vt = (b.vel - a.vel).dot(tangent);
    let jt_max = jn.abs() * p.friction;
    let jt = (-vt / inv_sum).clamp(-jt_max, jt_max);
    a.vel -= tangent * jt * inv_a;
    b.vel += tangent * jt * inv_b;

    // spin
    let spin = vt * p.spin_transfer / p.radius;
    a.angular_velocity = (a.angular_velocity + spin).clamp(-p.max_spin, p.max_spin);
    b.angular_velocity = (b.angular_velocity - spin).clamp(-p.max_spin, p.max_spin);
    true
}

/// Every pair once per tick, in player order.
pub fn resolve_ship_collisions(state: &mut SimState) {
    let params = ContactParams {
        radius: state.ship_tuning.radius,
        mass: state.ship_tuning.mass,
        restitution: state.physics.ship_restitution,
        friction: state.physics.ship_friction,
        spin_transfer: state.ship_tuning.spin_transfer,
        max_spin: state.ship_tuning.max_spin,
    };
    let n = state.players.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (left, right) = state.players.split_at_mut(j);
            let a = &mut left[i].ship;
            let b = &mut right[0].ship;
            if a.alive && b.alive {
                resolve_ship_pair(a, b, &params);
            }
        }
    }
}

fn ship_asteroid_contacts(state: &mut SimState) {
    let r = state.ship_tuning.radius;
    let restitution = state.physics.wall_restitution;
    for pi in 0..state.players.len() {
        let ship = &state.players[pi].ship;
        if !ship.alive {
            continue;
        }
        let pos = ship.pos;
        let Some(ai) = state
            .asteroids
            .iter()
            .position(|a| a.alive && asteroids::touches(a, pos, r))
        else {
            continue;
        };

        let player_id = state.players[pi].id;
        if damage_ship(state, player_id, None, DamageSource::Asteroid).landed() {
            hit_asteroid(state, ai, AsteroidDamage::Destroy);
            continue;
        }

        // Protected ships bounce off instead.
        let (rock_pos, rock_r) = (state.asteroids[ai].pos, state.asteroids[ai].radius);
        let normal = (pos - rock_pos).normalize_or(Vec2::X);
        let ship = &mut state.players[pi].ship;
        ship.pos = rock_pos + normal * (rock_r + r);
        let vn = ship.vel.dot(normal);
        if vn < 0.0 {
            ship.vel -= normal * vn * (1.0 + restitution);
        }
    }
}

fn pilot_contacts(state: &mut SimState) {
    let ship_r = state.ship_tuning.radius;
    let pilot_r = state.pilot_tuning.radius;

    let mut kills: Vec<(PlayerId, Option<PlayerId>)> = Vec::new();
    for p in &state.players {
        let Some(pilot) = p.pilot.as_ref().filter(|pl| pl.alive) else {
            continue;
        };
        let rammed_by = state
            .players
            .iter()
            .find(|o| {
                o.id != p.id
                    && o.ship.alive
                    && o.ship.pos.distance(pilot.pos) <= ship_r + pilot_r
            })
            .map(|o| o.id);
        if rammed_by.is_some() {
            kills.push((p.id, rammed_by));
        } else if state
            .asteroids
            .iter()
            .any(|a| a.alive && asteroids::touches(a, pilot.pos, pilot_r))
        {
            kills.push((p.id, None));
        }
    }
    for (pilot_owner, killer) in kills {
        kill_pilot(state, pilot_owner, killer);
    }
}

fn joust_contacts(state: &mut SimState) {
    let reach = state.ship_tuning.radius * 2.0 + JOUST_REACH;
    let mut hits: Vec<(PlayerId, PlayerId)> = Vec::new();
    for a in state
        .players
        .iter()
        .filter(|p| p.ship.alive && p.holds(PowerUpKind::Joust))
    {
        for b in state.players.iter().filter(|b| b.id != a.id && b.ship.alive) {
            if a.ship.pos.distance(b.ship.pos) <= reach {
                hits.push((a.id, b.id));
            }
        }
    }
    for (attacker, target) in hits {
        // A jouster destroyed earlier in this pass loses its blades.
        let still_armed = state
            .player(attacker)
            .is_some_and(|p| p.ship.alive && p.holds(PowerUpKind::Joust));
        if still_armed {
            damage_ship(state, target, Some(attacker), DamageSource::Joust);
        }
    }
}

/// Contacts that are not projectile hits.
pub fn detect_contacts(state: &mut SimState) {
    joust_contacts(state);
    ship_asteroid_contacts(state);
    pilot_contacts(state);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AsteroidTier, AsteroidVariant, Pilot};
    use crate::domain::player::{PlayerKind, RuntimePlayer};
    use crate::domain::state::RoomSettings;
    use crate::domain::systems::asteroids::create_asteroid;

    fn params() -> ContactParams {
        ContactParams {
            radius: 18.0,
            mass: 1.0,
            restitution: 0.6,
            friction: 0.2,
            spin_transfer: 0.35,
            max_spin: 9.0,
        }
    }

    #[test]
    fn when_ships_share_a_position_then_they_separate_symmetrically_by_the_overlap() {
        let start = Vec2::new(300.0, 300.0);
        let mut a = Ship::new(start, 0.0, 3);
        let mut b = Ship::new(start, 0.0, 3);
        a.vel = Vec2::new(0.0, 40.0);
        b.vel = Vec2::new(0.0, -40.0);

        assert!(resolve_ship_pair(&mut a, &mut b, &params()));

        let overlap = params().radius * 2.0;
        let moved_a = (a.pos - start).length();
        let moved_b = (b.pos - start).length();
        assert!((moved_a - moved_b).abs() < 1e-4);
        assert!((moved_a + moved_b - (overlap + SEPARATION_EPSILON)).abs() < 1e-3);
        // fallback normal is +x
        assert!(a.pos.x < start.x && b.pos.x > start.x);
        assert!((a.pos.y - start.y).abs() < 1e-6);

        assert!(a.angular_velocity != 0.0);
        assert_eq!(a.angular_velocity, -b.angular_velocity);
    }

    #[test]
    fn when_ships_approach_head_on_then_normal_velocities_reverse_scaled_by_restitution() {
        let mut a = Ship::new(Vec2::new(100.0, 100.0), 0.0, 3);
        let mut b = Ship::new(Vec2::new(130.0, 100.0), 0.0, 3);
        a.vel = Vec2::new(50.0, 0.0);
        b.vel = Vec2::new(-50.0, 0.0);

        resolve_ship_pair(&mut a, &mut b, &params());

        assert!((a.vel.x + 30.0).abs() < 1e-3);
        assert!((b.vel.x - 30.0).abs() < 1e-3);
        assert_eq!(a.angular_velocity, 0.0);
    }

    #[test]
    fn when_ships_do_not_touch_then_nothing_changes() {
        let mut a = Ship::new(Vec2::new(100.0, 100.0), 0.0, 3);
        let mut b = Ship::new(Vec2::new(200.0, 100.0), 0.0, 3);
        assert!(!resolve_ship_pair(&mut a, &mut b, &params()));
        assert_eq!(a.pos, Vec2::new(100.0, 100.0));
    }

    #[test]
    fn when_spin_would_exceed_the_cap_then_it_is_clamped() {
        let mut a = Ship::new(Vec2::new(100.0, 100.0), 0.0, 3);
        let mut b = Ship::new(Vec2::new(110.0, 100.0), 0.0, 3);
        a.vel = Vec2::new(0.0, 2000.0);
        b.vel = Vec2::new(0.0, -2000.0);

        resolve_ship_pair(&mut a, &mut b, &params());

        assert_eq!(a.angular_velocity.abs(), params().max_spin);
        assert_eq!(b.angular_velocity.abs(), params().max_spin);
    }

    fn arena_state() -> SimState {
        let mut state = SimState::new(RoomSettings::default(), 4);
        state.now_ms = 3_000.0;
        for id in [1u64, 2] {
            let mut p = RuntimePlayer::new(id, format!("p{id}"), id as usize, PlayerKind::Human, id);
            p.in_round = true;
            state.players.push(p);
        }
        state
    }

    #[test]
    fn when_enemy_ship_runs_over_pilot_then_pilot_dies_and_ship_owner_scores() {
        let mut state = arena_state();
        state.players[0].ship = Ship::new(Vec2::new(400.0, 400.0), 0.0, 3);
        state.players[1].pilot = Some(Pilot {
            pos: Vec2::new(410.0, 400.0),
            vel: Vec2::ZERO,
            angle: 0.0,
            alive: true,
            spawned_at_ms: 0.0,
        });

        detect_contacts(&mut state);

        assert!(state.players[1].pilot.is_none());
        assert_eq!(state.players[0].kills, 1);
    }

    #[test]
    fn when_jouster_touches_enemy_then_enemy_ship_is_destroyed() {
        let mut state = arena_state();
        state.players[0].ship = Ship::new(Vec2::new(400.0, 400.0), 0.0, 3);
        state.players[1].ship = Ship::new(Vec2::new(440.0, 400.0), 0.0, 3);
        state.players[0].grant_power_up(PowerUpKind::Joust, state.now_ms);

        detect_contacts(&mut state);

        assert!(state.players[0].ship.alive);
        assert!(!state.players[1].ship.alive);
    }

    #[test]
    fn when_ship_flies_into_asteroid_then_both_break() {
        let mut state = arena_state();
        state.players[0].ship = Ship::new(Vec2::new(600.0, 300.0), 0.0, 3);
        let rock = create_asteroid(
            &mut state.rng.asteroid,
            &mut state.ids,
            Vec2::new(600.0, 300.0),
            Vec2::ZERO,
            AsteroidTier::Small,
            AsteroidVariant::Grey,
        );
        state.asteroids.push(rock);

        detect_contacts(&mut state);

        assert!(!state.players[0].ship.alive);
        assert!(!state.asteroids[0].alive);
    }
}
