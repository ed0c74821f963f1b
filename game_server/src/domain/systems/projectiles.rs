use super::asteroids::{self, AsteroidDamage, hit_asteroid};
use super::damage::{damage_ship, kill_pilot};
use crate::domain::entities::{PlayerId, Projectile};
use crate::domain::events::DamageSource;
use crate::domain::state::SimState;
use crate::domain::tuning::weapons::HOMING_RADIUS;
use glam::Vec2;
use tracing::trace;

enum Struck {
    Ship(PlayerId),
    Pilot(PlayerId),
    Asteroid(usize),
}

fn find_struck(state: &SimState, owner_id: PlayerId, pos: Vec2, radius: f32) -> Option<Struck> {
    let ship_reach = state.ship_tuning.radius + radius;
    let pilot_reach = state.pilot_tuning.radius + radius;

    for p in state.players.iter().filter(|p| p.id != owner_id) {
        if p.ship.alive && p.ship.pos.distance_squared(pos) <= ship_reach * ship_reach {
            return Some(Struck::Ship(p.id));
        }
        if p.pilot
            .as_ref()
            .is_some_and(|pl| pl.alive && pl.pos.distance_squared(pos) <= pilot_reach * pilot_reach)
        {
            return Some(Struck::Pilot(p.id));
        }
    }
    state
        .asteroids
        .iter()
        .position(|a| a.alive && asteroids::touches(a, pos, radius))
        .map(Struck::Asteroid)
}

/// Resolves a round body against ships, pilots and asteroids. The owner is never struck.
/// Returns true when the body hit something and should be removed.
fn strike(
    state: &mut SimState,
    owner_id: PlayerId,
    pos: Vec2,
    radius: f32,
    source: DamageSource,
) -> bool {
    match find_struck(state, owner_id, pos, radius) {
        Some(Struck::Ship(id)) => {
            damage_ship(state, id, Some(owner_id), source);
            true
        }
        Some(Struck::Pilot(id)) => {
            kill_pilot(state, id, Some(owner_id));
            true
        }
        Some(Struck::Asteroid(index)) => {
            hit_asteroid(state, index, AsteroidDamage::Chip(1));
            true
        }
        None => false,
    }
}

fn advance(list: &mut [Projectile], dt: f32) {
    for p in list.iter_mut() {
        p.pos += p.vel * dt;
    }
}

fn resolve(state: &mut SimState, list: Vec<Projectile>, source: DamageSource) -> Vec<Projectile> {
    let now = state.now_ms;
    let arena = state.arena;
    let mut kept = Vec::with_capacity(list.len());
    for p in list {
        if now - p.spawned_at_ms >= p.lifetime_ms || !arena.contains(p.pos, p.radius) {
            continue;
        }
        if strike(state, p.owner_id, p.pos, p.radius, source) {
            trace!(projectile_id = p.id, owner_id = p.owner_id, ?source, "projectile hit");
            continue;
        }
        kept.push(p);
    }
    kept
}

/// Moves bullets and scatter shots, then despawns anything expired, off-arena, or on first hit.
/// Missiles are steered in `powerups`; their contacts are resolved here too.
pub fn tick_projectiles(state: &mut SimState, dt: f32) {
    let mut projectiles = std::mem::take(&mut state.projectiles);
    let mut scatter = std::mem::take(&mut state.scatter_shots);
    advance(&mut projectiles, dt);
    advance(&mut scatter, dt);

    let projectiles = resolve(state, projectiles, DamageSource::Projectile);
    let scatter = resolve(state, scatter, DamageSource::Scatter);
    state.projectiles = projectiles;
    state.scatter_shots = scatter;

    let missiles = std::mem::take(&mut state.missiles);
    let mut kept = Vec::with_capacity(missiles.len());
    for m in missiles {
        if strike(state, m.owner_id, m.pos, HOMING_RADIUS, DamageSource::Missile) {
            trace!(missile_id = m.id, owner_id = m.owner_id, "missile hit");
            continue;
        }
        kept.push(m);
    }
    state.missiles = kept;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Ship;
    use crate::domain::player::{PlayerKind, RuntimePlayer};
    use crate::domain::state::RoomSettings;
    use crate::domain::tuning::weapons::{PROJECTILE_LIFETIME_MS, PROJECTILE_RADIUS};

    fn bullet(state: &mut SimState, owner_id: PlayerId, pos: Vec2, vel: Vec2) {
        let id = state.ids.next_projectile();
        state.projectiles.push(Projectile {
            id,
            owner_id,
            pos,
            vel,
            radius: PROJECTILE_RADIUS,
            spawned_at_ms: state.now_ms,
            lifetime_ms: PROJECTILE_LIFETIME_MS,
        });
    }

    fn state_with_ships(positions: &[Vec2]) -> SimState {
        let mut state = SimState::new(RoomSettings::default(), 8);
        for (i, pos) in positions.iter().enumerate() {
            let id = i as u64 + 1;
            let mut p = RuntimePlayer::new(id, format!("p{id}"), i, PlayerKind::Human, id);
            p.ship = Ship::new(*pos, 0.0, 3);
            p.in_round = true;
            state.players.push(p);
        }
        state.now_ms = 2_000.0;
        state
    }

    #[test]
    fn when_bullet_reaches_enemy_then_ship_is_destroyed_and_bullet_despawns() {
        let mut state = state_with_ships(&[Vec2::new(100.0, 300.0), Vec2::new(200.0, 300.0)]);
        bullet(&mut state, 1, Vec2::new(175.0, 300.0), Vec2::new(600.0, 0.0));

        tick_projectiles(&mut state, 1.0 / 60.0);

        assert!(state.projectiles.is_empty());
        assert!(!state.players[1].ship.alive);
    }

    #[test]
    fn when_bullet_overlaps_its_owner_then_it_flies_on() {
        let mut state = state_with_ships(&[Vec2::new(100.0, 300.0)]);
        bullet(&mut state, 1, Vec2::new(100.0, 300.0), Vec2::new(60.0, 0.0));

        tick_projectiles(&mut state, 1.0 / 60.0);

        assert_eq!(state.projectiles.len(), 1);
        assert!(state.players[0].ship.alive);
    }

    #[test]
    fn when_bullet_expires_or_leaves_arena_then_it_is_removed() {
        let mut state = state_with_ships(&[]);
        bullet(&mut state, 1, Vec2::new(5.0, 300.0), Vec2::new(-6000.0, 0.0));
        bullet(&mut state, 1, Vec2::new(600.0, 300.0), Vec2::ZERO);
        state.projectiles[1].spawned_at_ms = state.now_ms - PROJECTILE_LIFETIME_MS;

        tick_projectiles(&mut state, 1.0 / 60.0);

        assert!(state.projectiles.is_empty());
    }
}
