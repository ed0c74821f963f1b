use super::powerups::{roll_power_up, spawn_pickup};
use crate::domain::entities::{Asteroid, AsteroidTier, AsteroidVariant, EntityId, EntityIds};
use crate::domain::events::SoundCue;
use crate::domain::geometry::{circle_overlaps_convex, convex_hull};
use crate::domain::rng::SimRng;
use crate::domain::state::SimState;
use crate::domain::tuning::asteroid::*;
use crate::domain::tuning::modes::AsteroidDensity;
use glam::Vec2;
use std::f32::consts::TAU;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsteroidDamage {
    Chip(u32),
    /// Lasers and contacts with ships ignore remaining hp.
    Destroy,
}

fn tier_radius(rng: &mut SimRng, tier: AsteroidTier) -> f32 {
    match tier {
        AsteroidTier::Large => rng.range(LARGE_RADIUS_MIN, LARGE_RADIUS_MAX),
        AsteroidTier::Small => rng.range(SMALL_RADIUS_MIN, SMALL_RADIUS_MAX),
    }
}

fn tier_hp(tier: AsteroidTier, variant: AsteroidVariant) -> u32 {
    match (variant, tier) {
        (AsteroidVariant::Orange, AsteroidTier::Large) => ORANGE_LARGE_HP,
        (AsteroidVariant::Orange, AsteroidTier::Small) => ORANGE_SMALL_HP,
        (AsteroidVariant::Grey, AsteroidTier::Large) => GREY_LARGE_HP,
        (AsteroidVariant::Grey, AsteroidTier::Small) => GREY_SMALL_HP,
    }
}

/// Irregular outline: random-radius points around a circle, reduced to their convex hull.
/// Degenerate hulls fall back to the raw points.
pub fn generate_vertices(rng: &mut SimRng, radius: f32) -> Vec<Vec2> {
    let count = rng.int_inclusive(VERTEX_COUNT_MIN, VERTEX_COUNT_MAX);
    let step = TAU / count as f32;
    let points: Vec<Vec2> = (0..count)
        .map(|i| {
            let theta = step * i as f32 + rng.signed(step * 0.3);
            Vec2::from_angle(theta) * radius * rng.range(VERTEX_RADIUS_MIN, VERTEX_RADIUS_MAX)
        })
        .collect();

    let hull = convex_hull(&points);
    if hull.len() >= 3 { hull } else { points }
}

pub fn create_asteroid(
    rng: &mut SimRng,
    ids: &mut EntityIds,
    pos: Vec2,
    vel: Vec2,
    tier: AsteroidTier,
    variant: AsteroidVariant,
) -> Asteroid {
    let radius = tier_radius(rng, tier);
    let hp = tier_hp(tier, variant);
    Asteroid {
        id: ids.next_asteroid(),
        pos,
        vel,
        angle: rng.angle(),
        angular_velocity: rng.signed(MAX_ANGULAR_SPEED),
        radius,
        vertices: generate_vertices(rng, radius),
        hp,
        max_hp: hp,
        tier,
        variant,
        alive: true,
    }
}

/// World-space outline of an asteroid.
pub fn outline(asteroid: &Asteroid) -> Vec<Vec2> {
    let rot = Vec2::from_angle(asteroid.angle);
    asteroid
        .vertices
        .iter()
        .map(|v| asteroid.pos + rot.rotate(*v))
        .collect()
}

/// Circle-vs-outline contact with a bounding-circle early out.
pub fn touches(asteroid: &Asteroid, center: Vec2, radius: f32) -> bool {
    let reach = asteroid.radius * VERTEX_RADIUS_MAX + radius;
    if asteroid.pos.distance_squared(center) > reach * reach {
        return false;
    }
    if asteroid.vertices.len() < 3 {
        return asteroid.pos.distance(center) <= asteroid.radius + radius;
    }
    circle_overlaps_convex(&outline(asteroid), center, radius)
}

fn spot_is_clear(state: &SimState, pos: Vec2, radius: f32) -> bool {
    let ship_clearance = state.ship_tuning.radius * 3.0;
    let clear_of_rocks = state.asteroids.iter().filter(|a| a.alive).all(|a| {
        let min = a.radius + radius + SPAWN_PADDING;
        a.pos.distance_squared(pos) >= min * min
    });
    let clear_of_ships = state.players.iter().filter(|p| p.ship.alive).all(|p| {
        let min = ship_clearance + radius;
        p.ship.pos.distance_squared(pos) >= min * min
    });
    clear_of_rocks && clear_of_ships
}

/// Rejection-samples a clear spot near the centre. When every attempt fails the centre is
/// used only if it is clear itself; otherwise the asteroid is skipped.
fn find_spawn_spot(state: &mut SimState, radius: f32) -> Option<Vec2> {
    let center = state.arena.center();
    let half = Vec2::new(state.arena.width, state.arena.height) * SPAWN_CENTER_FRACTION;
    for _ in 0..SPAWN_MAX_ATTEMPTS {
        let offset = Vec2::new(
            state.rng.asteroid.signed(half.x),
            state.rng.asteroid.signed(half.y),
        );
        let pos = center + offset;
        if spot_is_clear(state, pos, radius) {
            return Some(pos);
        }
    }
    spot_is_clear(state, center, radius).then_some(center)
}

/// Fills the arena for a new round according to the map and density setting.
pub fn spawn_initial_asteroids(state: &mut SimState) {
    let map = state.map();
    let multiplier = state.settings.advanced.asteroid_density.initial_multiplier();
    let count = state
        .rng
        .asteroid
        .int_inclusive(map.asteroid_count.0, map.asteroid_count.1)
        * multiplier;

    let mut skipped = 0;
    for _ in 0..count {
        let rng = &mut state.rng.asteroid;
        let tier = if rng.chance(LARGE_CHANCE) {
            AsteroidTier::Large
        } else {
            AsteroidTier::Small
        };
        let variant = if rng.chance(map.grey_chance) {
            AsteroidVariant::Grey
        } else {
            AsteroidVariant::Orange
        };
        let vel = Vec2::from_angle(rng.angle()) * rng.range(DRIFT_SPEED_MIN, DRIFT_SPEED_MAX);

        let mut asteroid = create_asteroid(
            &mut state.rng.asteroid,
            &mut state.ids,
            Vec2::ZERO,
            vel,
            tier,
            variant,
        );
        match find_spawn_spot(state, asteroid.radius) {
            Some(pos) => {
                asteroid.pos = pos;
                state.asteroids.push(asteroid);
            }
            None => skipped += 1,
        }
    }
    debug!(count, skipped, map = map.name, "initial asteroids spawned");
}

/// Spawn interval multiplier: 3.0 in round 1 easing to 1/1.5 by round 4.
pub fn spawn_interval_scale(round: u32) -> f32 {
    let span = (SPAWN_SCALE_RAMP_ROUNDS - 1) as f32;
    let t = (round.saturating_sub(1) as f32 / span).clamp(0.0, 1.0);
    SPAWN_SCALE_FIRST_ROUND + (SPAWN_SCALE_LATE_ROUNDS - SPAWN_SCALE_FIRST_ROUND) * t
}

/// Arms the border spawner. Only the SPAWN density keeps spawning during a round.
pub fn schedule_next_spawn(state: &mut SimState) {
    if state.settings.advanced.asteroid_density != AsteroidDensity::Spawn {
        state.next_asteroid_spawn_ms = None;
        return;
    }
    let base = state
        .rng
        .asteroid
        .range_f64(SPAWN_INTERVAL_MIN_MS, SPAWN_INTERVAL_MAX_MS);
    let scale = spawn_interval_scale(state.round) as f64;
    state.next_asteroid_spawn_ms = Some(state.now_ms + base * scale);
}

/// Spawns one asteroid just outside a random edge, heading for the central region.
fn spawn_from_border(state: &mut SimState) {
    let arena = state.arena;
    let center = arena.center();
    let grey_chance = state.map().grey_chance;
    let rng = &mut state.rng.asteroid;
    let tier = if rng.chance(LARGE_CHANCE) {
        AsteroidTier::Large
    } else {
        AsteroidTier::Small
    };
    let variant = if rng.chance(grey_chance) {
        AsteroidVariant::Grey
    } else {
        AsteroidVariant::Orange
    };

    let mut asteroid = create_asteroid(rng, &mut state.ids, Vec2::ZERO, Vec2::ZERO, tier, variant);
    let rng = &mut state.rng.asteroid;
    let r = asteroid.radius;
    let pos = match rng.index(4) {
        0 => Vec2::new(rng.range(0.0, arena.width), -r),
        1 => Vec2::new(arena.width + r, rng.range(0.0, arena.height)),
        2 => Vec2::new(rng.range(0.0, arena.width), arena.height + r),
        _ => Vec2::new(-r, rng.range(0.0, arena.height)),
    };
    let aim = center
        + Vec2::new(
            rng.signed(arena.width * EDGE_AIM_REGION),
            rng.signed(arena.height * EDGE_AIM_REGION),
        );
    let heading = (aim - pos).to_angle() + rng.signed(EDGE_AIM_JITTER);
    asteroid.pos = pos;
    asteroid.vel = Vec2::from_angle(heading) * rng.range(EDGE_SPEED_MIN, EDGE_SPEED_MAX);
    trace!(asteroid_id = asteroid.id, ?pos, "border asteroid");
    state.asteroids.push(asteroid);
}

fn update_spawner(state: &mut SimState) {
    let Some(due) = state.next_asteroid_spawn_ms else {
        return;
    };
    if state.now_ms < due {
        return;
    }
    let batch = state
        .rng
        .asteroid
        .int_inclusive(SPAWN_BATCH_MIN, SPAWN_BATCH_MAX);
    for _ in 0..batch {
        let alive = state.asteroids.iter().filter(|a| a.alive).count();
        if alive >= MAX_ASTEROIDS {
            break;
        }
        spawn_from_border(state);
    }
    schedule_next_spawn(state);
}

/// Leaving by more than the radius reappears on the opposite side.
pub fn wrap_position(pos: &mut Vec2, radius: f32, width: f32, height: f32) {
    if pos.x < -radius {
        pos.x = width + radius;
    } else if pos.x > width + radius {
        pos.x = -radius;
    }
    if pos.y < -radius {
        pos.y = height + radius;
    } else if pos.y > height + radius {
        pos.y = -radius;
    }
}

pub fn update_asteroids(state: &mut SimState, dt: f32) {
    let (w, h) = (state.arena.width, state.arena.height);
    for a in state.asteroids.iter_mut().filter(|a| a.alive) {
        a.pos += a.vel * dt;
        a.angle += a.angular_velocity * dt;
        wrap_position(&mut a.pos, a.radius, w, h);
    }
    update_spawner(state);
}

/// Damages the asteroid at `index`. Returns true if it was destroyed by this hit.
///
/// Destroyed LARGE ORANGE asteroids split; smaller ORANGE ones may drop a power-up.
/// GREY asteroids just break.
pub fn hit_asteroid(state: &mut SimState, index: usize, damage: AsteroidDamage) -> bool {
    let Some(asteroid) = state.asteroids.get_mut(index).filter(|a| a.alive) else {
        return false;
    };
    match damage {
        AsteroidDamage::Chip(n) => asteroid.hp = asteroid.hp.saturating_sub(n),
        AsteroidDamage::Destroy => asteroid.hp = 0,
    }
    if asteroid.hp > 0 {
        state.sound(SoundCue::AsteroidHit);
        return false;
    }

    asteroid.alive = false;
    let parent = asteroid.clone();
    state.sound(SoundCue::AsteroidBreak);

    match (parent.variant, parent.tier) {
        (AsteroidVariant::Orange, AsteroidTier::Large) => {
            split_asteroid(state, &parent);
        }
        (AsteroidVariant::Orange, AsteroidTier::Small) => {
            if state.rng.power_up.chance(DROP_CHANCE) {
                let kind = roll_power_up(&mut state.rng.power_up);
                spawn_pickup(state, kind, parent.pos);
            }
        }
        (AsteroidVariant::Grey, _) => {}
    }
    true
}

/// Children are always SMALL ORANGE and move with the parent's damped velocity plus an
/// evenly spread radial kick.
fn split_asteroid(state: &mut SimState, parent: &Asteroid) -> Vec<EntityId> {
    let rng = &mut state.rng.asteroid;
    let base = rng.angle();
    let mut children = Vec::with_capacity(SPLIT_COUNT);
    for k in 0..SPLIT_COUNT {
        let dir = Vec2::from_angle(base + TAU * k as f32 / SPLIT_COUNT as f32);
        let vel = parent.vel * SPLIT_VELOCITY_DAMPING
            + dir * rng.range(SPLIT_SPEED_MIN, SPLIT_SPEED_MAX);
        let pos = parent.pos + dir * parent.radius * 0.4;
        let child = create_asteroid(
            rng,
            &mut state.ids,
            pos,
            vel,
            AsteroidTier::Small,
            AsteroidVariant::Orange,
        );
        children.push(child);
    }
    let ids: Vec<EntityId> = children.iter().map(|c| c.id).collect();
    debug!(parent_id = parent.id, ?ids, "asteroid split");
    state.asteroids.extend(children);
    ids
}
