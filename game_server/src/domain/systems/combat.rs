// Firing: power-up dispatch, the base weapon, reload and recoil.

use super::asteroids::{AsteroidDamage, hit_asteroid};
use super::damage::{damage_ship, kill_pilot};
use super::powerups::nearest_enemy_ship;
use crate::domain::entities::{
    EntityId, HomingMissile, LaserBeam, Mine, PlayerId, PowerUpKind, Projectile,
};
use crate::domain::events::{DamageSource, ShipDamage, SoundCue};
use crate::domain::geometry::ray_circle_hit;
use crate::domain::state::SimState;
use crate::domain::tuning::modes::RecoilStyle;
use crate::domain::tuning::weapons::*;
use glam::Vec2;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    Fired(Option<PowerUpKind>),
    /// Cooldown, no ammo, or a passive power-up.
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaserHit {
    Ship {
        player_id: PlayerId,
        outcome: ShipDamage,
        distance: f32,
    },
    Pilot {
        player_id: PlayerId,
        distance: f32,
    },
    Asteroid {
        asteroid_id: EntityId,
        distance: f32,
    },
}

impl LaserHit {
    pub fn distance(&self) -> f32 {
        match *self {
            LaserHit::Ship { distance, .. }
            | LaserHit::Pilot { distance, .. }
            | LaserHit::Asteroid { distance, .. } => distance,
        }
    }
}

enum LaserTarget {
    Ship(PlayerId),
    Pilot(PlayerId),
    Asteroid(usize),
}

/// Casts a beam and damages the first valid target along it.
///
/// The owner and invulnerable ships are passed through. Pilots and asteroids are destroyed
/// outright; ships go through the shared damage path.
pub fn apply_laser_damage(
    state: &mut SimState,
    owner_id: PlayerId,
    origin: Vec2,
    angle: f32,
    length: f32,
) -> Option<LaserHit> {
    let now = state.now_ms;
    let dir = Vec2::from_angle(angle);
    let ship_r = state.ship_tuning.radius;
    let pilot_r = state.pilot_tuning.radius;

    let mut best: Option<(f32, LaserTarget)> = None;
    let mut consider = |t: Option<f32>, target: LaserTarget| {
        if let Some(t) = t
            && best.as_ref().is_none_or(|(d, _)| t < *d)
        {
            best = Some((t, target));
        }
    };

    for p in state.players.iter().filter(|p| p.id != owner_id) {
        if p.ship.alive && !p.ship.is_invulnerable(now) {
            consider(
                ray_circle_hit(origin, dir, length, p.ship.pos, ship_r),
                LaserTarget::Ship(p.id),
            );
        }
        if let Some(pilot) = p.pilot.as_ref().filter(|pl| pl.alive) {
            consider(
                ray_circle_hit(origin, dir, length, pilot.pos, pilot_r),
                LaserTarget::Pilot(p.id),
            );
        }
    }
    for (i, a) in state.asteroids.iter().enumerate().filter(|(_, a)| a.alive) {
        consider(
            ray_circle_hit(origin, dir, length, a.pos, a.radius),
            LaserTarget::Asteroid(i),
        );
    }

    let (distance, target) = best?;
    let hit = match target {
        LaserTarget::Ship(player_id) => LaserHit::Ship {
            player_id,
            outcome: damage_ship(state, player_id, Some(owner_id), DamageSource::Laser),
            distance,
        },
        LaserTarget::Pilot(player_id) => {
            kill_pilot(state, player_id, Some(owner_id));
            LaserHit::Pilot {
                player_id,
                distance,
            }
        }
        LaserTarget::Asteroid(index) => {
            let asteroid_id = state.asteroids[index].id;
            hit_asteroid(state, index, AsteroidDamage::Destroy);
            LaserHit::Asteroid {
                asteroid_id,
                distance,
            }
        }
    };
    Some(hit)
}

fn apply_recoil(state: &mut SimState, index: usize) {
    let now = state.now_ms;
    let recoil = state.physics.recoil;
    let player = &mut state.players[index];
    match recoil {
        RecoilStyle::SpeedPenalty { duration_ms, .. } => {
            player.recoil_until_ms = now + duration_ms;
        }
        RecoilStyle::Impulse { speed } => {
            player.ship.vel -= player.ship.heading() * speed;
        }
    }
}

/// Spends one charge and starts the power-up's cooldown. The power-up is dropped at zero.
fn consume_charge(state: &mut SimState, index: usize, cooldown_ms: f64) {
    let now = state.now_ms;
    let player = &mut state.players[index];
    let Some(pu) = player.power_up.as_mut() else {
        return;
    };
    pu.charges = pu.charges.saturating_sub(1);
    pu.cooldown_until_ms = now + cooldown_ms;
    if pu.charges == 0 {
        player.power_up = None;
    }
}

fn spawn_bullet(
    state: &mut SimState,
    owner_id: PlayerId,
    pos: Vec2,
    angle: f32,
    scatter: bool,
) {
    let (speed, radius, lifetime_ms) = if scatter {
        (SCATTER_SPEED, SCATTER_RADIUS, SCATTER_LIFETIME_MS)
    } else {
        (PROJECTILE_SPEED, PROJECTILE_RADIUS, PROJECTILE_LIFETIME_MS)
    };
    let id = if scatter {
        state.ids.next_scatter()
    } else {
        state.ids.next_projectile()
    };
    let projectile = Projectile {
        id,
        owner_id,
        pos,
        vel: Vec2::from_angle(angle) * speed,
        radius,
        spawned_at_ms: state.now_ms,
        lifetime_ms,
    };
    if scatter {
        state.scatter_shots.push(projectile);
    } else {
        state.projectiles.push(projectile);
    }
}

/// Base weapon: cooldown first, then ammo. An empty magazine touches nothing.
fn fire_base(state: &mut SimState, index: usize) -> FireOutcome {
    let now = state.now_ms;
    let tuning = state.ship_tuning;
    let player = &mut state.players[index];
    let ship = &mut player.ship;

    if ship
        .last_shot_ms
        .is_some_and(|last| now - last < tuning.fire_cooldown_ms)
    {
        return FireOutcome::Blocked;
    }
    if ship.ammo == 0 {
        return FireOutcome::Blocked;
    }

    if ship.ammo == ship.max_ammo {
        ship.reload_timer_ms = tuning.reload_ms;
    }
    ship.ammo -= 1;
    ship.last_shot_ms = Some(now);
    player.fired_this_tick = true;

    let owner_id = player.id;
    let angle = ship.angle;
    let muzzle = ship.pos + ship.heading() * (tuning.radius + PROJECTILE_RADIUS);
    spawn_bullet(state, owner_id, muzzle, angle, false);
    apply_recoil(state, index);
    state.sound(SoundCue::Fire);
    FireOutcome::Fired(None)
}

fn fire_laser(state: &mut SimState, index: usize) -> FireOutcome {
    let player = &state.players[index];
    let owner_id = player.id;
    let angle = player.ship.angle;
    let origin = player.ship.pos + player.ship.heading() * state.ship_tuning.radius;

    let hit = apply_laser_damage(state, owner_id, origin, angle, LASER_LENGTH);
    let length = hit.map_or(LASER_LENGTH, |h| h.distance());
    let id = state.ids.next_laser();
    state.lasers.push(LaserBeam {
        id,
        owner_id,
        origin,
        angle,
        length,
        spawned_at_ms: state.now_ms,
        lifetime_ms: LASER_BEAM_LIFETIME_MS,
    });
    trace!(owner_id, ?hit, "laser fired");
    state.players[index].fired_this_tick = true;
    consume_charge(state, index, LASER_COOLDOWN_MS);
    state.sound(SoundCue::Laser);
    FireOutcome::Fired(Some(PowerUpKind::Laser))
}

fn fire_scatter(state: &mut SimState, index: usize) -> FireOutcome {
    let player = &state.players[index];
    let owner_id = player.id;
    let angle = player.ship.angle;
    let muzzle = player.ship.pos + player.ship.heading() * (state.ship_tuning.radius + SCATTER_RADIUS);
    for offset in [-SCATTER_SPREAD, 0.0, SCATTER_SPREAD] {
        spawn_bullet(state, owner_id, muzzle, angle + offset, true);
    }
    state.players[index].fired_this_tick = true;
    apply_recoil(state, index);
    consume_charge(state, index, SCATTER_COOLDOWN_MS);
    state.sound(SoundCue::Scatter);
    FireOutcome::Fired(Some(PowerUpKind::Scatter))
}

fn drop_mine(state: &mut SimState, index: usize) -> FireOutcome {
    let now = state.now_ms;
    let player = &state.players[index];
    let owner_id = player.id;
    let pos = player.ship.pos - player.ship.heading() * MINE_DROP_OFFSET;
    let id = state.ids.next_mine();
    state.mines.push(Mine {
        id,
        owner_id,
        pos,
        spawned_at_ms: now,
        arms_at_ms: now + MINE_ARM_MS,
        lifetime_ms: MINE_LIFETIME_MS,
    });
    consume_charge(state, index, MINE_COOLDOWN_MS);
    state.sound(SoundCue::MineDrop);
    FireOutcome::Fired(Some(PowerUpKind::Mine))
}

fn fire_missile(state: &mut SimState, index: usize) -> FireOutcome {
    let now = state.now_ms;
    let player = &state.players[index];
    let owner_id = player.id;
    let angle = player.ship.angle;
    let pos = player.ship.pos + player.ship.heading() * (state.ship_tuning.radius + HOMING_RADIUS);
    let target_id = nearest_enemy_ship(state, owner_id, pos).map(|(id, _)| id);
    let id = state.ids.next_missile();
    state.missiles.push(HomingMissile {
        id,
        owner_id,
        pos,
        vel: Vec2::from_angle(angle) * HOMING_SPEED,
        angle,
        target_id,
        spawned_at_ms: now,
        lifetime_ms: HOMING_LIFETIME_MS,
    });
    state.players[index].fired_this_tick = true;
    consume_charge(state, index, HOMING_COOLDOWN_MS);
    state.sound(SoundCue::MissileLaunch);
    FireOutcome::Fired(Some(PowerUpKind::HomingMissile))
}

/// Fires whatever the player at `index` holds, falling back to the base weapon.
pub fn try_fire(state: &mut SimState, index: usize) -> FireOutcome {
    let now = state.now_ms;
    let Some(player) = state.players.get(index) else {
        return FireOutcome::Blocked;
    };
    if !player.ship.alive {
        return FireOutcome::Blocked;
    }
    let held = player
        .power_up
        .as_ref()
        .map(|pu| (pu.kind, now < pu.cooldown_until_ms));

    match held {
        Some((PowerUpKind::Joust, _)) => FireOutcome::Blocked,
        Some((
            PowerUpKind::Laser | PowerUpKind::Scatter | PowerUpKind::Mine | PowerUpKind::HomingMissile,
            true,
        )) => FireOutcome::Blocked,
        Some((PowerUpKind::Laser, false)) => fire_laser(state, index),
        Some((PowerUpKind::Scatter, false)) => fire_scatter(state, index),
        Some((PowerUpKind::Mine, false)) => drop_mine(state, index),
        Some((PowerUpKind::HomingMissile, false)) => fire_missile(state, index),
        Some((PowerUpKind::Shield | PowerUpKind::Reverse, _)) | None => fire_base(state, index),
    }
}

/// One ammo unit per `reload_ms` while below max, paused on a tick the ship fired.
fn reload(state: &mut SimState, index: usize, dt_ms: f64) {
    let reload_ms = state.ship_tuning.reload_ms;
    let player = &mut state.players[index];
    let ship = &mut player.ship;
    if player.fired_this_tick || ship.ammo >= ship.max_ammo {
        return;
    }
    ship.reload_timer_ms -= dt_ms;
    if ship.reload_timer_ms <= 0.0 {
        ship.ammo += 1;
        ship.reload_timer_ms = if ship.ammo < ship.max_ammo {
            ship.reload_timer_ms + reload_ms
        } else {
            0.0
        };
    }
}

/// Consumes pending fire presses and runs reload for every living ship.
pub fn update_combat(state: &mut SimState, dt_ms: f64) {
    for index in 0..state.players.len() {
        let player = &mut state.players[index];
        player.fired_this_tick = false;
        if !player.ship.alive {
            player.input.fire_pending = false;
            continue;
        }
        if std::mem::take(&mut player.input.fire_pending) {
            try_fire(state, index);
        }
        reload(state, index, dt_ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Ship;
    use crate::domain::events::SimEvent;
    use crate::domain::player::{PlayerKind, RuntimePlayer};
    use crate::domain::state::RoomSettings;

    fn state_with_ships(ships: &[(Vec2, f32)]) -> SimState {
        let mut state = SimState::new(RoomSettings::default(), 2);
        for (i, (pos, angle)) in ships.iter().enumerate() {
            let id = i as u64 + 1;
            let mut p = RuntimePlayer::new(id, format!("p{id}"), i, PlayerKind::Human, id);
            p.ship = Ship::new(*pos, *angle, 3);
            p.in_round = true;
            state.players.push(p);
        }
        state.now_ms = 5_000.0;
        state
    }

    #[test]
    fn when_ammo_is_empty_and_no_power_up_then_fire_spawns_nothing_and_keeps_cooldown() {
        let mut state = state_with_ships(&[(Vec2::new(100.0, 100.0), 0.0)]);
        state.players[0].ship.ammo = 0;
        state.players[0].ship.last_shot_ms = Some(1_000.0);

        assert_eq!(try_fire(&mut state, 0), FireOutcome::Blocked);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.players[0].ship.last_shot_ms, Some(1_000.0));
    }

    #[test]
    fn when_full_magazine_fires_then_reload_timer_starts() {
        let mut state = state_with_ships(&[(Vec2::new(100.0, 100.0), 0.0)]);

        assert_eq!(try_fire(&mut state, 0), FireOutcome::Fired(None));

        let ship = &state.players[0].ship;
        assert_eq!(ship.ammo, 2);
        assert_eq!(ship.reload_timer_ms, state.ship_tuning.reload_ms);
        assert_eq!(state.projectiles.len(), 1);
    }

    #[test]
    fn when_fire_cooldown_is_running_then_second_shot_is_blocked() {
        let mut state = state_with_ships(&[(Vec2::new(100.0, 100.0), 0.0)]);
        try_fire(&mut state, 0);
        state.now_ms += state.ship_tuning.fire_cooldown_ms / 2.0;
        assert_eq!(try_fire(&mut state, 0), FireOutcome::Blocked);
        assert_eq!(state.players[0].ship.ammo, 2);
    }

    #[test]
    fn when_reload_interval_passes_then_one_ammo_is_restored() {
        let mut state = state_with_ships(&[(Vec2::new(100.0, 100.0), 0.0)]);
        try_fire(&mut state, 0);
        let reload_ms = state.ship_tuning.reload_ms;

        update_combat(&mut state, reload_ms - 1.0);
        assert_eq!(state.players[0].ship.ammo, 2);
        update_combat(&mut state, 2.0);
        assert_eq!(state.players[0].ship.ammo, 3);
    }

    #[test]
    fn when_laser_hits_unshielded_enemy_then_power_up_is_cleared_and_one_hit_recorded() {
        let length = 600.0;
        let mut state = state_with_ships(&[
            (Vec2::new(0.0, 0.0), 0.0),
            (Vec2::new(length / 2.0, 0.0), 0.0),
        ]);
        state.players[1].grant_power_up(PowerUpKind::Scatter, state.now_ms);

        let hit = apply_laser_damage(&mut state, 1, Vec2::ZERO, 0.0, length);

        assert!(matches!(
            hit,
            Some(LaserHit::Ship {
                player_id: 2,
                outcome: ShipDamage::Destroyed,
                ..
            })
        ));
        assert!(state.players[1].power_up.is_none());
        let hits = state
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::ShipHit { target_id: 2, .. }))
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn when_laser_path_has_invulnerable_ship_first_then_it_hits_the_one_behind() {
        let mut state = state_with_ships(&[
            (Vec2::new(0.0, 0.0), 0.0),
            (Vec2::new(200.0, 0.0), 0.0),
            (Vec2::new(400.0, 0.0), 0.0),
        ]);
        state.players[1].ship.invulnerable_until_ms = state.now_ms + 1_000.0;

        let hit = apply_laser_damage(&mut state, 1, Vec2::ZERO, 0.0, 900.0);

        assert!(matches!(hit, Some(LaserHit::Ship { player_id: 3, .. })));
        assert!(state.players[1].ship.alive);
    }

    #[test]
    fn when_laser_charges_run_out_then_power_up_is_removed() {
        let mut state = state_with_ships(&[(Vec2::new(100.0, 100.0), 0.0)]);
        state.players[0].grant_power_up(PowerUpKind::Laser, 0.0);

        for _ in 0..LASER_CHARGES {
            assert_eq!(
                try_fire(&mut state, 0),
                FireOutcome::Fired(Some(PowerUpKind::Laser))
            );
            state.now_ms += LASER_COOLDOWN_MS;
        }
        assert!(state.players[0].power_up.is_none());
        assert_eq!(state.lasers.len(), LASER_CHARGES as usize);
    }

    #[test]
    fn when_scatter_fires_then_three_shots_spread_around_heading() {
        let mut state = state_with_ships(&[(Vec2::new(300.0, 300.0), 0.0)]);
        state.players[0].grant_power_up(PowerUpKind::Scatter, 0.0);

        try_fire(&mut state, 0);

        assert_eq!(state.scatter_shots.len(), 3);
        assert!(state.projectiles.is_empty());
        let ys: Vec<f32> = state.scatter_shots.iter().map(|s| s.vel.y).collect();
        assert!(ys[0] < 0.0 && ys[1].abs() < 1e-3 && ys[2] > 0.0);
        assert_eq!(
            state.players[0].power_up.as_ref().map(|p| p.charges),
            Some(SCATTER_CHARGES - 1)
        );
    }

    #[test]
    fn when_joust_is_held_then_firing_is_disabled() {
        let mut state = state_with_ships(&[(Vec2::new(300.0, 300.0), 0.0)]);
        state.players[0].grant_power_up(PowerUpKind::Joust, state.now_ms);

        assert_eq!(try_fire(&mut state, 0), FireOutcome::Blocked);
        assert!(state.projectiles.is_empty());
        assert_eq!(state.players[0].ship.ammo, 3);
    }
}
