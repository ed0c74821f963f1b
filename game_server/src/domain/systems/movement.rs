use crate::domain::events::{SimEvent, SoundCue};
use crate::domain::geometry::wrap_angle;
use crate::domain::state::SimState;
use crate::domain::tuning::arena::ArenaBounds;
use crate::domain::tuning::modes::{DashStyle, Propulsion, RecoilStyle};
use glam::Vec2;

/// Wall response shared by ships and pilots.
#[derive(Debug, Clone, Copy)]
pub struct WallConfig {
    pub restitution: f32,
    pub friction: f32,
}

/// Clamps a body inside the arena. The outward velocity component is reflected and scaled
/// by restitution; the tangential one is damped by friction. Returns whether a wall was hit.
pub fn bounce_off_walls(
    pos: &mut Vec2,
    vel: &mut Vec2,
    radius: f32,
    arena: &ArenaBounds,
    cfg: WallConfig,
) -> bool {
    let mut hit = false;

    if pos.x < radius {
        pos.x = radius;
        if vel.x < 0.0 {
            vel.x = -vel.x * cfg.restitution;
            vel.y *= 1.0 - cfg.friction;
        }
        hit = true;
    } else if pos.x > arena.width - radius {
        pos.x = arena.width - radius;
        if vel.x > 0.0 {
            vel.x = -vel.x * cfg.restitution;
            vel.y *= 1.0 - cfg.friction;
        }
        hit = true;
    }

    if pos.y < radius {
        pos.y = radius;
        if vel.y < 0.0 {
            vel.y = -vel.y * cfg.restitution;
            vel.x *= 1.0 - cfg.friction;
        }
        hit = true;
    } else if pos.y > arena.height - radius {
        pos.y = arena.height - radius;
        if vel.y > 0.0 {
            vel.y = -vel.y * cfg.restitution;
            vel.x *= 1.0 - cfg.friction;
        }
        hit = true;
    }

    hit
}

pub fn update_ships(state: &mut SimState, dt: f32) {
    let now = state.now_ms;
    let physics = state.physics;
    let tuning = state.ship_tuning;
    let arena = state.arena;
    let walls = WallConfig {
        restitution: physics.wall_restitution,
        friction: physics.wall_friction,
    };

    // Resolved up front: REVERSE depends on the other players.
    let reversed: Vec<bool> = state
        .players
        .iter()
        .map(|p| state.is_reversed_for(p.id))
        .collect();
    let mut dash_events = Vec::new();

    for (player, reversed) in state.players.iter_mut().zip(reversed) {
        if !player.ship.alive {
            continue;
        }
        let ship = &mut player.ship;

        // rotation
        if player.input.button_a {
            let dir = if reversed { -1.0 } else { 1.0 };
            ship.angle = wrap_angle(ship.angle + tuning.rotate_speed * dt * dir);
            ship.angular_velocity = 0.0;
        } else if ship.angular_velocity != 0.0 {
            ship.angle = wrap_angle(ship.angle + ship.angular_velocity * dt);
            ship.angular_velocity *= (-physics.ship_angular_damping * dt).exp();
            if ship.angular_velocity.abs() < 1e-3 {
                ship.angular_velocity = 0.0;
            }
        }

        let heading = ship.heading();

        // dash; a queued dash waits for its cooldown
        if player.dash_queued && now >= player.dash_ready_at_ms {
            player.dash_queued = false;
            player.dash_ready_at_ms = now + tuning.dash_cooldown_ms;
            match physics.dash {
                DashStyle::Boost { duration_ms, .. } => player.dash_until_ms = now + duration_ms,
                DashStyle::Impulse { speed } => ship.vel += heading * speed,
            }
            dash_events.push(SimEvent::DashParticles {
                player_id: player.id,
                pos: ship.pos,
                angle: ship.angle,
            });
        }

        // propulsion
        match physics.propulsion {
            Propulsion::Smoothed {
                target_speed,
                response,
            } => {
                let mut speed = target_speed;
                if let DashStyle::Boost { multiplier, .. } = physics.dash
                    && now < player.dash_until_ms
                {
                    speed *= multiplier;
                }
                if let RecoilStyle::SpeedPenalty { factor, .. } = physics.recoil
                    && now < player.recoil_until_ms
                {
                    speed *= factor;
                }
                let target = heading * speed;
                ship.vel += (target - ship.vel) * (1.0 - (-response * dt).exp());
            }
            Propulsion::Thrust { accel, max_speed } => {
                // Impulses may push past the cap; thrust alone never does.
                let cap = max_speed.max(ship.vel.length());
                ship.vel = (ship.vel + heading * accel * dt).clamp_length_max(cap);
            }
        }

        // air friction
        if physics.air_friction > 0.0 {
            ship.vel *= (-physics.air_friction * dt).exp();
        }

        ship.pos += ship.vel * dt;
        bounce_off_walls(&mut ship.pos, &mut ship.vel, tuning.radius, &arena, walls);
    }

    for event in dash_events {
        state.push_event(event);
        state.sound(SoundCue::Dash);
    }
}

/// Ejected pilots: button A rotates, button B pushes forward.
pub fn update_pilots(state: &mut SimState, dt: f32) {
    let tuning = state.pilot_tuning;
    let arena = state.arena;
    let walls = WallConfig {
        restitution: state.physics.wall_restitution,
        friction: state.physics.wall_friction,
    };
    let reversed: Vec<bool> = state
        .players
        .iter()
        .map(|p| state.is_reversed_for(p.id))
        .collect();

    for (player, reversed) in state.players.iter_mut().zip(reversed) {
        let Some(pilot) = player.pilot.as_mut().filter(|p| p.alive) else {
            continue;
        };

        if player.input.button_a {
            let dir = if reversed { -1.0 } else { 1.0 };
            pilot.angle = wrap_angle(pilot.angle + tuning.rotate_speed * dt * dir);
        }
        if player.input.button_b {
            pilot.vel = (pilot.vel + pilot.heading() * tuning.thrust * dt)
                .clamp_length_max(tuning.max_speed);
        }
        pilot.vel *= (-tuning.air_friction * dt).exp();
        pilot.pos += pilot.vel * dt;
        bounce_off_walls(&mut pilot.pos, &mut pilot.vel, tuning.radius, &arena, walls);
    }
}
