// One damage path for every source: bullets, scatter, laser, mines, missiles, joust, rocks.

use crate::domain::entities::{Pilot, PlayerId, PowerUpKind};
use crate::domain::events::{DamageSource, ShipDamage, SimEvent, SoundCue};
use crate::domain::state::SimState;
use crate::domain::tuning::weapons::{POWERUP_SHIELD_HITS, SHIELD_HIT_GRACE_MS};
use glam::Vec2;
use tracing::debug;

/// Applies one hit to `target_id`'s ship.
///
/// The owner never damages itself and invulnerable ships are untouched. A held SHIELD soaks
/// hits until the `POWERUP_SHIELD_HITS`-th, which removes it while the ship survives.
/// Anything else destroys the ship, clears its power-up and ejects a pilot.
pub fn damage_ship(
    state: &mut SimState,
    target_id: PlayerId,
    attacker_id: Option<PlayerId>,
    source: DamageSource,
) -> ShipDamage {
    if attacker_id == Some(target_id) {
        return ShipDamage::Ignored;
    }
    let now = state.now_ms;
    let eject_scale = state.pilot_tuning.eject_velocity_scale;
    let Some(player) = state.player_mut(target_id) else {
        return ShipDamage::Ignored;
    };
    if !player.ship.alive || player.ship.is_invulnerable(now) {
        return ShipDamage::Ignored;
    }

    let shield = player
        .power_up
        .as_mut()
        .filter(|p| p.kind == PowerUpKind::Shield);
    let outcome = if let Some(shield) = shield {
        shield.shield_hits += 1;
        let hits = shield.shield_hits;
        player.ship.invulnerable_until_ms = now + SHIELD_HIT_GRACE_MS;
        if hits >= POWERUP_SHIELD_HITS {
            player.power_up = None;
            ShipDamage::ShieldBroken
        } else {
            ShipDamage::ShieldAbsorbed {
                hits_left: POWERUP_SHIELD_HITS - hits,
            }
        }
    } else {
        let ship = &mut player.ship;
        ship.alive = false;
        player.power_up = None;
        player.pilot = Some(Pilot {
            pos: ship.pos,
            vel: ship.vel * eject_scale,
            angle: ship.angle,
            alive: true,
            spawned_at_ms: now,
        });
        ship.vel = Vec2::ZERO;
        ship.angular_velocity = 0.0;
        ShipDamage::Destroyed
    };

    debug!(target_id, ?attacker_id, ?source, ?outcome, "ship hit");
    state.push_event(SimEvent::ShipHit {
        target_id,
        attacker_id,
        source,
        outcome,
    });
    match outcome {
        ShipDamage::ShieldAbsorbed { .. } => state.sound(SoundCue::ShieldHit),
        ShipDamage::ShieldBroken => state.sound(SoundCue::ShieldBreak),
        ShipDamage::Destroyed => {
            state.sound(SoundCue::ShipExplode);
            state.shake(8.0, 250.0);
        }
        ShipDamage::Ignored => {}
    }
    outcome
}

/// Kills `pilot_owner`'s pilot. Any attacker other than the owner earns a kill.
/// Returns false when there was no living pilot to kill.
pub fn kill_pilot(
    state: &mut SimState,
    pilot_owner: PlayerId,
    killer_id: Option<PlayerId>,
) -> bool {
    if killer_id == Some(pilot_owner) {
        return false;
    }
    let Some(player) = state.player_mut(pilot_owner) else {
        return false;
    };
    if !player.pilot.as_ref().is_some_and(|p| p.alive) {
        return false;
    }
    player.pilot = None;

    if let Some(killer) = killer_id.and_then(|id| state.player_mut(id)) {
        killer.kills += 1;
    }
    debug!(pilot_owner, ?killer_id, "pilot killed");
    state.push_event(SimEvent::PilotKilled {
        pilot_id: pilot_owner,
        killer_id,
    });
    state.sound(SoundCue::PilotKilled);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::Ship;
    use crate::domain::player::{PlayerKind, RuntimePlayer};
    use crate::domain::state::RoomSettings;

    fn two_player_state() -> SimState {
        let mut state = SimState::new(RoomSettings::default(), 5);
        for id in [1, 2] {
            let mut p = RuntimePlayer::new(id, format!("p{id}"), id as usize, PlayerKind::Human, id);
            p.ship = Ship::new(Vec2::new(100.0 * id as f32, 100.0), 0.0, 3);
            p.in_round = true;
            state.players.push(p);
        }
        state.now_ms = 10_000.0;
        state
    }

    fn ship_hits(state: &SimState) -> usize {
        state
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::ShipHit { .. }))
            .count()
    }

    #[test]
    fn when_shielded_ship_is_hit_then_last_shield_hit_breaks_shield_and_ship_survives() {
        let mut state = two_player_state();
        state.players[1].grant_power_up(PowerUpKind::Shield, state.now_ms);

        let mut outcomes = Vec::new();
        for _ in 0..POWERUP_SHIELD_HITS {
            outcomes.push(damage_ship(&mut state, 2, Some(1), DamageSource::Projectile));
            // step past the grace window
            state.now_ms += SHIELD_HIT_GRACE_MS + 1.0;
        }

        assert_eq!(outcomes.last(), Some(&ShipDamage::ShieldBroken));
        for o in &outcomes[..outcomes.len() - 1] {
            assert!(matches!(o, ShipDamage::ShieldAbsorbed { .. }));
        }
        let target = &state.players[1];
        assert!(target.ship.alive);
        assert!(target.power_up.is_none());

        assert_eq!(
            damage_ship(&mut state, 2, Some(1), DamageSource::Mine),
            ShipDamage::Destroyed
        );
        assert!(!state.players[1].ship.alive);
        assert!(state.players[1].pilot.is_some());
    }

    #[test]
    fn when_shield_has_one_hit_left_then_it_is_still_held() {
        let mut state = two_player_state();
        state.players[1].grant_power_up(PowerUpKind::Shield, state.now_ms);
        for _ in 0..POWERUP_SHIELD_HITS - 1 {
            damage_ship(&mut state, 2, Some(1), DamageSource::Laser);
            state.now_ms += SHIELD_HIT_GRACE_MS + 1.0;
        }
        assert!(state.players[1].holds(PowerUpKind::Shield));
        assert!(state.players[1].ship.alive);
    }

    #[test]
    fn when_owner_or_invulnerable_ship_is_hit_then_nothing_happens() {
        let mut state = two_player_state();
        assert_eq!(
            damage_ship(&mut state, 1, Some(1), DamageSource::Projectile),
            ShipDamage::Ignored
        );
        state.players[1].ship.invulnerable_until_ms = state.now_ms + 100.0;
        assert_eq!(
            damage_ship(&mut state, 2, Some(1), DamageSource::Projectile),
            ShipDamage::Ignored
        );
        assert_eq!(
            damage_ship(&mut state, 99, Some(1), DamageSource::Projectile),
            ShipDamage::Ignored
        );
        assert_eq!(ship_hits(&state), 0);
    }

    #[test]
    fn when_pilot_is_killed_then_attacker_gets_credit_once() {
        let mut state = two_player_state();
        damage_ship(&mut state, 2, Some(1), DamageSource::Projectile);

        assert!(kill_pilot(&mut state, 2, Some(1)));
        assert!(!kill_pilot(&mut state, 2, Some(1)));
        assert_eq!(state.players[0].kills, 1);
        assert!(state.players[1].pilot.is_none());
    }
}
