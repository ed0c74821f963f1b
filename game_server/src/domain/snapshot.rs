// Render-facing projection of the simulation, published at the snapshot rate.

use super::entities::{AsteroidTier, AsteroidVariant, EntityId, PlayerId, PowerUpKind, Projectile};
use super::state::{Phase, SimState};
use glam::Vec2;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ShipView {
    pub player_id: PlayerId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub angle: f32,
    pub ammo: u32,
    pub max_ammo: u32,
    pub invulnerable: bool,
    pub dashing: bool,
    pub power_up: Option<PowerUpKind>,
    pub power_up_charges: u32,
    pub shield_hits: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct PilotView {
    pub player_id: PlayerId,
    pub pos: Vec2,
    pub angle: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileView {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub pos: Vec2,
    pub radius: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MissileView {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub pos: Vec2,
    pub angle: f32,
    pub target_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LaserView {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub origin: Vec2,
    pub angle: f32,
    pub length: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct MineView {
    pub id: EntityId,
    pub owner_id: PlayerId,
    pub pos: Vec2,
    pub armed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AsteroidView {
    pub id: EntityId,
    pub pos: Vec2,
    pub angle: f32,
    pub radius: f32,
    pub vertices: Vec<Vec2>,
    pub hp: u32,
    pub max_hp: u32,
    pub tier: AsteroidTier,
    pub variant: AsteroidVariant,
}

#[derive(Debug, Clone, Serialize)]
pub struct PickupView {
    pub id: EntityId,
    pub kind: PowerUpKind,
    pub pos: Vec2,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    pub now_ms: f64,
    pub phase: Phase,
    pub round: u32,
    pub ships: Vec<ShipView>,
    pub pilots: Vec<PilotView>,
    pub projectiles: Vec<ProjectileView>,
    pub scatter_shots: Vec<ProjectileView>,
    pub missiles: Vec<MissileView>,
    pub lasers: Vec<LaserView>,
    pub mines: Vec<MineView>,
    pub asteroids: Vec<AsteroidView>,
    pub pickups: Vec<PickupView>,
}

fn projectile_views(list: &[Projectile]) -> Vec<ProjectileView> {
    list.iter()
        .map(|p| ProjectileView {
            id: p.id,
            owner_id: p.owner_id,
            pos: p.pos,
            radius: p.radius,
        })
        .collect()
}

impl Snapshot {
    /// Only alive entities are included.
    pub fn capture(state: &SimState) -> Self {
        let now = state.now_ms;
        let ships = state
            .players
            .iter()
            .filter(|p| p.ship.alive)
            .map(|p| ShipView {
                player_id: p.id,
                pos: p.ship.pos,
                vel: p.ship.vel,
                angle: p.ship.angle,
                ammo: p.ship.ammo,
                max_ammo: p.ship.max_ammo,
                invulnerable: p.ship.is_invulnerable(now),
                dashing: now < p.dash_until_ms,
                power_up: p.power_up.as_ref().map(|pu| pu.kind),
                power_up_charges: p.power_up.as_ref().map_or(0, |pu| pu.charges),
                shield_hits: p.power_up.as_ref().map_or(0, |pu| pu.shield_hits),
            })
            .collect();

        let pilots = state
            .players
            .iter()
            .filter_map(|p| p.pilot.as_ref().filter(|pl| pl.alive).map(|pl| (p.id, pl)))
            .map(|(player_id, pl)| PilotView {
                player_id,
                pos: pl.pos,
                angle: pl.angle,
            })
            .collect();

        Self {
            tick: state.tick,
            now_ms: now,
            phase: state.phase,
            round: state.round,
            ships,
            pilots,
            projectiles: projectile_views(&state.projectiles),
            scatter_shots: projectile_views(&state.scatter_shots),
            missiles: state
                .missiles
                .iter()
                .map(|m| MissileView {
                    id: m.id,
                    owner_id: m.owner_id,
                    pos: m.pos,
                    angle: m.angle,
                    target_id: m.target_id,
                })
                .collect(),
            lasers: state
                .lasers
                .iter()
                .map(|l| LaserView {
                    id: l.id,
                    owner_id: l.owner_id,
                    origin: l.origin,
                    angle: l.angle,
                    length: l.length,
                })
                .collect(),
            mines: state
                .mines
                .iter()
                .map(|m| MineView {
                    id: m.id,
                    owner_id: m.owner_id,
                    pos: m.pos,
                    armed: m.is_armed(now),
                })
                .collect(),
            asteroids: state
                .asteroids
                .iter()
                .filter(|a| a.alive)
                .map(|a| AsteroidView {
                    id: a.id,
                    pos: a.pos,
                    angle: a.angle,
                    radius: a.radius,
                    vertices: a.vertices.clone(),
                    hp: a.hp,
                    max_hp: a.max_hp,
                    tier: a.tier,
                    variant: a.variant,
                })
                .collect(),
            pickups: state
                .pickups
                .iter()
                .map(|p| PickupView {
                    id: p.id,
                    kind: p.kind,
                    pos: p.pos,
                })
                .collect(),
        }
    }
}
