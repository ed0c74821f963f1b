/// Arena bounds and map definitions.
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArenaBounds {
    pub width: f32,
    pub height: f32,
}

impl ArenaBounds {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }

    pub fn contains(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }
}

impl Default for ArenaBounds {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MapDefinition {
    pub id: u32,
    pub name: &'static str,
    /// Inclusive range for the initial asteroid count before the density multiplier.
    pub asteroid_count: (u32, u32),
    pub grey_chance: f32,
    /// Spawn ring radius as a fraction of the arena's smaller side.
    pub spawn_ring: f32,
}

pub const MAPS: [MapDefinition; 3] = [
    MapDefinition {
        id: 0,
        name: "Open Field",
        asteroid_count: (2, 4),
        grey_chance: 0.0,
        spawn_ring: 0.4,
    },
    MapDefinition {
        id: 1,
        name: "Rock Belt",
        asteroid_count: (5, 8),
        grey_chance: 0.2,
        spawn_ring: 0.42,
    },
    MapDefinition {
        id: 2,
        name: "Iron Drift",
        asteroid_count: (4, 7),
        grey_chance: 0.55,
        spawn_ring: 0.38,
    },
];

pub fn map_by_id(id: u32) -> Option<&'static MapDefinition> {
    MAPS.iter().find(|m| m.id == id)
}

impl MapDefinition {
    /// Spawn point and facing for the `slot`-th ship out of `count`.
    /// Ships sit on a ring around the centre and face inward.
    pub fn spawn_point(&self, arena: &ArenaBounds, slot: usize, count: usize) -> (Vec2, f32) {
        let count = count.max(1) as f32;
        let center = arena.center();
        let ring = arena.width.min(arena.height) * self.spawn_ring;
        let theta = std::f32::consts::TAU * (slot as f32 / count) + std::f32::consts::FRAC_PI_4;
        let pos = center + Vec2::from_angle(theta) * ring;
        let facing = (center - pos).to_angle();
        (pos, facing)
    }
}
