// Domain layer: simulation state, rules, and per-tick systems. No I/O.

pub mod entities;
pub mod events;
pub mod geometry;
pub mod identity;
pub mod player;
pub mod rng;
pub mod snapshot;
pub mod state;
pub mod systems;
pub mod tuning;

pub use entities::{EntityId, PlayerId, PowerUpKind, SessionId};
pub use events::{DamageSource, ShipDamage, SimEvent, SoundCue};
pub use player::{PlayerKind, RuntimePlayer};
pub use snapshot::Snapshot;
pub use state::{Phase, RoomSettings, SimState};
