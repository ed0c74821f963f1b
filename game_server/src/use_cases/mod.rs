// Use cases layer: room workflows around the simulation core.

pub mod commands;
pub mod hooks;
pub mod room;
pub mod rooms;
pub mod scheduler;
pub mod simulation;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use commands::CommandError;
pub use hooks::SimHooks;
pub use rooms::{OutboundFrame, RoomConfig, RoomError, RoomHandle, RoomId, RoomRegistry};
pub use simulation::Simulation;
pub use types::{CommandKind, RoomCommand, RoomEvent};
