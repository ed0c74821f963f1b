// Outbound seam between the simulation and whoever hosts it.

use super::types::{PhaseChange, PlayerInfo, RoomMeta, RoundResult};
use crate::domain::{PlayerId, SessionId, Snapshot, SoundCue};
use glam::Vec2;

/// One method per event kind. Injected when a `Simulation` is built.
pub trait SimHooks: Send {
    fn players_changed(&mut self, players: &[PlayerInfo]);
    fn room_meta_changed(&mut self, meta: &RoomMeta);
    fn phase_changed(&mut self, change: &PhaseChange);
    fn countdown(&mut self, seconds_left: u32);
    fn round_result(&mut self, result: &RoundResult);
    fn snapshot(&mut self, snapshot: &Snapshot);
    fn sound(&mut self, cue: SoundCue);
    fn screen_shake(&mut self, intensity: f32, duration_ms: f64);
    fn dash_particles(&mut self, player_id: PlayerId, pos: Vec2, angle: f32);
    fn dev_mode_changed(&mut self, enabled: bool);
    /// Only the offending session should see this.
    fn error(&mut self, session_id: SessionId, code: &'static str, message: &str);
    /// The session no longer has a player in the room (left or kicked).
    fn session_removed(&mut self, _session_id: SessionId) {}
}
