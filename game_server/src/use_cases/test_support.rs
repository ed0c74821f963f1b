// Hooks that just remember what they were told.

use super::hooks::SimHooks;
use super::types::{PhaseChange, PlayerInfo, RoomMeta, RoundResult};
use crate::domain::{Phase, PlayerId, SessionId, Snapshot, SoundCue};
use glam::Vec2;

#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Players(usize),
    Meta(Phase),
    Phase(Phase),
    Countdown(u32),
    RoundResult { winner_id: Option<PlayerId> },
    Snapshot { tick: u64, ships: usize },
    Sound(SoundCue),
    Shake,
    Dash(PlayerId),
    DevMode(bool),
    Error { session_id: SessionId, code: &'static str },
    SessionRemoved(SessionId),
}

#[derive(Debug, Default)]
pub struct RecordingHooks {
    pub events: Vec<Recorded>,
}

impl RecordingHooks {
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl SimHooks for RecordingHooks {
    fn players_changed(&mut self, players: &[PlayerInfo]) {
        self.events.push(Recorded::Players(players.len()));
    }

    fn room_meta_changed(&mut self, meta: &RoomMeta) {
        self.events.push(Recorded::Meta(meta.phase));
    }

    fn phase_changed(&mut self, change: &PhaseChange) {
        self.events.push(Recorded::Phase(change.phase));
    }

    fn countdown(&mut self, seconds_left: u32) {
        self.events.push(Recorded::Countdown(seconds_left));
    }

    fn round_result(&mut self, result: &RoundResult) {
        self.events.push(Recorded::RoundResult {
            winner_id: result.winner_id,
        });
    }

    fn snapshot(&mut self, snapshot: &Snapshot) {
        self.events.push(Recorded::Snapshot {
            tick: snapshot.tick,
            ships: snapshot.ships.len(),
        });
    }

    fn sound(&mut self, cue: SoundCue) {
        self.events.push(Recorded::Sound(cue));
    }

    fn screen_shake(&mut self, _intensity: f32, _duration_ms: f64) {
        self.events.push(Recorded::Shake);
    }

    fn dash_particles(&mut self, player_id: PlayerId, _pos: Vec2, _angle: f32) {
        self.events.push(Recorded::Dash(player_id));
    }

    fn dev_mode_changed(&mut self, enabled: bool) {
        self.events.push(Recorded::DevMode(enabled));
    }

    fn error(&mut self, session_id: SessionId, code: &'static str, _message: &str) {
        self.events.push(Recorded::Error { session_id, code });
    }

    fn session_removed(&mut self, session_id: SessionId) {
        self.events.push(Recorded::SessionRemoved(session_id));
    }
}
