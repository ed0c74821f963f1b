use super::hooks::SimHooks;
use super::simulation::Simulation;
use super::types::{PhaseChange, PlayerInfo, RoomCommand, RoomEvent, RoomMeta, RoundResult};
use crate::domain::{Phase, PlayerId, SessionId, Snapshot, SoundCue};
use glam::Vec2;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::info;

/// Publishes every hook call on the room's broadcast channel.
///
/// Send errors only mean nobody is subscribed right now.
pub struct BroadcastHooks {
    events_tx: broadcast::Sender<RoomEvent>,
}

impl BroadcastHooks {
    pub fn new(events_tx: broadcast::Sender<RoomEvent>) -> Self {
        Self { events_tx }
    }

    fn publish(&self, event: RoomEvent) {
        let _ = self.events_tx.send(event);
    }
}

impl SimHooks for BroadcastHooks {
    fn players_changed(&mut self, players: &[PlayerInfo]) {
        self.publish(RoomEvent::PlayersChanged(Arc::from(players)));
    }

    fn room_meta_changed(&mut self, meta: &RoomMeta) {
        self.publish(RoomEvent::RoomMeta(meta.clone()));
    }

    fn phase_changed(&mut self, change: &PhaseChange) {
        self.publish(RoomEvent::PhaseChanged(change.clone()));
    }

    fn countdown(&mut self, seconds_left: u32) {
        self.publish(RoomEvent::Countdown(seconds_left));
    }

    fn round_result(&mut self, result: &RoundResult) {
        self.publish(RoomEvent::RoundResult(result.clone()));
    }

    fn snapshot(&mut self, snapshot: &Snapshot) {
        self.publish(RoomEvent::Snapshot(Arc::new(snapshot.clone())));
    }

    fn sound(&mut self, cue: SoundCue) {
        self.publish(RoomEvent::Sound(cue));
    }

    fn screen_shake(&mut self, intensity: f32, duration_ms: f64) {
        self.publish(RoomEvent::ScreenShake {
            intensity,
            duration_ms,
        });
    }

    fn dash_particles(&mut self, player_id: PlayerId, pos: Vec2, angle: f32) {
        self.publish(RoomEvent::DashParticles {
            player_id,
            pos,
            angle,
        });
    }

    fn dev_mode_changed(&mut self, enabled: bool) {
        self.publish(RoomEvent::DevMode(enabled));
    }

    fn error(&mut self, session_id: SessionId, code: &'static str, message: &str) {
        self.publish(RoomEvent::Error {
            session_id,
            code,
            message: message.to_string(),
        });
    }

    fn session_removed(&mut self, session_id: SessionId) {
        self.publish(RoomEvent::SessionRemoved(session_id));
    }
}

/// The one task that owns a room's simulation.
///
/// Each tick drains the command channel first, then feeds the elapsed wall time to the
/// fixed-step scheduler. Snapshots go out on their own slower interval.
pub async fn room_task(
    room_id: u64,
    mut sim: Simulation<BroadcastHooks>,
    mut command_rx: mpsc::Receiver<RoomCommand>,
    tick_interval: Duration,
    snapshot_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut snapshots = tokio::time::interval(snapshot_interval);
    snapshots.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = Instant::now();

    info!(room_id, "room started");
    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                // The registry dropped this room.
                break;
            }
            _ = ticker.tick() => {
                while let Ok(command) = command_rx.try_recv() {
                    // Rejections were already reported to the sender.
                    let _ = sim.apply(command);
                }

                let now = Instant::now();
                let frame_ms = now.duration_since(last_frame).as_secs_f64() * 1000.0;
                last_frame = now;
                sim.advance(frame_ms);
            }
            _ = snapshots.tick() => {
                if sim.state().phase != Phase::Lobby {
                    sim.publish_snapshot();
                }
            }
        }
    }
    info!(room_id, tick = sim.state().tick, "room stopped");
}
