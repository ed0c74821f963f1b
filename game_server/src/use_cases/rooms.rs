// Room orchestration: join codes, spawning room tasks, and tearing them down.

use super::room::{BroadcastHooks, room_task};
use super::simulation::Simulation;
use super::types::{RoomCommand, RoomEvent};
use crate::domain::{RoomSettings, SessionId};
use axum::extract::ws::Utf8Bytes;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Notify, RwLock, broadcast, mpsc, watch};
use tracing::info;

pub type RoomId = u64;

/// Codes avoid look-alike characters (0/O, 1/I).
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const ROOM_CODE_LEN: usize = 4;
pub const MAX_CODE_ATTEMPTS: u32 = 64;

/// Shared configuration for spawning rooms.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Capacity for inbound commands per room.
    pub command_channel_capacity: usize,
    /// Capacity for broadcast room events.
    pub event_broadcast_capacity: usize,
    /// Fixed simulation tick.
    pub tick_interval: Duration,
    pub snapshot_interval: Duration,
    pub max_players: usize,
    /// A room nobody is connected to this long after creation is closed.
    pub idle_timeout: Duration,
    /// Fixed seed for every room, or a fresh random one per room.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomError {
    /// No unused code was found within `MAX_CODE_ATTEMPTS` tries.
    CodeSpaceExhausted,
    CodeTaken(String),
}

impl fmt::Display for RoomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomError::CodeSpaceExhausted => write!(f, "no free room codes"),
            RoomError::CodeTaken(code) => write!(f, "room code {code} is already in use"),
        }
    }
}

impl std::error::Error for RoomError {}

/// Serialized outbound message. `target` limits delivery to one session.
#[derive(Debug, Clone)]
pub struct OutboundFrame {
    pub target: Option<SessionId>,
    pub bytes: Utf8Bytes,
    /// The target session has been removed and its socket should close after this frame.
    pub closes_session: bool,
}

/// Join codes in use, mapped to their rooms.
///
/// Generated codes stay reserved until they are registered or released.
#[derive(Debug, Default)]
pub struct RoomCodes {
    by_code: HashMap<String, RoomId>,
    reserved: HashSet<String>,
}

impl RoomCodes {
    fn in_use(&self, code: &str) -> bool {
        self.by_code.contains_key(code) || self.reserved.contains(code)
    }

    pub fn generate_unique_room_code(
        &mut self,
        len: usize,
        rng: &mut impl Rng,
    ) -> Result<String, RoomError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code: String = (0..len)
                .map(|_| ROOM_CODE_ALPHABET[rng.random_range(0..ROOM_CODE_ALPHABET.len())] as char)
                .collect();
            if !self.in_use(&code) {
                self.reserved.insert(code.clone());
                return Ok(code);
            }
        }
        Err(RoomError::CodeSpaceExhausted)
    }

    /// Binds a code to a room. A code reserved by generation may be registered once.
    pub fn register_room_code(&mut self, code: &str, room_id: RoomId) -> Result<(), RoomError> {
        let code = normalize_code(code);
        if self.by_code.contains_key(&code) {
            return Err(RoomError::CodeTaken(code));
        }
        self.reserved.remove(&code);
        self.by_code.insert(code, room_id);
        Ok(())
    }

    /// Lookup is case-insensitive.
    pub fn room_id_by_code(&self, code: &str) -> Option<RoomId> {
        self.by_code.get(&normalize_code(code)).copied()
    }

    pub fn release(&mut self, code: &str) {
        let code = normalize_code(code);
        self.reserved.remove(&code);
        self.by_code.remove(&code);
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Per-room channels.
#[derive(Clone)]
pub struct RoomHandle {
    pub room_id: RoomId,
    pub code: Arc<str>,
    /// Sender for commands into the room task.
    pub command_tx: mpsc::Sender<RoomCommand>,
    /// Broadcast sender for raw room events.
    pub events_tx: broadcast::Sender<RoomEvent>,
    /// Broadcast sender for serialized events, shared by every connection.
    pub frames_tx: broadcast::Sender<OutboundFrame>,
    /// Latest serialized snapshot for lag recovery.
    pub snapshot_latest_tx: watch::Sender<Utf8Bytes>,
    shutdown: Arc<Notify>,
}

struct RoomEntry {
    handle: RoomHandle,
    connections: usize,
}

#[derive(Default)]
struct Rooms {
    by_id: HashMap<RoomId, RoomEntry>,
    codes: RoomCodes,
    next_id: RoomId,
}

/// Thread-safe registry for active rooms.
pub struct RoomRegistry {
    config: RoomConfig,
    rooms: RwLock<Rooms>,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: RwLock::new(Rooms::default()),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a room with a fresh join code and spawns its task.
    ///
    /// The room closes on its own if nobody is connected when `idle_timeout` runs out.
    pub async fn create_room(self: &Arc<Self>) -> Result<RoomHandle, RoomError> {
        let mut rooms = self.rooms.write().await;
        let code = rooms
            .codes
            .generate_unique_room_code(ROOM_CODE_LEN, &mut rand::rng())?;
        rooms.next_id += 1;
        let room_id = rooms.next_id;
        rooms.codes.register_room_code(&code, room_id)?;

        // Channel wiring for the room task.
        let (command_tx, command_rx) =
            mpsc::channel::<RoomCommand>(self.config.command_channel_capacity);
        let (events_tx, _events_rx) =
            broadcast::channel::<RoomEvent>(self.config.event_broadcast_capacity);
        let (frames_tx, _frames_rx) =
            broadcast::channel::<OutboundFrame>(self.config.event_broadcast_capacity);
        let (snapshot_latest_tx, _latest_rx) = watch::channel(Utf8Bytes::from(""));
        let shutdown = Arc::new(Notify::new());

        let seed = self.config.seed.unwrap_or_else(rand::random);
        let tick_ms = self.config.tick_interval.as_secs_f64() * 1000.0;
        let sim = Simulation::new(
            RoomSettings::new(self.config.max_players),
            seed,
            tick_ms,
            BroadcastHooks::new(events_tx.clone()),
        );
        tokio::spawn(room_task(
            room_id,
            sim,
            command_rx,
            self.config.tick_interval,
            self.config.snapshot_interval,
            shutdown.clone(),
        ));

        let handle = RoomHandle {
            room_id,
            code: Arc::from(code.as_str()),
            command_tx,
            events_tx,
            frames_tx,
            snapshot_latest_tx,
            shutdown,
        };
        rooms.by_id.insert(
            room_id,
            RoomEntry {
                handle: handle.clone(),
                connections: 0,
            },
        );
        info!(room_id, code = %code, seed, "room created");
        spawn_idle_reaper(Arc::downgrade(self), room_id, self.config.idle_timeout);
        Ok(handle)
    }

    pub async fn get_by_code(&self, code: &str) -> Option<RoomHandle> {
        let rooms = self.rooms.read().await;
        let room_id = rooms.codes.room_id_by_code(code)?;
        rooms.by_id.get(&room_id).map(|e| e.handle.clone())
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.by_id.len()
    }

    /// Counts a live socket. `None` if the room is already gone.
    pub async fn register_connection(&self, room_id: RoomId) -> Option<usize> {
        let mut rooms = self.rooms.write().await;
        let entry = rooms.by_id.get_mut(&room_id)?;
        entry.connections += 1;
        Some(entry.connections)
    }

    /// The last socket to leave closes the room.
    pub async fn register_disconnect(&self, room_id: RoomId) {
        let mut rooms = self.rooms.write().await;
        let Some(entry) = rooms.by_id.get_mut(&room_id) else {
            return;
        };
        entry.connections = entry.connections.saturating_sub(1);
        if entry.connections == 0 {
            Self::remove_locked(&mut rooms, room_id);
        }
    }

    /// Closes the room only when no socket is attached.
    pub async fn remove_if_idle(&self, room_id: RoomId) -> bool {
        let mut rooms = self.rooms.write().await;
        let idle = rooms
            .by_id
            .get(&room_id)
            .is_some_and(|entry| entry.connections == 0);
        if !idle {
            return false;
        }
        info!(room_id, "closing idle room");
        Self::remove_locked(&mut rooms, room_id)
    }

    pub async fn remove_room(&self, room_id: RoomId) -> bool {
        let mut rooms = self.rooms.write().await;
        Self::remove_locked(&mut rooms, room_id)
    }

    fn remove_locked(rooms: &mut Rooms, room_id: RoomId) -> bool {
        let Some(entry) = rooms.by_id.remove(&room_id) else {
            return false;
        };
        rooms.codes.release(&entry.handle.code);
        // notify_one keeps a permit, so the task sees it even between selects.
        entry.handle.shutdown.notify_one();
        info!(room_id, code = %entry.handle.code, "room removed");
        true
    }
}

// Rooms with live sockets are closed by their last disconnect instead.
fn spawn_idle_reaper(registry: Weak<RoomRegistry>, room_id: RoomId, idle_timeout: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(idle_timeout).await;
        if let Some(registry) = registry.upgrade() {
            registry.remove_if_idle(room_id).await;
        }
    });
}
