use crate::domain::tuning::MAX_PLAYERS_LIMIT;
use std::{env, str::FromStr, time::Duration};

// Runtime/server settings read from the environment. Gameplay tuning lives in domain::tuning.

pub const COMMAND_CHANNEL_CAPACITY: usize = 1024;
pub const EVENT_BROADCAST_CAPACITY: usize = 256;

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_TICK_RATE_HZ: u32 = 60;
const DEFAULT_SNAPSHOT_RATE_HZ: u32 = 20;
const DEFAULT_ROOM_IDLE_TIMEOUT_SECS: u64 = 60;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

pub fn http_port() -> u16 {
    env_or("GAME_SERVER_PORT", DEFAULT_PORT)
}

pub fn tick_rate_hz() -> u32 {
    env_or("TICK_RATE_HZ", DEFAULT_TICK_RATE_HZ).clamp(1, 240)
}

pub fn snapshot_rate_hz() -> u32 {
    env_or("SNAPSHOT_RATE_HZ", DEFAULT_SNAPSHOT_RATE_HZ).clamp(1, tick_rate_hz())
}

/// Room settings clamp this again to 2..=MAX_PLAYERS_LIMIT.
pub fn max_players() -> usize {
    env_or("MAX_PLAYERS", MAX_PLAYERS_LIMIT)
}

/// Fixed seed for every room. Unset means each room draws its own.
pub fn sim_seed() -> Option<u64> {
    env::var("SIM_SEED").ok().and_then(|v| v.trim().parse().ok())
}

/// How long a created room may wait for its first socket.
pub fn room_idle_timeout() -> Duration {
    Duration::from_secs(env_or("ROOM_IDLE_TIMEOUT_SECS", DEFAULT_ROOM_IDLE_TIMEOUT_SECS).max(1))
}

pub fn interval_for(rate_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)))
}
