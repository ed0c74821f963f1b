// Gameplay tuning. Runtime/server configuration lives in `frameworks::config`.

pub mod ai;
pub mod arena;
pub mod asteroid;
pub mod modes;
pub mod ship;
pub mod weapons;

/// Countdown before each round.
pub const COUNTDOWN_MS: f64 = 3000.0;
/// How long round results stay on screen before the next countdown.
pub const ROUND_RESULT_MS: f64 = 3500.0;
pub const DEFAULT_ROUNDS_TO_WIN: u32 = 3;
pub const MAX_PLAYERS_LIMIT: usize = 8;
pub const MIN_PLAYERS_TO_START: usize = 2;
