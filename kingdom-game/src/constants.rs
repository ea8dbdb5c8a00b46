//! Fixed rules and tuning defaults for the Kingdom turn engine.
//!
//! Channel bounds are rules of the game and live here rather than in
//! `GameConfig`; everything a deployment may reasonably tune (endpoint,
//! storage version, polling cadence) is defaulted from these values.

// Resource rules -----------------------------------------------------------
pub const RESOURCE_MIN: i32 = 0;
pub const RESOURCE_MAX: i32 = 10;
pub const INITIAL_CHANNEL_VALUE: i32 = 5;

// Session storage ----------------------------------------------------------
pub const DEFAULT_STORAGE_VERSION: &str = "v6_preload";
pub(crate) const MAIN_STATE_KEY_PREFIX: &str = "kingdomGameState_";
pub(crate) const HISTORY_KEY_PREFIX: &str = "kingdomGameHistory_";
pub(crate) const PENDING_TURN_KEY_PREFIX: &str = "kingdomGameNextEvent_";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

// Feedback polling ---------------------------------------------------------
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 15_000;

// Backend ------------------------------------------------------------------
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8787/";

// Player-facing fallbacks --------------------------------------------------
pub const DEFAULT_OPENING_STATUS: &str = "Your reign begins...";
pub const DEFAULT_CHOICE_PROMPT: &str = "Make your choice.";
