// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod app_dirs;
pub mod audio;
pub mod config;
pub mod round;
pub mod runtime;
pub mod stimulus;
pub mod store;
pub mod ui;

/// UI tick granularity; turn pacing is layered on top of this.
pub const TICK_RATE_MS: u64 = 100;

/// Default wall-clock interval between turns.
pub const TURN_INTERVAL_MS: u64 = 3000;
