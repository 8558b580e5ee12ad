//! Configured bounds and cadence thresholds. `EngineConfig` defaults pull
//! from here; hosts override through config.

/// Shortest lottery a command may create.
pub const MIN_DURATION_MS: i64 = 60 * 1000;
/// Longest lottery a command may create.
pub const MAX_DURATION_MS: i64 = 24 * 60 * 60 * 1000;
/// Hard cap on winners per draw.
pub const MAX_WINNERS: u32 = 10;

/// Window after `end_time` inside which a crashed process must still replay
/// a missing winner announcement on restart.
pub const ANNOUNCEMENT_GRACE_MS: i64 = 10 * 60 * 1000;
/// Lead time for the one-shot "ending soon" participant notification.
pub const ENDING_SOON_LEAD_MS: i64 = 15 * 60 * 1000;

pub const DEFAULT_TERMS: &str = "Winner must have an active C61 account, or a redraw occurs!";

// --- UI REFRESH CADENCE ---
// Coarse far from the deadline, ramping down inside the final minute.

pub const REFRESH_DEFAULT_MS: u64 = 30_000;
pub const REFRESH_LAST_HOUR_MS: u64 = 15_000;
pub const REFRESH_LAST_FIVE_MIN_MS: u64 = 5_000;
pub const REFRESH_LAST_MINUTE_MS: u64 = 1_000;

pub const ONE_MINUTE_MS: i64 = 60 * 1000;
pub const FIVE_MINUTES_MS: i64 = 5 * 60 * 1000;
pub const ONE_HOUR_MS: i64 = 60 * 60 * 1000;
