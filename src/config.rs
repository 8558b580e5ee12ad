use serde::Deserialize;

use crate::constants::{
    ANNOUNCEMENT_GRACE_MS, DEFAULT_TERMS, ENDING_SOON_LEAD_MS, MAX_DURATION_MS, MAX_WINNERS,
    MIN_DURATION_MS,
};

/// Tunables for the lifecycle engine. Deserializable so a host binary can
/// layer file or environment configuration over the defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub min_duration_ms: i64,
    pub max_duration_ms: i64,
    pub max_winners: u32,
    /// Window after `end_time` inside which a restart replays a missing
    /// winner announcement.
    pub announcement_grace_ms: i64,
    /// Lead time before `end_time` for the "ending soon" notification.
    pub ending_soon_lead_ms: i64,
    /// Terms attached to a lottery when the creator supplies none.
    pub default_terms: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: MIN_DURATION_MS,
            max_duration_ms: MAX_DURATION_MS,
            max_winners: MAX_WINNERS,
            announcement_grace_ms: ANNOUNCEMENT_GRACE_MS,
            ending_soon_lead_ms: ENDING_SOON_LEAD_MS,
            default_terms: DEFAULT_TERMS.to_string(),
        }
    }
}
