use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Time-based lottery identifier (epoch milliseconds, bumped on collision).
/// Immutable once issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LotteryId(pub u64);

impl fmt::Display for LotteryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Discord user snowflake, kept opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LotteryStatus {
    /// Created, awaiting explicit confirmation.
    Pending,
    /// Accepting participants, timer armed.
    Active,
    /// Terminal: drawn (or closed without winners).
    Ended,
    /// Deadline passed on a manual-draw lottery; waiting for the draw command.
    Expired,
    /// Terminal: cancelled by an admin.
    Cancelled,
}

impl LotteryStatus {
    /// No transition ever leaves `Ended` or `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(self, LotteryStatus::Ended | LotteryStatus::Cancelled)
    }
}

impl fmt::Display for LotteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LotteryStatus::Pending => "pending",
            LotteryStatus::Active => "active",
            LotteryStatus::Ended => "ended",
            LotteryStatus::Expired => "expired",
            LotteryStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawMode {
    /// Draw fires automatically when the deadline timer lands.
    Auto,
    /// Deadline flips the lottery to `Expired`; the draw waits for a command.
    Manual,
}

/// Where the live lottery card lives on the Discord side. Owned by the
/// messaging collaborator; stored on the record only so reconciliation can
/// resume the refresh loop after a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub channel_id: String,
    pub message_id: String,
}

/// Parameters for creating a lottery. Draw mode is chosen at activation.
#[derive(Debug, Clone)]
pub struct CreateLottery {
    pub prize: String,
    pub winner_count: u32,
    /// Defaults to `winner_count` when unset.
    pub min_participants: Option<u32>,
    pub duration_ms: i64,
    /// `0` means free entry: one ticket per participant, no currency moves.
    pub ticket_price: u64,
    pub max_tickets_per_user: u32,
    pub terms: Option<String>,
    pub created_by: UserId,
    pub guild_id: String,
}

/// The aggregate root. One timed draw event with a prize, a deadline and a
/// participant ticket ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Lottery {
    pub id: LotteryId,
    pub prize: String,
    pub winner_count: u32,
    pub min_participants: u32,
    pub ticket_price: u64,
    pub max_tickets_per_user: u32,
    pub terms: String,
    pub created_by: UserId,
    pub guild_id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub status: LotteryStatus,
    pub draw_mode: DrawMode,
    pub participants: BTreeMap<UserId, u32>,
    /// Cached `Σ participants.values()`; must hold after every mutation.
    pub total_tickets: u64,
    /// Draw order, populated exactly once. Display-only ordering.
    pub winner_list: Vec<UserId>,
    /// Guards the one-time announcement side effect across restarts.
    pub winner_announced: bool,
    pub location: Option<MessageRef>,
}

impl Lottery {
    pub fn tickets_of(&self, user: &UserId) -> u32 {
        self.participants.get(user).copied().unwrap_or(0)
    }

    pub fn ticket_sum(&self) -> u64 {
        self.participants.values().map(|t| u64::from(*t)).sum()
    }

    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.end_time - now_ms).max(0)
    }

    /// Probability of the user winning a single pick, as a percentage.
    pub fn win_chance(&self, user: &UserId) -> f64 {
        if self.total_tickets == 0 {
            return 0.0;
        }
        f64::from(self.tickets_of(user)) / self.total_tickets as f64 * 100.0
    }

    #[cfg(debug_assertions)]
    pub(crate) fn assert_ticket_ledger(&self) {
        debug_assert_eq!(
            self.total_tickets,
            self.ticket_sum(),
            "total_tickets out of sync for lottery {}",
            self.id
        );
    }

    #[cfg(not(debug_assertions))]
    pub(crate) fn assert_ticket_ledger(&self) {}
}
