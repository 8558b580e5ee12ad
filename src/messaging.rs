//! Messaging collaborator contract. The engine hands over record snapshots
//! and typed notices; rendering embeds, mentions and button rows is entirely
//! the host's business. The core never produces user-facing text.

use async_trait::async_trait;

use crate::errors::Result;
use crate::state::{Lottery, MessageRef, UserId};

/// Direct-notification payloads. Each maps to one DM the host renders.
#[derive(Debug)]
pub enum Notice<'a> {
    /// Sent after a successful join or ticket purchase.
    JoinConfirmed { lottery: &'a Lottery, tickets: u32 },
    /// Sent to every participant shortly before the deadline.
    EndingSoon { lottery: &'a Lottery, tickets: u32 },
    /// Sent to each winner after the draw.
    Winner { lottery: &'a Lottery },
}

#[async_trait]
pub trait Messenger: Send + Sync {
    /// Re-renders the live lottery card. Returns `false` when the surface
    /// no longer exists (message deleted, channel gone); the engine then
    /// stops refreshing and closes the lottery defensively.
    async fn update_message(&self, location: &MessageRef, lottery: &Lottery) -> bool;

    /// Posts the one-time conclusion announcement. An empty `winners` slice
    /// means the lottery closed without a valid draw (insufficient
    /// participants). Errors are surfaced so the announcement can be
    /// replayed by reconciliation.
    async fn post_announcement(&self, lottery: &Lottery, winners: &[UserId]) -> Result<()>;

    /// Fire-and-forget DM. Returns `false` when the user was unreachable.
    async fn send_direct_notification(&self, user: &UserId, notice: Notice<'_>) -> bool;
}
