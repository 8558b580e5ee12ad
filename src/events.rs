//! Analytics events. Published fire-and-forget at the same points the
//! lifecycle persists a transition; sinks must not block.

use crate::state::{LotteryId, UserId};

#[derive(Debug, Clone, PartialEq)]
pub enum LotteryEvent {
    LotteryActivated {
        lottery: LotteryId,
        end_time: i64,
    },
    ParticipantJoined {
        lottery: LotteryId,
        user: UserId,
        tickets: u32,
    },
    ParticipantRemoved {
        lottery: LotteryId,
        user: UserId,
        tickets: u32,
    },
    WinnersDrawn {
        lottery: LotteryId,
        winners: Vec<UserId>,
    },
    LotteryCancelled {
        lottery: LotteryId,
    },
}

pub trait EventSink: Send + Sync {
    fn publish(&self, event: LotteryEvent);
}

/// Sink for hosts that do not collect analytics.
pub struct NoopSink;

impl EventSink for NoopSink {
    fn publish(&self, _event: LotteryEvent) {}
}
