use thiserror::Error;

use crate::state::{LotteryId, LotteryStatus};

pub type Result<T> = std::result::Result<T, LotteryError>;

#[derive(Debug, Error)]
pub enum LotteryError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("lottery {0} not found")]
    NotFound(LotteryId),

    #[error("lottery {id} is {actual}, operation requires {needed}")]
    InvalidState {
        id: LotteryId,
        actual: LotteryStatus,
        needed: &'static str,
    },

    #[error("durable store failure: {0}")]
    Persistence(String),

    #[error("already participating in this lottery")]
    AlreadyParticipating,

    #[error("ticket limit exceeded: holding {held}, requested {requested}, cap {cap}")]
    TicketLimit { held: u32, requested: u32, cap: u32 },

    #[error("insufficient balance: {needed} required")]
    InsufficientFunds { needed: u64 },
}

impl LotteryError {
    pub(crate) fn invalid_state(id: LotteryId, actual: LotteryStatus, needed: &'static str) -> Self {
        Self::InvalidState { id, actual, needed }
    }
}

macro_rules! persistence_from {
    ($($err:ty),* $(,)?) => {
        $(
            impl From<$err> for LotteryError {
                fn from(err: $err) -> Self {
                    LotteryError::Persistence(err.to_string())
                }
            }
        )*
    };
}

persistence_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
    serde_json::Error,
);
