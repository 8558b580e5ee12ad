//! Lottery lifecycle core for a Discord community bot.
//!
//! The crate owns the two layers with real invariants: the [`store`] (the
//! single source of truth for lottery records, write-through to a durable
//! redb file) and the [`engine`] (status transitions, timers, weighted
//! winner selection, and restart reconciliation). Everything user-facing,
//! such as slash commands, embeds and role gating, lives behind the collaborator
//! traits in [`messaging`], [`ledger`] and [`events`] and is supplied by the
//! host process.

pub mod config;
pub mod constants;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod messaging;
pub mod scheduler;
pub mod state;
pub mod store;

pub use config::EngineConfig;
pub use engine::{DrawOutcome, LifecycleEngine, ReconcileReport};
pub use errors::{LotteryError, Result};
pub use ledger::CurrencyLedger;
pub use messaging::{Messenger, Notice};
pub use state::{CreateLottery, DrawMode, Lottery, LotteryId, LotteryStatus, MessageRef, UserId};
pub use store::{LotteryRepository, LotteryStore};
