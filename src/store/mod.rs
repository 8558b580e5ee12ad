//! Lottery Store: the single source of truth for lottery records.
//!
//! An in-memory map fronts a durable [`LotteryRepository`]. Every mutation
//! writes through before it becomes visible in memory; a failed durable
//! write leaves the cache untouched, so cache and store never diverge.

pub mod memory;
pub mod redb_repo;

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{LotteryError, Result};
use crate::state::{Lottery, LotteryId, LotteryRow, LotteryStatus};

pub use memory::MemoryRepository;
pub use redb_repo::{open_database, RedbRepository};

/// Durable backend seam. Implementations must survive process restarts.
pub trait LotteryRepository: Send + Sync {
    fn insert(&self, row: &LotteryRow) -> Result<()>;
    fn update(&self, row: &LotteryRow) -> Result<()>;
    /// All rows the engine must reconsider after a restart: non-terminal
    /// (`active`, `expired`) plus `ended` rows still inside the
    /// announcement grace window.
    fn list_for_reconciliation(&self, now_ms: i64, grace_ms: i64) -> Result<Vec<LotteryRow>>;
}

pub struct LotteryStore {
    cache: HashMap<LotteryId, Lottery>,
    repo: Arc<dyn LotteryRepository>,
}

impl LotteryStore {
    pub fn new(repo: Arc<dyn LotteryRepository>) -> Self {
        Self {
            cache: HashMap::new(),
            repo,
        }
    }

    /// Persists a new record and admits it to the cache.
    pub fn insert(&mut self, lottery: Lottery) -> Result<()> {
        if self.cache.contains_key(&lottery.id) {
            return Err(LotteryError::Validation(format!(
                "lottery {} already exists",
                lottery.id
            )));
        }
        lottery.assert_ticket_ledger();
        self.repo.insert(&LotteryRow::from(&lottery))?;
        self.cache.insert(lottery.id, lottery);
        Ok(())
    }

    /// In-memory lookup only. The cache is populated at creation and at
    /// reconciliation time, never lazily from the durable store.
    pub fn get(&self, id: LotteryId) -> Option<&Lottery> {
        self.cache.get(&id)
    }

    /// Applies `mutate` to a copy, writes it through, and only then swaps
    /// the copy into the cache. A durable failure therefore rolls the
    /// in-memory state back by construction.
    pub fn update<F>(&mut self, id: LotteryId, mutate: F) -> Result<&Lottery>
    where
        F: FnOnce(&mut Lottery),
    {
        let current = self.cache.get(&id).ok_or(LotteryError::NotFound(id))?;
        let mut next = current.clone();
        mutate(&mut next);
        next.assert_ticket_ledger();
        self.repo.update(&LotteryRow::from(&next))?;
        self.cache.insert(id, next);
        Ok(&self.cache[&id])
    }

    pub fn list_by_status(&self, status: LotteryStatus) -> Vec<&Lottery> {
        self.cache
            .values()
            .filter(|lottery| lottery.status == status)
            .collect()
    }

    /// Seeds the cache from a persisted record during reconciliation.
    pub fn adopt(&mut self, lottery: Lottery) {
        lottery.assert_ticket_ledger();
        self.cache.insert(lottery.id, lottery);
    }

    pub fn list_for_reconciliation(&self, now_ms: i64, grace_ms: i64) -> Result<Vec<LotteryRow>> {
        self.repo.list_for_reconciliation(now_ms, grace_ms)
    }
}
