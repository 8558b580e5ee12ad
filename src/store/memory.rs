//! In-memory repository for tests and ephemeral runs. Same visibility rules
//! as the redb backend, no durability.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::errors::{LotteryError, Result};
use crate::state::{LotteryRow, LotteryStatus};

use super::LotteryRepository;

#[derive(Default)]
pub struct MemoryRepository {
    rows: Mutex<BTreeMap<u64, LotteryRow>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test hook: reads a row back the way a restarted process would.
    pub fn fetch(&self, id: u64) -> Option<LotteryRow> {
        self.rows.lock().expect("repo lock").get(&id).cloned()
    }
}

impl LotteryRepository for MemoryRepository {
    fn insert(&self, row: &LotteryRow) -> Result<()> {
        let mut rows = self.rows.lock().expect("repo lock");
        if rows.contains_key(&row.id) {
            return Err(LotteryError::Persistence(format!(
                "row {} already exists",
                row.id
            )));
        }
        rows.insert(row.id, row.clone());
        Ok(())
    }

    fn update(&self, row: &LotteryRow) -> Result<()> {
        self.rows
            .lock()
            .expect("repo lock")
            .insert(row.id, row.clone());
        Ok(())
    }

    fn list_for_reconciliation(&self, now_ms: i64, grace_ms: i64) -> Result<Vec<LotteryRow>> {
        let rows = self.rows.lock().expect("repo lock");
        Ok(rows
            .values()
            .filter(|row| needs_reconciliation(row, now_ms, grace_ms))
            .cloned()
            .collect())
    }
}

pub(crate) fn needs_reconciliation(row: &LotteryRow, now_ms: i64, grace_ms: i64) -> bool {
    match row.status {
        LotteryStatus::Active | LotteryStatus::Expired => true,
        LotteryStatus::Ended => row.end_time > now_ms - grace_ms,
        LotteryStatus::Pending | LotteryStatus::Cancelled => false,
    }
}
