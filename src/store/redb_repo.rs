//! redb-backed durable repository. Rows are serialized with serde_json and
//! keyed by lottery id; the reconciliation query is a table scan, which is
//! fine at community-bot scale.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::errors::{LotteryError, Result};
use crate::state::LotteryRow;

use super::memory::needs_reconciliation;
use super::LotteryRepository;

const LOTTERIES: TableDefinition<u64, &[u8]> = TableDefinition::new("lotteries");

/// Opens (or creates) the backing database file shared by the lottery
/// repository and the skull bank.
pub fn open_database(path: impl AsRef<Path>) -> Result<Arc<Database>> {
    let db = Database::create(path)?;
    Ok(Arc::new(db))
}

pub struct RedbRepository {
    db: Arc<Database>,
}

impl RedbRepository {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        // Create the table eagerly so reads on a fresh file see an empty
        // table instead of a missing one.
        let txn = db.begin_write()?;
        txn.open_table(LOTTERIES)?;
        txn.commit()?;
        Ok(Self { db })
    }

    fn write(&self, row: &LotteryRow) -> Result<()> {
        let bytes = serde_json::to_vec(row)?;
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(LOTTERIES)?;
            table.insert(row.id, bytes.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }
}

impl LotteryRepository for RedbRepository {
    fn insert(&self, row: &LotteryRow) -> Result<()> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(LOTTERIES)?;
        if table.get(row.id)?.is_some() {
            return Err(LotteryError::Persistence(format!(
                "row {} already exists",
                row.id
            )));
        }
        drop(table);
        self.write(row)
    }

    fn update(&self, row: &LotteryRow) -> Result<()> {
        self.write(row)
    }

    fn list_for_reconciliation(&self, now_ms: i64, grace_ms: i64) -> Result<Vec<LotteryRow>> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(LOTTERIES)?;
        let mut rows = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            let row: LotteryRow = serde_json::from_slice(value.value())?;
            if needs_reconciliation(&row, now_ms, grace_ms) {
                rows.push(row);
            }
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::state::{DrawMode, LotteryStatus};

    fn row(id: u64, status: LotteryStatus, end_time: i64) -> LotteryRow {
        LotteryRow {
            id,
            prize: "prize".into(),
            winner_count: 1,
            min_participants: 1,
            ticket_price: 0,
            max_tickets_per_user: 1,
            terms: String::new(),
            created_by: "admin".into(),
            guild_id: "g".into(),
            start_time: 0,
            end_time,
            status,
            draw_mode: DrawMode::Auto,
            participants: BTreeMap::new(),
            total_tickets: 0,
            winner_list: Vec::new(),
            winner_announced: false,
            location: None,
        }
    }

    #[test]
    fn rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("souldraw.redb");

        {
            let repo = RedbRepository::new(open_database(&path).unwrap()).unwrap();
            repo.insert(&row(1, LotteryStatus::Active, 5_000)).unwrap();
        }

        let repo = RedbRepository::new(open_database(&path).unwrap()).unwrap();
        let rows = repo.list_for_reconciliation(0, 0).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, 1);
    }

    #[test]
    fn reconciliation_query_filters_by_status_and_grace() {
        let dir = tempfile::tempdir().unwrap();
        let repo =
            RedbRepository::new(open_database(dir.path().join("db.redb")).unwrap()).unwrap();

        repo.insert(&row(1, LotteryStatus::Active, 10_000)).unwrap();
        repo.insert(&row(2, LotteryStatus::Expired, 1_000)).unwrap();
        // Ended recently: inside the grace window.
        repo.insert(&row(3, LotteryStatus::Ended, 9_500)).unwrap();
        // Ended long ago: outside the window.
        repo.insert(&row(4, LotteryStatus::Ended, 1_000)).unwrap();
        repo.insert(&row(5, LotteryStatus::Cancelled, 9_900)).unwrap();
        repo.insert(&row(6, LotteryStatus::Pending, 20_000)).unwrap();

        let now = 10_000;
        let grace = 2_000;
        let mut ids: Vec<u64> = repo
            .list_for_reconciliation(now, grace)
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_insert_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let repo =
            RedbRepository::new(open_database(dir.path().join("db.redb")).unwrap()).unwrap();
        repo.insert(&row(1, LotteryStatus::Pending, 1)).unwrap();
        assert!(repo.insert(&row(1, LotteryStatus::Pending, 1)).is_err());
    }
}
