//! Skull currency: the ledger seam the engine calls around paid joins and
//! refunds, plus the shipped redb-backed implementation.
//!
//! The engine never stores balances itself; it only requires that `debit`
//! is an atomic check-and-deduct and `transfer` moves both sides in one
//! serializable step, so concurrent gifts cannot lose updates.

use std::sync::Arc;

use async_trait::async_trait;
use redb::{Database, ReadableTable, TableDefinition};

use crate::errors::Result;
use crate::state::UserId;

const SKULLS: TableDefinition<&str, u64> = TableDefinition::new("skulls");

#[async_trait]
pub trait CurrencyLedger: Send + Sync {
    async fn balance(&self, user: &UserId) -> Result<u64>;

    async fn has_sufficient(&self, user: &UserId, amount: u64) -> Result<bool> {
        Ok(self.balance(user).await? >= amount)
    }

    /// Atomic check-and-deduct. Returns `false` (without mutating) when the
    /// balance does not cover `amount`.
    async fn debit(&self, user: &UserId, amount: u64) -> Result<bool>;

    /// Adds to a balance, creating the account if needed. Returns the new
    /// balance.
    async fn credit(&self, user: &UserId, amount: u64) -> Result<u64>;

    /// Moves `amount` between users as a single serializable operation.
    /// Returns `false` when the sender cannot cover it.
    async fn transfer(&self, from: &UserId, to: &UserId, amount: u64) -> Result<bool>;
}

/// redb-backed skull ledger. All writes run inside one write transaction,
/// which is what makes `debit` and `transfer` atomic.
pub struct SkullBank {
    db: Arc<Database>,
}

impl SkullBank {
    pub fn new(db: Arc<Database>) -> Result<Self> {
        let txn = db.begin_write()?;
        txn.open_table(SKULLS)?;
        txn.commit()?;
        Ok(Self { db })
    }
}

#[async_trait]
impl CurrencyLedger for SkullBank {
    async fn balance(&self, user: &UserId) -> Result<u64> {
        let txn = self.db.begin_read()?;
        let table = txn.open_table(SKULLS)?;
        let balance = table.get(user.0.as_str())?.map(|g| g.value()).unwrap_or(0);
        Ok(balance)
    }

    async fn debit(&self, user: &UserId, amount: u64) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let covered = {
            let mut table = txn.open_table(SKULLS)?;
            let current = table.get(user.0.as_str())?.map(|g| g.value()).unwrap_or(0);
            if current < amount {
                false
            } else {
                table.insert(user.0.as_str(), current - amount)?;
                true
            }
        };
        if covered {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(covered)
    }

    async fn credit(&self, user: &UserId, amount: u64) -> Result<u64> {
        let txn = self.db.begin_write()?;
        let new_balance = {
            let mut table = txn.open_table(SKULLS)?;
            let current = table.get(user.0.as_str())?.map(|g| g.value()).unwrap_or(0);
            let next = current.saturating_add(amount);
            table.insert(user.0.as_str(), next)?;
            next
        };
        txn.commit()?;
        Ok(new_balance)
    }

    async fn transfer(&self, from: &UserId, to: &UserId, amount: u64) -> Result<bool> {
        let txn = self.db.begin_write()?;
        let covered = {
            let mut table = txn.open_table(SKULLS)?;
            let from_balance = table.get(from.0.as_str())?.map(|g| g.value()).unwrap_or(0);
            if from_balance < amount {
                false
            } else {
                let to_balance = table.get(to.0.as_str())?.map(|g| g.value()).unwrap_or(0);
                table.insert(from.0.as_str(), from_balance - amount)?;
                table.insert(to.0.as_str(), to_balance.saturating_add(amount))?;
                true
            }
        };
        if covered {
            txn.commit()?;
        } else {
            txn.abort()?;
        }
        Ok(covered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::open_database;

    fn bank() -> (tempfile::TempDir, SkullBank) {
        let dir = tempfile::tempdir().unwrap();
        let db = open_database(dir.path().join("skulls.redb")).unwrap();
        let bank = SkullBank::new(db).unwrap();
        (dir, bank)
    }

    #[tokio::test]
    async fn debit_refuses_overdraft_without_mutating() {
        let (_dir, bank) = bank();
        let user = UserId::from("u1");

        bank.credit(&user, 10).await.unwrap();
        assert!(!bank.debit(&user, 11).await.unwrap());
        assert_eq!(bank.balance(&user).await.unwrap(), 10);

        assert!(bank.debit(&user, 10).await.unwrap());
        assert_eq!(bank.balance(&user).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn transfer_moves_both_sides_or_neither() {
        let (_dir, bank) = bank();
        let alice = UserId::from("alice");
        let bob = UserId::from("bob");

        bank.credit(&alice, 25).await.unwrap();
        assert!(bank.transfer(&alice, &bob, 20).await.unwrap());
        assert_eq!(bank.balance(&alice).await.unwrap(), 5);
        assert_eq!(bank.balance(&bob).await.unwrap(), 20);

        assert!(!bank.transfer(&alice, &bob, 6).await.unwrap());
        assert_eq!(bank.balance(&alice).await.unwrap(), 5);
        assert_eq!(bank.balance(&bob).await.unwrap(), 20);
    }

    #[tokio::test]
    async fn unknown_user_has_zero_balance() {
        let (_dir, bank) = bank();
        assert_eq!(bank.balance(&UserId::from("ghost")).await.unwrap(), 0);
        assert!(!bank.has_sufficient(&UserId::from("ghost"), 1).await.unwrap());
    }
}
