//! Shared test doubles: a recording messenger, an in-memory skull ledger
//! and an event sink, wired around the in-memory repository.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use souldraw::events::{EventSink, LotteryEvent};
use souldraw::store::MemoryRepository;
use souldraw::{
    CurrencyLedger, EngineConfig, LifecycleEngine, Lottery, LotteryError, MessageRef, Messenger,
    Notice, Result, UserId,
};

#[derive(Default)]
pub struct StubMessenger {
    /// Flip to false to simulate a deleted lottery card.
    pub surface_alive: AtomicBool,
    /// Flip to false to simulate the announcement channel being down.
    pub announcement_ok: AtomicBool,
    /// Flip to true to yield before every call, like a real network client.
    pub slow: AtomicBool,
    pub card_updates: AtomicUsize,
    pub announcements: Mutex<Vec<(u64, Vec<String>)>>,
    pub dms: Mutex<Vec<(String, &'static str)>>,
}

impl StubMessenger {
    pub fn new() -> Self {
        Self {
            surface_alive: AtomicBool::new(true),
            announcement_ok: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub fn announcement_count(&self) -> usize {
        self.announcements.lock().unwrap().len()
    }

    pub fn dm_count_of_kind(&self, kind: &str) -> usize {
        self.dms
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, k)| *k == kind)
            .count()
    }

    async fn maybe_yield(&self) {
        if self.slow.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl Messenger for StubMessenger {
    async fn update_message(&self, _location: &MessageRef, _lottery: &Lottery) -> bool {
        self.maybe_yield().await;
        self.card_updates.fetch_add(1, Ordering::SeqCst);
        self.surface_alive.load(Ordering::SeqCst)
    }

    async fn post_announcement(&self, lottery: &Lottery, winners: &[UserId]) -> Result<()> {
        self.maybe_yield().await;
        if !self.announcement_ok.load(Ordering::SeqCst) {
            return Err(LotteryError::Persistence("announcement channel down".into()));
        }
        self.announcements
            .lock()
            .unwrap()
            .push((lottery.id.0, winners.iter().map(|w| w.0.clone()).collect()));
        Ok(())
    }

    async fn send_direct_notification(&self, user: &UserId, notice: Notice<'_>) -> bool {
        self.maybe_yield().await;
        let kind = match notice {
            Notice::JoinConfirmed { .. } => "join",
            Notice::EndingSoon { .. } => "ending_soon",
            Notice::Winner { .. } => "winner",
        };
        self.dms.lock().unwrap().push((user.0.clone(), kind));
        true
    }
}

#[derive(Default)]
pub struct TestLedger {
    pub balances: Mutex<HashMap<String, u64>>,
    /// Flip to true to yield before every call, like a real backend.
    pub slow: AtomicBool,
}

impl TestLedger {
    pub fn seeded(entries: &[(&str, u64)]) -> Self {
        let ledger = Self::default();
        {
            let mut balances = ledger.balances.lock().unwrap();
            for (user, amount) in entries {
                balances.insert((*user).to_string(), *amount);
            }
        }
        ledger
    }

    pub fn balance_of(&self, user: &str) -> u64 {
        self.balances.lock().unwrap().get(user).copied().unwrap_or(0)
    }

    async fn maybe_yield(&self) {
        if self.slow.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }
}

#[async_trait]
impl CurrencyLedger for TestLedger {
    async fn balance(&self, user: &UserId) -> Result<u64> {
        self.maybe_yield().await;
        Ok(self.balance_of(&user.0))
    }

    async fn debit(&self, user: &UserId, amount: u64) -> Result<bool> {
        self.maybe_yield().await;
        let mut balances = self.balances.lock().unwrap();
        let current = balances.get(&user.0).copied().unwrap_or(0);
        if current < amount {
            return Ok(false);
        }
        balances.insert(user.0.clone(), current - amount);
        Ok(true)
    }

    async fn credit(&self, user: &UserId, amount: u64) -> Result<u64> {
        self.maybe_yield().await;
        let mut balances = self.balances.lock().unwrap();
        let next = balances.get(&user.0).copied().unwrap_or(0) + amount;
        balances.insert(user.0.clone(), next);
        Ok(next)
    }

    async fn transfer(&self, from: &UserId, to: &UserId, amount: u64) -> Result<bool> {
        self.maybe_yield().await;
        let mut balances = self.balances.lock().unwrap();
        let from_balance = balances.get(&from.0).copied().unwrap_or(0);
        if from_balance < amount {
            return Ok(false);
        }
        let to_balance = balances.get(&to.0).copied().unwrap_or(0);
        balances.insert(from.0.clone(), from_balance - amount);
        balances.insert(to.0.clone(), to_balance + amount);
        Ok(true)
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<LotteryEvent>>,
}

impl EventSink for RecordingSink {
    fn publish(&self, event: LotteryEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub engine: Arc<LifecycleEngine>,
    pub repo: Arc<MemoryRepository>,
    pub messenger: Arc<StubMessenger>,
    pub ledger: Arc<TestLedger>,
    pub sink: Arc<RecordingSink>,
}

pub fn harness_on(repo: Arc<MemoryRepository>, ledger: Arc<TestLedger>) -> Harness {
    let messenger = Arc::new(StubMessenger::new());
    let sink = Arc::new(RecordingSink::default());
    let engine = LifecycleEngine::new(
        repo.clone(),
        messenger.clone(),
        ledger.clone(),
        sink.clone(),
        EngineConfig::default(),
    );
    Harness {
        engine,
        repo,
        messenger,
        ledger,
        sink,
    }
}

pub fn harness() -> Harness {
    harness_on(
        Arc::new(MemoryRepository::new()),
        Arc::new(TestLedger::default()),
    )
}

pub fn location() -> MessageRef {
    MessageRef {
        channel_id: "chan-1".into(),
        message_id: "msg-1".into(),
    }
}
