//! Lifecycle Engine: owns status transitions, timers, weighted winner
//! selection and restart reconciliation. Messaging, currency and analytics
//! are injected collaborators; the engine holds the only mutable authority
//! over lottery records.
//!
//! Concurrency contract: every record mutation runs under `store`'s mutex
//! and is held across the durable write-through, so a draw seals the ticket
//! pool before any join can interleave. Collaborator I/O happens on
//! snapshots after the lock is released, and each post-suspension step
//! re-reads the record, treating "no longer active" as a normal abort.

mod activate;
mod cancel;
mod create;
mod draw;
mod participants;
mod reconcile;
mod refresh;

use std::sync::{Arc, Mutex as StdMutex, Weak};

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::events::EventSink;
use crate::ledger::CurrencyLedger;
use crate::messaging::{Messenger, Notice};
use crate::scheduler::{Scheduler, TimerKind};
use crate::state::{DrawMode, Lottery, LotteryId, LotteryStatus};
use crate::store::{LotteryRepository, LotteryStore};

pub use draw::{select_winners, DrawOutcome};
pub use reconcile::ReconcileReport;

pub struct LifecycleEngine {
    store: Mutex<LotteryStore>,
    scheduler: Scheduler,
    messenger: Arc<dyn Messenger>,
    ledger: Arc<dyn CurrencyLedger>,
    events: Arc<dyn EventSink>,
    config: EngineConfig,
    rng: StdMutex<SmallRng>,
    last_id: StdMutex<u64>,
    self_ref: Weak<LifecycleEngine>,
}

impl LifecycleEngine {
    /// Constructs the single engine instance for the process. Callers keep
    /// the returned handle and pass clones to every surface that needs it.
    pub fn new(
        repo: Arc<dyn LotteryRepository>,
        messenger: Arc<dyn Messenger>,
        ledger: Arc<dyn CurrencyLedger>,
        events: Arc<dyn EventSink>,
        config: EngineConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            store: Mutex::new(LotteryStore::new(repo)),
            scheduler: Scheduler::new(),
            messenger,
            ledger,
            events,
            config,
            rng: StdMutex::new(SmallRng::from_entropy()),
            last_id: StdMutex::new(0),
            self_ref: weak.clone(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Snapshot of a cached record.
    pub async fn get(&self, id: LotteryId) -> Option<Lottery> {
        self.store.lock().await.get(id).cloned()
    }

    pub async fn list_by_status(&self, status: LotteryStatus) -> Vec<Lottery> {
        self.store
            .lock()
            .await
            .list_by_status(status)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Whether a live timer exists for the record. Mostly for tests and the
    /// status surface.
    pub fn timer_armed(&self, id: LotteryId, kind: TimerKind) -> bool {
        self.scheduler.armed(id, kind)
    }

    /// Aborts every scheduled timer. The durable store keeps the records;
    /// the next start reconciles.
    pub fn shutdown(&self) {
        self.scheduler.clear();
    }

    fn handle(&self) -> Arc<Self> {
        self.self_ref.upgrade().expect("engine dropped while in use")
    }

    pub(crate) fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn next_id(&self, now_ms: i64) -> LotteryId {
        let mut last = self.last_id.lock().expect("id lock");
        let id = (now_ms.max(0) as u64).max(*last + 1);
        *last = id;
        LotteryId(id)
    }

    /// Deadline-fire path. Safe to invoke against any record: anything that
    /// is not `active` anymore makes the fire a no-op.
    pub async fn finalize_deadline(&self, id: LotteryId) {
        let mut store = self.store.lock().await;
        let mode = match store.get(id) {
            Some(lottery) if lottery.status == LotteryStatus::Active => lottery.draw_mode,
            _ => return,
        };

        if mode == DrawMode::Manual {
            // The waiting state: draw deferred until an explicit command.
            if let Err(error) = store.update(id, |l| l.status = LotteryStatus::Expired) {
                warn!(lottery = %id, %error, "could not persist expiry; reconcile will retry");
                return;
            }
            drop(store);
            self.scheduler.disarm_all(id);
            info!(lottery = %id, "deadline reached; awaiting manual draw");
            return;
        }

        drop(store);
        match self.draw(id).await {
            Ok(DrawOutcome::Winners(_)) | Ok(DrawOutcome::AlreadyDrawn(_)) => {}
            Ok(DrawOutcome::InsufficientParticipants { have, need }) => {
                info!(lottery = %id, have, need, "ending without winners");
                self.close_without_draw(id).await;
            }
            Err(error) => {
                warn!(lottery = %id, %error, "deadline draw failed; reconcile will retry");
            }
        }
    }

    /// Terminal transition for a lottery that cannot hold a valid draw:
    /// ends it with an empty winner list and refunds ticket holders.
    pub(crate) async fn close_without_draw(&self, id: LotteryId) {
        let snapshot = {
            let mut store = self.store.lock().await;
            let open = store.get(id).map_or(false, |l| {
                matches!(l.status, LotteryStatus::Active | LotteryStatus::Expired)
            });
            if !open {
                return;
            }
            match store.update(id, |l| l.status = LotteryStatus::Ended) {
                Ok(updated) => updated.clone(),
                Err(error) => {
                    warn!(lottery = %id, %error, "could not close lottery; reconcile will retry");
                    return;
                }
            }
        };
        self.scheduler.disarm_all(id);
        self.refund_participants(&snapshot).await;
        self.announce_result(id).await;
    }

    /// Credits every ticket holder their stake back. Failures are logged;
    /// a refund is never allowed to wedge a terminal transition.
    pub(crate) async fn refund_participants(&self, lottery: &Lottery) {
        if lottery.ticket_price == 0 {
            return;
        }
        for (user, tickets) in &lottery.participants {
            let amount = u64::from(*tickets) * lottery.ticket_price;
            if let Err(error) = self.ledger.credit(user, amount).await {
                warn!(lottery = %lottery.id, %user, amount, %error, "refund failed");
            }
        }
    }

    /// One-time conclusion announcement, guarded by `winner_announced` so a
    /// crash between the post and the flag write replays at most once more.
    pub(crate) async fn announce_result(&self, id: LotteryId) {
        let snapshot = {
            let store = self.store.lock().await;
            match store.get(id) {
                Some(l) if l.status == LotteryStatus::Ended && !l.winner_announced => l.clone(),
                _ => return,
            }
        };

        if let Err(error) = self
            .messenger
            .post_announcement(&snapshot, &snapshot.winner_list)
            .await
        {
            warn!(lottery = %id, %error, "announcement failed; will replay on next reconcile");
            return;
        }

        {
            let mut store = self.store.lock().await;
            if let Err(error) = store.update(id, |l| l.winner_announced = true) {
                warn!(lottery = %id, %error, "could not persist announcement flag");
            }
        }

        for winner in &snapshot.winner_list {
            let delivered = self
                .messenger
                .send_direct_notification(winner, Notice::Winner { lottery: &snapshot })
                .await;
            if !delivered {
                debug!(lottery = %id, user = %winner, "winner unreachable by DM");
            }
        }
    }
}
