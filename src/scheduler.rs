//! Single timer authority for the lifecycle engine.
//!
//! Every timed side effect (deadline fire, ending-soon notice, UI refresh
//! loop) is a tokio task registered here under `(lottery, kind)`. Terminal
//! transitions call [`Scheduler::disarm_all`], which is the one place that
//! enforces the invariant that an orphaned timer never fires against a
//! finished record.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::{self, JoinHandle};

use crate::state::LotteryId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-shot at `end_time`.
    Deadline,
    /// One-shot at `end_time - ending_soon_lead`.
    EndingSoon,
    /// Recurring UI re-render loop.
    Refresh,
}

#[derive(Default)]
pub struct Scheduler {
    tasks: Mutex<HashMap<(LotteryId, TimerKind), JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms a one-shot timer. Re-arming the same key replaces (and aborts)
    /// the previous timer.
    pub fn arm<F>(&self, id: LotteryId, kind: TimerKind, delay: Duration, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire.await;
        });
        self.register(id, kind, handle);
    }

    /// Registers a free-running task (the refresh loop manages its own
    /// sleeps) under a timer key so terminal transitions can abort it.
    pub fn spawn<F>(&self, id: LotteryId, kind: TimerKind, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(task);
        self.register(id, kind, handle);
    }

    fn register(&self, id: LotteryId, kind: TimerKind, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().expect("scheduler lock");
        if let Some(previous) = tasks.insert((id, kind), handle) {
            Self::abort(previous);
        }
    }

    /// A fired timer disarms its own key while its fire path is still
    /// running; aborting that handle would cancel the remainder of the fire
    /// path at its next suspension. Deregister it, abort only other tasks.
    fn abort(handle: JoinHandle<()>) {
        if task::try_id() != Some(handle.id()) {
            handle.abort();
        }
    }

    pub fn disarm(&self, id: LotteryId, kind: TimerKind) {
        if let Some(handle) = self.tasks.lock().expect("scheduler lock").remove(&(id, kind)) {
            Self::abort(handle);
        }
    }

    pub fn disarm_all(&self, id: LotteryId) {
        let mut tasks = self.tasks.lock().expect("scheduler lock");
        for kind in [TimerKind::Deadline, TimerKind::EndingSoon, TimerKind::Refresh] {
            if let Some(handle) = tasks.remove(&(id, kind)) {
                Self::abort(handle);
            }
        }
    }

    /// Whether a live (registered and unfinished) timer exists for the key.
    pub fn armed(&self, id: LotteryId, kind: TimerKind) -> bool {
        self.tasks
            .lock()
            .expect("scheduler lock")
            .get(&(id, kind))
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Aborts everything. Used on shutdown.
    pub fn clear(&self) {
        let mut tasks = self.tasks.lock().expect("scheduler lock");
        for (_, handle) in tasks.drain() {
            Self::abort(handle);
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.clear();
    }
}
