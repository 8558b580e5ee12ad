use tracing::info;

use crate::errors::Result;
use crate::state::{Lottery, LotteryStatus};

use super::LifecycleEngine;

/// What a reconciliation pass did, for the startup log and for tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Active lotteries whose deadline is still ahead; timers re-armed.
    pub resumed: usize,
    /// Active lotteries whose deadline passed while the process was down;
    /// ran the end-of-timer path.
    pub finalized: usize,
    /// Expired manual-draw lotteries re-registered without timers.
    pub awaiting_manual: usize,
    /// Ended lotteries whose announcement was replayed.
    pub replayed: usize,
}

impl LifecycleEngine {
    /// Restart recovery. Re-derives in-memory status and timers purely from
    /// persisted records and `now_ms`; draws that already produced a winner
    /// list are never recomputed, and announcements are replayed at most
    /// once thanks to the `winner_announced` guard.
    pub async fn reconcile(&self, now_ms: i64) -> Result<ReconcileReport> {
        let rows = {
            let store = self.store.lock().await;
            store.list_for_reconciliation(now_ms, self.config.announcement_grace_ms)?
        };

        let mut report = ReconcileReport::default();
        for row in rows {
            let lottery = Lottery::from(row);
            let id = lottery.id;
            match lottery.status {
                LotteryStatus::Active if lottery.end_time > now_ms => {
                    self.store.lock().await.adopt(lottery.clone());
                    // Same timers activation would arm, none of its
                    // one-time side effects.
                    self.arm_runtime(&lottery, now_ms);
                    report.resumed += 1;
                }
                LotteryStatus::Active => {
                    // Deadline passed while the process was down: run the
                    // exact end-of-timer path a live fire would have run.
                    self.store.lock().await.adopt(lottery);
                    self.finalize_deadline(id).await;
                    report.finalized += 1;
                }
                LotteryStatus::Expired => {
                    // Manual-draw waiting state: in memory, no timer.
                    self.store.lock().await.adopt(lottery);
                    report.awaiting_manual += 1;
                }
                LotteryStatus::Ended => {
                    let replay = !lottery.winner_announced;
                    self.store.lock().await.adopt(lottery);
                    if replay {
                        // Announcement only; the persisted draw result
                        // stands.
                        self.announce_result(id).await;
                        report.replayed += 1;
                    }
                }
                LotteryStatus::Pending | LotteryStatus::Cancelled => {}
            }
        }

        info!(
            resumed = report.resumed,
            finalized = report.finalized,
            awaiting_manual = report.awaiting_manual,
            replayed = report.replayed,
            "reconciliation complete"
        );
        Ok(report)
    }
}
