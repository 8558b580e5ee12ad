use std::time::Duration;

use tracing::{debug, info};

use crate::errors::{LotteryError, Result};
use crate::events::LotteryEvent;
use crate::messaging::Notice;
use crate::scheduler::TimerKind;
use crate::state::{DrawMode, Lottery, LotteryId, LotteryStatus, MessageRef};

use super::LifecycleEngine;

impl LifecycleEngine {
    /// Confirms a pending lottery: records the draw mode and the live card
    /// location, flips it to `active` and arms its timers.
    pub async fn activate(
        &self,
        id: LotteryId,
        draw_mode: DrawMode,
        location: MessageRef,
    ) -> Result<Lottery> {
        let now = Self::now_ms();
        let snapshot = {
            let mut store = self.store.lock().await;
            let current = store.get(id).ok_or(LotteryError::NotFound(id))?;
            if current.status != LotteryStatus::Pending {
                return Err(LotteryError::invalid_state(id, current.status, "pending"));
            }
            store
                .update(id, |l| {
                    l.status = LotteryStatus::Active;
                    l.draw_mode = draw_mode;
                    l.location = Some(location);
                })?
                .clone()
        };

        self.arm_runtime(&snapshot, now);
        self.events.publish(LotteryEvent::LotteryActivated {
            lottery: id,
            end_time: snapshot.end_time,
        });
        info!(lottery = %id, mode = ?draw_mode, end_time = snapshot.end_time, "lottery activated");
        Ok(snapshot)
    }

    /// Arms the deadline countdown, the ending-soon one-shot (when its
    /// instant is still ahead) and the refresh loop for an active record.
    /// Shared by activation and reconciliation; deliberately carries none
    /// of activation's one-time side effects.
    pub(crate) fn arm_runtime(&self, lottery: &Lottery, now_ms: i64) {
        let id = lottery.id;

        let engine = self.handle();
        self.scheduler.arm(
            id,
            TimerKind::Deadline,
            Duration::from_millis(lottery.remaining_ms(now_ms) as u64),
            async move {
                engine.finalize_deadline(id).await;
            },
        );

        let lead = lottery.end_time - self.config.ending_soon_lead_ms;
        if lead > now_ms {
            let engine = self.handle();
            self.scheduler.arm(
                id,
                TimerKind::EndingSoon,
                Duration::from_millis((lead - now_ms) as u64),
                async move {
                    engine.notify_ending_soon(id).await;
                },
            );
        }

        let engine = self.handle();
        self.scheduler.spawn(id, TimerKind::Refresh, async move {
            engine.run_refresh_loop(id).await;
        });
    }

    /// DMs every participant that the lottery closes soon. Best effort.
    pub(crate) async fn notify_ending_soon(&self, id: LotteryId) {
        let snapshot = {
            let store = self.store.lock().await;
            match store.get(id) {
                Some(l) if l.status == LotteryStatus::Active => l.clone(),
                _ => return,
            }
        };
        for (user, tickets) in &snapshot.participants {
            let delivered = self
                .messenger
                .send_direct_notification(
                    user,
                    Notice::EndingSoon {
                        lottery: &snapshot,
                        tickets: *tickets,
                    },
                )
                .await;
            if !delivered {
                debug!(lottery = %id, %user, "participant unreachable by DM");
            }
        }
    }
}
