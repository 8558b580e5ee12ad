use tracing::info;

use crate::errors::{LotteryError, Result};
use crate::events::LotteryEvent;
use crate::state::{Lottery, LotteryId, LotteryStatus};

use super::LifecycleEngine;

impl LifecycleEngine {
    /// Admin cancellation. Valid from any non-terminal status; invalidates
    /// every armed timer so the cancelled record can never fire a draw or a
    /// notification, and refunds ticket holders.
    pub async fn cancel(&self, id: LotteryId) -> Result<Lottery> {
        let snapshot = {
            let mut store = self.store.lock().await;
            let current = store.get(id).ok_or(LotteryError::NotFound(id))?;
            if current.status.is_terminal() {
                return Err(LotteryError::invalid_state(
                    id,
                    current.status,
                    "a non-terminal status",
                ));
            }
            store.update(id, |l| l.status = LotteryStatus::Cancelled)?.clone()
        };

        self.scheduler.disarm_all(id);
        self.events
            .publish(LotteryEvent::LotteryCancelled { lottery: id });
        info!(lottery = %id, "lottery cancelled");
        self.refund_participants(&snapshot).await;
        Ok(snapshot)
    }
}
