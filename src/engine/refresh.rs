//! UI refresh cadence: ask the messaging collaborator to re-render the live
//! card on a ramp that tightens as the deadline approaches.

use std::time::Duration;

use tracing::{debug, warn};

use crate::constants::{
    FIVE_MINUTES_MS, ONE_HOUR_MS, ONE_MINUTE_MS, REFRESH_DEFAULT_MS, REFRESH_LAST_FIVE_MIN_MS,
    REFRESH_LAST_HOUR_MS, REFRESH_LAST_MINUTE_MS,
};
use crate::state::{LotteryId, LotteryStatus};

use super::LifecycleEngine;

pub(crate) fn refresh_interval(remaining_ms: i64) -> Duration {
    let ms = if remaining_ms <= ONE_MINUTE_MS {
        REFRESH_LAST_MINUTE_MS
    } else if remaining_ms <= FIVE_MINUTES_MS {
        REFRESH_LAST_FIVE_MIN_MS
    } else if remaining_ms <= ONE_HOUR_MS {
        REFRESH_LAST_HOUR_MS
    } else {
        REFRESH_DEFAULT_MS
    };
    Duration::from_millis(ms)
}

impl LifecycleEngine {
    /// Runs until the lottery leaves `active` or the render surface
    /// disappears. Each tick re-reads the record, so a draw or cancellation
    /// that lands mid-suspension stops the loop on the next pass.
    pub(crate) async fn run_refresh_loop(&self, id: LotteryId) {
        loop {
            let snapshot = {
                let store = self.store.lock().await;
                match store.get(id) {
                    Some(l) if l.status == LotteryStatus::Active => l.clone(),
                    _ => return,
                }
            };
            let Some(location) = snapshot.location.clone() else {
                debug!(lottery = %id, "no live card to refresh");
                return;
            };

            let alive = self.messenger.update_message(&location, &snapshot).await;
            if !alive {
                warn!(lottery = %id, "render surface gone; closing lottery");
                // Same terminal path as a failed deadline: refund ticket
                // holders, announce the closure, drop every timer.
                self.close_without_draw(id).await;
                return;
            }

            tokio::time::sleep(refresh_interval(snapshot.remaining_ms(Self::now_ms()))).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cadence_ramps_toward_the_deadline() {
        assert_eq!(refresh_interval(2 * ONE_HOUR_MS), Duration::from_secs(30));
        assert_eq!(refresh_interval(ONE_HOUR_MS), Duration::from_secs(15));
        assert_eq!(refresh_interval(FIVE_MINUTES_MS), Duration::from_secs(5));
        assert_eq!(refresh_interval(ONE_MINUTE_MS), Duration::from_secs(1));
        assert_eq!(refresh_interval(500), Duration::from_secs(1));
        assert_eq!(refresh_interval(0), Duration::from_secs(1));
    }
}
