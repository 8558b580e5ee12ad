use std::collections::BTreeMap;

use rand::Rng;
use tracing::info;

use crate::errors::{LotteryError, Result};
use crate::events::LotteryEvent;
use crate::state::{LotteryId, LotteryStatus, UserId};

use super::LifecycleEngine;

/// Result of a draw attempt. Insufficient participants is an expected
/// outcome routed to the failure path, never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOutcome {
    /// Fresh draw; winners in draw order.
    Winners(Vec<UserId>),
    /// The persisted result of an earlier draw; nothing was recomputed.
    AlreadyDrawn(Vec<UserId>),
    InsufficientParticipants { have: usize, need: u32 },
}

/// Ticket-weighted selection without duplicate wins. Each participant
/// enters the pool once per ticket; after a pick, every remaining
/// occurrence of that participant leaves the pool, so later picks
/// renormalize over the remaining distinct participants.
pub fn select_winners<R: Rng>(
    participants: &BTreeMap<UserId, u32>,
    winner_count: u32,
    rng: &mut R,
) -> Vec<UserId> {
    let mut pool: Vec<UserId> = Vec::new();
    for (user, tickets) in participants {
        for _ in 0..*tickets {
            pool.push(user.clone());
        }
    }

    let target = (winner_count as usize).min(participants.len());
    let mut winners = Vec::with_capacity(target);
    while winners.len() < target && !pool.is_empty() {
        let index = rng.gen_range(0..pool.len());
        let picked = pool[index].clone();
        pool.retain(|user| user != &picked);
        winners.push(picked);
    }
    winners
}

impl LifecycleEngine {
    /// Runs the weighted draw and seals the lottery: the terminal status
    /// and the winner list land in the same durable write, taken under the
    /// store lock so no join can race into or out of the pool.
    ///
    /// Re-running against an already-drawn record is a no-op returning the
    /// persisted result.
    pub async fn draw(&self, id: LotteryId) -> Result<DrawOutcome> {
        let winners = {
            let mut store = self.store.lock().await;
            let current = store.get(id).ok_or(LotteryError::NotFound(id))?;

            if current.status == LotteryStatus::Ended && !current.winner_list.is_empty() {
                return Ok(DrawOutcome::AlreadyDrawn(current.winner_list.clone()));
            }
            if !matches!(
                current.status,
                LotteryStatus::Active | LotteryStatus::Expired
            ) {
                return Err(LotteryError::invalid_state(
                    id,
                    current.status,
                    "active or expired",
                ));
            }
            if (current.participants.len() as u32) < current.min_participants {
                return Ok(DrawOutcome::InsufficientParticipants {
                    have: current.participants.len(),
                    need: current.min_participants,
                });
            }

            let picked = {
                let mut rng = self.rng.lock().expect("rng lock");
                select_winners(&current.participants, current.winner_count, &mut *rng)
            };
            store.update(id, |l| {
                l.status = LotteryStatus::Ended;
                l.winner_list = picked.clone();
            })?;
            picked
        };

        self.scheduler.disarm_all(id);
        self.events.publish(LotteryEvent::WinnersDrawn {
            lottery: id,
            winners: winners.clone(),
        });
        info!(lottery = %id, winners = winners.len(), "winners drawn");
        self.announce_result(id).await;
        Ok(DrawOutcome::Winners(winners))
    }
}
