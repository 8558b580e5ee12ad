use tracing::error;

use crate::errors::{LotteryError, Result};
use crate::events::LotteryEvent;
use crate::messaging::Notice;
use crate::state::{Lottery, LotteryId, LotteryStatus, UserId};
use crate::store::LotteryStore;

use super::LifecycleEngine;

impl LifecycleEngine {
    /// Raw participant commit. No currency moves here: callers that charge
    /// for tickets must debit first and refund on failure (see
    /// [`buy_tickets`](Self::buy_tickets)). Returns the participant's new
    /// ticket total.
    pub async fn add_participant(
        &self,
        id: LotteryId,
        user: UserId,
        tickets: u32,
    ) -> Result<u32> {
        let updated = {
            let mut store = self.store.lock().await;
            self.apply_join(&mut store, id, &user, tickets)?
        };
        let total = updated.tickets_of(&user);
        self.events.publish(LotteryEvent::ParticipantJoined {
            lottery: id,
            user,
            tickets,
        });
        Ok(total)
    }

    /// Free-entry join: one ticket, no currency, duplicate joins rejected.
    pub async fn join(&self, id: LotteryId, user: UserId) -> Result<()> {
        let updated = {
            let mut store = self.store.lock().await;
            let current = store.get(id).ok_or(LotteryError::NotFound(id))?;
            if current.ticket_price > 0 {
                return Err(LotteryError::Validation(
                    "this lottery requires a ticket purchase".into(),
                ));
            }
            self.apply_join(&mut store, id, &user, 1)?
        };
        self.events.publish(LotteryEvent::ParticipantJoined {
            lottery: id,
            user: user.clone(),
            tickets: 1,
        });
        self.messenger
            .send_direct_notification(
                &user,
                Notice::JoinConfirmed {
                    lottery: &updated,
                    tickets: 1,
                },
            )
            .await;
        Ok(())
    }

    /// Paid join: debit first, commit the participant second, and issue a
    /// compensating refund if the commit cannot land. Either both sides
    /// succeed or neither is visible.
    pub async fn buy_tickets(&self, id: LotteryId, user: UserId, quantity: u32) -> Result<u32> {
        if quantity == 0 {
            return Err(LotteryError::Validation(
                "ticket count must be positive".into(),
            ));
        }

        // Pre-check under the lock so we do not debit for a doomed join.
        let cost = {
            let store = self.store.lock().await;
            let current = store.get(id).ok_or(LotteryError::NotFound(id))?;
            if current.status != LotteryStatus::Active {
                return Err(LotteryError::invalid_state(id, current.status, "active"));
            }
            if current.ticket_price == 0 {
                return Err(LotteryError::Validation(
                    "free lottery: join instead of buying tickets".into(),
                ));
            }
            let held = current.tickets_of(&user);
            if held
                .checked_add(quantity)
                .map_or(true, |total| total > current.max_tickets_per_user)
            {
                return Err(LotteryError::TicketLimit {
                    held,
                    requested: quantity,
                    cap: current.max_tickets_per_user,
                });
            }
            current
                .ticket_price
                .checked_mul(u64::from(quantity))
                .ok_or_else(|| LotteryError::Validation("ticket cost overflow".into()))?
        };

        if !self.ledger.debit(&user, cost).await? {
            return Err(LotteryError::InsufficientFunds { needed: cost });
        }

        // The debit suspended us; re-read the record, which may have sealed
        // or been cancelled meanwhile.
        let joined = {
            let mut store = self.store.lock().await;
            self.apply_join(&mut store, id, &user, quantity)
        };
        match joined {
            Ok(updated) => {
                let total = updated.tickets_of(&user);
                self.events.publish(LotteryEvent::ParticipantJoined {
                    lottery: id,
                    user: user.clone(),
                    tickets: quantity,
                });
                self.messenger
                    .send_direct_notification(
                        &user,
                        Notice::JoinConfirmed {
                            lottery: &updated,
                            tickets: total,
                        },
                    )
                    .await;
                Ok(total)
            }
            Err(join_error) => {
                if let Err(refund_error) = self.ledger.credit(&user, cost).await {
                    error!(
                        lottery = %id, %user, cost, %refund_error,
                        "compensating refund failed after rejected join"
                    );
                }
                Err(join_error)
            }
        }
    }

    /// Admin-forced removal. Returns the removed ticket count; whether to
    /// refund it is the caller's policy, not the engine's.
    pub async fn remove_participant(&self, id: LotteryId, user: &UserId) -> Result<u32> {
        let removed = {
            let mut store = self.store.lock().await;
            let current = store.get(id).ok_or(LotteryError::NotFound(id))?;
            if current.status != LotteryStatus::Active {
                return Err(LotteryError::invalid_state(id, current.status, "active"));
            }
            let held = current.tickets_of(user);
            if held == 0 {
                return Err(LotteryError::Validation(format!(
                    "{user} is not participating"
                )));
            }
            store.update(id, |l| {
                l.participants.remove(user);
                l.total_tickets -= u64::from(held);
            })?;
            held
        };
        self.events.publish(LotteryEvent::ParticipantRemoved {
            lottery: id,
            user: user.clone(),
            tickets: removed,
        });
        Ok(removed)
    }

    /// Shared join validation and commit. Holds the store lock; any failure
    /// leaves the record untouched.
    fn apply_join(
        &self,
        store: &mut LotteryStore,
        id: LotteryId,
        user: &UserId,
        tickets: u32,
    ) -> Result<Lottery> {
        if tickets == 0 {
            return Err(LotteryError::Validation(
                "ticket count must be positive".into(),
            ));
        }
        let current = store.get(id).ok_or(LotteryError::NotFound(id))?;
        if current.status != LotteryStatus::Active {
            return Err(LotteryError::invalid_state(id, current.status, "active"));
        }

        let held = current.tickets_of(user);
        if current.ticket_price == 0 {
            if held > 0 {
                return Err(LotteryError::AlreadyParticipating);
            }
            if tickets != 1 {
                return Err(LotteryError::Validation(
                    "free lotteries grant a single entry".into(),
                ));
            }
        } else if held
            .checked_add(tickets)
            .map_or(true, |total| total > current.max_tickets_per_user)
        {
            return Err(LotteryError::TicketLimit {
                held,
                requested: tickets,
                cap: current.max_tickets_per_user,
            });
        }

        let updated = store.update(id, |l| {
            *l.participants.entry(user.clone()).or_insert(0) += tickets;
            l.total_tickets += u64::from(tickets);
        })?;
        Ok(updated.clone())
    }
}
