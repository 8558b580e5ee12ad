use tracing::info;

use crate::errors::{LotteryError, Result};
use crate::state::{CreateLottery, DrawMode, Lottery, LotteryStatus};

use super::LifecycleEngine;

impl LifecycleEngine {
    /// Validates bounds and persists a new record as `pending`. The lottery
    /// starts accepting participants only after [`activate`](Self::activate).
    pub async fn create(&self, params: CreateLottery) -> Result<Lottery> {
        let config = &self.config;

        if params.prize.trim().is_empty() {
            return Err(LotteryError::Validation("prize must not be empty".into()));
        }
        if params.winner_count == 0 || params.winner_count > config.max_winners {
            return Err(LotteryError::Validation(format!(
                "winner count must be between 1 and {}",
                config.max_winners
            )));
        }
        if params.duration_ms < config.min_duration_ms || params.duration_ms > config.max_duration_ms
        {
            return Err(LotteryError::Validation(format!(
                "duration must be between {} and {} ms",
                config.min_duration_ms, config.max_duration_ms
            )));
        }
        if params.max_tickets_per_user == 0 {
            return Err(LotteryError::Validation(
                "ticket cap must be at least 1".into(),
            ));
        }
        let min_participants = params.min_participants.unwrap_or(params.winner_count);
        if min_participants < params.winner_count {
            return Err(LotteryError::Validation(format!(
                "minimum participants ({min_participants}) must cover the winner count ({})",
                params.winner_count
            )));
        }

        let now = Self::now_ms();
        let id = self.next_id(now);
        let lottery = Lottery {
            id,
            prize: params.prize,
            winner_count: params.winner_count,
            min_participants,
            ticket_price: params.ticket_price,
            max_tickets_per_user: params.max_tickets_per_user,
            terms: params
                .terms
                .unwrap_or_else(|| config.default_terms.clone()),
            created_by: params.created_by,
            guild_id: params.guild_id,
            start_time: now,
            end_time: now + params.duration_ms,
            status: LotteryStatus::Pending,
            draw_mode: DrawMode::Auto,
            participants: Default::default(),
            total_tickets: 0,
            winner_list: Vec::new(),
            winner_announced: false,
            location: None,
        };

        self.store.lock().await.insert(lottery.clone())?;
        info!(lottery = %id, prize = %lottery.prize, "lottery created");
        Ok(lottery)
    }
}
