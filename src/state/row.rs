//! Persisted record shape. One explicit DTO with pure conversions to and
//! from the in-memory [`Lottery`], so the durable schema cannot silently
//! diverge from the cache type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::lottery::{DrawMode, Lottery, LotteryId, LotteryStatus, MessageRef, UserId};

/// Durable row: participants flattened to a string-keyed map, timestamps as
/// integer epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotteryRow {
    pub id: u64,
    pub prize: String,
    pub winner_count: u32,
    pub min_participants: u32,
    pub ticket_price: u64,
    pub max_tickets_per_user: u32,
    pub terms: String,
    pub created_by: String,
    pub guild_id: String,
    pub start_time: i64,
    pub end_time: i64,
    pub status: LotteryStatus,
    pub draw_mode: DrawMode,
    pub participants: BTreeMap<String, u32>,
    pub total_tickets: u64,
    pub winner_list: Vec<String>,
    pub winner_announced: bool,
    pub location: Option<MessageRef>,
}

impl From<&Lottery> for LotteryRow {
    fn from(lottery: &Lottery) -> Self {
        Self {
            id: lottery.id.0,
            prize: lottery.prize.clone(),
            winner_count: lottery.winner_count,
            min_participants: lottery.min_participants,
            ticket_price: lottery.ticket_price,
            max_tickets_per_user: lottery.max_tickets_per_user,
            terms: lottery.terms.clone(),
            created_by: lottery.created_by.0.clone(),
            guild_id: lottery.guild_id.clone(),
            start_time: lottery.start_time,
            end_time: lottery.end_time,
            status: lottery.status,
            draw_mode: lottery.draw_mode,
            participants: lottery
                .participants
                .iter()
                .map(|(user, tickets)| (user.0.clone(), *tickets))
                .collect(),
            total_tickets: lottery.total_tickets,
            winner_list: lottery.winner_list.iter().map(|w| w.0.clone()).collect(),
            winner_announced: lottery.winner_announced,
            location: lottery.location.clone(),
        }
    }
}

impl From<LotteryRow> for Lottery {
    fn from(row: LotteryRow) -> Self {
        Self {
            id: LotteryId(row.id),
            prize: row.prize,
            winner_count: row.winner_count,
            min_participants: row.min_participants,
            ticket_price: row.ticket_price,
            max_tickets_per_user: row.max_tickets_per_user,
            terms: row.terms,
            created_by: UserId(row.created_by),
            guild_id: row.guild_id,
            start_time: row.start_time,
            end_time: row.end_time,
            status: row.status,
            draw_mode: row.draw_mode,
            participants: row
                .participants
                .into_iter()
                .map(|(user, tickets)| (UserId(user), tickets))
                .collect(),
            total_tickets: row.total_tickets,
            winner_list: row.winner_list.into_iter().map(UserId).collect(),
            winner_announced: row.winner_announced,
            location: row.location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions_preserve_participant_ledger() {
        let mut lottery = Lottery {
            id: LotteryId(42),
            prize: "steam key".into(),
            winner_count: 2,
            min_participants: 2,
            ticket_price: 5,
            max_tickets_per_user: 3,
            terms: "terms".into(),
            created_by: UserId::from("admin"),
            guild_id: "guild".into(),
            start_time: 100,
            end_time: 200,
            status: LotteryStatus::Active,
            draw_mode: DrawMode::Manual,
            participants: BTreeMap::new(),
            total_tickets: 0,
            winner_list: Vec::new(),
            winner_announced: false,
            location: Some(MessageRef {
                channel_id: "c1".into(),
                message_id: "m1".into(),
            }),
        };
        lottery.participants.insert(UserId::from("a"), 3);
        lottery.participants.insert(UserId::from("b"), 1);
        lottery.total_tickets = 4;

        let row = LotteryRow::from(&lottery);
        assert_eq!(row.participants.get("a"), Some(&3));
        assert_eq!(row.location.as_ref().unwrap().channel_id, "c1");

        let back = Lottery::from(row);
        assert_eq!(back, lottery);
        assert_eq!(back.total_tickets, back.ticket_sum());
    }
}
