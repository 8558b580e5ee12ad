pub mod lottery;
pub mod row;

pub use lottery::{CreateLottery, DrawMode, Lottery, LotteryId, LotteryStatus, MessageRef, UserId};
pub use row::LotteryRow;
