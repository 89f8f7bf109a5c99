//! 领域错误类型
//!
//! 所有失败都是面向用户的校验信息，不存在重试或致命错误。

use thiserror::Error;

/// 抽奖应用领域错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaffleError {
    #[error("Ticket number {0} is already registered")]
    DuplicateNumber(String),
    #[error("Ticket number {0} does not exist")]
    UnknownNumber(String),
    #[error("Ticket number {0} is not a valid 5-digit number")]
    InvalidNumber(String),
    #[error("Ticket number {number} is outside the configured range {min:05}-{max:05}")]
    OutOfRange { number: String, min: u32, max: u32 },
    #[error("Ticket {0} is already sold")]
    TicketSold(String),
    #[error("Ticket {0} is not selected")]
    NotSelected(String),
    #[error("Purchase requires at least {min} tickets, got {got}")]
    TooFewTickets { min: u32, got: usize },
    #[error("Prize description must not be empty")]
    EmptyPrize,
    #[error("No sold tickets to draw from")]
    NoSoldTickets,
    #[error("Only {sold} tickets sold, cannot pick {requested} winners")]
    NotEnoughSold { sold: usize, requested: usize },
    #[error("Storage error: {0}")]
    Storage(String),
}
