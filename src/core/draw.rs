//! 开奖解析与随机抽取
//!
//! 官方号码解析：已售票中精确命中优先，否则取数值差最小者；
//! 随机抽取：由种子字符串派生 `StdRng`，结果可复现。

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::core::lottery_service::{LotteryResult, SriInvoice};
use crate::core::tickets::{Ticket, TicketStatus, TicketStore};
use crate::core::winners::{winner_id, Winner, WinnerKind};
use crate::errors::RaffleError;
use crate::utils::{now_iso, parse_number};

/// 官方号码的解析结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DrawOutcome {
    /// 精确命中
    Exact { ticket: Ticket },
    /// 最接近的已售票
    Closest { ticket: Ticket, difference: u32 },
    /// 无已售票可供验证
    None,
}

impl DrawOutcome {
    /// 命中的票（如有）
    pub fn ticket(&self) -> Option<&Ticket> {
        match self {
            DrawOutcome::Exact { ticket } => Some(ticket),
            DrawOutcome::Closest { ticket, .. } => Some(ticket),
            DrawOutcome::None => None,
        }
    }

    /// 面向用户的提示信息
    pub fn message(&self) -> String {
        match self {
            DrawOutcome::Exact { .. } => "¡Coincidencia exacta!".to_string(),
            DrawOutcome::Closest { difference, .. } => {
                format!("Número más cercano (diferencia: {})", difference)
            }
            DrawOutcome::None => "No hay boletos vendidos para validar".to_string(),
        }
    }
}

/// 官方开奖的完整报告
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OfficialDrawReport {
    pub lottery: LotteryResult,
    pub outcome: DrawOutcome,
    pub invoice: Option<SriInvoice>,
    pub prize: String,
    pub all_tickets_sold: bool,
}

/// 开奖解析器
pub struct DrawResolver;

impl DrawResolver {
    /// 在已售票中解析官方中奖号码
    ///
    /// 精确命中优先；否则取与中奖号码数值差最小的已售票，
    /// 差值相同时保留先遇到的那张；无已售票返回 `None`。
    pub fn resolve(tickets: &[Ticket], winning_number: &str) -> DrawOutcome {
        if let Some(exact) = tickets
            .iter()
            .find(|t| t.number == winning_number && t.status == TicketStatus::Sold)
        {
            return DrawOutcome::Exact { ticket: exact.clone() };
        }

        let sold: Vec<&Ticket> = tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Sold)
            .collect();
        if sold.is_empty() {
            return DrawOutcome::None;
        }

        let target = match parse_number(winning_number) {
            Some(v) => v,
            None => return DrawOutcome::None,
        };

        let mut closest = sold[0];
        let mut min_difference = diff(closest, target);
        for &ticket in &sold[1..] {
            let difference = diff(ticket, target);
            if difference < min_difference {
                min_difference = difference;
                closest = ticket;
            }
        }

        DrawOutcome::Closest { ticket: closest.clone(), difference: min_difference }
    }
}

fn diff(ticket: &Ticket, target: u32) -> u32 {
    parse_number(&ticket.number)
        .map(|v| v.abs_diff(target))
        .unwrap_or(u32::MAX)
}

/// 随机抽取请求
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RandomDraw {
    pub count: usize,
    pub prize: String,
    pub kind: WinnerKind,
}

/// 由种子字符串派生随机数生成器
pub fn create_rng(seed: &str) -> StdRng {
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    let hash = hasher.finalize();
    let seed_array: [u8; 32] = hash.into();
    StdRng::from_seed(seed_array)
}

/// 从已售票中随机抽取 `count` 个互不相同的中奖者
///
/// 无已售票或数量不足时报错，不追加任何记录。
pub fn draw_random(
    store: &TicketStore,
    request: &RandomDraw,
    seed: &str,
) -> Result<Vec<Winner>, RaffleError> {
    if request.prize.trim().is_empty() {
        return Err(RaffleError::EmptyPrize);
    }

    let sold = store.sold_tickets();
    if sold.is_empty() {
        return Err(RaffleError::NoSoldTickets);
    }
    if request.count > sold.len() {
        return Err(RaffleError::NotEnoughSold {
            sold: sold.len(),
            requested: request.count,
        });
    }

    let mut rng = create_rng(seed);
    let mut winners = Vec::new();
    let mut selected_indices = HashSet::new();

    while winners.len() < request.count {
        let index = rng.gen_range(0..sold.len());
        if selected_indices.insert(index) {
            let ticket = sold[index];
            winners.push(Winner {
                id: winner_id(request.kind, winners.len(), &mut rng),
                ticket_number: ticket.number.clone(),
                buyer_name: store.buyer_of(&ticket.number),
                prize: request.prize.clone(),
                draw_date: now_iso(),
                kind: request.kind,
            });
        }
    }

    Ok(winners)
}
