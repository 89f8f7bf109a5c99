//! 票券状态机与购买记录
//!
//! 实现票券的创建、选择、取消、购买确认以及重号的备选号码建议。
//! 票券按插入顺序保存，保证"先遇到者优先"的平局规则可复现。

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::raffle_config::RaffleConfig;
use crate::errors::RaffleError;
use crate::utils::{now_iso, now_millis, pad_number, parse_number};

/// 票券状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    /// 可用
    Available,
    /// 已选中（购买流程中）
    Selected,
    /// 已售出
    Sold,
}

/// 单张票券；以 5 位补零票号唯一标识
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    pub number: String,
    pub status: TicketStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_name: Option<String>,
}

impl Ticket {
    fn available(number: String) -> Self {
        Self { number, status: TicketStatus::Available, buyer_name: None }
    }

    fn selected(number: String) -> Self {
        Self { number, status: TicketStatus::Selected, buyer_name: None }
    }
}

/// 购买人信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Buyer {
    pub full_name: String,
    pub document_id: String,
    pub email: String,
    pub phone: String,
}

/// 购买记录；确认后不可变
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Purchase {
    pub order_id: String,
    pub buyer: Buyer,
    pub tickets: Vec<String>,
    pub created_at: String,
}

/// 票券统计
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TicketStats {
    pub available: usize,
    pub selected: usize,
    pub sold: usize,
}

/// 与目标号码接近的空闲号码
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NearbyNumber {
    pub number: String,
    pub difference: u32,
}

/// 重号时提供的备选号码建议
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AlternativeSuggestions {
    /// 范围内第一个空闲号码
    pub first_free: Option<String>,
    /// 随机空闲号码
    pub random_free: Option<String>,
    /// 与目标号码差值最小的三个空闲号码
    pub nearest: Vec<NearbyNumber>,
}

/// 票券存储：持有票券集合与购买记录并执行状态转移
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketStore {
    tickets: Vec<Ticket>,
    purchases: Vec<Purchase>,
}

impl TicketStore {
    /// 创建带初始网格的存储：从最小票号起预置 `total_tickets` 张可用票
    pub fn new(config: &RaffleConfig) -> Self {
        let total = config.total_tickets.unwrap_or(100);
        let tickets = (0..total)
            .map(|i| Ticket::available(pad_number(config.min_ticket_number + i)))
            .collect();
        Self { tickets, purchases: Vec::new() }
    }

    /// 从持久化数据恢复
    pub fn from_parts(tickets: Vec<Ticket>, purchases: Vec<Purchase>) -> Self {
        Self { tickets, purchases }
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn purchases(&self) -> &[Purchase] {
        &self.purchases
    }

    fn find(&self, number: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|t| t.number == number)
    }

    fn find_mut(&mut self, number: &str) -> Option<&mut Ticket> {
        self.tickets.iter_mut().find(|t| t.number == number)
    }

    /// 校验票号格式与配置范围；返回数值形式
    pub fn validate_number(&self, config: &RaffleConfig, number: &str) -> Result<u32, RaffleError> {
        let value = parse_number(number)
            .filter(|v| *v != 0)
            .ok_or_else(|| RaffleError::InvalidNumber(number.to_string()))?;
        if value < config.min_ticket_number || value > config.max_ticket_number {
            return Err(RaffleError::OutOfRange {
                number: number.to_string(),
                min: config.min_ticket_number,
                max: config.max_ticket_number,
            });
        }
        Ok(value)
    }

    /// 新增用户输入的票号，状态为已选中
    ///
    /// 号码已存在（任意状态）时返回 `DuplicateNumber`，且不改变任何状态。
    pub fn add_ticket(&mut self, config: &RaffleConfig, number: &str) -> Result<(), RaffleError> {
        self.validate_number(config, number)?;
        if self.find(number).is_some() {
            return Err(RaffleError::DuplicateNumber(number.to_string()));
        }
        self.tickets.push(Ticket::selected(number.to_string()));
        Ok(())
    }

    /// 插入一个已被建议过的备选号码，不再触发重号检查流程
    ///
    /// 备选号码理论上必然空闲；若期间被占用仍按重号处理。
    pub fn add_alternative(
        &mut self,
        config: &RaffleConfig,
        number: &str,
    ) -> Result<(), RaffleError> {
        self.add_ticket(config, number)
    }

    /// 将预置的可用票标记为已选中
    pub fn select(&mut self, number: &str) -> Result<(), RaffleError> {
        let ticket = self
            .find_mut(number)
            .ok_or_else(|| RaffleError::UnknownNumber(number.to_string()))?;
        match ticket.status {
            TicketStatus::Available => {
                ticket.status = TicketStatus::Selected;
                Ok(())
            }
            TicketStatus::Selected => Ok(()),
            TicketStatus::Sold => Err(RaffleError::TicketSold(number.to_string())),
        }
    }

    /// 取消选中，回到可用状态
    pub fn deselect(&mut self, number: &str) -> Result<(), RaffleError> {
        let ticket = self
            .find_mut(number)
            .ok_or_else(|| RaffleError::UnknownNumber(number.to_string()))?;
        match ticket.status {
            TicketStatus::Selected => {
                ticket.status = TicketStatus::Available;
                Ok(())
            }
            TicketStatus::Available => Ok(()),
            TicketStatus::Sold => Err(RaffleError::TicketSold(number.to_string())),
        }
    }

    /// 删除一张未售出的票
    pub fn remove_ticket(&mut self, number: &str) -> Result<(), RaffleError> {
        let ticket = self
            .find(number)
            .ok_or_else(|| RaffleError::UnknownNumber(number.to_string()))?;
        if ticket.status == TicketStatus::Sold {
            return Err(RaffleError::TicketSold(number.to_string()));
        }
        self.tickets.retain(|t| t.number != number);
        Ok(())
    }

    /// 确认购买：原子地把给定号码全部标记为已售出并生成一条购买记录
    ///
    /// 任何校验失败都不会改变状态。订单号缺省为 `ORD-<毫秒时间戳>`。
    pub fn confirm_purchase(
        &mut self,
        config: &RaffleConfig,
        buyer: Buyer,
        numbers: &[String],
        order_id: Option<String>,
    ) -> Result<Purchase, RaffleError> {
        if (numbers.len() as u32) < config.min_tickets_per_purchase {
            return Err(RaffleError::TooFewTickets {
                min: config.min_tickets_per_purchase,
                got: numbers.len(),
            });
        }

        // 先整体校验，后整体变更
        for number in numbers {
            match self.find(number) {
                None => return Err(RaffleError::UnknownNumber(number.clone())),
                Some(t) if t.status == TicketStatus::Sold => {
                    return Err(RaffleError::TicketSold(number.clone()))
                }
                Some(t) if t.status != TicketStatus::Selected => {
                    return Err(RaffleError::NotSelected(number.clone()))
                }
                Some(_) => {}
            }
        }

        for number in numbers {
            if let Some(ticket) = self.find_mut(number) {
                ticket.status = TicketStatus::Sold;
                ticket.buyer_name = Some(buyer.full_name.clone());
            }
        }

        let purchase = Purchase {
            order_id: order_id.unwrap_or_else(|| format!("ORD-{}", now_millis())),
            buyer,
            tickets: numbers.to_vec(),
            created_at: now_iso(),
        };
        // 最近的购买排在最前
        self.purchases.insert(0, purchase.clone());
        Ok(purchase)
    }

    /// 配置范围内未被占用的号码，升序排列
    fn free_numbers(&self, config: &RaffleConfig) -> Vec<u32> {
        let used: HashSet<u32> = self
            .tickets
            .iter()
            .filter_map(|t| parse_number(&t.number))
            .collect();
        (config.min_ticket_number..=config.max_ticket_number)
            .filter(|n| !used.contains(n))
            .collect()
    }

    /// 针对重号给出备选号码建议
    pub fn suggest_alternatives<R: Rng>(
        &self,
        config: &RaffleConfig,
        number: &str,
        rng: &mut R,
    ) -> AlternativeSuggestions {
        let free = self.free_numbers(config);
        if free.is_empty() {
            return AlternativeSuggestions::default();
        }

        let first_free = free.first().map(|n| pad_number(*n));
        let random_free = Some(pad_number(free[rng.gen_range(0..free.len())]));

        let nearest = match parse_number(number) {
            Some(target) => {
                let mut scored: Vec<(u32, u32)> = free
                    .iter()
                    .map(|n| (n.abs_diff(target), *n))
                    .collect();
                scored.sort();
                scored
                    .into_iter()
                    .take(3)
                    .map(|(difference, n)| NearbyNumber { number: pad_number(n), difference })
                    .collect()
            }
            None => Vec::new(),
        };

        AlternativeSuggestions { first_free, random_free, nearest }
    }

    /// 已售出票券
    pub fn sold_tickets(&self) -> Vec<&Ticket> {
        self.tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Sold)
            .collect()
    }

    /// 当前已选中的号码列表
    pub fn selected_numbers(&self) -> Vec<String> {
        self.tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Selected)
            .map(|t| t.number.clone())
            .collect()
    }

    /// 查询某票号的买家姓名：优先购买记录，回退票面姓名
    pub fn buyer_of(&self, number: &str) -> Option<String> {
        if let Some(purchase) = self
            .purchases
            .iter()
            .find(|p| p.tickets.iter().any(|t| t == number))
        {
            return Some(purchase.buyer.full_name.clone());
        }
        self.find(number).and_then(|t| t.buyer_name.clone())
    }

    pub fn stats(&self) -> TicketStats {
        let mut stats = TicketStats::default();
        for ticket in &self.tickets {
            match ticket.status {
                TicketStatus::Available => stats.available += 1,
                TicketStatus::Selected => stats.selected += 1,
                TicketStatus::Sold => stats.sold += 1,
            }
        }
        stats
    }

    /// 清空全部状态，回到初始网格
    pub fn reset(&mut self, config: &RaffleConfig) {
        *self = TicketStore::new(config);
    }
}
