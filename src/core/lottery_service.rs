//! 模拟外部服务
//!
//! 彩票机构查询、SRI 电子发票、邮件发送均为本地脚本化模拟：
//! 固定延迟 + 确定性或伪随机输出，不存在真实网络调用。

use std::time::Duration;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::info;

use crate::core::tickets::Buyer;
use crate::utils::{now_iso, now_millis, pad_number};

/// SRI 增值税率（12%）
pub const IVA_RATE: f64 = 0.12;

/// 各模拟服务的固定延迟
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationDelays {
    pub lottery_query: Duration,
    pub invoice: Duration,
    pub email: Duration,
}

impl Default for SimulationDelays {
    fn default() -> Self {
        Self {
            lottery_query: Duration::from_millis(2000),
            invoice: Duration::from_millis(1500),
            email: Duration::from_millis(2000),
        }
    }
}

impl SimulationDelays {
    /// 零延迟，用于测试
    pub fn none() -> Self {
        Self {
            lottery_query: Duration::ZERO,
            invoice: Duration::ZERO,
            email: Duration::ZERO,
        }
    }
}

/// 彩票机构查询结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LotteryResult {
    pub winning_number: String,
    pub draw_date: String,
    pub source: String,
    pub verified: bool,
    pub timestamp: String,
}

/// 模拟的 SRI 电子发票
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SriInvoice {
    pub invoice_number: String,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
    pub status: String,
    pub authorization_date: String,
    pub sri_code: String,
    pub buyer: Buyer,
    pub tickets: Vec<String>,
}

/// 模拟的邮件发送回执
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmailReceipt {
    pub success: bool,
    pub message_id: String,
    pub to: String,
    pub subject: String,
    pub sent_at: String,
}

/// 基于日期的确定性中奖号码
///
/// 种子为 `日 + 月（0 起） + 年`，中奖号码为 `(seed * 7 + 12345) % 100000`。
pub fn winning_number_for_date(date: NaiveDate) -> String {
    let seed = date.day() + date.month0() + date.year().unsigned_abs();
    pad_number((seed * 7 + 12345) % 100_000)
}

/// 外部服务模拟器
#[derive(Debug, Clone)]
pub struct ServiceSimulator {
    delays: SimulationDelays,
}

impl Default for ServiceSimulator {
    fn default() -> Self {
        Self { delays: SimulationDelays::default() }
    }
}

impl ServiceSimulator {
    pub fn new(delays: SimulationDelays) -> Self {
        Self { delays }
    }

    /// 查询官方中奖号码
    pub async fn query_winning_number(&self) -> LotteryResult {
        sleep(self.delays.lottery_query).await;

        let today = Utc::now().date_naive();
        let result = LotteryResult {
            winning_number: winning_number_for_date(today),
            draw_date: today.to_string(),
            source: "Lotería Nacional del Ecuador".to_string(),
            verified: true,
            timestamp: now_iso(),
        };
        info!("彩票机构查询完成，中奖号码 {}", result.winning_number);
        result
    }

    /// 为一笔购买生成授权发票
    pub async fn generate_invoice(
        &self,
        amount: f64,
        buyer: Buyer,
        tickets: Vec<String>,
    ) -> SriInvoice {
        sleep(self.delays.invoice).await;

        let millis = now_millis().to_string();
        let suffix = if millis.len() > 9 {
            &millis[millis.len() - 9..]
        } else {
            millis.as_str()
        };
        let tax_amount = amount * IVA_RATE;
        let invoice = SriInvoice {
            invoice_number: format!("001-001-{}", suffix),
            subtotal: amount - tax_amount,
            tax_amount,
            total: amount,
            status: "AUTORIZADA".to_string(),
            authorization_date: now_iso(),
            sri_code: format!("SRI-{}", millis),
            buyer,
            tickets,
        };
        info!("发票已授权: {}", invoice.invoice_number);
        invoice
    }

    /// 发送通知邮件
    pub async fn send_email(&self, to: &str, subject: &str, _content: &str) -> EmailReceipt {
        sleep(self.delays.email).await;

        let receipt = EmailReceipt {
            success: true,
            message_id: format!("msg-{}", now_millis()),
            to: to.to_string(),
            subject: subject.to_string(),
            sent_at: now_iso(),
        };
        info!("邮件已发送: {} -> {}", receipt.message_id, to);
        receipt
    }
}
