//! 抽奖售票与开奖演示 - 主程序
//!
//! 脚本化跑通一次完整流程：选号、重号处理、确认购买、官方开奖与随机抽奖。
//! 全部状态保存在本地 JSON 文件中，外部调用均为本地模拟。

use tracing::{error, info};

mod core;
mod errors;
mod state;
mod utils;

#[cfg(test)]
mod tests;

use crate::core::lottery_service::ServiceSimulator;
use crate::core::raffle_config::custom_package_price;
use crate::core::storage::LocalStorage;
use crate::core::tickets::Buyer;
use crate::errors::RaffleError;
use crate::state::AppState;

async fn run_demo(state: &AppState) -> Result<(), RaffleError> {
    // 演示从干净状态开始
    state.reset().await;

    for package in state.packages().await {
        let price = match package.count {
            Some(_) => package.price,
            None => custom_package_price(12),
        };
        info!("套餐 {}: ${:.2} - {}", package.name, price, package.description);
    }

    // 预置网格内的票通过选中/取消切换
    state.select_ticket("00007").await?;
    state.deselect_ticket("00007").await?;

    let numbers = ["00123", "00456", "00789", "01234", "02345", "03456"];
    for number in numbers {
        state.add_ticket(number).await?;
        info!("已选号 {}", number);
    }

    // 重号：不改变状态，只给出备选建议
    match state.add_ticket("00123").await {
        Err(RaffleError::DuplicateNumber(number)) => {
            info!("号码 {} 已被占用，生成备选建议", number);
            let suggestions = state.suggest_alternatives(&number).await;
            if let Some(nearby) = suggestions.nearest.first() {
                info!("采用最接近的备选号码 {} (差值 {})", nearby.number, nearby.difference);
                state.add_alternative(&nearby.number).await?;
            }
        }
        other => {
            other?;
        }
    }

    // 误选的号码可在确认前移除
    state.add_ticket("04567").await?;
    state.remove_ticket("04567").await?;

    let buyer = Buyer {
        full_name: "Ana Torres".to_string(),
        document_id: "0912345678".to_string(),
        email: "ana@example.com".to_string(),
        phone: "0991234567".to_string(),
    };
    let selected = state.selected_numbers().await;
    let purchase = state.confirm_purchase(buyer, &selected, None).await?;
    info!(
        "购买确认: 订单 {}，买家 {}，{} 张票",
        purchase.order_id,
        purchase.buyer.full_name,
        purchase.tickets.len()
    );

    let report = state.official_draw().await?;
    info!(
        "官方开奖: 号码 {}，{}，奖品 {}",
        report.lottery.winning_number,
        report.outcome.message(),
        report.prize
    );
    if let Some(invoice) = &report.invoice {
        info!("发票 {}: 合计 ${:.2}", invoice.invoice_number, invoice.total);
    }

    let economic = state.economic_draw(2, 100.0, "demo-economic").await?;
    for winner in &economic {
        info!(
            "现金奖: 票号 {}，买家 {}，奖金 {}",
            winner.ticket_number,
            winner.buyer_name.as_deref().unwrap_or("-"),
            winner.prize
        );
    }

    let major = state
        .major_draw(1, "Camioneta Toyota Hilux 2024", "demo-major")
        .await?;
    for winner in &major {
        info!(
            "大奖: 票号 {}，买家 {}，奖品 {}",
            winner.ticket_number,
            winner.buyer_name.as_deref().unwrap_or("-"),
            winner.prize
        );
    }

    let stats = state.stats().await;
    info!(
        "最终统计: 可用 {}，已选 {}，已售 {}；中奖记录 {} 条",
        stats.available,
        stats.selected,
        stats.sold,
        state.winners_snapshot().await.len()
    );
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    info!("启动抽奖售票演示...");

    let data_dir = std::env::var("RAFFLE_DATA_DIR").unwrap_or_else(|_| ".".to_string());
    let storage = LocalStorage::new(&data_dir);
    let state = match AppState::new(storage, ServiceSimulator::default()) {
        Ok(state) => state,
        Err(e) => {
            error!("初始化应用状态失败: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run_demo(&state).await {
        error!("演示流程失败: {}", e);
        std::process::exit(1);
    }
    info!("演示完成");
}
