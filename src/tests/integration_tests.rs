//! 端到端集成测试：完整购买与开奖流程、持久化恢复、并发选号

use futures::future::join_all;

use crate::core::draw::DrawOutcome;
use crate::core::raffle_config::RaffleConfig;
use crate::core::tickets::TicketStatus;
use crate::core::winners::WinnerKind;
use crate::errors::RaffleError;
use crate::tests::test_helpers::{
    create_test_state, create_test_state_in, temp_data_dir, test_buyer,
};

async fn sell_six_tickets(state: &crate::state::AppState) -> Vec<String> {
    let numbers: Vec<String> = ["00123", "00456", "00789", "01234", "02345", "03456"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for n in &numbers {
        state.add_ticket(n).await.unwrap();
    }
    state
        .confirm_purchase(test_buyer(), &numbers, Some("ORD-TEST".to_string()))
        .await
        .unwrap();
    numbers
}

#[tokio::test]
async fn test_full_purchase_and_official_draw_flow() {
    let state = create_test_state();
    let numbers = sell_six_tickets(&state).await;

    let stats = state.stats().await;
    assert_eq!(stats.sold, numbers.len());
    assert_eq!(stats.selected, 0);

    let report = state.official_draw().await.unwrap();
    assert_eq!(report.lottery.winning_number.len(), 5);
    assert!(!report.all_tickets_sold);
    assert_eq!(report.prize, "Premio en Efectivo ($5,000)");

    // 至少有一张已售票，解析结果必然是精确或最接近
    let winning = match &report.outcome {
        DrawOutcome::Exact { ticket } => ticket,
        DrawOutcome::Closest { ticket, .. } => ticket,
        DrawOutcome::None => panic!("expected a winning ticket"),
    };
    assert!(numbers.contains(&winning.number));

    let invoice = report.invoice.expect("winner purchase should be invoiced");
    assert!((invoice.total - 60.0).abs() < 1e-9);
    assert_eq!(invoice.buyer.full_name, "Ana Torres");

    let winners = state.winners_snapshot().await;
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0].kind, WinnerKind::Official);
    assert_eq!(winners[0].ticket_number, winning.number);
}

#[tokio::test]
async fn test_official_draw_requires_sold_tickets() {
    let state = create_test_state();
    assert_eq!(
        state.official_draw().await.unwrap_err(),
        RaffleError::NoSoldTickets
    );
}

#[tokio::test]
async fn test_duplicate_number_never_mutates_state() {
    let state = create_test_state();
    state.add_ticket("00777").await.unwrap();
    let before = state.tickets_snapshot().await;

    let err = state.add_ticket("00777").await.unwrap_err();
    assert_eq!(err, RaffleError::DuplicateNumber("00777".to_string()));
    assert_eq!(state.tickets_snapshot().await, before);

    let suggestions = state.suggest_alternatives("00777").await;
    let alternative = suggestions.nearest.first().expect("nearby numbers exist");
    state.add_alternative(&alternative.number).await.unwrap();
    assert_eq!(state.stats().await.selected, 2);
}

#[tokio::test]
async fn test_state_survives_restart() {
    let dir = temp_data_dir();
    let numbers = {
        let state = create_test_state_in(dir.clone());
        sell_six_tickets(&state).await
    };

    let restored = create_test_state_in(dir);
    let stats = restored.stats().await;
    assert_eq!(stats.sold, numbers.len());
    assert_eq!(restored.purchases_snapshot().await.len(), 1);
    assert_eq!(
        restored.purchases_snapshot().await[0].order_id,
        "ORD-TEST"
    );
    // 已售状态与购买记录一一对应
    for ticket in restored.tickets_snapshot().await {
        let in_purchase = numbers.contains(&ticket.number);
        assert_eq!(ticket.status == TicketStatus::Sold, in_purchase);
    }
}

#[tokio::test]
async fn test_reset_clears_everything() {
    let dir = temp_data_dir();
    let state = create_test_state_in(dir.clone());
    sell_six_tickets(&state).await;
    state.economic_draw(1, 50.0, "seed").await.unwrap();

    state.reset().await;
    let stats = state.stats().await;
    assert_eq!(stats.available, 100);
    assert_eq!(stats.selected, 0);
    assert_eq!(stats.sold, 0);
    assert!(state.purchases_snapshot().await.is_empty());
    assert!(state.winners_snapshot().await.is_empty());
    assert_eq!(state.config().await, RaffleConfig::default());

    // 存储文件已删除，重启后仍是默认状态
    let restored = create_test_state_in(dir);
    assert_eq!(restored.stats().await.available, 100);
    assert!(restored.purchases_snapshot().await.is_empty());
}

#[tokio::test]
async fn test_config_update_validation_and_persistence() {
    let dir = temp_data_dir();
    let state = create_test_state_in(dir.clone());

    let mut invalid = RaffleConfig::default();
    invalid.min_ticket_number = 9000;
    invalid.max_ticket_number = 100;
    invalid.total_tickets = None;
    assert!(state.update_config(invalid).await.is_err());
    assert_eq!(state.config().await, RaffleConfig::default());

    let mut valid = RaffleConfig::default();
    valid.ticket_price = 12.5;
    state.update_config(valid.clone()).await.unwrap();

    let restored = create_test_state_in(dir);
    assert_eq!(restored.config().await, valid);
}

#[tokio::test]
async fn test_random_draws_append_to_ledger() {
    let state = create_test_state();
    sell_six_tickets(&state).await;

    let economic = state.economic_draw(2, 100.0, "eco-seed").await.unwrap();
    assert_eq!(economic.len(), 2);
    assert!(economic.iter().all(|w| w.prize == "$100"));

    let major = state
        .major_draw(1, "Camioneta Toyota Hilux 2024", "major-seed")
        .await
        .unwrap();
    assert_eq!(major.len(), 1);

    let winners = state.winners_snapshot().await;
    assert_eq!(winners.len(), 3);
    assert_eq!(
        winners
            .iter()
            .filter(|w| w.kind == WinnerKind::Economic)
            .count(),
        2
    );

    assert_eq!(
        state.economic_draw(10, 100.0, "s").await.unwrap_err(),
        RaffleError::NotEnoughSold { sold: 6, requested: 10 }
    );
}

#[tokio::test]
async fn test_grid_selection_and_removal_persist() {
    let dir = temp_data_dir();
    let state = create_test_state_in(dir.clone());

    // 预置票的选中/取消切换
    state.select_ticket("00007").await.unwrap();
    assert_eq!(state.stats().await.selected, 1);
    state.deselect_ticket("00007").await.unwrap();
    assert_eq!(state.stats().await.selected, 0);

    // 手动添加的票在确认前可移除
    state.add_ticket("04567").await.unwrap();
    state.remove_ticket("04567").await.unwrap();
    assert!(state
        .tickets_snapshot()
        .await
        .iter()
        .all(|t| t.number != "04567"));

    state.select_ticket("00009").await.unwrap();
    let restored = create_test_state_in(dir);
    assert_eq!(restored.stats().await.selected, 1);
}

#[tokio::test]
async fn test_reset_config_restores_defaults() {
    let state = create_test_state();
    let mut changed = RaffleConfig::default();
    changed.ticket_price = 25.0;
    state.update_config(changed).await.unwrap();
    assert_eq!(state.config().await.ticket_price, 25.0);
    assert_eq!(state.packages().await.len(), 5);

    state.reset_config().await;
    assert_eq!(state.config().await, RaffleConfig::default());
}

#[tokio::test]
async fn test_concurrent_ticket_selection_is_consistent() {
    let state = create_test_state();
    let tasks = (0..16).map(|i| {
        let state = state.clone();
        async move { state.add_ticket(&format!("{:05}", 40000 + i)).await }
    });
    let results = join_all(tasks).await;
    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(state.stats().await.selected, 16);
}
