//! 测试辅助

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::lottery_service::{ServiceSimulator, SimulationDelays};
use crate::core::storage::LocalStorage;
use crate::core::tickets::Buyer;
use crate::state::AppState;
use crate::utils::now_millis;

static DIR_SEQ: AtomicU64 = AtomicU64::new(0);

/// 每个测试使用独立的临时数据目录
pub fn temp_data_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "raffle-demo-test-{}-{}-{}",
        std::process::id(),
        now_millis(),
        DIR_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).expect("创建临时目录失败");
    dir
}

/// 创建测试用的 AppState：零延迟模拟服务 + 临时目录存储
pub fn create_test_state() -> AppState {
    create_test_state_in(temp_data_dir())
}

/// 在指定目录创建测试用的 AppState，便于验证持久化恢复
pub fn create_test_state_in(dir: PathBuf) -> AppState {
    AppState::new(
        LocalStorage::new(dir),
        ServiceSimulator::new(SimulationDelays::none()),
    )
    .expect("创建测试状态失败")
}

pub fn test_buyer() -> Buyer {
    Buyer {
        full_name: "Ana Torres".to_string(),
        document_id: "0912345678".to_string(),
        email: "ana@example.com".to_string(),
        phone: "0991234567".to_string(),
    }
}
