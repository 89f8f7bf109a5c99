//! 本地持久化
//!
//! 全量状态序列化为单个 JSON 文件：启动时加载，每次变更整体覆写，
//! 重置时删除。文件缺失或损坏时回退到默认初始状态。

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::core::raffle_config::RaffleConfig;
use crate::core::tickets::{Purchase, Ticket};
use crate::core::winners::Winner;
use crate::errors::RaffleError;

/// 持久化键名，同时作为文件名
pub const STORAGE_KEY: &str = "raffle-tickets-data";

/// 持久化的全量状态
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedState {
    pub tickets: Vec<Ticket>,
    pub purchases: Vec<Purchase>,
    #[serde(default)]
    pub winners: Vec<Winner>,
    #[serde(default)]
    pub config: RaffleConfig,
}

/// 本地存储：单一 JSON 文件
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// 在给定目录下创建存储，文件名固定为 `raffle-tickets-data.json`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self { path: dir.as_ref().join(format!("{}.json", STORAGE_KEY)) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 覆写保存全量状态
    pub fn save(&self, state: &PersistedState) -> Result<(), RaffleError> {
        let serialized = serde_json::to_string(state)
            .map_err(|e| RaffleError::Storage(format!("序列化失败: {}", e)))?;
        std::fs::write(&self.path, serialized)
            .map_err(|e| RaffleError::Storage(format!("写入 {} 失败: {}", self.path.display(), e)))?;
        info!("状态已保存到 {}", self.path.display());
        Ok(())
    }

    /// 加载全量状态；文件缺失或损坏返回 None
    pub fn load(&self) -> Option<PersistedState> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                error!("读取 {} 失败: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str::<PersistedState>(&raw) {
            Ok(state) => {
                info!("已从 {} 加载状态", self.path.display());
                Some(state)
            }
            Err(e) => {
                warn!("持久化数据损坏，回退默认状态: {}", e);
                None
            }
        }
    }

    /// 删除持久化文件
    pub fn clear(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(_) => info!("本地存储已清空"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!("清空 {} 失败: {}", self.path.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tickets::TicketStore;
    use crate::utils::now_millis;
    use std::sync::atomic::{AtomicU64, Ordering};

    static DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    fn temp_storage() -> LocalStorage {
        let dir = std::env::temp_dir().join(format!(
            "raffle-storage-test-{}-{}-{}",
            std::process::id(),
            now_millis(),
            DIR_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        LocalStorage::new(dir)
    }

    fn sample_state() -> PersistedState {
        let config = RaffleConfig::default();
        let store = TicketStore::new(&config);
        PersistedState {
            tickets: store.tickets().to_vec(),
            purchases: Vec::new(),
            winners: Vec::new(),
            config,
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let storage = temp_storage();
        let state = sample_state();
        storage.save(&state).unwrap();
        let loaded = storage.load().unwrap();
        assert_eq!(loaded, state);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let storage = temp_storage();
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_load_corrupt_returns_none() {
        let storage = temp_storage();
        std::fs::write(storage.path(), "{not json").unwrap();
        assert!(storage.load().is_none());
    }

    #[test]
    fn test_clear_removes_file() {
        let storage = temp_storage();
        storage.save(&sample_state()).unwrap();
        storage.clear();
        assert!(storage.load().is_none());
        // 重复清空不报错
        storage.clear();
    }
}
