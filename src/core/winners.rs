//! 中奖记录台账
//!
//! 仅追加、不可变更的中奖记录集合。

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::utils::now_millis;

/// 抽奖类型
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WinnerKind {
    /// 现金小奖
    Economic,
    /// 大奖
    Major,
    /// 官方号码开奖
    Official,
}

impl WinnerKind {
    fn id_prefix(&self) -> &'static str {
        match self {
            WinnerKind::Economic => "eco",
            WinnerKind::Major => "major",
            WinnerKind::Official => "official",
        }
    }
}

/// 中奖记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Winner {
    pub id: String,
    pub ticket_number: String,
    pub buyer_name: Option<String>,
    pub prize: String,
    pub draw_date: String,
    pub kind: WinnerKind,
}

/// 生成中奖记录 ID：`<前缀>-<毫秒>-<序号>-<随机 hex>`
pub fn winner_id<R: RngCore>(kind: WinnerKind, index: usize, rng: &mut R) -> String {
    let mut nonce = [0u8; 4];
    rng.fill_bytes(&mut nonce);
    format!(
        "{}-{}-{}-{}",
        kind.id_prefix(),
        now_millis(),
        index,
        hex::encode(nonce)
    )
}

/// 中奖台账；只追加，永不修改既有记录
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct WinnerLedger {
    winners: Vec<Winner>,
}

impl WinnerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(winners: Vec<Winner>) -> Self {
        Self { winners }
    }

    pub fn append(&mut self, winner: Winner) {
        self.winners.push(winner);
    }

    pub fn extend(&mut self, winners: impl IntoIterator<Item = Winner>) {
        self.winners.extend(winners);
    }

    pub fn all(&self) -> &[Winner] {
        &self.winners
    }

    pub fn by_kind(&self, kind: WinnerKind) -> Vec<&Winner> {
        self.winners.iter().filter(|w| w.kind == kind).collect()
    }

    pub fn len(&self) -> usize {
        self.winners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_append_only_ledger() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut ledger = WinnerLedger::new();
        ledger.append(Winner {
            id: winner_id(WinnerKind::Economic, 0, &mut rng),
            ticket_number: "00042".to_string(),
            buyer_name: Some("Ana Torres".to_string()),
            prize: "$100".to_string(),
            draw_date: "2025-01-01T00:00:00Z".to_string(),
            kind: WinnerKind::Economic,
        });
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.by_kind(WinnerKind::Economic).len(), 1);
        assert!(ledger.by_kind(WinnerKind::Major).is_empty());
    }

    #[test]
    fn test_winner_id_shape() {
        let mut rng = StdRng::seed_from_u64(2);
        let id = winner_id(WinnerKind::Major, 3, &mut rng);
        let parts: Vec<&str> = id.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "major");
        assert_eq!(parts[2], "3");
        assert_eq!(parts[3].len(), 8);
    }
}
