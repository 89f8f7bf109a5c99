//! 应用状态
//!
//! 单一状态持有者：聚合票券存储、配置管理器、中奖台账与模拟外部服务，
//! 每次变更后整体覆写本地存储。

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{error, info};

use crate::core::draw::{draw_random, DrawResolver, OfficialDrawReport, RandomDraw};
use crate::core::lottery_service::ServiceSimulator;
use crate::core::raffle_config::{ConfigManager, RaffleConfig, TicketPackage};
use crate::core::storage::{LocalStorage, PersistedState};
use crate::core::tickets::{
    AlternativeSuggestions, Buyer, Purchase, Ticket, TicketStats, TicketStore,
};
use crate::core::winners::{winner_id, Winner, WinnerKind, WinnerLedger};
use crate::errors::RaffleError;
use crate::utils::now_iso;

/// 满额开奖的大奖
const GRAND_PRIZE: &str = "Camioneta";
/// 部分售出时的替代现金奖
const CASH_PRIZE: &str = "Premio en Efectivo ($5,000)";

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    tickets: Arc<RwLock<TicketStore>>,
    config: Arc<RwLock<ConfigManager>>,
    winners: Arc<RwLock<WinnerLedger>>,
    services: ServiceSimulator,
    storage: LocalStorage,
}

impl AppState {
    /// 创建应用状态：优先从本地存储恢复，否则使用默认初始状态
    pub fn new(storage: LocalStorage, services: ServiceSimulator) -> Result<Self, String> {
        let (config_manager, store, ledger) = match storage.load() {
            Some(persisted) => {
                let config_manager = ConfigManager::with_config(persisted.config)
                    .map_err(|e| format!("初始化配置管理器失败: {}", e))?;
                let store = TicketStore::from_parts(persisted.tickets, persisted.purchases);
                let ledger = WinnerLedger::from_parts(persisted.winners);
                (config_manager, store, ledger)
            }
            None => {
                let config_manager =
                    ConfigManager::new().map_err(|e| format!("初始化配置管理器失败: {}", e))?;
                let store = TicketStore::new(config_manager.get());
                (config_manager, store, WinnerLedger::new())
            }
        };

        Ok(Self {
            tickets: Arc::new(RwLock::new(store)),
            config: Arc::new(RwLock::new(config_manager)),
            winners: Arc::new(RwLock::new(ledger)),
            services,
            storage,
        })
    }

    /// 每次变更后整体覆写本地存储；持久化失败仅记录日志
    async fn persist(&self) {
        let snapshot = {
            let store = self.tickets.read().await;
            let config = self.config.read().await;
            let winners = self.winners.read().await;
            PersistedState {
                tickets: store.tickets().to_vec(),
                purchases: store.purchases().to_vec(),
                winners: winners.all().to_vec(),
                config: config.get().clone(),
            }
        };
        if let Err(e) = self.storage.save(&snapshot) {
            error!("持久化失败: {}", e);
        }
    }

    pub async fn config(&self) -> RaffleConfig {
        self.config.read().await.get().clone()
    }

    pub async fn packages(&self) -> Vec<TicketPackage> {
        self.config.read().await.packages().to_vec()
    }

    pub async fn tickets_snapshot(&self) -> Vec<Ticket> {
        self.tickets.read().await.tickets().to_vec()
    }

    pub async fn purchases_snapshot(&self) -> Vec<Purchase> {
        self.tickets.read().await.purchases().to_vec()
    }

    pub async fn winners_snapshot(&self) -> Vec<Winner> {
        self.winners.read().await.all().to_vec()
    }

    pub async fn stats(&self) -> TicketStats {
        self.tickets.read().await.stats()
    }

    pub async fn selected_numbers(&self) -> Vec<String> {
        self.tickets.read().await.selected_numbers()
    }

    /// 新增用户输入的票号
    pub async fn add_ticket(&self, number: &str) -> Result<(), RaffleError> {
        let config = self.config().await;
        {
            let mut store = self.tickets.write().await;
            store.add_ticket(&config, number)?;
        }
        self.persist().await;
        Ok(())
    }

    /// 插入重号时选定的备选号码
    pub async fn add_alternative(&self, number: &str) -> Result<(), RaffleError> {
        let config = self.config().await;
        {
            let mut store = self.tickets.write().await;
            store.add_alternative(&config, number)?;
        }
        self.persist().await;
        Ok(())
    }

    /// 针对重号给出备选号码建议
    pub async fn suggest_alternatives(&self, number: &str) -> AlternativeSuggestions {
        let config = self.config().await;
        let store = self.tickets.read().await;
        store.suggest_alternatives(&config, number, &mut rand::thread_rng())
    }

    pub async fn select_ticket(&self, number: &str) -> Result<(), RaffleError> {
        {
            let mut store = self.tickets.write().await;
            store.select(number)?;
        }
        self.persist().await;
        Ok(())
    }

    pub async fn deselect_ticket(&self, number: &str) -> Result<(), RaffleError> {
        {
            let mut store = self.tickets.write().await;
            store.deselect(number)?;
        }
        self.persist().await;
        Ok(())
    }

    pub async fn remove_ticket(&self, number: &str) -> Result<(), RaffleError> {
        {
            let mut store = self.tickets.write().await;
            store.remove_ticket(number)?;
        }
        self.persist().await;
        Ok(())
    }

    /// 确认购买：给定号码全部转为已售出并生成一条购买记录
    pub async fn confirm_purchase(
        &self,
        buyer: Buyer,
        numbers: &[String],
        order_id: Option<String>,
    ) -> Result<Purchase, RaffleError> {
        let config = self.config().await;
        let purchase = {
            let mut store = self.tickets.write().await;
            store.confirm_purchase(&config, buyer, numbers, order_id)?
        };
        self.persist().await;
        info!("订单 {} 确认，共 {} 张票", purchase.order_id, purchase.tickets.len());
        Ok(purchase)
    }

    /// 管理员更新配置；校验失败不改变状态
    pub async fn update_config(&self, config: RaffleConfig) -> Result<(), Vec<String>> {
        {
            let mut manager = self.config.write().await;
            manager.update(config)?;
        }
        self.persist().await;
        Ok(())
    }

    /// 恢复默认配置
    pub async fn reset_config(&self) {
        {
            let mut manager = self.config.write().await;
            manager.reset_to_defaults();
        }
        self.persist().await;
    }

    /// 官方开奖：查询号码 → 解析 → 发票与邮件 → 追加中奖记录
    pub async fn official_draw(&self) -> Result<OfficialDrawReport, RaffleError> {
        let config = self.config().await;
        let (tickets, sold_count) = {
            let store = self.tickets.read().await;
            (store.tickets().to_vec(), store.sold_tickets().len())
        };
        if sold_count == 0 {
            return Err(RaffleError::NoSoldTickets);
        }

        info!("步骤 1/3: 查询官方中奖号码");
        let lottery = self.services.query_winning_number().await;

        info!("步骤 2/3: 验证中奖号码 {}", lottery.winning_number);
        let outcome = DrawResolver::resolve(&tickets, &lottery.winning_number);

        let all_tickets_sold = sold_count >= config.total_tickets.unwrap_or(100) as usize;
        let prize = if all_tickets_sold { GRAND_PRIZE } else { CASH_PRIZE };

        info!("步骤 3/3: 生成结果");
        let mut invoice = None;
        if let Some(ticket) = outcome.ticket() {
            let winning_purchase = {
                let store = self.tickets.read().await;
                store
                    .purchases()
                    .iter()
                    .find(|p| p.tickets.iter().any(|t| *t == ticket.number))
                    .cloned()
            };
            if let Some(purchase) = winning_purchase {
                let amount = purchase.tickets.len() as f64 * config.ticket_price;
                invoice = Some(
                    self.services
                        .generate_invoice(amount, purchase.buyer.clone(), purchase.tickets.clone())
                        .await,
                );
                let _ = self
                    .services
                    .send_email(
                        &purchase.buyer.email,
                        "¡Tenemos un Ganador!",
                        &format!("Boleto ganador: {}. Premio: {}", ticket.number, prize),
                    )
                    .await;
            }

            let buyer_name = {
                let store = self.tickets.read().await;
                store.buyer_of(&ticket.number)
            };
            let mut ledger = self.winners.write().await;
            ledger.append(Winner {
                id: winner_id(WinnerKind::Official, 0, &mut rand::thread_rng()),
                ticket_number: ticket.number.clone(),
                buyer_name,
                prize: prize.to_string(),
                draw_date: now_iso(),
                kind: WinnerKind::Official,
            });
        }
        self.persist().await;

        Ok(OfficialDrawReport {
            lottery,
            outcome,
            invoice,
            prize: prize.to_string(),
            all_tickets_sold,
        })
    }

    /// 现金小奖抽取
    pub async fn economic_draw(
        &self,
        count: usize,
        prize_amount: f64,
        seed: &str,
    ) -> Result<Vec<Winner>, RaffleError> {
        self.random_draw(
            RandomDraw {
                count,
                prize: format!("${}", prize_amount),
                kind: WinnerKind::Economic,
            },
            seed,
        )
        .await
    }

    /// 大奖抽取
    pub async fn major_draw(
        &self,
        count: usize,
        prize_description: &str,
        seed: &str,
    ) -> Result<Vec<Winner>, RaffleError> {
        self.random_draw(
            RandomDraw {
                count,
                prize: prize_description.to_string(),
                kind: WinnerKind::Major,
            },
            seed,
        )
        .await
    }

    async fn random_draw(
        &self,
        request: RandomDraw,
        seed: &str,
    ) -> Result<Vec<Winner>, RaffleError> {
        let winners = {
            let store = self.tickets.read().await;
            draw_random(&store, &request, seed)?
        };
        {
            let mut ledger = self.winners.write().await;
            ledger.extend(winners.clone());
        }
        self.persist().await;
        info!("抽取完成，{} 位中奖者", winners.len());
        Ok(winners)
    }

    /// 重置整个应用：清空本地存储并回到默认初始状态
    pub async fn reset(&self) {
        self.storage.clear();
        let mut manager = self.config.write().await;
        manager.reset_to_defaults();
        let mut store = self.tickets.write().await;
        store.reset(manager.get());
        let mut ledger = self.winners.write().await;
        *ledger = WinnerLedger::new();
        info!("应用已重置为默认状态");
    }
}
