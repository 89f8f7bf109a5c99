//! 抽奖参数配置管理模块
//!
//! 实现抽奖配置的定义、校验、更新与默认值管理，
//! 以及票券套餐目录与阶梯定价。

use jsonschema::{Draft, JSONSchema};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 票号的全局下界
pub const NUMBER_LOWER_BOUND: u32 = 1;
/// 票号的全局上界
pub const NUMBER_UPPER_BOUND: u32 = 99999;

/// 抽奖参数配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RaffleConfig {
    /// 单张票价
    pub ticket_price: f64,
    /// 最小票号（含）
    pub min_ticket_number: u32,
    /// 最大票号（含）
    pub max_ticket_number: u32,
    /// 预置票总数，决定初始网格大小
    pub total_tickets: Option<u32>,
    /// 单笔购买的最少票数
    pub min_tickets_per_purchase: u32,
}

impl Default for RaffleConfig {
    fn default() -> Self {
        Self {
            ticket_price: 10.0,
            min_ticket_number: NUMBER_LOWER_BOUND,
            max_ticket_number: NUMBER_UPPER_BOUND,
            total_tickets: Some(100),
            min_tickets_per_purchase: 6,
        }
    }
}

/// 票券套餐；`count` 为 None 时表示自选数量套餐
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketPackage {
    pub id: String,
    pub name: String,
    pub count: Option<u32>,
    pub price: f64,
    pub description: String,
}

/// 默认套餐目录
pub fn default_packages() -> Vec<TicketPackage> {
    vec![
        TicketPackage {
            id: "package-6".to_string(),
            name: "Paquete Básico".to_string(),
            count: Some(6),
            price: 60.0,
            description: "6 boletos personalizados".to_string(),
        },
        TicketPackage {
            id: "package-10".to_string(),
            name: "Paquete Estándar".to_string(),
            count: Some(10),
            price: 95.0,
            description: "10 boletos personalizados".to_string(),
        },
        TicketPackage {
            id: "package-15".to_string(),
            name: "Paquete Premium".to_string(),
            count: Some(15),
            price: 135.0,
            description: "15 boletos personalizados".to_string(),
        },
        TicketPackage {
            id: "package-20".to_string(),
            name: "Paquete VIP".to_string(),
            count: Some(20),
            price: 170.0,
            description: "20 boletos personalizados".to_string(),
        },
        TicketPackage {
            id: "package-custom".to_string(),
            name: "Cantidad Personalizada".to_string(),
            count: None,
            price: 0.0,
            description: "Elige tu cantidad (mín. 6 boletos)".to_string(),
        },
    ]
}

/// 自选数量套餐的阶梯定价
pub fn custom_package_price(count: u32) -> f64 {
    let per_ticket = if count <= 6 {
        10.0
    } else if count <= 10 {
        9.5
    } else if count <= 15 {
        9.0
    } else {
        8.5
    };
    count as f64 * per_ticket
}

/// 配置验证器
pub struct ConfigValidator {
    schema: JSONSchema,
}

impl ConfigValidator {
    /// 创建新的配置验证器
    pub fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        static SCHEMA_JSON: Lazy<Value> = Lazy::new(|| {
            serde_json::json!({
                "type": "object",
                "properties": {
                    "ticket_price": {
                        "type": "number",
                        "exclusiveMinimum": 0
                    },
                    "min_ticket_number": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 99999
                    },
                    "max_ticket_number": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": 99999
                    },
                    "total_tickets": {
                        "type": ["integer", "null"],
                        "minimum": 1
                    },
                    "min_tickets_per_purchase": {
                        "type": "integer",
                        "minimum": 1
                    }
                },
                "required": [
                    "ticket_price",
                    "min_ticket_number",
                    "max_ticket_number",
                    "min_tickets_per_purchase"
                ]
            })
        });

        let schema = JSONSchema::options()
            .with_draft(Draft::Draft7)
            .compile(&*SCHEMA_JSON)
            .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)?;

        Ok(Self { schema })
    }

    /// 验证配置定义；返回全部违规信息
    pub fn validate(&self, config: &RaffleConfig) -> Result<(), Vec<String>> {
        let config_json = serde_json::to_value(config)
            .map_err(|e| vec![format!("配置序列化失败: {}", e)])?;

        let result = match self.schema.validate(&config_json) {
            Ok(_) => self.validate_business_rules(config),
            Err(errors) => {
                let error_messages: Vec<String> = errors.map(|e| format!("{}", e)).collect();
                Err(error_messages)
            }
        };
        result
    }

    /// 验证业务规则
    fn validate_business_rules(&self, config: &RaffleConfig) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !config.ticket_price.is_finite() || config.ticket_price <= 0.0 {
            errors.push("票价必须为大于 0 的有限数".to_string());
        }

        if config.min_ticket_number >= config.max_ticket_number {
            errors.push("最小票号必须小于最大票号".to_string());
        }

        if config.min_ticket_number < NUMBER_LOWER_BOUND
            || config.max_ticket_number > NUMBER_UPPER_BOUND
        {
            errors.push(format!(
                "票号范围必须位于 [{}, {}] 之内",
                NUMBER_LOWER_BOUND, NUMBER_UPPER_BOUND
            ));
        }

        if let Some(total) = config.total_tickets {
            let range_size = config
                .max_ticket_number
                .saturating_sub(config.min_ticket_number)
                .saturating_add(1);
            if total > range_size {
                errors.push("预置票总数超过票号范围容量".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// 配置管理器：仅管理员操作会更新配置
pub struct ConfigManager {
    config: RaffleConfig,
    packages: Vec<TicketPackage>,
    validator: ConfigValidator,
}

impl ConfigManager {
    /// 创建新的配置管理器，使用默认配置
    pub fn new() -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        Ok(Self {
            config: RaffleConfig::default(),
            packages: default_packages(),
            validator: ConfigValidator::new()?,
        })
    }

    /// 从持久化状态恢复
    pub fn with_config(
        config: RaffleConfig,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync + 'static>> {
        Ok(Self {
            config,
            packages: default_packages(),
            validator: ConfigValidator::new()?,
        })
    }

    /// 当前生效配置
    pub fn get(&self) -> &RaffleConfig {
        &self.config
    }

    /// 套餐目录
    pub fn packages(&self) -> &[TicketPackage] {
        &self.packages
    }

    /// 更新配置；校验失败时不改变任何状态
    pub fn update(&mut self, config: RaffleConfig) -> Result<(), Vec<String>> {
        self.validator.validate(&config)?;
        self.config = config;
        Ok(())
    }

    /// 恢复默认配置
    pub fn reset_to_defaults(&mut self) {
        self.config = RaffleConfig::default();
        self.packages = default_packages();
    }
}
