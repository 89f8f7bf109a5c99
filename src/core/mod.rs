//! 核心业务逻辑模块

pub mod draw;
pub mod lottery_service;
pub mod raffle_config;
pub mod storage;
pub mod tickets;
pub mod winners;
