//! 通用工具函数

use chrono::Utc;

/// 当前 Unix 毫秒
pub fn now_millis() -> u128 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// 当前时间的 RFC 3339 字符串
pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

/// 票号固定为 5 位补零格式
pub fn pad_number(n: u32) -> String {
    format!("{:05}", n)
}

/// 解析 5 位票号；格式非法返回 None
pub fn parse_number(s: &str) -> Option<u32> {
    if s.len() != 5 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<u32>().ok()
}
