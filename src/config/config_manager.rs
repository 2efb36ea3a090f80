// ==========================================
// 装配线产能再平衡系统 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表装配 EngineConfig，缺失键回落默认值
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config::EngineConfig;
use crate::db::open_sqlite_connection;
use crate::domain::types::AssemblyLine;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 读取 global scope 的全部配置
    fn load_global_values(&self) -> Result<HashMap<String, String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut values = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            values.insert(key, value);
        }
        Ok(values)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn upsert_global(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 装配引擎配置
    ///
    /// # 说明
    /// - 未配置的键使用 EngineConfig::default()
    /// - 值无法解析时直接报错（不静默吞掉）
    pub fn load_engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        let values = self.load_global_values()?;
        let mut config = EngineConfig::default();

        if let Some(v) = values.get(config_keys::TODAY) {
            config.today = NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d")
                .map_err(|e| format!("{} 格式错误: {}", config_keys::TODAY, e))?;
        }

        for line in AssemblyLine::ALL {
            let key = format!("{}{}", config_keys::CAPACITY_LIMIT_PREFIX, line);
            if let Some(v) = values.get(&key) {
                config.capacity_limits.insert(line, parse_value(&key, v)?);
            }
        }

        if let Some(v) = values.get(config_keys::FROZEN_DAYS) {
            config.frozen_days = parse_value(config_keys::FROZEN_DAYS, v)?;
        }
        if let Some(v) = values.get(config_keys::FUTURE_WINDOW_WORKDAYS) {
            config.future_window_workdays = parse_value(config_keys::FUTURE_WINDOW_WORKDAYS, v)?;
        }
        if let Some(v) = values.get(config_keys::REDUCTION_FUTURE_DAYS) {
            config.reduction_future_days = parse_value(config_keys::REDUCTION_FUTURE_DAYS, v)?;
        }
        if let Some(v) = values.get(config_keys::INCREASE_FUTURE_DAYS) {
            config.increase_future_days = parse_value(config_keys::INCREASE_FUTURE_DAYS, v)?;
        }
        if let Some(v) = values.get(config_keys::ACHIEVEMENT_THRESHOLD) {
            config.achievement_threshold = parse_value(config_keys::ACHIEVEMENT_THRESHOLD, v)?;
        }
        if let Some(v) = values.get(config_keys::DEFAULT_CAPACITY_RATIO) {
            config.default_capacity_ratio = parse_value(config_keys::DEFAULT_CAPACITY_RATIO, v)?;
        }
        if let Some(v) = values.get(config_keys::UNIVERSAL_MARKER) {
            config.markers.universal = v.trim().to_string();
        }
        if let Some(v) = values.get(config_keys::RESTRICTED_MARKER) {
            config.markers.restricted = v.trim().to_string();
        }
        if let Some(v) = values.get(config_keys::RESTRICTED_FORBIDDEN_LINE) {
            config.markers.restricted_forbidden_line = v.parse::<AssemblyLine>()?;
        }
        if let Some(v) = values.get(config_keys::PROPOSER_TIMEOUT_SECS) {
            config.proposer_timeout_secs = parse_value(config_keys::PROPOSER_TIMEOUT_SECS, v)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, Box<dyn Error>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| format!("配置值格式错误 (key: {}, value: {}): {}", key, raw, e).into())
}

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // 基准日
    pub const TODAY: &str = "today";

    // 产能（按线体后缀，如 capacity_limit/ASSY1）
    pub const CAPACITY_LIMIT_PREFIX: &str = "capacity_limit/";

    // 冻结区
    pub const FROZEN_DAYS: &str = "frozen_days";

    // 搜索窗口
    pub const FUTURE_WINDOW_WORKDAYS: &str = "future_window_workdays";
    pub const REDUCTION_FUTURE_DAYS: &str = "reduction_future_days";
    pub const INCREASE_FUTURE_DAYS: &str = "increase_future_days";

    // 阈值
    pub const ACHIEVEMENT_THRESHOLD: &str = "achievement_threshold";
    pub const DEFAULT_CAPACITY_RATIO: &str = "default_capacity_ratio";

    // 产品族
    pub const UNIVERSAL_MARKER: &str = "universal_marker";
    pub const RESTRICTED_MARKER: &str = "restricted_marker";
    pub const RESTRICTED_FORBIDDEN_LINE: &str = "restricted_forbidden_line";

    // 外部提议器
    pub const PROPOSER_TIMEOUT_SECS: &str = "proposer_timeout_secs";
}
