// ==========================================
// 装配线产能再平衡系统 - 引擎配置
// ==========================================
// 职责: 一次运行所需的全部常量（基准日、线体产能、搜索窗口、阈值）
// 红线: 显式注入,不做进程级可变单例
// ==========================================

use crate::domain::types::AssemblyLine;
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

// ==========================================
// ConfigError
// ==========================================
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置文件解析失败: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("配置值非法 (key: {key}): {message}")]
    Invalid { key: String, message: String },
}

// ==========================================
// PastHorizonRule - 提前生产候选天数
// ==========================================
// 目标日离基准日越远,可提前的天数越少（经验阈值,保持可配）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PastHorizonRule {
    pub near_days: i64,  // 目标日距今 <= near_days
    pub near_range: i64, // 可提前天数
    pub mid_days: i64,   // 目标日距今 <= mid_days
    pub mid_range: i64,
    pub far_range: i64,  // 其余
}

impl Default for PastHorizonRule {
    fn default() -> Self {
        Self {
            near_days: 7,
            near_range: 3,
            mid_days: 14,
            mid_range: 2,
            far_range: 1,
        }
    }
}

impl PastHorizonRule {
    /// 根据目标日距基准日的天数给出提前候选天数
    pub fn range_for(&self, days_from_today: i64) -> i64 {
        if days_from_today <= self.near_days {
            self.near_range
        } else if days_from_today <= self.mid_days {
            self.mid_range
        } else {
            self.far_range
        }
    }
}

// ==========================================
// FamilyMarkers - 产品族名称标记
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FamilyMarkers {
    pub universal: String,                    // 通用族标记
    pub restricted: String,                   // 受限族标记
    pub restricted_forbidden_line: AssemblyLine,
}

impl Default for FamilyMarkers {
    fn default() -> Self {
        Self {
            universal: "T6".to_string(),
            restricted: "A2XX".to_string(),
            restricted_forbidden_line: AssemblyLine::Assy3,
        }
    }
}

// ==========================================
// EngineConfig
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub today: NaiveDate,
    pub capacity_limits: BTreeMap<AssemblyLine, i64>,
    pub frozen_days: i64,
    pub future_window_workdays: usize,
    pub future_scan_days: i64,
    pub reduction_future_days: i64,
    pub increase_future_days: i64,
    pub achievement_threshold: f64,
    pub default_capacity_ratio: f64,
    pub no_due_buffer_days: i64,
    pub past_horizon: PastHorizonRule,
    pub markers: FamilyMarkers,
    pub proposer_timeout_secs: u64,
    pub snapshot_window_days: i64,
}

/// 默认线体日产能
pub fn default_capacity_limits() -> BTreeMap<AssemblyLine, i64> {
    BTreeMap::from([
        (AssemblyLine::Assy1, 3300),
        (AssemblyLine::Assy2, 3700),
        (AssemblyLine::Assy3, 3600),
    ])
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            today: Local::now().date_naive(),
            capacity_limits: default_capacity_limits(),
            frozen_days: 3,
            future_window_workdays: 10,
            future_scan_days: 10,
            reduction_future_days: 15,
            increase_future_days: 10,
            achievement_threshold: 0.9,
            default_capacity_ratio: 0.75,
            no_due_buffer_days: 999,
            past_horizon: PastHorizonRule::default(),
            markers: FamilyMarkers::default(),
            proposer_timeout_secs: 30,
            snapshot_window_days: 10,
        }
    }
}

impl EngineConfig {
    /// 以指定基准日创建默认配置
    pub fn with_today(today: NaiveDate) -> Self {
        Self {
            today,
            ..Self::default()
        }
    }

    /// 线体日产能（未配置视为 0）
    pub fn capacity_of(&self, line: AssemblyLine) -> i64 {
        self.capacity_limits.get(&line).copied().unwrap_or(0)
    }

    /// 从 JSON 文件加载（缺失字段取默认值）
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        for line in AssemblyLine::ALL {
            if self.capacity_of(line) <= 0 {
                return Err(ConfigError::Invalid {
                    key: format!("capacity_limits.{}", line),
                    message: "线体日产能必须为正数".to_string(),
                });
            }
        }

        if !(self.achievement_threshold > 0.0 && self.achievement_threshold <= 1.0) {
            return Err(ConfigError::Invalid {
                key: "achievement_threshold".to_string(),
                message: format!("必须在 (0, 1] 之内: {}", self.achievement_threshold),
            });
        }

        if !(self.default_capacity_ratio > 0.0 && self.default_capacity_ratio <= 2.0) {
            return Err(ConfigError::Invalid {
                key: "default_capacity_ratio".to_string(),
                message: format!("必须在 (0, 2] 之内: {}", self.default_capacity_ratio),
            });
        }

        if self.frozen_days < 0 {
            return Err(ConfigError::Invalid {
                key: "frozen_days".to_string(),
                message: "冻结天数不能为负".to_string(),
            });
        }

        if self.future_window_workdays == 0
            || self.future_scan_days <= 0
            || self.reduction_future_days <= 0
            || self.increase_future_days <= 0
        {
            return Err(ConfigError::Invalid {
                key: "future_window".to_string(),
                message: "搜索窗口必须为正数".to_string(),
            });
        }

        if self.markers.universal.trim().is_empty() || self.markers.restricted.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "markers".to_string(),
                message: "产品族标记不能为空".to_string(),
            });
        }

        Ok(())
    }
}
