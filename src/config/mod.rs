// ==========================================
// 装配线产能再平衡系统 - 配置层
// ==========================================
// 职责: 引擎常量的装配与校验
// 存储: config_kv 表 / JSON 文件
// ==========================================

pub mod config_manager;
pub mod engine_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::{ConfigError, EngineConfig, FamilyMarkers, PastHorizonRule};
