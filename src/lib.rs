// ==========================================
// 装配线产能再平衡系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 决策支持系统 (输出调整方案,不回写计划)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 计划快照读取
pub mod repository;

// 引擎层 - 再平衡规则
pub mod engine;

// 导入层 - 计划文件
pub mod importer;

// 配置层 - 引擎常量
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AssemblyLine, FamilyTag, MoveDirection, MoveOrigin, OperationMode, ViolationKind,
};

// 领域实体
pub use domain::{
    CapacityLedger, CapacitySlot, Location, Move, PlanEntry, PlanSnapshot, ProposedMove,
    RebalanceOutcome, RebalanceReport, Violation,
};

// 配置
pub use config::EngineConfig;

// 引擎
pub use engine::{
    RebalanceOrchestrator, RebalanceRequest, StrategyProposer, TargetSpec,
};

// API
pub use api::{RebalanceApi, SnapshotSource};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "装配线产能再平衡系统";
