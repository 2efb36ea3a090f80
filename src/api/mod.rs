// ==========================================
// 装配线产能再平衡系统 - API 层
// ==========================================
// 职责: 装配快照来源 + 配置 + 引擎,供 CLI 或上层服务调用
// ==========================================

pub mod error;
pub mod rebalance_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use rebalance_api::{RebalanceApi, SnapshotSource};
