// ==========================================
// 装配线产能再平衡系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 读取上游计划快照,屏蔽数据库细节
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod plan_snapshot_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use plan_snapshot_repo::PlanSnapshotRepository;
