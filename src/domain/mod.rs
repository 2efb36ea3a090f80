// ==========================================
// 装配线产能再平衡系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、业务规则接口
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod analysis;
pub mod capacity;
pub mod move_plan;
pub mod plan;
pub mod report;
pub mod types;

// 重导出核心类型
pub use analysis::{ItemConstraint, ItemSlack};
pub use capacity::{CapacityConstraint, CapacityLedger, CapacitySlot, LedgerError};
pub use move_plan::{Move, ProposedMove, Violation};
pub use plan::{Location, PlanEntry, PlanSnapshot, StockItem, StockList, WorkdayCalendar};
pub use report::{ProposalSummary, RebalanceOutcome, RebalanceReport};
pub use types::{
    AssemblyLine, Disposition, FamilyTag, MoveDirection, MoveOrigin, OperationMode, ViolationKind,
};
