// ==========================================
// 装配线产能再平衡系统 - 调整报告领域模型
// ==========================================
// 职责: 汇总各阶段结论，供外部渲染
// 红线: 未达标必须显式标记，不得伪装成功
// ==========================================

use crate::domain::analysis::{ItemConstraint, ItemSlack};
use crate::domain::capacity::CapacitySlot;
use crate::domain::move_plan::{Move, Violation};
use crate::domain::plan::StockList;
use crate::domain::types::{AssemblyLine, OperationMode};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// ==========================================
// 结果判定
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceOutcome {
    /// 达到阈值（默认 90%）
    TargetReached,
    /// 未达阈值，附说明
    Partial { explanation: String },
    /// 当前量已等于目标
    AlreadyAtTarget,
}

impl RebalanceOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RebalanceOutcome::Partial { .. })
    }
}

// ==========================================
// 提议摘要
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalSummary {
    pub strategy: Option<String>,
    pub explanation: Option<String>,
    pub proposed_count: usize,
    pub failed: bool,
    pub error: Option<String>,
}

// ==========================================
// RebalanceReport - 调整报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceReport {
    // ===== 运行信息 =====
    pub run_id: String,
    pub generated_at: NaiveDateTime,
    pub today: NaiveDate,

    // ===== 目标 =====
    pub target_date: NaiveDate,
    pub target_line: AssemblyLine,
    pub mode: Option<OperationMode>,
    pub current_total: i64,
    pub target_qty: i64,
    pub capacity_ratio: f64,
    pub operation_qty: i64,

    // ===== 各阶段结论 =====
    pub stock: StockList,
    pub slack_table: Vec<ItemSlack>,
    pub capacity_table: Vec<CapacitySlot>, // 分析时快照（未消耗）
    pub ledger_after: Vec<CapacitySlot>,   // 校验 + 兜底之后
    pub constraint_table: Vec<ItemConstraint>,
    pub proposal: ProposalSummary,
    pub strategy_source: String,

    // ===== 最终方案 =====
    pub moves: Vec<Move>,
    pub violations: Vec<Violation>,
    pub total_moved: i64,
    pub final_qty: i64,
    pub achievement_rate: f64, // 百分比
    pub outcome: RebalanceOutcome,
}

impl RebalanceReport {
    pub fn rejection_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_rejection()).count()
    }

    pub fn adjustment_count(&self) -> usize {
        self.violations.iter().filter(|v| v.is_adjustment()).count()
    }
}

/// 达成率（百分比）；操作量为 0 时返回 0
pub fn achievement_rate(total_moved: i64, operation_qty: i64) -> f64 {
    if operation_qty <= 0 {
        return 0.0;
    }
    total_moved as f64 / operation_qty as f64 * 100.0
}
