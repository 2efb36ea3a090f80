// ==========================================
// 装配线产能再平衡系统 - 移动方案领域模型
// ==========================================
// 红线: 每条移动都必须带 reason；每条提议都必须有且只有一个终态处置
// ==========================================

use crate::domain::plan::Location;
use crate::domain::types::{Disposition, MoveDirection, MoveOrigin, ViolationKind};
use serde::{Deserialize, Serialize};

// ==========================================
// ProposedMove - 外部提议的移动（不可信输入）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedMove {
    pub item: Option<String>,
    pub qty: i64,
    pub from: Option<String>,
    pub to: String,
    pub reason: String,
}

// ==========================================
// Move - 已确认的移动
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub item: String,
    pub qty: i64,
    pub pallets: i64,
    pub from: Location,
    pub to: Location,
    pub direction: MoveDirection,
    pub origin: MoveOrigin,
    pub reason: String,
    pub adjusted: bool,
    pub original_qty: Option<i64>,
}

impl Move {
    /// 由起止位置推断方向：换线优先，其次按日期先后
    pub fn infer_direction(from: &Location, to: &Location) -> MoveDirection {
        if from.line != to.line {
            MoveDirection::Transfer
        } else if to.date < from.date {
            MoveDirection::Advance
        } else if to.date > from.date {
            MoveDirection::Postpone
        } else {
            MoveDirection::Transfer
        }
    }
}

/// 移动总量
pub fn total_qty(moves: &[Move]) -> i64 {
    moves.iter().map(|m| m.qty).sum()
}

// ==========================================
// Violation - 处置/事件记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub move_index: Option<usize>, // 1 起始；规划器级事件为 None
    pub item: Option<String>,
    pub kind: ViolationKind,
    pub disposition: Disposition,
    pub message: String,
}

impl Violation {
    pub fn accepted(move_index: usize, item: &str, message: String) -> Self {
        Self {
            move_index: Some(move_index),
            item: Some(item.to_string()),
            kind: ViolationKind::Accepted,
            disposition: Disposition::Accepted,
            message,
        }
    }

    pub fn adjusted(move_index: usize, item: &str, message: String) -> Self {
        Self {
            move_index: Some(move_index),
            item: Some(item.to_string()),
            kind: ViolationKind::CapacityAdjusted,
            disposition: Disposition::Adjusted,
            message,
        }
    }

    pub fn rejected(move_index: usize, item: Option<&str>, kind: ViolationKind, message: String) -> Self {
        Self {
            move_index: Some(move_index),
            item: item.map(|s| s.to_string()),
            kind,
            disposition: Disposition::Rejected,
            message,
        }
    }

    pub fn info(kind: ViolationKind, item: Option<&str>, message: String) -> Self {
        Self {
            move_index: None,
            item: item.map(|s| s.to_string()),
            kind,
            disposition: Disposition::Info,
            message,
        }
    }

    pub fn is_rejection(&self) -> bool {
        self.disposition == Disposition::Rejected
    }

    pub fn is_adjustment(&self) -> bool {
        self.disposition == Disposition::Adjusted
    }
}
