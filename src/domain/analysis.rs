// ==========================================
// 装配线产能再平衡系统 - 分析结果领域模型
// ==========================================
// 职责: 承载松弛分析与约束分类的逐品目结果
// 红线: 不含计算逻辑
// ==========================================

use crate::domain::types::{AssemblyLine, FamilyTag};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ItemSlack - 品目交付松弛
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSlack {
    pub product_name: String,
    pub qty: i64,                       // 目标日/线计划量
    pub pallet_unit: i64,
    pub cum_due: i64,                   // 截至目标日累计需求
    pub cum_produced: i64,              // 截至目标日累计生产
    pub cumulative_slack: i64,          // cum_produced - cum_due
    pub future_slack: i64,              // 目标日之后 生产 - 需求
    pub max_movable: i64,               // 可安全移出的最大量
    pub last_due_date: Option<NaiveDate>,
    pub buffer_days: i64,               // 距最后交付日天数（无未来交付时为哨兵值）
    pub movable: bool,                  // max_movable >= pallet_unit
}

// ==========================================
// ItemConstraint - 品目线体约束
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConstraint {
    pub product_name: String,
    pub qty: i64,
    pub pallet_unit: i64,
    pub max_movable: i64,
    pub buffer_days: i64,
    pub family: FamilyTag,
    pub origin_line: AssemblyLine,
    pub allowed_lines: Vec<AssemblyLine>, // 可换线目的地（不含原线体）
    pub forbidden_line: Option<AssemblyLine>,
    pub description: String,              // 约束说明（报告用）
    pub priority_hint: String,            // 建议（仅报告用）
}

impl ItemConstraint {
    /// 能否换线到 line（原线体视为允许：仅改日期）
    pub fn can_target_line(&self, line: AssemblyLine) -> bool {
        if line == self.origin_line {
            return self.forbidden_line != Some(line);
        }
        match self.family {
            FamilyTag::Dedicated => false,
            _ => self.allowed_lines.contains(&line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(family: FamilyTag, allowed: Vec<AssemblyLine>, forbidden: Option<AssemblyLine>) -> ItemConstraint {
        ItemConstraint {
            product_name: "X".to_string(),
            qty: 200,
            pallet_unit: 100,
            max_movable: 200,
            buffer_days: 5,
            family,
            origin_line: AssemblyLine::Assy1,
            allowed_lines: allowed,
            forbidden_line: forbidden,
            description: String::new(),
            priority_hint: String::new(),
        }
    }

    #[test]
    fn test_dedicated_only_origin_line() {
        let c = constraint(FamilyTag::Dedicated, vec![], None);
        assert!(c.can_target_line(AssemblyLine::Assy1));
        assert!(!c.can_target_line(AssemblyLine::Assy2));
    }

    #[test]
    fn test_restricted_forbidden_line() {
        let c = constraint(
            FamilyTag::Restricted,
            vec![AssemblyLine::Assy2],
            Some(AssemblyLine::Assy3),
        );
        assert!(c.can_target_line(AssemblyLine::Assy2));
        assert!(!c.can_target_line(AssemblyLine::Assy3));
    }
}
