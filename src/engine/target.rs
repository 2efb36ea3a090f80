// ==========================================
// 装配线产能再平衡系统 - 调整目标解析
// ==========================================
// 职责: 把"产能比例"或"追加数量"换算为目标量与操作方向
// 红线: 比例只接受 (0, 2],追加量只接受正数
// ==========================================

use crate::domain::types::OperationMode;
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// ==========================================
// TargetSpec - 调整目标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetSpec {
    /// 目标产能比例（0.75 即 75%）
    CapacityRatio(f64),
    /// 在现有量基础上追加
    AdditionalQty(i64),
}

impl FromStr for TargetSpec {
    type Err = String;

    /// 支持 "75%" / "0.75" / "+200"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if let Some(add) = raw.strip_prefix('+') {
            let qty = add
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("追加数量格式错误 '{}': {}", raw, e))?;
            return Ok(TargetSpec::AdditionalQty(qty));
        }
        if let Some(pct) = raw.strip_suffix('%') {
            let value = pct
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("比例格式错误 '{}': {}", raw, e))?;
            return Ok(TargetSpec::CapacityRatio(value / 100.0));
        }
        raw.parse::<f64>()
            .map(TargetSpec::CapacityRatio)
            .map_err(|e| format!("无法识别的目标 '{}': {}", raw, e))
    }
}

// ==========================================
// TargetAction / ResolvedTarget
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetAction {
    Operate { mode: OperationMode, qty: i64 },
    NoActionNeeded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub current_total: i64,
    pub max_capacity: i64,
    pub target_qty: i64,
    pub capacity_ratio: f64,
    pub action: TargetAction,
}

impl ResolvedTarget {
    pub fn mode(&self) -> Option<OperationMode> {
        match self.action {
            TargetAction::Operate { mode, .. } => Some(mode),
            TargetAction::NoActionNeeded => None,
        }
    }

    /// 需要移动的量（无需操作时为 0）
    pub fn operation_qty(&self) -> i64 {
        match self.action {
            TargetAction::Operate { qty, .. } => qty,
            TargetAction::NoActionNeeded => 0,
        }
    }
}

// ==========================================
// TargetResolver
// ==========================================
#[derive(Debug, Default)]
pub struct TargetResolver;

impl TargetResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(
        &self,
        spec: TargetSpec,
        current_total: i64,
        max_capacity: i64,
    ) -> EngineResult<ResolvedTarget> {
        let (target_qty, capacity_ratio) = match spec {
            TargetSpec::CapacityRatio(ratio) => {
                if !ratio.is_finite() || ratio <= 0.0 || ratio > 2.0 {
                    return Err(EngineError::InvalidTarget(format!(
                        "产能比例必须在 (0, 2] 之内: {}",
                        ratio
                    )));
                }
                // 加极小量抵消浮点误差（3300 * 0.7 = 2309.999...）
                let qty = (max_capacity as f64 * ratio + 1e-9).floor() as i64;
                (qty, ratio)
            }
            TargetSpec::AdditionalQty(add) => {
                if add <= 0 {
                    return Err(EngineError::InvalidTarget(format!("追加数量必须为正数: {}", add)));
                }
                let qty = current_total + add;
                let ratio = if max_capacity > 0 {
                    qty as f64 / max_capacity as f64
                } else {
                    0.0
                };
                (qty, ratio)
            }
        };

        let delta = current_total - target_qty;
        let action = if delta > 0 {
            TargetAction::Operate {
                mode: OperationMode::Reduce,
                qty: delta,
            }
        } else if delta < 0 {
            TargetAction::Operate {
                mode: OperationMode::Increase,
                qty: -delta,
            }
        } else {
            TargetAction::NoActionNeeded
        };

        Ok(ResolvedTarget {
            current_total,
            max_capacity,
            target_qty,
            capacity_ratio,
            action,
        })
    }
}
