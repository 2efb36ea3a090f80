// ==========================================
// 装配线产能再平衡系统 - 产能账本领域模型
// ==========================================
// 红线: 任何已提交的移动都不得让 remaining 变为负数
// 用途: 校验器与兜底搜索共用的同一本账
// ==========================================

use crate::domain::plan::Location;
use crate::domain::types::AssemblyLine;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

// ==========================================
// CapacitySlot - 单日单线产能槽
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacitySlot {
    pub date: NaiveDate,
    pub line: AssemblyLine,
    pub current_qty: i64,       // 读取时已排量
    pub max_capacity: i64,      // 线体日产能上限
    pub remaining: i64,         // 剩余产能（随移动递减）
    pub initial_remaining: i64, // 读取时剩余产能（审计用）
}

impl CapacitySlot {
    pub fn new(date: NaiveDate, line: AssemblyLine, current_qty: i64, max_capacity: i64) -> Self {
        let remaining = max_capacity - current_qty;
        Self {
            date,
            line,
            current_qty,
            max_capacity,
            remaining,
            initial_remaining: remaining,
        }
    }

    pub fn location(&self) -> Location {
        Location::new(self.date, self.line)
    }

    /// 已被本次运行消耗的量
    pub fn consumed(&self) -> i64 {
        self.initial_remaining - self.remaining
    }
}

// ==========================================
// Trait: CapacityConstraint
// ==========================================
// 用途: 校验器/兜底搜索的产能门控接口
pub trait CapacityConstraint {
    /// 能否整体吸收 qty
    fn can_absorb(&self, qty: i64) -> bool;

    /// 按托盘单位可容纳的最大量
    fn pallet_fit(&self, pallet_unit: i64) -> i64;

    /// 使用率（0.0 - 1.0+），产能为 0 时返回 0
    fn usage_rate(&self) -> f64;
}

impl CapacityConstraint for CapacitySlot {
    fn can_absorb(&self, qty: i64) -> bool {
        qty <= self.remaining
    }

    fn pallet_fit(&self, pallet_unit: i64) -> i64 {
        if pallet_unit <= 0 || self.remaining < pallet_unit {
            return 0;
        }
        (self.remaining / pallet_unit) * pallet_unit
    }

    fn usage_rate(&self) -> f64 {
        if self.max_capacity <= 0 {
            return 0.0;
        }
        self.current_qty as f64 / self.max_capacity as f64
    }
}

// ==========================================
// LedgerError - 账本误用
// ==========================================
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("产能槽不存在: {0}")]
    SlotNotFound(String),

    #[error("产能不足: key={key}, requested={requested}, remaining={remaining}")]
    InsufficientCapacity {
        key: String,
        requested: i64,
        remaining: i64,
    },

    #[error("非法扣减量: key={key}, qty={qty}")]
    InvalidQuantity { key: String, qty: i64 },
}

// ==========================================
// CapacityLedger - 产能账本
// ==========================================
// 键: "YYYY-MM-DD_<线体>"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CapacityLedger {
    slots: BTreeMap<String, CapacitySlot>,
}

impl CapacityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 写入产能槽（已存在则保留原值，避免覆盖已消耗状态）
    pub fn insert(&mut self, slot: CapacitySlot) -> &mut CapacitySlot {
        self.slots.entry(slot.location().key()).or_insert(slot)
    }

    pub fn get(&self, key: &str) -> Option<&CapacitySlot> {
        self.slots.get(key)
    }

    pub fn get_at(&self, location: &Location) -> Option<&CapacitySlot> {
        self.slots.get(&location.key())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> impl Iterator<Item = &CapacitySlot> {
        self.slots.values()
    }

    /// 扣减产能；超出剩余量直接报错，不做部分扣减
    pub fn consume(&mut self, key: &str, qty: i64) -> Result<i64, LedgerError> {
        let slot = self
            .slots
            .get_mut(key)
            .ok_or_else(|| LedgerError::SlotNotFound(key.to_string()))?;

        if qty <= 0 {
            return Err(LedgerError::InvalidQuantity {
                key: key.to_string(),
                qty,
            });
        }
        if qty > slot.remaining {
            return Err(LedgerError::InsufficientCapacity {
                key: key.to_string(),
                requested: qty,
                remaining: slot.remaining,
            });
        }

        slot.remaining -= qty;
        Ok(slot.remaining)
    }

    /// 本次运行已消耗的总量
    pub fn total_consumed(&self) -> i64 {
        self.slots.values().map(|s| s.consumed()).sum()
    }
}
