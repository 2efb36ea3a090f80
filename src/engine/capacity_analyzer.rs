// ==========================================
// 装配线产能再平衡系统 - 目的地产能分析
// ==========================================
// 职责: 建立本次运行的产能账本
// 范围: 同日其他线体（换线）+ 同线未来工作日（顺延）
// 红线: 账本是本次运行独占的值,不跨运行共享
// ==========================================

use crate::config::EngineConfig;
use crate::domain::capacity::{CapacityLedger, CapacitySlot};
use crate::domain::plan::PlanSnapshot;
use crate::domain::types::AssemblyLine;
use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

#[derive(Debug, Clone)]
pub struct CapacityAnalyzer {
    capacity_limits: BTreeMap<AssemblyLine, i64>,
    future_window_workdays: usize,
    future_scan_days: i64,
}

impl CapacityAnalyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            capacity_limits: config.capacity_limits.clone(),
            future_window_workdays: config.future_window_workdays,
            future_scan_days: config.future_scan_days,
        }
    }

    pub fn capacity_of(&self, line: AssemblyLine) -> i64 {
        self.capacity_limits.get(&line).copied().unwrap_or(0)
    }

    /// 按快照构造单个产能槽（兜底搜索按需补槽时复用）
    pub fn slot_for(&self, snapshot: &PlanSnapshot, date: NaiveDate, line: AssemblyLine) -> CapacitySlot {
        CapacitySlot::new(date, line, snapshot.produced_total(date, line), self.capacity_of(line))
    }

    #[instrument(skip(self, snapshot))]
    pub fn analyze(&self, snapshot: &PlanSnapshot, target_date: NaiveDate, target_line: AssemblyLine) -> CapacityLedger {
        let mut ledger = CapacityLedger::new();

        // 1. 同日其他线体
        for line in target_line.others() {
            ledger.insert(self.slot_for(snapshot, target_date, line));
        }

        // 2. 同线未来工作日
        let calendar = snapshot.calendar();
        let mut future_days = calendar.workdays_after(target_date, self.future_window_workdays);
        if future_days.is_empty() {
            // 日历窗口取不到时逐日扫描
            future_days = (1..=self.future_scan_days)
                .map(|i| target_date + Duration::days(i))
                .filter(|d| calendar.is_workday(*d))
                .collect();
        }
        for date in future_days {
            ledger.insert(self.slot_for(snapshot, date, target_line));
        }

        debug!(slots = ledger.len(), "产能账本建立完成");
        ledger
    }
}
