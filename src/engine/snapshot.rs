// ==========================================
// 装配线产能再平衡系统 - 快照读取
// ==========================================
// 职责: 从计划快照中取出目标日/线的现有品目
// 输入: PlanSnapshot + 日期 + 线体
// 输出: StockList（总量含零量行,品目仅保留正数量）
// ==========================================

use crate::domain::plan::{PlanSnapshot, StockItem, StockList};
use crate::domain::types::AssemblyLine;
use crate::engine::error::{EngineError, EngineResult};
use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SnapshotReader;

impl SnapshotReader {
    pub fn new() -> Self {
        Self
    }

    /// 读取目标日/线的品目清单
    ///
    /// 同一产品多行时合并为一个品目（托盘单位取首行）
    pub fn read_stock(
        &self,
        snapshot: &PlanSnapshot,
        date: NaiveDate,
        line: AssemblyLine,
    ) -> EngineResult<StockList> {
        let rows: Vec<_> = snapshot.rows_at(date, line).collect();
        if rows.is_empty() {
            return Err(EngineError::NoPlanData {
                date,
                line: line.to_string(),
            });
        }

        let total: i64 = rows.iter().map(|r| r.produced_qty).sum();

        let mut items: Vec<StockItem> = Vec::new();
        for row in rows.iter().filter(|r| r.produced_qty > 0) {
            match items.iter_mut().find(|i| i.product_name == row.product_name) {
                Some(existing) => existing.qty += row.produced_qty,
                None => items.push(StockItem {
                    product_name: row.product_name.clone(),
                    qty: row.produced_qty,
                    pallet_unit: row.pallet_unit,
                }),
            }
        }

        debug!(
            date = %date,
            line = %line,
            total = total,
            items_count = items.len(),
            "读取目标日/线品目"
        );

        Ok(StockList {
            date,
            line,
            total,
            items,
        })
    }

    /// 未指定线体时,取当日生产总量最大的线体（并列取编号小者）
    pub fn busiest_line(&self, snapshot: &PlanSnapshot, date: NaiveDate) -> EngineResult<AssemblyLine> {
        if !snapshot.has_date(date) {
            return Err(EngineError::NoPlanData {
                date,
                line: "-".to_string(),
            });
        }

        let mut best: Option<(AssemblyLine, i64)> = None;
        for line in AssemblyLine::ALL {
            if snapshot.rows_at(date, line).next().is_none() {
                continue;
            }
            let total = snapshot.produced_total(date, line);
            match best {
                Some((_, best_total)) if best_total >= total => {}
                _ => best = Some((line, total)),
            }
        }

        best.map(|(line, _)| line).ok_or(EngineError::NoPlanData {
            date,
            line: "-".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::PlanEntry;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn row(name: &str, line: AssemblyLine, produced: i64) -> PlanEntry {
        PlanEntry {
            product_name: name.to_string(),
            plan_date: d(8),
            line,
            produced_qty: produced,
            due_qty: 0,
            pallet_unit: 100,
            is_workday: Some(true),
        }
    }

    #[test]
    fn test_read_stock_filters_zero_rows_but_counts_total() {
        let snapshot = PlanSnapshot::new(vec![
            row("T6-100", AssemblyLine::Assy1, 1200),
            row("J9-11", AssemblyLine::Assy1, 0),
            row("A2XX-7", AssemblyLine::Assy1, 800),
            row("T6-100", AssemblyLine::Assy2, 500),
        ]);
        let stock = SnapshotReader::new()
            .read_stock(&snapshot, d(8), AssemblyLine::Assy1)
            .unwrap();
        assert_eq!(stock.total, 2000);
        assert_eq!(stock.items.len(), 2);
        assert_eq!(stock.items[0].product_name, "T6-100");
    }

    #[test]
    fn test_read_stock_all_zero_rows_is_not_error() {
        let snapshot = PlanSnapshot::new(vec![row("J9-11", AssemblyLine::Assy1, 0)]);
        let stock = SnapshotReader::new()
            .read_stock(&snapshot, d(8), AssemblyLine::Assy1)
            .unwrap();
        assert_eq!(stock.total, 0);
        assert!(stock.items.is_empty());
    }

    #[test]
    fn test_read_stock_missing_rows() {
        let snapshot = PlanSnapshot::new(vec![row("J9-11", AssemblyLine::Assy1, 100)]);
        let err = SnapshotReader::new()
            .read_stock(&snapshot, d(8), AssemblyLine::Assy3)
            .unwrap_err();
        assert!(matches!(err, EngineError::NoPlanData { .. }));
    }

    #[test]
    fn test_busiest_line() {
        let snapshot = PlanSnapshot::new(vec![
            row("A", AssemblyLine::Assy1, 1000),
            row("B", AssemblyLine::Assy2, 3000),
            row("C", AssemblyLine::Assy3, 3000),
        ]);
        let reader = SnapshotReader::new();
        assert_eq!(reader.busiest_line(&snapshot, d(8)).unwrap(), AssemblyLine::Assy2);
        assert!(reader.busiest_line(&snapshot, d(9)).is_err());
    }
}
