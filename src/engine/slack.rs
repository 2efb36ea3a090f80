// ==========================================
// 装配线产能再平衡系统 - 交付松弛分析
// ==========================================
// 职责: 逐品目计算"今天最多能挪走多少而不欠交付"
// 输入: 计划快照（全时序）+ 目标日/线品目清单
// 输出: ItemSlack 列表
// 红线: max_movable 永不为负
// ==========================================

use crate::config::EngineConfig;
use crate::domain::analysis::ItemSlack;
use crate::domain::plan::{PlanSnapshot, StockItem, StockList};
use chrono::NaiveDate;
use tracing::{debug, instrument};

// ==========================================
// SlackAnalyzer
// ==========================================
#[derive(Debug, Clone)]
pub struct SlackAnalyzer {
    no_due_buffer_days: i64, // 目标日之后无交付时的哨兵值
}

impl SlackAnalyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            no_due_buffer_days: config.no_due_buffer_days,
        }
    }

    /// 分析目标日/线全部品目
    #[instrument(skip(self, snapshot, stock), fields(date = %stock.date, line = %stock.line))]
    pub fn analyze(&self, snapshot: &PlanSnapshot, stock: &StockList) -> Vec<ItemSlack> {
        let result: Vec<ItemSlack> = stock
            .items
            .iter()
            .map(|item| self.analyze_item(snapshot, stock.date, item))
            .collect();

        debug!(
            items = result.len(),
            movable = result.iter().filter(|s| s.movable).count(),
            "松弛分析完成"
        );
        result
    }

    fn analyze_item(&self, snapshot: &PlanSnapshot, target_date: NaiveDate, item: &StockItem) -> ItemSlack {
        let series = snapshot.product_series(&item.product_name);

        let mut cum_due = 0;
        let mut cum_produced = 0;
        let mut future_due = 0;
        let mut future_produced = 0;
        let mut last_due_date: Option<NaiveDate> = None;

        for (date, due, produced) in &series {
            if *date <= target_date {
                cum_due += due;
                cum_produced += produced;
            } else {
                future_due += due;
                future_produced += produced;
            }
            if *due > 0 {
                last_due_date = Some(*date);
            }
        }

        let cumulative_slack = cum_produced - cum_due;
        let future_slack = future_produced - future_due;

        // 1) 累计有富余: 富余量即可移量
        // 2) 累计无富余: 看目标日之后 生产-需求 是否还能兜住
        let max_movable = if cumulative_slack > 0 {
            cumulative_slack
        } else if future_slack >= 0 {
            item.qty
        } else {
            (item.qty + future_slack).max(0)
        };

        let buffer_days = match last_due_date {
            Some(last) if last > target_date => (last - target_date).num_days(),
            _ => self.no_due_buffer_days,
        };

        debug!(
            product = %item.product_name,
            cum_due,
            cum_produced,
            future_slack,
            max_movable,
            buffer_days,
            "品目松弛"
        );

        ItemSlack {
            product_name: item.product_name.clone(),
            qty: item.qty,
            pallet_unit: item.pallet_unit,
            cum_due,
            cum_produced,
            cumulative_slack,
            future_slack,
            max_movable,
            last_due_date,
            buffer_days,
            // 托盘单位非法的品目不参与移动
            movable: item.pallet_unit > 0 && max_movable >= item.pallet_unit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::PlanEntry;
    use crate::domain::types::AssemblyLine;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn row(name: &str, day: u32, produced: i64, due: i64) -> PlanEntry {
        PlanEntry {
            product_name: name.to_string(),
            plan_date: d(day),
            line: AssemblyLine::Assy1,
            produced_qty: produced,
            due_qty: due,
            pallet_unit: 50,
            is_workday: Some(true),
        }
    }

    fn analyze(rows: Vec<PlanEntry>, qty: i64) -> ItemSlack {
        let snapshot = PlanSnapshot::new(rows);
        let stock = StockList {
            date: d(10),
            line: AssemblyLine::Assy1,
            total: qty,
            items: vec![StockItem {
                product_name: "P".to_string(),
                qty,
                pallet_unit: 50,
            }],
        };
        let analyzer = SlackAnalyzer::new(&EngineConfig::with_today(d(5)));
        analyzer.analyze(&snapshot, &stock).remove(0)
    }

    // ==========================================
    // 累计松弛
    // ==========================================

    #[test]
    fn test_positive_cumulative_slack() {
        let slack = analyze(vec![row("P", 8, 600, 300), row("P", 10, 200, 100)], 200);
        assert_eq!(slack.cumulative_slack, 400);
        assert_eq!(slack.max_movable, 400);
        assert!(slack.movable);
    }

    #[test]
    fn test_zero_slack_with_future_surplus() {
        // 累计 500/500,未来富余 200,当日 150 -> 150
        let slack = analyze(
            vec![row("P", 8, 350, 300), row("P", 10, 150, 200), row("P", 12, 400, 200)],
            150,
        );
        assert_eq!(slack.cum_produced, 500);
        assert_eq!(slack.cum_due, 500);
        assert_eq!(slack.future_slack, 200);
        assert_eq!(slack.max_movable, 150);
    }

    #[test]
    fn test_zero_slack_with_future_deficit() {
        // 未来缺口 -80,当日 150 -> 70
        let slack = analyze(
            vec![row("P", 8, 350, 300), row("P", 10, 150, 200), row("P", 12, 120, 200)],
            150,
        );
        assert_eq!(slack.future_slack, -80);
        assert_eq!(slack.max_movable, 70);
        assert!(slack.movable);
    }

    #[test]
    fn test_max_movable_never_negative() {
        let slack = analyze(
            vec![row("P", 8, 100, 300), row("P", 10, 100, 0), row("P", 12, 0, 500)],
            100,
        );
        assert_eq!(slack.max_movable, 0);
        assert!(!slack.movable);
    }

    #[test]
    fn test_non_positive_pallet_not_movable() {
        let snapshot = PlanSnapshot::new(vec![row("P", 10, 3000, 0)]);
        let stock = StockList {
            date: d(10),
            line: AssemblyLine::Assy1,
            total: 3000,
            items: vec![StockItem {
                product_name: "P".to_string(),
                qty: 3000,
                pallet_unit: 0,
            }],
        };
        let slack = SlackAnalyzer::new(&EngineConfig::with_today(d(5)))
            .analyze(&snapshot, &stock)
            .remove(0);
        assert_eq!(slack.max_movable, 3000);
        assert!(!slack.movable);
    }

    // ==========================================
    // 交付缓冲
    // ==========================================

    #[test]
    fn test_buffer_days_to_last_future_due() {
        let slack = analyze(
            vec![row("P", 10, 500, 0), row("P", 13, 0, 100), row("P", 17, 0, 100)],
            500,
        );
        assert_eq!(slack.buffer_days, 7);
        assert_eq!(slack.last_due_date, Some(d(17)));
    }

    #[test]
    fn test_buffer_days_sentinel_without_future_due() {
        let slack = analyze(vec![row("P", 8, 0, 100), row("P", 10, 500, 0)], 500);
        assert_eq!(slack.buffer_days, 999);
        assert_eq!(slack.last_due_date, Some(d(8)));
    }
}
