// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use assembly_rebalance_aps::config::EngineConfig;
use assembly_rebalance_aps::domain::plan::{PlanEntry, PlanSnapshot};
use assembly_rebalance_aps::domain::types::AssemblyLine;
use chrono::NaiveDate;

/// 2026 年 1 月的某一天
pub fn d(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
}

/// 基准日 2026-01-05 的默认配置
pub fn base_config() -> EngineConfig {
    EngineConfig::with_today(d(5))
}

// ==========================================
// PlanEntry 构建器
// ==========================================

pub struct PlanEntryBuilder {
    product_name: String,
    plan_date: NaiveDate,
    line: AssemblyLine,
    produced_qty: i64,
    due_qty: i64,
    pallet_unit: i64,
    is_workday: Option<bool>,
}

impl PlanEntryBuilder {
    pub fn new(product_name: &str) -> Self {
        Self {
            product_name: product_name.to_string(),
            plan_date: d(10),
            line: AssemblyLine::Assy1,
            produced_qty: 0,
            due_qty: 0,
            pallet_unit: 100,
            is_workday: Some(true),
        }
    }

    pub fn date(mut self, date: NaiveDate) -> Self {
        self.plan_date = date;
        self
    }

    pub fn line(mut self, line: AssemblyLine) -> Self {
        self.line = line;
        self
    }

    pub fn produced(mut self, qty: i64) -> Self {
        self.produced_qty = qty;
        self
    }

    pub fn due(mut self, qty: i64) -> Self {
        self.due_qty = qty;
        self
    }

    pub fn pallet(mut self, unit: i64) -> Self {
        self.pallet_unit = unit;
        self
    }

    pub fn workday(mut self, flag: Option<bool>) -> Self {
        self.is_workday = flag;
        self
    }

    pub fn build(self) -> PlanEntry {
        PlanEntry {
            product_name: self.product_name,
            plan_date: self.plan_date,
            line: self.line,
            produced_qty: self.produced_qty,
            due_qty: self.due_qty,
            pallet_unit: self.pallet_unit,
            is_workday: self.is_workday,
        }
    }
}

// ==========================================
// 标准场景
// ==========================================
// 目标: 2026-01-10 ASSY1（产能 3300,已排满）
//   T6-200  1000  托盘 100  通用族  无交付 -> 可移 1000
//   A2XX-7   800  托盘 100  受限族  累计持平,未来 +100 -> 可移 800,缓冲 6 天
//   J9-11    600  托盘 50   专用族  累计持平,未来 -80 -> 可移 520,缓冲 3 天
//   FILL     900  托盘 100  专用族  未来欠交 -> 不可移
// 同日: ASSY2 3000（剩 700）/ ASSY3 3400（剩 200）
// ASSY1: 01-06~01-09 各 3100（剩 200）; 01-11 非工作日; 01-12~01-31 各 3000（剩 300）
pub fn standard_entries() -> Vec<PlanEntry> {
    let fill = |day: u32, line: AssemblyLine, produced: i64, due: i64| {
        PlanEntryBuilder::new("FILL")
            .date(d(day))
            .line(line)
            .produced(produced)
            .due(due)
            .build()
    };

    let mut rows = Vec::new();
    for day in 6..=9 {
        rows.push(fill(day, AssemblyLine::Assy1, 3100, 3100));
    }

    // 目标日
    rows.push(PlanEntryBuilder::new("T6-200").produced(1000).build());
    rows.push(PlanEntryBuilder::new("A2XX-7").produced(800).due(800).build());
    rows.push(PlanEntryBuilder::new("J9-11").produced(600).due(600).pallet(50).build());
    rows.push(fill(10, AssemblyLine::Assy1, 900, 900));
    rows.push(fill(10, AssemblyLine::Assy2, 3000, 3000));
    rows.push(fill(10, AssemblyLine::Assy3, 3400, 3400));

    // 非工作日
    rows.push(
        PlanEntryBuilder::new("FILL")
            .date(d(11))
            .workday(Some(false))
            .build(),
    );

    for day in 12..=31 {
        rows.push(fill(day, AssemblyLine::Assy1, 3000, 3100));
    }

    // 未来交付/生产（放在 ASSY2,不占用目标线产能）
    rows.push(
        PlanEntryBuilder::new("A2XX-7")
            .date(d(14))
            .line(AssemblyLine::Assy2)
            .produced(400)
            .build(),
    );
    rows.push(
        PlanEntryBuilder::new("A2XX-7")
            .date(d(16))
            .line(AssemblyLine::Assy2)
            .due(300)
            .build(),
    );
    rows.push(
        PlanEntryBuilder::new("J9-11")
            .date(d(12))
            .line(AssemblyLine::Assy2)
            .produced(120)
            .pallet(50)
            .build(),
    );
    rows.push(
        PlanEntryBuilder::new("J9-11")
            .date(d(13))
            .line(AssemblyLine::Assy2)
            .due(200)
            .pallet(50)
            .build(),
    );

    rows
}

pub fn standard_snapshot() -> PlanSnapshot {
    PlanSnapshot::new(standard_entries())
}

/// 提议 JSON（moves 为 (品目, 数量, 目的地)）
pub fn proposal_json(moves: &[(&str, i64, &str)]) -> String {
    let moves: Vec<serde_json::Value> = moves
        .iter()
        .map(|(item, qty, to)| {
            serde_json::json!({
                "item": item,
                "qty": qty,
                "from": "2026-01-10_ASSY1",
                "to": to,
                "reason": "测试提议",
            })
        })
        .collect();
    serde_json::json!({
        "strategy": "测试策略",
        "explanation": "集成测试",
        "moves": moves,
    })
    .to_string()
}
