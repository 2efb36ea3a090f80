// ==========================================
// 装配线产能再平衡系统 - 生产计划快照领域模型
// ==========================================
// 红线: 快照只读,引擎只在内存副本上推演
// ==========================================

use crate::domain::types::AssemblyLine;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// 日期格式（快照/目的地字符串统一）
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ==========================================
// PlanEntry - 计划行 (产品 × 日期 × 线体)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub product_name: String,      // 产品名
    pub plan_date: NaiveDate,      // 计划日期
    pub line: AssemblyLine,        // 线体
    pub produced_qty: i64,         // 计划生产量（本线本日）
    pub due_qty: i64,              // 当日交付需求
    pub pallet_unit: i64,          // 托盘单位（正整数）
    pub is_workday: Option<bool>,  // 是否工作日（缺失视为非工作日）
}

// ==========================================
// Location - 日期 + 线体
// ==========================================
// 文本格式: "YYYY-MM-DD_<线体>"，只按第一个 '_' 切分
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub date: NaiveDate,
    pub line: AssemblyLine,
}

impl Location {
    pub fn new(date: NaiveDate, line: AssemblyLine) -> Self {
        Self { date, line }
    }

    /// 账本键
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.date.format(DATE_FORMAT), self.line)
    }
}

impl FromStr for Location {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (date_part, line_part) = s
            .split_once('_')
            .ok_or_else(|| format!("缺少 '_' 分隔符: '{}'", s))?;

        let date = NaiveDate::parse_from_str(date_part.trim(), DATE_FORMAT)
            .map_err(|e| format!("日期格式错误 '{}': {}", date_part, e))?;
        let line = line_part.trim().parse::<AssemblyLine>()?;

        Ok(Self { date, line })
    }
}

impl Serialize for Location {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ==========================================
// WorkdayCalendar - 工作日历
// ==========================================
// 同一日期多行时以第一行为准；无记录即非工作日
#[derive(Debug, Clone, Default)]
pub struct WorkdayCalendar {
    days: BTreeMap<NaiveDate, bool>,
}

impl WorkdayCalendar {
    pub fn from_entries(entries: &[PlanEntry]) -> Self {
        let mut days = BTreeMap::new();
        for entry in entries {
            days.entry(entry.plan_date)
                .or_insert_with(|| entry.is_workday.unwrap_or(false));
        }
        Self { days }
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        self.days.get(&date).copied().unwrap_or(false)
    }

    /// 严格晚于 start 的前 count 个工作日
    pub fn workdays_after(&self, start: NaiveDate, count: usize) -> Vec<NaiveDate> {
        self.days
            .range((start + Duration::days(1))..)
            .filter(|(_, is_work)| **is_work)
            .map(|(date, _)| *date)
            .take(count)
            .collect()
    }
}

// ==========================================
// PlanSnapshot - 计划快照（带索引）
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PlanSnapshot {
    entries: Vec<PlanEntry>,
    calendar: WorkdayCalendar,
    slot_totals: HashMap<(NaiveDate, AssemblyLine), i64>,
}

impl PlanSnapshot {
    pub fn new(mut entries: Vec<PlanEntry>) -> Self {
        // 稳定排序：日期优先，保留同日原始顺序（日历取首行）
        entries.sort_by_key(|e| e.plan_date);

        let calendar = WorkdayCalendar::from_entries(&entries);
        let mut slot_totals = HashMap::new();
        for entry in &entries {
            *slot_totals.entry((entry.plan_date, entry.line)).or_insert(0) += entry.produced_qty;
        }

        Self {
            entries,
            calendar,
            slot_totals,
        }
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn calendar(&self) -> &WorkdayCalendar {
        &self.calendar
    }

    /// 指定日期/线体的计划行
    pub fn rows_at(&self, date: NaiveDate, line: AssemblyLine) -> impl Iterator<Item = &PlanEntry> {
        self.entries
            .iter()
            .filter(move |e| e.plan_date == date && e.line == line)
    }

    /// 指定日期/线体的生产总量
    pub fn produced_total(&self, date: NaiveDate, line: AssemblyLine) -> i64 {
        self.slot_totals.get(&(date, line)).copied().unwrap_or(0)
    }

    /// 指定日期是否有任何计划行
    pub fn has_date(&self, date: NaiveDate) -> bool {
        self.entries.iter().any(|e| e.plan_date == date)
    }

    /// 产品按日期聚合的时间序列: (日期, 需求量, 生产量)
    pub fn product_series(&self, product_name: &str) -> Vec<(NaiveDate, i64, i64)> {
        let mut daily: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| e.product_name == product_name) {
            let slot = daily.entry(entry.plan_date).or_insert((0, 0));
            slot.0 += entry.due_qty;
            slot.1 += entry.produced_qty;
        }
        daily
            .into_iter()
            .map(|(date, (due, produced))| (date, due, produced))
            .collect()
    }
}

// ==========================================
// StockList - 目标日/线现有品目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockItem {
    pub product_name: String,
    pub qty: i64,
    pub pallet_unit: i64,
}

impl StockItem {
    pub fn pallets(&self) -> i64 {
        if self.pallet_unit > 0 {
            self.qty / self.pallet_unit
        } else {
            0
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockList {
    pub date: NaiveDate,
    pub line: AssemblyLine,
    pub total: i64,             // 该日该线总量（含零量行）
    pub items: Vec<StockItem>,  // 仅正数量品目
}
