// ==========================================
// 装配线产能再平衡系统 - 计划文件导入器
// ==========================================
// 职责: 原始行 -> PlanEntry,字段转换 + 基本数据质量校验
// 必需列: plan_date, line, product_name, pallet_unit
// 可选列: produced_qty, due_qty（缺省 0）, is_workday（缺省视为非工作日）
// 红线: pallet_unit 必须为正整数,数量不得为负
// ==========================================

use crate::domain::plan::{PlanEntry, PlanSnapshot, DATE_FORMAT};
use crate::domain::types::AssemblyLine;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRecord, UniversalFileParser};
use chrono::{Duration, NaiveDate};
use std::path::Path;
use tracing::{info, instrument};

/// 字段名
pub mod columns {
    pub const PLAN_DATE: &str = "plan_date";
    pub const LINE: &str = "line";
    pub const PRODUCT_NAME: &str = "product_name";
    pub const PRODUCED_QTY: &str = "produced_qty";
    pub const DUE_QTY: &str = "due_qty";
    pub const PALLET_UNIT: &str = "pallet_unit";
    pub const IS_WORKDAY: &str = "is_workday";

    pub const REQUIRED: [&str; 4] = [PLAN_DATE, LINE, PRODUCT_NAME, PALLET_UNIT];
}

// ==========================================
// PlanFileImporter
// ==========================================
#[derive(Debug, Default)]
pub struct PlanFileImporter;

impl PlanFileImporter {
    pub fn new() -> Self {
        Self
    }

    /// 读取计划文件为快照
    #[instrument(skip(self, file_path), fields(path = %file_path.as_ref().display()))]
    pub fn import<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<PlanSnapshot> {
        let records = UniversalFileParser.parse(file_path.as_ref())?;
        let entries = self.map_records(&records)?;
        info!(rows = entries.len(), "计划文件导入完成");
        Ok(PlanSnapshot::new(entries))
    }

    /// 原始行 -> PlanEntry（行号从 2 起,与表格一致）
    pub fn map_records(&self, records: &[RawRecord]) -> ImportResult<Vec<PlanEntry>> {
        if let Some(first) = records.first() {
            for column in columns::REQUIRED {
                if !first.contains_key(column) {
                    return Err(ImportError::MissingColumn(column.to_string()));
                }
            }
        }

        records
            .iter()
            .enumerate()
            .map(|(idx, record)| map_record(idx + 2, record))
            .collect()
    }
}

fn field<'a>(record: &'a RawRecord, name: &str) -> &'a str {
    record.get(name).map(String::as_str).unwrap_or("")
}

fn map_record(row: usize, record: &RawRecord) -> ImportResult<PlanEntry> {
    let plan_date = parse_date(row, field(record, columns::PLAN_DATE))?;

    let line = field(record, columns::LINE)
        .parse::<AssemblyLine>()
        .map_err(|message| ImportError::TypeConversionError {
            row,
            field: columns::LINE.to_string(),
            message,
        })?;

    let product_name = field(record, columns::PRODUCT_NAME).to_string();
    if product_name.is_empty() {
        return Err(ImportError::ValueRangeError {
            row,
            field: columns::PRODUCT_NAME.to_string(),
            message: "产品名为空".to_string(),
        });
    }

    let produced_qty = parse_qty(row, columns::PRODUCED_QTY, field(record, columns::PRODUCED_QTY))?;
    let due_qty = parse_qty(row, columns::DUE_QTY, field(record, columns::DUE_QTY))?;
    let pallet_unit = parse_qty(row, columns::PALLET_UNIT, field(record, columns::PALLET_UNIT))?;
    if pallet_unit <= 0 {
        return Err(ImportError::ValueRangeError {
            row,
            field: columns::PALLET_UNIT.to_string(),
            message: format!("托盘单位必须为正整数: {}", pallet_unit),
        });
    }

    Ok(PlanEntry {
        product_name,
        plan_date,
        line,
        produced_qty,
        due_qty,
        pallet_unit,
        is_workday: parse_flag(field(record, columns::IS_WORKDAY)),
    })
}

/// 支持 YYYY-MM-DD / YYYY/MM/DD / YYYYMMDD / Excel 序列号
fn parse_date(row: usize, raw: &str) -> ImportResult<NaiveDate> {
    let text = raw.trim();
    let text = text.split_whitespace().next().unwrap_or(text);

    for fmt in [DATE_FORMAT, "%Y/%m/%d", "%Y%m%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Ok(date);
        }
    }

    // Excel 日期序列号（1900 体系）
    if let Ok(serial) = text.parse::<f64>() {
        if serial > 0.0 {
            if let Some(base) = NaiveDate::from_ymd_opt(1899, 12, 30) {
                return Ok(base + Duration::days(serial.trunc() as i64));
            }
        }
    }

    Err(ImportError::DateFormatError {
        row,
        value: raw.to_string(),
    })
}

/// 空值视为 0；允许 "300.0" 这类 Excel 数值文本
fn parse_qty(row: usize, name: &str, raw: &str) -> ImportResult<i64> {
    let text = raw.trim().replace(',', "");
    if text.is_empty() {
        return Ok(0);
    }
    let value = text
        .parse::<f64>()
        .map_err(|e| ImportError::TypeConversionError {
            row,
            field: name.to_string(),
            message: format!("{}: {}", raw, e),
        })?;
    if value < 0.0 {
        return Err(ImportError::ValueRangeError {
            row,
            field: name.to_string(),
            message: format!("数量不得为负: {}", raw),
        });
    }
    Ok(value.round() as i64)
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "1.0" | "true" | "y" | "yes" | "是" => Some(true),
        "0" | "0.0" | "false" | "n" | "no" | "否" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> RawRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full(date: &str, pallet: &str) -> RawRecord {
        record(&[
            ("plan_date", date),
            ("line", "assy2"),
            ("product_name", "T6-200"),
            ("produced_qty", "1,200"),
            ("due_qty", ""),
            ("pallet_unit", pallet),
            ("is_workday", "1"),
        ])
    }

    #[test]
    fn test_map_record_converts_fields() {
        let entries = PlanFileImporter::new()
            .map_records(&[full("2026/01/05", "100.0")])
            .unwrap();
        let entry = &entries[0];
        assert_eq!(entry.plan_date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        assert_eq!(entry.line, AssemblyLine::Assy2);
        assert_eq!(entry.produced_qty, 1200);
        assert_eq!(entry.due_qty, 0);
        assert_eq!(entry.pallet_unit, 100);
        assert_eq!(entry.is_workday, Some(true));
    }

    #[test]
    fn test_excel_serial_date() {
        // 46027 = 2026-01-05
        let date = parse_date(2, "46027").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
    }

    #[test]
    fn test_zero_pallet_rejected() {
        let err = PlanFileImporter::new()
            .map_records(&[full("2026-01-05", "0")])
            .unwrap_err();
        assert!(matches!(err, ImportError::ValueRangeError { row: 2, .. }));
    }

    #[test]
    fn test_missing_required_column() {
        let err = PlanFileImporter::new()
            .map_records(&[record(&[("plan_date", "2026-01-05"), ("line", "ASSY1")])])
            .unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn(_)));
    }

    #[test]
    fn test_unknown_workday_flag_is_none() {
        assert_eq!(parse_flag(""), None);
        assert_eq!(parse_flag("否"), Some(false));
    }
}
