// ==========================================
// 装配线产能再平衡系统 - 计划文件导入
// ==========================================
// 职责: 把上游导出的计划文件（CSV/Excel）读成 PlanSnapshot
// 流程: 文件解析(原始行) -> 字段映射/校验 -> PlanEntry
// ==========================================

pub mod error;
pub mod file_parser;
pub mod plan_file_importer;

pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, RawRecordParser, UniversalFileParser};
pub use plan_file_importer::PlanFileImporter;
