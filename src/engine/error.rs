// ==========================================
// 装配线产能再平衡系统 - 引擎层错误类型
// ==========================================
// 职责: 仅承载会中止本次运行的输入错误
// 红线: 校验拒绝/兜底耗尽不是错误,走 Violation 日志
// ==========================================

use crate::config::ConfigError;
use crate::domain::capacity::LedgerError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("该日期/线体没有生产计划: date={date}, line={line}")]
    NoPlanData { date: NaiveDate, line: String },

    #[error("调整目标非法: {0}")]
    InvalidTarget(String),

    #[error("引擎配置非法: {0}")]
    Config(#[from] ConfigError),

    #[error("产能账本错误: {0}")]
    Ledger(#[from] LedgerError),
}

pub type EngineResult<T> = Result<T, EngineError>;
