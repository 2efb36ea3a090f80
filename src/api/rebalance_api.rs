// ==========================================
// 装配线产能再平衡系统 - 再平衡 API
// ==========================================
// 职责: 读取快照（数据库/文件）-> 运行引擎 -> 返回报告
// 红线: 每次调用独立读取快照并新建账本,调用之间不共享可变状态
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, EngineConfig};
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::plan::PlanSnapshot;
use crate::domain::report::RebalanceReport;
use crate::engine::orchestrator::{RebalanceOrchestrator, RebalanceRequest};
use crate::engine::proposal::StrategyProposer;
use crate::importer::PlanFileImporter;
use crate::repository::PlanSnapshotRepository;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

// ==========================================
// SnapshotSource - 快照来源
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    /// SQLite 数据库（production_plan 表）
    Database(PathBuf),
    /// CSV / Excel 文件
    File(PathBuf),
}

impl SnapshotSource {
    /// 按扩展名判断来源（.db/.sqlite/.sqlite3 为数据库,其余按文件导入）
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        match ext.as_str() {
            "db" | "sqlite" | "sqlite3" => SnapshotSource::Database(path),
            _ => SnapshotSource::File(path),
        }
    }
}

// ==========================================
// RebalanceApi
// ==========================================
pub struct RebalanceApi {
    orchestrator: RebalanceOrchestrator,
}

impl RebalanceApi {
    pub fn new(config: EngineConfig) -> ApiResult<Self> {
        Ok(Self {
            orchestrator: RebalanceOrchestrator::new(config)?,
        })
    }

    /// 从数据库 config_kv 装配配置
    pub fn from_database(db_path: &str) -> ApiResult<Self> {
        let conn = open_sqlite_connection(db_path).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let config = manager
            .load_engine_config()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        Self::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        self.orchestrator.config()
    }

    /// 读取目标日附近的计划快照
    ///
    /// 窗口: 目标日前 snapshot_window_days 天 ~ 目标日后 max(snapshot_window_days, 兜底搜索天数)
    pub fn load_snapshot(&self, source: &SnapshotSource, target_date: NaiveDate) -> ApiResult<PlanSnapshot> {
        let snapshot = match source {
            SnapshotSource::Database(path) => {
                let path_text = path
                    .to_str()
                    .ok_or_else(|| ApiError::InvalidInput(format!("数据库路径非法: {}", path.display())))?;
                let config = self.config();
                let days_after = config
                    .snapshot_window_days
                    .max(config.reduction_future_days)
                    .max(config.future_scan_days);
                PlanSnapshotRepository::new(path_text)?.load_around(
                    target_date,
                    config.snapshot_window_days,
                    days_after,
                )?
            }
            SnapshotSource::File(path) => PlanFileImporter::new().import(path)?,
        };

        if snapshot.is_empty() {
            return Err(ApiError::NoPlanData(format!("{:?} 中没有计划行", source)));
        }
        Ok(snapshot)
    }

    /// 同步运行（提议文本可选）
    #[instrument(skip(self, snapshot, proposal), fields(date = %request.target_date))]
    pub fn rebalance(
        &self,
        snapshot: &PlanSnapshot,
        request: &RebalanceRequest,
        proposal: Option<(&str, &str)>,
    ) -> ApiResult<RebalanceReport> {
        let report = self.orchestrator.run(snapshot, request, proposal)?;
        info!(run_id = %report.run_id, success = report.outcome.is_success(), "再平衡完成");
        Ok(report)
    }

    /// 异步运行（外部提议器,带超时）
    pub async fn rebalance_with_proposer(
        &self,
        snapshot: &PlanSnapshot,
        request: &RebalanceRequest,
        proposer: &dyn StrategyProposer,
    ) -> ApiResult<RebalanceReport> {
        let report = self
            .orchestrator
            .run_with_proposer(snapshot, request, proposer)
            .await?;
        info!(run_id = %report.run_id, success = report.outcome.is_success(), "再平衡完成");
        Ok(report)
    }

    /// 读取快照并运行
    pub fn rebalance_from_source(
        &self,
        source: &SnapshotSource,
        request: &RebalanceRequest,
        proposal: Option<(&str, &str)>,
    ) -> ApiResult<RebalanceReport> {
        let snapshot = self.load_snapshot(source, request.target_date)?;
        self.rebalance(&snapshot, request, proposal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_source_from_extension() {
        assert_eq!(
            SnapshotSource::from_path("plan.DB"),
            SnapshotSource::Database(PathBuf::from("plan.DB"))
        );
        assert_eq!(
            SnapshotSource::from_path("plan.xlsx"),
            SnapshotSource::File(PathBuf::from("plan.xlsx"))
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.achievement_threshold = 1.5;
        assert!(matches!(RebalanceApi::new(config), Err(ApiError::ConfigError(_))));
    }
}
