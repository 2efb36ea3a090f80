// ==========================================
// 装配线产能再平衡系统 - 计划快照仓储
// ==========================================
// 职责: 读取 production_plan 表的指定日期窗口
// 红线: Repository 不含业务逻辑,本系统对计划表只读（insert 仅供上游同步/测试）
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::plan::{PlanEntry, PlanSnapshot, DATE_FORMAT};
use crate::domain::types::AssemblyLine;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::debug;

// ==========================================
// PlanSnapshotRepository
// ==========================================
pub struct PlanSnapshotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanSnapshotRepository {
    /// 打开数据库（不存在则建表）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 [start, end] 窗口内全部计划行
    ///
    /// # 返回
    /// - Ok(PlanSnapshot): 按 (日期, 线体, 产品) 排序的快照（窗口内无数据时为空快照）
    /// - Err: 数据库错误或字段非法
    pub fn load_window(&self, start: NaiveDate, end: NaiveDate) -> RepositoryResult<PlanSnapshot> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT plan_date, line, product_name, produced_qty, due_qty, pallet_unit, is_workday
            FROM production_plan
            WHERE plan_date BETWEEN ?1 AND ?2
            ORDER BY plan_date, line, product_name
            "#,
        )?;

        let raw_rows = stmt
            .query_map(
                params![
                    start.format(DATE_FORMAT).to_string(),
                    end.format(DATE_FORMAT).to_string()
                ],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, Option<i64>>(6)?,
                    ))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        let mut entries = Vec::with_capacity(raw_rows.len());
        for (date_text, line_text, product_name, produced, due, pallet_unit, is_workday) in raw_rows {
            let plan_date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|e| {
                RepositoryError::FieldValueError {
                    field: "plan_date".to_string(),
                    message: format!("{}: {}", date_text, e),
                }
            })?;
            let line = line_text
                .parse::<AssemblyLine>()
                .map_err(|message| RepositoryError::FieldValueError {
                    field: "line".to_string(),
                    message,
                })?;
            if pallet_unit <= 0 {
                return Err(RepositoryError::FieldValueError {
                    field: "pallet_unit".to_string(),
                    message: format!("{} {} {}: 托盘单位必须为正整数: {}", date_text, line_text, product_name, pallet_unit),
                });
            }

            entries.push(PlanEntry {
                product_name,
                plan_date,
                line,
                produced_qty: produced.unwrap_or(0),
                due_qty: due.unwrap_or(0),
                pallet_unit,
                is_workday: is_workday.map(|v| v != 0),
            });
        }

        debug!(start = %start, end = %end, rows = entries.len(), "计划快照读取完成");
        Ok(PlanSnapshot::new(entries))
    }

    /// 以目标日为中心读取窗口
    pub fn load_around(
        &self,
        target_date: NaiveDate,
        days_before: i64,
        days_after: i64,
    ) -> RepositoryResult<PlanSnapshot> {
        self.load_window(
            target_date - chrono::Duration::days(days_before),
            target_date + chrono::Duration::days(days_after),
        )
    }

    /// 批量写入计划行（同键覆盖）
    pub fn upsert_entries(&self, entries: &[PlanEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT OR REPLACE INTO production_plan
                    (plan_date, line, product_name, produced_qty, due_qty, pallet_unit, is_workday)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )?;
            for entry in entries {
                stmt.execute(params![
                    entry.plan_date.format(DATE_FORMAT).to_string(),
                    entry.line.code(),
                    entry.product_name,
                    entry.produced_qty,
                    entry.due_qty,
                    entry.pallet_unit,
                    entry.is_workday.map(|v| v as i64),
                ])?;
            }
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(entries.len())
    }
}
