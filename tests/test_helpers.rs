// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、计划行与配置写入
// ==========================================
#![allow(dead_code)]

use assembly_rebalance_aps::config::ConfigManager;
use assembly_rebalance_aps::db::{init_schema, open_sqlite_connection};
use assembly_rebalance_aps::domain::plan::PlanEntry;
use assembly_rebalance_aps::repository::PlanSnapshotRepository;
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时路径非 UTF-8")?
        .to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入计划行
pub fn insert_plan_entries(db_path: &str, entries: &[PlanEntry]) -> Result<usize, Box<dyn Error>> {
    let repo = PlanSnapshotRepository::new(db_path)?;
    Ok(repo.upsert_entries(entries)?)
}

/// 写入 global 配置
pub fn insert_test_config(db_path: &str, pairs: &[(&str, &str)]) -> Result<(), Box<dyn Error>> {
    let conn: Connection = open_sqlite_connection(db_path)?;
    let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn)))?;
    for (key, value) in pairs {
        manager.upsert_global(key, value)?;
    }
    Ok(())
}
