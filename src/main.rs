// ==========================================
// 装配线产能再平衡系统 - 命令行入口
// ==========================================
// 用法:
//   assembly-rebalance <snapshot.(csv|xlsx|db)|-> <YYYY-MM-DD> <line|-> [ratio%|+qty|-] [proposal.json|-] [config.json]
//
// - snapshot 为 "-" 时使用默认数据库路径
// - line 为 "-" 时取当日生产量最大的线体
// - 报告以 JSON 输出到 stdout,日志写 stderr
// - RUST_LOG 控制日志级别,ASSY_LOG_FORMAT=json 输出 JSON 日志
// ==========================================

use anyhow::{anyhow, bail, Context};
use assembly_rebalance_aps::api::{RebalanceApi, SnapshotSource};
use assembly_rebalance_aps::config::EngineConfig;
use assembly_rebalance_aps::domain::types::AssemblyLine;
use assembly_rebalance_aps::engine::{RebalanceRequest, StaticProposer, TargetSpec};
use assembly_rebalance_aps::{logging, APP_NAME, VERSION};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

const USAGE: &str = "用法: assembly-rebalance <snapshot.(csv|xlsx|db)|-> <YYYY-MM-DD> <line|-> [ratio%|+qty|-] [proposal.json|-] [config.json]";

/// 默认数据库路径（用户数据目录）
fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("assembly-rebalance")
        .join("assembly_rebalance.db")
}

/// "-" 或空串视为未提供
fn optional(arg: Option<String>) -> Option<String> {
    arg.map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && s != "-")
}

fn load_api(source: &SnapshotSource, config_path: Option<&Path>) -> anyhow::Result<RebalanceApi> {
    if let Some(path) = config_path {
        let config = EngineConfig::from_json_file(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        return Ok(RebalanceApi::new(config)?);
    }
    match source {
        SnapshotSource::Database(path) => {
            let path_text = path
                .to_str()
                .ok_or_else(|| anyhow!("数据库路径非法: {}", path.display()))?;
            Ok(RebalanceApi::from_database(path_text)?)
        }
        SnapshotSource::File(_) => Ok(RebalanceApi::new(EngineConfig::default())?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match std::env::var("ASSY_LOG_FORMAT").as_deref() {
        Ok("json") => logging::init_json(),
        _ => logging::init(),
    }
    tracing::info!("{} v{}", APP_NAME, VERSION);

    let mut args = std::env::args().skip(1);

    let source = match optional(args.next()) {
        Some(path) => SnapshotSource::from_path(path),
        None => SnapshotSource::Database(default_db_path()),
    };

    let date_arg = args.next().ok_or_else(|| anyhow!("缺少目标日期\n{}", USAGE))?;
    let target_date = NaiveDate::parse_from_str(date_arg.trim(), "%Y-%m-%d")
        .with_context(|| format!("目标日期格式错误: {}\n{}", date_arg, USAGE))?;

    let target_line = optional(args.next())
        .map(|s| s.parse::<AssemblyLine>())
        .transpose()
        .map_err(|e| anyhow!("{}\n{}", e, USAGE))?;

    let target = optional(args.next())
        .map(|s| s.parse::<TargetSpec>())
        .transpose()
        .map_err(|e| anyhow!("{}\n{}", e, USAGE))?;

    let proposal_path = optional(args.next()).map(PathBuf::from);
    let config_path = optional(args.next()).map(PathBuf::from);
    if args.next().is_some() {
        bail!("参数过多\n{}", USAGE);
    }

    let api = load_api(&source, config_path.as_deref())?;
    let snapshot = api.load_snapshot(&source, target_date)?;
    let request = RebalanceRequest {
        target_date,
        target_line,
        target,
    };

    let report = match proposal_path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("读取提议文件失败: {}", path.display()))?;
            let proposer = StaticProposer::new(format!("file:{}", path.display()), text);
            api.rebalance_with_proposer(&snapshot, &request, &proposer).await?
        }
        None => api.rebalance(&snapshot, &request, None)?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
