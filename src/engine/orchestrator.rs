// ==========================================
// 装配线产能再平衡系统 - 引擎编排器
// ==========================================
// 用途: 协调各阶段的执行顺序,组装调整报告
// 流程: 快照读取 -> 目标解析 -> 松弛分析 -> 产能分析 -> 约束分类
//       -> (外部提议) -> 校验 -> 兜底搜索 -> 报告
// 红线: 每次调用重新构建全部状态,不在调用之间保留任何东西
// ==========================================

use crate::config::EngineConfig;
use crate::domain::analysis::{ItemConstraint, ItemSlack};
use crate::domain::capacity::CapacityLedger;
use crate::domain::move_plan::{total_qty, Violation};
use crate::domain::plan::{Location, PlanSnapshot, StockList};
use crate::domain::report::{achievement_rate, ProposalSummary, RebalanceOutcome, RebalanceReport};
use crate::domain::types::{AssemblyLine, OperationMode, ViolationKind};
use crate::engine::capacity_analyzer::CapacityAnalyzer;
use crate::engine::constraint::{ConstraintClassifier, FamilyClassifier, MarkerClassifier};
use crate::engine::error::EngineResult;
use crate::engine::fallback::{FallbackContext, FallbackPlanner};
use crate::engine::proposal::{FactSummary, ParsedProposal, ProposalError, ProposalParser, StrategyProposer};
use crate::engine::slack::SlackAnalyzer;
use crate::engine::snapshot::SnapshotReader;
use crate::engine::target::{ResolvedTarget, TargetAction, TargetResolver, TargetSpec};
use crate::engine::validator::PlanValidator;
use crate::i18n::{t, t_with_args};
use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// 请求 / 中间结果
// ==========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebalanceRequest {
    pub target_date: NaiveDate,
    pub target_line: Option<AssemblyLine>, // None: 取当日最忙线体
    pub target: Option<TargetSpec>,        // None: 默认产能比例
}

/// 分析阶段（1-4）的输出
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub origin: Location,
    pub stock: StockList,
    pub target: ResolvedTarget,
    pub slack_table: Vec<ItemSlack>,
    pub ledger: CapacityLedger,
    pub constraints: Vec<ItemConstraint>,
}

/// 外部提议的获取结果
#[derive(Debug)]
pub enum ProposalInput {
    /// 未接入提议器
    None,
    Parsed { source: String, proposal: ParsedProposal },
    Failed { source: String, error: ProposalError },
}

// ==========================================
// RebalanceOrchestrator - 引擎编排器
// ==========================================
pub struct RebalanceOrchestrator {
    config: EngineConfig,
    reader: SnapshotReader,
    resolver: TargetResolver,
    slack: SlackAnalyzer,
    capacity: CapacityAnalyzer,
    constraint: ConstraintClassifier,
    validator: PlanValidator,
    fallback: FallbackPlanner,
}

impl RebalanceOrchestrator {
    /// 使用默认名称标记分类器创建编排器
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let classifier = Arc::new(MarkerClassifier::new(&config.markers));
        Self::with_classifier(config, classifier)
    }

    /// 使用自定义产品族分类器创建编排器
    pub fn with_classifier(config: EngineConfig, classifier: Arc<dyn FamilyClassifier>) -> EngineResult<Self> {
        config.validate()?;
        let constraint = ConstraintClassifier::new(classifier);

        Ok(Self {
            reader: SnapshotReader::new(),
            resolver: TargetResolver::new(),
            slack: SlackAnalyzer::new(&config),
            capacity: CapacityAnalyzer::new(&config),
            validator: PlanValidator::new(),
            fallback: FallbackPlanner::new(&config, constraint.clone()),
            constraint,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn frozen_until(&self) -> NaiveDate {
        self.config.today + Duration::days(self.config.frozen_days)
    }

    fn reached(&self, total: i64, operation_qty: i64) -> bool {
        total as f64 >= operation_qty as f64 * self.config.achievement_threshold
    }

    // ==========================================
    // 阶段 1-4: 分析
    // ==========================================

    #[instrument(skip(self, snapshot), fields(rows = snapshot.entries().len()))]
    pub fn analyze(&self, snapshot: &PlanSnapshot, request: &RebalanceRequest) -> EngineResult<AnalysisResult> {
        let date = request.target_date;
        let line = match request.target_line {
            Some(line) => line,
            None => {
                let line = self.reader.busiest_line(snapshot, date)?;
                info!(line = %line, "未指定线体,取当日生产量最大的线体");
                line
            }
        };

        // 步骤1: 目标日/线品目
        let stock = self.reader.read_stock(snapshot, date, line)?;

        // 步骤0: 目标解析
        let spec = request
            .target
            .unwrap_or(TargetSpec::CapacityRatio(self.config.default_capacity_ratio));
        let target = self
            .resolver
            .resolve(spec, stock.total, self.config.capacity_of(line))?;

        // 步骤2-4
        let slack_table = self.slack.analyze(snapshot, &stock);
        let ledger = self.capacity.analyze(snapshot, date, line);
        let constraints = self.constraint.classify(&slack_table, line);

        info!(
            date = %date,
            line = %line,
            current_total = stock.total,
            target_qty = target.target_qty,
            mode = ?target.mode(),
            operation_qty = target.operation_qty(),
            movable_items = constraints.len(),
            capacity_slots = ledger.len(),
            "分析阶段完成"
        );

        Ok(AnalysisResult {
            origin: Location::new(date, line),
            stock,
            target,
            slack_table,
            ledger,
            constraints,
        })
    }

    /// 提议器所需事实摘要（无需调整时为 None）
    pub fn fact_summary(&self, snapshot: &PlanSnapshot, analysis: &AnalysisResult) -> Option<FactSummary> {
        let mode = analysis.target.mode()?;
        let facts = FactSummary::build(
            self.config.today,
            self.frozen_until(),
            analysis.origin,
            mode,
            analysis.target.operation_qty(),
            analysis.target.capacity_ratio,
            &analysis.constraints,
            &analysis.ledger,
        );
        Some(match mode {
            OperationMode::Reduce => facts,
            OperationMode::Increase => {
                facts.with_sources(&self.fallback.pull_sources(snapshot, analysis.origin))
            }
        })
    }

    // ==========================================
    // 阶段 5-6: 校验 + 兜底,组装报告
    // ==========================================

    #[instrument(skip_all, fields(origin = %analysis.origin))]
    pub fn plan(
        &self,
        snapshot: &PlanSnapshot,
        analysis: AnalysisResult,
        proposal: ProposalInput,
    ) -> EngineResult<RebalanceReport> {
        let AnalysisResult {
            origin,
            stock,
            target,
            slack_table,
            ledger,
            constraints,
        } = analysis;

        let capacity_table = ledger.slots().cloned().collect::<Vec<_>>();
        let mut ledger = ledger;

        let mode = match target.action {
            TargetAction::NoActionNeeded => {
                info!(current_total = stock.total, "已处于目标量,无需调整");
                return Ok(RebalanceReport {
                    run_id: Uuid::new_v4().to_string(),
                    generated_at: Local::now().naive_local(),
                    today: self.config.today,
                    target_date: origin.date,
                    target_line: origin.line,
                    mode: None,
                    current_total: stock.total,
                    target_qty: target.target_qty,
                    capacity_ratio: target.capacity_ratio,
                    operation_qty: 0,
                    stock,
                    slack_table,
                    ledger_after: capacity_table.clone(),
                    capacity_table,
                    constraint_table: constraints,
                    proposal: ProposalSummary::default(),
                    strategy_source: t("strategy.no_action"),
                    moves: Vec::new(),
                    violations: Vec::new(),
                    total_moved: 0,
                    final_qty: target.current_total,
                    achievement_rate: 0.0,
                    outcome: RebalanceOutcome::AlreadyAtTarget,
                });
            }
            TargetAction::Operate { mode, .. } => mode,
        };
        let operation_qty = target.operation_qty();

        // ==========================================
        // 提议归一
        // ==========================================
        let mut violations: Vec<Violation> = Vec::new();
        let (proposal_summary, proposed_moves, mut strategy_source) = match proposal {
            ProposalInput::None => (ProposalSummary::default(), Vec::new(), t("strategy.fallback_only")),
            ProposalInput::Parsed { source, proposal } => (
                ProposalSummary {
                    strategy: proposal.strategy,
                    explanation: proposal.explanation,
                    proposed_count: proposal.moves.len(),
                    failed: false,
                    error: None,
                },
                proposal.moves,
                source,
            ),
            ProposalInput::Failed { source, error } => {
                warn!(source = %source, error = %error, "外部提议不可用,转兜底搜索");
                let error_text = error.to_string();
                violations.push(Violation::info(
                    ViolationKind::ProposalUnavailable,
                    None,
                    t_with_args(
                        "proposal.unavailable",
                        &[("source", source.as_str()), ("error", error_text.as_str())],
                    ),
                ));
                (
                    ProposalSummary {
                        failed: true,
                        error: Some(error_text),
                        ..Default::default()
                    },
                    Vec::new(),
                    t_with_args("strategy.fallback_after_failure", &[("source", source.as_str())]),
                )
            }
        };

        // ==========================================
        // 步骤5: 校验
        // ==========================================
        debug!(proposed = proposed_moves.len(), "步骤5: 校验外部提议");
        let validation = match mode {
            OperationMode::Reduce => self.validator.validate(
                &proposed_moves,
                &constraints,
                &mut ledger,
                snapshot.calendar(),
                origin,
            )?,
            OperationMode::Increase => {
                // 增产: 提议必须从来源拉入目标槽
                ledger.insert(self.capacity.slot_for(snapshot, origin.date, origin.line));
                let sources = self.fallback.pull_sources(snapshot, origin);
                self.validator
                    .validate_increase(&proposed_moves, &sources, &mut ledger, origin)?
            }
        };
        violations.extend(validation.violations);
        let mut moves = validation.moves;

        // ==========================================
        // 步骤6: 兜底搜索
        // ==========================================
        debug!("步骤6: 兜底搜索");
        let ctx = FallbackContext {
            snapshot,
            origin,
            mode,
            operation_qty,
            constraints: &constraints,
        };
        let fallback = self.fallback.plan(&ctx, &moves, &mut ledger)?;
        if !fallback.moves.is_empty() {
            let suffix = match mode {
                OperationMode::Reduce => t("strategy.reduce_suffix"),
                OperationMode::Increase => t("strategy.increase_suffix"),
            };
            strategy_source = format!("{} + {}", strategy_source, suffix);
        }
        violations.extend(fallback.violations);
        moves.extend(fallback.moves);

        // ==========================================
        // 结果判定
        // ==========================================
        let total_moved = total_qty(&moves);
        let final_qty = match mode {
            OperationMode::Reduce => stock.total - total_moved,
            OperationMode::Increase => stock.total + total_moved,
        };
        let rate = achievement_rate(total_moved, operation_qty);

        let outcome = if self.reached(total_moved, operation_qty) {
            RebalanceOutcome::TargetReached
        } else {
            let mut explanation = t_with_args(
                "outcome.partial",
                &[
                    ("rate", &format!("{:.1}", rate)),
                    ("moved", &total_moved.to_string()),
                    ("target", &operation_qty.to_string()),
                ],
            );
            if let Some(detail) = &fallback.exhaustion {
                explanation = format!("{} {}", explanation, detail);
            }
            RebalanceOutcome::Partial { explanation }
        };

        info!(
            moves = moves.len(),
            total_moved,
            final_qty,
            achievement_rate = rate,
            success = outcome.is_success(),
            "调整方案生成完成"
        );

        Ok(RebalanceReport {
            run_id: Uuid::new_v4().to_string(),
            generated_at: Local::now().naive_local(),
            today: self.config.today,
            target_date: origin.date,
            target_line: origin.line,
            mode: Some(mode),
            current_total: stock.total,
            target_qty: target.target_qty,
            capacity_ratio: target.capacity_ratio,
            operation_qty,
            stock,
            slack_table,
            capacity_table,
            ledger_after: ledger.slots().cloned().collect(),
            constraint_table: constraints,
            proposal: proposal_summary,
            strategy_source,
            moves,
            violations,
            total_moved,
            final_qty,
            achievement_rate: rate,
            outcome,
        })
    }

    // ==========================================
    // 一次完整运行
    // ==========================================

    /// 同步运行: 提议文本已在手（或没有）
    pub fn run(
        &self,
        snapshot: &PlanSnapshot,
        request: &RebalanceRequest,
        raw_proposal: Option<(&str, &str)>,
    ) -> EngineResult<RebalanceReport> {
        let analysis = self.analyze(snapshot, request)?;
        let input = match raw_proposal {
            None => ProposalInput::None,
            Some((source, raw)) => parse_input(source, ProposalParser::parse(raw)),
        };
        self.plan(snapshot, analysis, input)
    }

    /// 异步运行: 在超时保护下调用外部提议器
    #[instrument(skip_all, fields(date = %request.target_date, proposer = proposer.name()))]
    pub async fn run_with_proposer(
        &self,
        snapshot: &PlanSnapshot,
        request: &RebalanceRequest,
        proposer: &dyn StrategyProposer,
    ) -> EngineResult<RebalanceReport> {
        let analysis = self.analyze(snapshot, request)?;

        let Some(facts) = self.fact_summary(snapshot, &analysis) else {
            return self.plan(snapshot, analysis, ProposalInput::None);
        };

        let timeout_secs = self.config.proposer_timeout_secs;
        let source = proposer.name().to_string();
        let raw = match tokio::time::timeout(
            std::time::Duration::from_secs(timeout_secs),
            proposer.propose(&facts),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ProposalError::Timeout(timeout_secs)),
        };

        let input = match raw {
            Ok(text) => parse_input(&source, ProposalParser::parse(&text)),
            Err(error) => ProposalInput::Failed { source, error },
        };
        self.plan(snapshot, analysis, input)
    }
}

fn parse_input(source: &str, parsed: Result<ParsedProposal, ProposalError>) -> ProposalInput {
    match parsed {
        Ok(proposal) => ProposalInput::Parsed {
            source: source.to_string(),
            proposal,
        },
        Err(error) => ProposalInput::Failed {
            source: source.to_string(),
            error,
        },
    }
}
