// ==========================================
// 装配线产能再平衡系统 - 外部提议边界
// ==========================================
// 职责: 向外部提议器提供事实摘要,并把返回文本解析为提议移动
// 红线: 提议是不可信输入,只能进入校验器,不能直接落到方案
// 红线: 提议失败/超时不是致命错误,直接走兜底搜索
// ==========================================

use crate::domain::analysis::ItemConstraint;
use crate::domain::capacity::{CapacityConstraint, CapacityLedger};
use crate::domain::move_plan::ProposedMove;
use crate::domain::plan::Location;
use crate::domain::types::{AssemblyLine, FamilyTag, OperationMode};
use crate::engine::fallback::PullSource;
use crate::i18n::{t, t_with_args};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ==========================================
// ProposalError
// ==========================================
#[derive(Error, Debug)]
pub enum ProposalError {
    #[error("提议器不可用: {0}")]
    Unavailable(String),

    #[error("提议器超时 ({0} 秒)")]
    Timeout(u64),

    #[error("提议文本中找不到 JSON 对象")]
    NoJson,

    #[error("提议 JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    #[error("提议缺少 moves 数组")]
    MissingMoves,
}

// ==========================================
// FactSummary - 事实摘要
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactItem {
    pub product_name: String,
    pub qty: i64,
    pub max_movable: i64,
    pub pallet_unit: i64,
    pub buffer_days: i64,
    pub family: FamilyTag,
    pub constraint: String,
    pub hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactDestination {
    pub location: Location,
    pub remaining: i64,
    pub max_capacity: i64,
    pub usage_rate: f64, // 百分比
}

/// 增产可拉入来源
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactSource {
    pub location: Location,
    pub product_name: String,
    pub qty: i64,
    pub pallet_unit: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactSummary {
    pub today: NaiveDate,
    pub frozen_until: NaiveDate,
    pub target_date: NaiveDate,
    pub target_line: AssemblyLine,
    pub mode: OperationMode,
    pub operation_qty: i64,
    pub capacity_ratio: f64,
    pub items: Vec<FactItem>,
    pub destinations: Vec<FactDestination>,
    #[serde(default)]
    pub sources: Vec<FactSource>,
}

impl FactSummary {
    #[allow(clippy::too_many_arguments)]
    pub fn build(
        today: NaiveDate,
        frozen_until: NaiveDate,
        origin: Location,
        mode: OperationMode,
        operation_qty: i64,
        capacity_ratio: f64,
        constraints: &[ItemConstraint],
        ledger: &CapacityLedger,
    ) -> Self {
        let items = constraints
            .iter()
            .map(|c| FactItem {
                product_name: c.product_name.clone(),
                qty: c.qty,
                max_movable: c.max_movable,
                pallet_unit: c.pallet_unit,
                buffer_days: c.buffer_days,
                family: c.family,
                constraint: c.description.clone(),
                hint: c.priority_hint.clone(),
            })
            .collect();

        let destinations = ledger
            .slots()
            .map(|s| FactDestination {
                location: s.location(),
                remaining: s.remaining,
                max_capacity: s.max_capacity,
                usage_rate: s.usage_rate() * 100.0,
            })
            .collect();

        Self {
            today,
            frozen_until,
            target_date: origin.date,
            target_line: origin.line,
            mode,
            operation_qty,
            capacity_ratio,
            items,
            destinations,
            sources: Vec::new(),
        }
    }

    /// 附加增产来源（仅增产模式有意义）
    pub fn with_sources(mut self, sources: &[PullSource]) -> Self {
        self.sources = sources
            .iter()
            .map(|s| FactSource {
                location: s.location,
                product_name: s.item.clone(),
                qty: s.qty,
                pallet_unit: s.pallet_unit,
            })
            .collect();
        self
    }

    /// 渲染给提议器的纯文本简报
    pub fn render_brief(&self) -> String {
        let action = match self.mode {
            OperationMode::Reduce => t("brief.action_reduce"),
            OperationMode::Increase => t("brief.action_increase"),
        };

        let mut lines = vec![
            t("brief.heading"),
            t_with_args(
                "brief.target",
                &[
                    ("date", &self.target_date.to_string()),
                    ("line", self.target_line.code()),
                    ("action", &action),
                    ("qty", &self.operation_qty.to_string()),
                    ("ratio", &format!("{:.0}", self.capacity_ratio * 100.0)),
                ],
            ),
            t_with_args(
                "brief.today",
                &[("today", &self.today.to_string()), ("frozen", &self.frozen_until.to_string())],
            ),
            String::new(),
            t("brief.items_header"),
        ];
        lines.extend(self.items.iter().enumerate().map(|(idx, item)| {
            t_with_args(
                "brief.item",
                &[
                    ("index", &(idx + 1).to_string()),
                    ("item", &item.product_name),
                    ("qty", &item.qty.to_string()),
                    ("max", &item.max_movable.to_string()),
                    ("pallet", &item.pallet_unit.to_string()),
                    ("buffer", &item.buffer_days.to_string()),
                    ("constraint", &item.constraint),
                    ("hint", &item.hint),
                ],
            )
        }));

        lines.push(String::new());
        lines.push(t("brief.destinations_header"));
        lines.extend(self.destinations.iter().map(|dest| {
            t_with_args(
                "brief.destination",
                &[
                    ("location", &dest.location.key()),
                    ("remaining", &dest.remaining.to_string()),
                    ("max", &dest.max_capacity.to_string()),
                    ("rate", &format!("{:.1}", dest.usage_rate)),
                ],
            )
        }));

        if !self.sources.is_empty() {
            lines.push(String::new());
            lines.push(t("brief.sources_header"));
            lines.extend(self.sources.iter().map(|src| {
                t_with_args(
                    "brief.source",
                    &[
                        ("location", &src.location.key()),
                        ("item", &src.product_name),
                        ("qty", &src.qty.to_string()),
                        ("pallet", &src.pallet_unit.to_string()),
                    ],
                )
            }));
        }

        lines.push(String::new());
        lines.push(t("brief.response_format"));
        lines.push(match self.mode {
            OperationMode::Reduce => t("brief.rules_reduce"),
            OperationMode::Increase => t("brief.rules_increase"),
        });

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

// ==========================================
// Trait: StrategyProposer
// ==========================================
// 用途: 外部策略来源（生成式模型/人工/规则文件）
#[async_trait]
pub trait StrategyProposer: Send + Sync {
    /// 提议来源名称（写入报告的 strategy_source）
    fn name(&self) -> &str;

    /// 根据事实摘要返回原始文本
    async fn propose(&self, facts: &FactSummary) -> Result<String, ProposalError>;
}

/// 固定文本提议器（文件/测试用）
#[derive(Debug, Clone)]
pub struct StaticProposer {
    name: String,
    text: String,
}

impl StaticProposer {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl StrategyProposer for StaticProposer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn propose(&self, _facts: &FactSummary) -> Result<String, ProposalError> {
        Ok(self.text.clone())
    }
}

/// 始终失败的提议器（未配置外部来源时使用）
#[derive(Debug, Clone)]
pub struct UnavailableProposer {
    reason: String,
}

impl UnavailableProposer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl StrategyProposer for UnavailableProposer {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn propose(&self, _facts: &FactSummary) -> Result<String, ProposalError> {
        Err(ProposalError::Unavailable(self.reason.clone()))
    }
}

// ==========================================
// ProposalParser
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedProposal {
    pub strategy: Option<String>,
    pub explanation: Option<String>,
    pub moves: Vec<ProposedMove>,
}

pub struct ProposalParser;

impl ProposalParser {
    /// 解析提议文本
    ///
    /// 1) 去掉 markdown 代码块标记
    /// 2) 取第一个 '{' 到最后一个 '}'
    /// 3) 必须含 moves 数组; 单条移动字段缺失时宽松处理
    pub fn parse(raw: &str) -> Result<ParsedProposal, ProposalError> {
        let cleaned = raw.replace("```json", "").replace("```", "");
        let start = cleaned.find('{').ok_or(ProposalError::NoJson)?;
        let end = cleaned.rfind('}').ok_or(ProposalError::NoJson)?;
        if end <= start {
            return Err(ProposalError::NoJson);
        }

        let value: Value = serde_json::from_str(&cleaned[start..=end])?;
        let moves = value
            .get("moves")
            .and_then(Value::as_array)
            .ok_or(ProposalError::MissingMoves)?
            .iter()
            .map(Self::parse_move)
            .collect();

        Ok(ParsedProposal {
            strategy: value.get("strategy").and_then(Value::as_str).map(str::to_string),
            explanation: value.get("explanation").and_then(Value::as_str).map(str::to_string),
            moves,
        })
    }

    fn parse_move(raw: &Value) -> ProposedMove {
        let text = |key: &str| raw.get(key).and_then(Value::as_str).map(|s| s.trim().to_string());

        ProposedMove {
            item: text("item"),
            qty: raw.get("qty").map(Self::lenient_qty).unwrap_or(0),
            from: text("from"),
            to: text("to").unwrap_or_default(),
            reason: text("reason").unwrap_or_else(|| t("validator.default_reason")),
        }
    }

    /// 只接受整数（含 300.0 / "1,200"）,小数与非法值记为 0,由校验器按非正数拒绝
    fn lenient_qty(value: &Value) -> i64 {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                        .map(|f| f as i64)
                })
                .unwrap_or(0),
            Value::String(s) => s.trim().replace(',', "").parse::<i64>().unwrap_or(0),
            _ => 0,
        }
    }
}
