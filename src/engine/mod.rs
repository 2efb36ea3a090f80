// ==========================================
// 装配线产能再平衡系统 - 引擎层
// ==========================================
// 职责: 实现再平衡规则,不拼 SQL,不做 I/O
// 数据流: snapshot -> target -> slack -> capacity_analyzer -> constraint
//         -> validator -> fallback （orchestrator 串联）
// 红线: 所有移动/拒绝都必须带可读 reason
// ==========================================

pub mod capacity_analyzer;
pub mod constraint;
pub mod error;
pub mod fallback;
pub mod orchestrator;
pub mod proposal;
pub mod slack;
pub mod snapshot;
pub mod target;
pub mod validator;

// 重导出核心引擎
pub use capacity_analyzer::CapacityAnalyzer;
pub use constraint::{ConstraintClassifier, FamilyClassifier, MarkerClassifier};
pub use error::{EngineError, EngineResult};
pub use fallback::{FallbackContext, FallbackOutcome, FallbackPlanner, PullSource};
pub use orchestrator::{AnalysisResult, ProposalInput, RebalanceOrchestrator, RebalanceRequest};
pub use proposal::{
    FactSource, FactSummary, ParsedProposal, ProposalError, ProposalParser, StaticProposer, StrategyProposer,
    UnavailableProposer,
};
pub use slack::SlackAnalyzer;
pub use snapshot::SnapshotReader;
pub use target::{ResolvedTarget, TargetAction, TargetResolver, TargetSpec};
pub use validator::{PlanValidator, ValidationOutcome};
