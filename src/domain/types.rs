// ==========================================
// 装配线产能再平衡系统 - 领域类型定义
// ==========================================
// 红线: 线体集合固定为三条,不是开放集合
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 装配线体 (Assembly Line)
// ==========================================
// 序列化格式: ASSY1 / ASSY2 / ASSY3 (与快照表一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AssemblyLine {
    #[serde(rename = "ASSY1")]
    Assy1,
    #[serde(rename = "ASSY2")]
    Assy2,
    #[serde(rename = "ASSY3")]
    Assy3,
}

impl AssemblyLine {
    /// 全部线体（固定顺序）
    pub const ALL: [AssemblyLine; 3] = [AssemblyLine::Assy1, AssemblyLine::Assy2, AssemblyLine::Assy3];

    pub fn code(&self) -> &'static str {
        match self {
            AssemblyLine::Assy1 => "ASSY1",
            AssemblyLine::Assy2 => "ASSY2",
            AssemblyLine::Assy3 => "ASSY3",
        }
    }

    /// 除自身以外的线体
    pub fn others(&self) -> impl Iterator<Item = AssemblyLine> + '_ {
        Self::ALL.into_iter().filter(move |l| l != self)
    }
}

impl fmt::Display for AssemblyLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for AssemblyLine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ASSY1" | "LINE1" => Ok(AssemblyLine::Assy1),
            "ASSY2" | "LINE2" => Ok(AssemblyLine::Assy2),
            "ASSY3" | "LINE3" => Ok(AssemblyLine::Assy3),
            other => Err(format!("未知线体: {}", other)),
        }
    }
}

// ==========================================
// 产品族标签 (Family Tag)
// ==========================================
// 派生值,不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FamilyTag {
    Universal,  // 通用族: 三条线均可
    Restricted, // 受限族: 一条线禁止
    Dedicated,  // 专用族: 只能改日期,不能换线
}

impl fmt::Display for FamilyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FamilyTag::Universal => write!(f, "UNIVERSAL"),
            FamilyTag::Restricted => write!(f, "RESTRICTED"),
            FamilyTag::Dedicated => write!(f, "DEDICATED"),
        }
    }
}

// ==========================================
// 调整方向 (Operation Mode)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationMode {
    Reduce,   // 减产: 把量移出目标日/线
    Increase, // 增产: 把量拉入目标日/线
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationMode::Reduce => write!(f, "REDUCE"),
            OperationMode::Increase => write!(f, "INCREASE"),
        }
    }
}

// ==========================================
// 移动方向 (Move Direction)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveDirection {
    Transfer, // 同日换线
    Advance,  // 提前生产
    Postpone, // 顺延生产
}

impl fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveDirection::Transfer => write!(f, "TRANSFER"),
            MoveDirection::Advance => write!(f, "ADVANCE"),
            MoveDirection::Postpone => write!(f, "POSTPONE"),
        }
    }
}

// ==========================================
// 移动来源 (Move Origin)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveOrigin {
    Proposer,          // 外部提议器（已校验）
    ReductionFallback, // 减产兜底搜索
    IncreaseFallback,  // 增产兜底搜索
}

impl fmt::Display for MoveOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveOrigin::Proposer => write!(f, "PROPOSER"),
            MoveOrigin::ReductionFallback => write!(f, "REDUCTION_FALLBACK"),
            MoveOrigin::IncreaseFallback => write!(f, "INCREASE_FALLBACK"),
        }
    }
}

// ==========================================
// 处置结果 (Disposition)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Accepted, // 通过
    Adjusted, // 自动缩量后通过
    Rejected, // 拒绝
    Info,     // 过程信息
}

impl Disposition {
    /// 是否为终态处置（提议逐条的唯一结论）
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Disposition::Info)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Disposition::Accepted => write!(f, "ACCEPTED"),
            Disposition::Adjusted => write!(f, "ADJUSTED"),
            Disposition::Rejected => write!(f, "REJECTED"),
            Disposition::Info => write!(f, "INFO"),
        }
    }
}

// ==========================================
// 违规/事件类型 (Violation Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    // ===== 校验器 =====
    Accepted,
    UnknownItem,
    ExceedsSlack,
    NonPositiveQty,
    PalletMismatch,
    MalformedDestination,
    ForbiddenLine,
    CrossLineDedicated,
    NonWorkday,
    NoCapacityData,
    CapacityAdjusted,
    CapacityExhausted,
    WrongDirection, // 增产: 目的地不是目标日/线
    UnknownSource,  // 增产: 来源不在可拉入清单中

    // ===== 提议边界 =====
    ProposalUnavailable,

    // ===== 兜底搜索 =====
    FallbackStarted,
    FallbackCandidates,
    FallbackMove,
    TargetReached,
    FallbackExhausted,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Accepted => "ACCEPTED",
            ViolationKind::UnknownItem => "UNKNOWN_ITEM",
            ViolationKind::ExceedsSlack => "EXCEEDS_SLACK",
            ViolationKind::NonPositiveQty => "NON_POSITIVE_QTY",
            ViolationKind::PalletMismatch => "PALLET_MISMATCH",
            ViolationKind::MalformedDestination => "MALFORMED_DESTINATION",
            ViolationKind::ForbiddenLine => "FORBIDDEN_LINE",
            ViolationKind::CrossLineDedicated => "CROSS_LINE_DEDICATED",
            ViolationKind::NonWorkday => "NON_WORKDAY",
            ViolationKind::NoCapacityData => "NO_CAPACITY_DATA",
            ViolationKind::CapacityAdjusted => "CAPACITY_ADJUSTED",
            ViolationKind::CapacityExhausted => "CAPACITY_EXHAUSTED",
            ViolationKind::WrongDirection => "WRONG_DIRECTION",
            ViolationKind::UnknownSource => "UNKNOWN_SOURCE",
            ViolationKind::ProposalUnavailable => "PROPOSAL_UNAVAILABLE",
            ViolationKind::FallbackStarted => "FALLBACK_STARTED",
            ViolationKind::FallbackCandidates => "FALLBACK_CANDIDATES",
            ViolationKind::FallbackMove => "FALLBACK_MOVE",
            ViolationKind::TargetReached => "TARGET_REACHED",
            ViolationKind::FallbackExhausted => "FALLBACK_EXHAUSTED",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_parse_case_insensitive() {
        assert_eq!("assy2".parse::<AssemblyLine>().unwrap(), AssemblyLine::Assy2);
        assert_eq!(" ASSY3 ".parse::<AssemblyLine>().unwrap(), AssemblyLine::Assy3);
        assert!("ASSY4".parse::<AssemblyLine>().is_err());
    }

    #[test]
    fn test_line_others() {
        let others: Vec<_> = AssemblyLine::Assy2.others().collect();
        assert_eq!(others, vec![AssemblyLine::Assy1, AssemblyLine::Assy3]);
    }

    #[test]
    fn test_line_serde_code() {
        let json = serde_json::to_string(&AssemblyLine::Assy1).unwrap();
        assert_eq!(json, "\"ASSY1\"");
    }

    #[test]
    fn test_disposition_terminal() {
        assert!(Disposition::Accepted.is_terminal());
        assert!(Disposition::Rejected.is_terminal());
        assert!(!Disposition::Info.is_terminal());
    }
}
