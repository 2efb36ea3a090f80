// ==========================================
// 装配线产能再平衡系统 - 兜底搜索
// ==========================================
// 职责: 提议不足时,确定性地补足移动方案
// 触发: 已通过移动量 < 阈值(默认 90%) × 操作量
// ==========================================
// 减产: 候选顺序 换线(同日) -> 提前(同线,冻结区之后) -> 顺延(同线,15 天内)
// 增产: 来源顺序 同日其他线通用族 -> 同线未来 10 天内
// ==========================================
// 红线: 与校验器共用同一本账,账本 remaining 不得为负
// 红线: 单品目累计移动量不得超过 max_movable
// 红线: 不重跑校验器,托盘/产能在此处直接保证
// ==========================================

use crate::config::{EngineConfig, PastHorizonRule};
use crate::domain::analysis::ItemConstraint;
use crate::domain::capacity::CapacityLedger;
use crate::domain::move_plan::{total_qty, Move, Violation};
use crate::domain::plan::{Location, PlanSnapshot};
use crate::domain::types::{FamilyTag, MoveOrigin, OperationMode, ViolationKind};
use crate::engine::capacity_analyzer::CapacityAnalyzer;
use crate::engine::constraint::ConstraintClassifier;
use crate::engine::error::EngineResult;
use crate::i18n::{t, t_with_args};
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

// ==========================================
// 输入/输出
// ==========================================

/// 兜底搜索上下文
pub struct FallbackContext<'a> {
    pub snapshot: &'a PlanSnapshot,
    pub origin: Location, // 目标日/线
    pub mode: OperationMode,
    pub operation_qty: i64,
    pub constraints: &'a [ItemConstraint],
}

#[derive(Debug, Clone, Default)]
pub struct FallbackOutcome {
    pub triggered: bool,
    pub moves: Vec<Move>,
    pub violations: Vec<Violation>,
    pub reached: bool,
    pub exhaustion: Option<String>, // 未达标时的说明
}

impl FallbackOutcome {
    fn exhausted(mut self, message: String) -> Self {
        self.violations
            .push(Violation::info(ViolationKind::FallbackExhausted, None, message.clone()));
        self.exhaustion = Some(message);
        self
    }
}

/// 减产候选类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateKind {
    Transfer,
    Past,
    Future,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    location: Location,
    kind: CandidateKind,
    days: i64, // 与目标日相距天数（换线为 0）
}

/// 增产来源（校验器与兜底共用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullSource {
    pub location: Location,
    pub item: String,
    pub qty: i64,
    pub pallet_unit: i64,
    pub days: i64, // 与目标日相距天数（他线为 0）
}

// ==========================================
// FallbackPlanner
// ==========================================
pub struct FallbackPlanner {
    today: NaiveDate,
    frozen_days: i64,
    reduction_future_days: i64,
    increase_future_days: i64,
    achievement_threshold: f64,
    past_horizon: PastHorizonRule,
    capacity: CapacityAnalyzer,
    classifier: ConstraintClassifier,
}

impl FallbackPlanner {
    pub fn new(config: &EngineConfig, classifier: ConstraintClassifier) -> Self {
        Self {
            today: config.today,
            frozen_days: config.frozen_days,
            reduction_future_days: config.reduction_future_days,
            increase_future_days: config.increase_future_days,
            achievement_threshold: config.achievement_threshold,
            past_horizon: config.past_horizon.clone(),
            capacity: CapacityAnalyzer::new(config),
            classifier,
        }
    }

    fn reached(&self, total: i64, operation_qty: i64) -> bool {
        total as f64 >= operation_qty as f64 * self.achievement_threshold
    }

    /// 执行兜底搜索（未触发时返回空结果）
    #[instrument(skip_all, fields(origin = %ctx.origin, mode = %ctx.mode, operation_qty = ctx.operation_qty))]
    pub fn plan(
        &self,
        ctx: &FallbackContext<'_>,
        validated: &[Move],
        ledger: &mut CapacityLedger,
    ) -> EngineResult<FallbackOutcome> {
        let current = total_qty(validated);
        if ctx.operation_qty <= 0 || self.reached(current, ctx.operation_qty) {
            debug!(current, "已通过移动量达标,跳过兜底");
            return Ok(FallbackOutcome {
                reached: true,
                ..Default::default()
            });
        }

        let outcome = match ctx.mode {
            OperationMode::Reduce => self.plan_reduction(ctx, validated, current, ledger)?,
            OperationMode::Increase => self.plan_increase(ctx, validated, current, ledger)?,
        };

        info!(
            moves = outcome.moves.len(),
            moved = total_qty(&outcome.moves),
            reached = outcome.reached,
            "兜底搜索结束"
        );
        Ok(outcome)
    }

    // ==========================================
    // 减产
    // ==========================================

    fn plan_reduction(
        &self,
        ctx: &FallbackContext<'_>,
        validated: &[Move],
        current: i64,
        ledger: &mut CapacityLedger,
    ) -> EngineResult<FallbackOutcome> {
        let mut outcome = FallbackOutcome {
            triggered: true,
            ..Default::default()
        };

        // 扣除已通过移动后的剩余可移量
        let mut moved_by_item: HashMap<&str, i64> = HashMap::new();
        for mv in validated {
            *moved_by_item.entry(mv.item.as_str()).or_insert(0) += mv.qty;
        }
        let items: Vec<(&ItemConstraint, i64)> = ctx
            .constraints
            .iter()
            .map(|c| {
                let left = c.max_movable - moved_by_item.get(c.product_name.as_str()).copied().unwrap_or(0);
                (c, left)
            })
            .filter(|(c, left)| c.pallet_unit > 0 && *left >= c.pallet_unit)
            .collect();

        if items.is_empty() {
            return Ok(outcome.exhausted(t("fallback.all_items_exhausted")));
        }

        outcome.violations.push(Violation::info(
            ViolationKind::FallbackStarted,
            None,
            if validated.is_empty() {
                t("fallback.reduce_started")
            } else {
                t_with_args(
                    "fallback.reduce_supplement",
                    &[
                        ("current", &current.to_string()),
                        ("needed", &(ctx.operation_qty - current).to_string()),
                    ],
                )
            },
        ));

        let candidates = self.reduction_candidates(ctx, ledger);
        if candidates.is_empty() {
            return Ok(outcome.exhausted(t("fallback.no_candidates")));
        }

        let count_of = |kind: CandidateKind| candidates.iter().filter(|c| c.kind == kind).count().to_string();
        outcome.violations.push(Violation::info(
            ViolationKind::FallbackCandidates,
            None,
            t_with_args(
                "fallback.candidates",
                &[
                    ("transfer", &count_of(CandidateKind::Transfer)),
                    ("past", &count_of(CandidateKind::Past)),
                    ("future", &count_of(CandidateKind::Future)),
                    ("total", &candidates.len().to_string()),
                ],
            ),
        ));

        let mut total = current;
        'items: for (constraint, movable_left) in items {
            let pallet = constraint.pallet_unit;
            let mut left = movable_left;

            for cand in &candidates {
                if left < pallet {
                    break;
                }
                let key = cand.location.key();
                let remaining = ledger.get(&key).map(|s| s.remaining).unwrap_or(0);
                if remaining < pallet {
                    continue;
                }
                if !constraint.can_target_line(cand.location.line) {
                    continue;
                }
                if cand.kind == CandidateKind::Future && cand.days > constraint.buffer_days {
                    continue;
                }

                let qty = (left.min(remaining) / pallet) * pallet;
                if qty <= 0 {
                    continue;
                }
                ledger.consume(&key, qty)?;
                left -= qty;
                total += qty;

                let reason = match cand.kind {
                    CandidateKind::Transfer => t_with_args(
                        "fallback.reason_transfer",
                        &[("line", cand.location.line.code()), ("remaining", &remaining.to_string())],
                    ),
                    CandidateKind::Past => t_with_args(
                        "fallback.reason_advance",
                        &[("days", &cand.days.to_string()), ("remaining", &remaining.to_string())],
                    ),
                    CandidateKind::Future => t_with_args(
                        "fallback.reason_postpone",
                        &[
                            ("days", &cand.days.to_string()),
                            ("buffer", &constraint.buffer_days.to_string()),
                            ("remaining", &remaining.to_string()),
                        ],
                    ),
                };

                debug!(item = %constraint.product_name, qty, dest = %cand.location, "兜底移动");
                self.push_move(
                    &mut outcome,
                    &constraint.product_name,
                    qty,
                    pallet,
                    ctx.origin,
                    cand.location,
                    MoveOrigin::ReductionFallback,
                    reason,
                );

                if self.reached(total, ctx.operation_qty) {
                    outcome.reached = true;
                    break 'items;
                }
            }
        }

        Ok(self.finish(outcome, total, ctx.operation_qty, candidates.len()))
    }

    /// 减产候选: 换线 -> 提前(由远及近) -> 顺延(由近及远)
    fn reduction_candidates(&self, ctx: &FallbackContext<'_>, ledger: &mut CapacityLedger) -> Vec<Candidate> {
        let origin = ctx.origin;
        let calendar = ctx.snapshot.calendar();
        let mut candidates = Vec::new();

        // 1) 同日其他线体
        for line in origin.line.others() {
            let slot = ledger.insert(self.capacity.slot_for(ctx.snapshot, origin.date, line));
            if slot.remaining > 0 {
                candidates.push(Candidate {
                    location: Location::new(origin.date, line),
                    kind: CandidateKind::Transfer,
                    days: 0,
                });
            }
        }

        // 2) 提前: 不早于基准日,不进冻结区
        let days_from_today = (origin.date - self.today).num_days();
        let past_range = self.past_horizon.range_for(days_from_today);
        let frozen_until = self.today + Duration::days(self.frozen_days);
        for i in (1..=past_range).rev() {
            let date = origin.date - Duration::days(i);
            if date < frozen_until || date < self.today || !calendar.is_workday(date) {
                continue;
            }
            ledger.insert(self.capacity.slot_for(ctx.snapshot, date, origin.line));
            candidates.push(Candidate {
                location: Location::new(date, origin.line),
                kind: CandidateKind::Past,
                days: i,
            });
        }

        // 3) 顺延
        for i in 1..=self.reduction_future_days {
            let date = origin.date + Duration::days(i);
            if !calendar.is_workday(date) {
                continue;
            }
            ledger.insert(self.capacity.slot_for(ctx.snapshot, date, origin.line));
            candidates.push(Candidate {
                location: Location::new(date, origin.line),
                kind: CandidateKind::Future,
                days: i,
            });
        }

        candidates
    }

    // ==========================================
    // 增产
    // ==========================================

    fn plan_increase(
        &self,
        ctx: &FallbackContext<'_>,
        validated: &[Move],
        current: i64,
        ledger: &mut CapacityLedger,
    ) -> EngineResult<FallbackOutcome> {
        let mut outcome = FallbackOutcome {
            triggered: true,
            ..Default::default()
        };
        let origin = ctx.origin;
        let mut still_needed = (ctx.operation_qty - current).max(0);

        outcome.violations.push(Violation::info(
            ViolationKind::FallbackStarted,
            None,
            if current == 0 {
                t("fallback.increase_started")
            } else {
                t_with_args(
                    "fallback.increase_supplement",
                    &[("current", &current.to_string()), ("needed", &still_needed.to_string())],
                )
            },
        ));

        let target_key = origin.key();
        ledger.insert(self.capacity.slot_for(ctx.snapshot, origin.date, origin.line));

        // 扣除已通过提议从同一来源拉走的量
        let mut pulled: HashMap<(String, Location), i64> = HashMap::new();
        for mv in validated {
            *pulled.entry((mv.item.clone(), mv.from)).or_insert(0) += mv.qty;
        }
        let sources: Vec<PullSource> = self
            .pull_sources(ctx.snapshot, origin)
            .into_iter()
            .filter_map(|mut source| {
                let used = pulled.remove(&(source.item.clone(), source.location)).unwrap_or(0);
                source.qty -= used;
                (source.qty >= source.pallet_unit).then_some(source)
            })
            .collect();
        if sources.is_empty() {
            return Ok(outcome.exhausted(t("fallback.increase_no_sources")));
        }

        let transfer_count = sources.iter().filter(|s| s.days == 0).count();
        outcome.violations.push(Violation::info(
            ViolationKind::FallbackCandidates,
            None,
            t_with_args(
                "fallback.increase_candidates",
                &[
                    ("transfer", &transfer_count.to_string()),
                    ("future", &(sources.len() - transfer_count).to_string()),
                ],
            ),
        ));

        let mut total = current;
        for source in &sources {
            if still_needed <= 0 {
                break;
            }
            let target_remaining = ledger.get(&target_key).map(|s| s.remaining).unwrap_or(0);
            let cap = source.qty.min(still_needed).min(target_remaining);
            let qty = (cap / source.pallet_unit) * source.pallet_unit;
            if qty <= 0 {
                continue;
            }
            ledger.consume(&target_key, qty)?;
            still_needed -= qty;
            total += qty;

            let reason = if source.days == 0 {
                t_with_args("fallback.reason_pull_transfer", &[("line", source.location.line.code())])
            } else {
                t_with_args("fallback.reason_pull_future", &[("days", &source.days.to_string())])
            };

            debug!(item = %source.item, qty, from = %source.location, "兜底拉入");
            self.push_move(
                &mut outcome,
                &source.item,
                qty,
                source.pallet_unit,
                source.location,
                origin,
                MoveOrigin::IncreaseFallback,
                reason,
            );

            if self.reached(total, ctx.operation_qty) {
                outcome.reached = true;
                break;
            }
        }

        Ok(self.finish(outcome, total, ctx.operation_qty, sources.len()))
    }

    /// 增产来源: 同日其他线通用族 -> 同线未来(由近及远)
    pub fn pull_sources(&self, snapshot: &PlanSnapshot, origin: Location) -> Vec<PullSource> {
        let mut sources = Vec::new();

        for line in origin.line.others() {
            for row in snapshot.rows_at(origin.date, line) {
                if row.produced_qty <= 0 || row.pallet_unit <= 0 {
                    continue;
                }
                if self.classifier.family_of(&row.product_name) != FamilyTag::Universal {
                    continue;
                }
                sources.push(PullSource {
                    location: Location::new(origin.date, line),
                    item: row.product_name.clone(),
                    qty: row.produced_qty,
                    pallet_unit: row.pallet_unit,
                    days: 0,
                });
            }
        }

        for i in 1..=self.increase_future_days {
            let date = origin.date + Duration::days(i);
            for row in snapshot.rows_at(date, origin.line) {
                if row.produced_qty <= 0 || row.pallet_unit <= 0 {
                    continue;
                }
                sources.push(PullSource {
                    location: Location::new(date, origin.line),
                    item: row.product_name.clone(),
                    qty: row.produced_qty,
                    pallet_unit: row.pallet_unit,
                    days: i,
                });
            }
        }

        sources
    }

    // ==========================================
    // 公共
    // ==========================================

    #[allow(clippy::too_many_arguments)]
    fn push_move(
        &self,
        outcome: &mut FallbackOutcome,
        item: &str,
        qty: i64,
        pallet_unit: i64,
        from: Location,
        to: Location,
        origin: MoveOrigin,
        reason: String,
    ) {
        outcome.violations.push(Violation::info(
            ViolationKind::FallbackMove,
            Some(item),
            t_with_args(
                "fallback.move",
                &[
                    ("item", item),
                    ("qty", &qty.to_string()),
                    ("from", &from.key()),
                    ("to", &to.key()),
                ],
            ),
        ));
        outcome.moves.push(Move {
            item: item.to_string(),
            qty,
            pallets: qty / pallet_unit,
            from,
            to,
            direction: Move::infer_direction(&from, &to),
            origin,
            reason,
            adjusted: false,
            original_qty: None,
        });
    }

    fn finish(&self, outcome: FallbackOutcome, total: i64, operation_qty: i64, candidate_count: usize) -> FallbackOutcome {
        if outcome.reached {
            let mut outcome = outcome;
            outcome.violations.push(Violation::info(
                ViolationKind::TargetReached,
                None,
                t_with_args(
                    "fallback.target_reached",
                    &[("total", &total.to_string()), ("target", &operation_qty.to_string())],
                ),
            ));
            return outcome;
        }

        if outcome.moves.is_empty() {
            outcome.exhausted(t_with_args(
                "fallback.failed_constrained",
                &[("count", &candidate_count.to_string())],
            ))
        } else {
            outcome.exhausted(t_with_args(
                "fallback.candidates_exhausted",
                &[("total", &total.to_string()), ("target", &operation_qty.to_string())],
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::PlanEntry;
    use crate::domain::types::{AssemblyLine, MoveDirection};
    use crate::engine::capacity_analyzer::CapacityAnalyzer;
    use crate::engine::constraint::MarkerClassifier;
    use std::sync::Arc;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn row(name: &str, day: u32, line: AssemblyLine, produced: i64) -> PlanEntry {
        PlanEntry {
            product_name: name.to_string(),
            plan_date: d(day),
            line,
            produced_qty: produced,
            due_qty: 0,
            pallet_unit: 100,
            is_workday: Some(day != 11),
        }
    }

    fn constraint(name: &str, family: FamilyTag, max_movable: i64, buffer_days: i64) -> ItemConstraint {
        let (allowed, forbidden) = match family {
            FamilyTag::Universal => (vec![AssemblyLine::Assy2, AssemblyLine::Assy3], None),
            FamilyTag::Restricted => (vec![AssemblyLine::Assy2], Some(AssemblyLine::Assy3)),
            FamilyTag::Dedicated => (vec![], None),
        };
        ItemConstraint {
            product_name: name.to_string(),
            qty: max_movable,
            pallet_unit: 100,
            max_movable,
            buffer_days,
            family,
            origin_line: AssemblyLine::Assy1,
            allowed_lines: allowed,
            forbidden_line: forbidden,
            description: String::new(),
            priority_hint: String::new(),
        }
    }

    fn planner(today: NaiveDate) -> (EngineConfig, FallbackPlanner) {
        let config = EngineConfig::with_today(today);
        let classifier = ConstraintClassifier::new(Arc::new(MarkerClassifier::default()));
        let planner = FallbackPlanner::new(&config, classifier);
        (config, planner)
    }

    /// 目标 1/10 ASSY1 剩 500,ASSY2 剩 300,ASSY3 剩 0,1/11 休息,前后同线各有余量
    fn snapshot() -> PlanSnapshot {
        let mut rows = vec![
            row("T6-200", 10, AssemblyLine::Assy1, 1000),
            row("A2XX-7", 10, AssemblyLine::Assy1, 1000),
            row("J9-11", 10, AssemblyLine::Assy1, 800),
            row("X", 10, AssemblyLine::Assy2, 3400),
            row("T6-500", 10, AssemblyLine::Assy3, 3600),
        ];
        for day in 5..=9 {
            rows.push(row("Z", day, AssemblyLine::Assy1, 3000));
        }
        for day in 11..=25 {
            rows.push(row("Z", day, AssemblyLine::Assy1, 2800));
        }
        PlanSnapshot::new(rows)
    }

    fn origin() -> Location {
        Location::new(d(10), AssemblyLine::Assy1)
    }

    // ==========================================
    // 减产
    // ==========================================

    #[test]
    fn test_not_triggered_when_validated_enough() {
        let (config, planner) = planner(d(5));
        let snapshot = snapshot();
        let mut ledger = CapacityAnalyzer::new(&config).analyze(&snapshot, d(10), AssemblyLine::Assy1);
        let ctx = FallbackContext {
            snapshot: &snapshot,
            origin: origin(),
            mode: OperationMode::Reduce,
            operation_qty: 0,
            constraints: &[],
        };
        let outcome = planner.plan(&ctx, &[], &mut ledger).unwrap();
        assert!(!outcome.triggered);
        assert!(outcome.moves.is_empty());
    }

    #[test]
    fn test_reduction_priority_and_compatibility() {
        let (config, planner) = planner(d(5));
        let snapshot = snapshot();
        let mut ledger = CapacityAnalyzer::new(&config).analyze(&snapshot, d(10), AssemblyLine::Assy1);
        let constraints = vec![
            constraint("J9-11", FamilyTag::Dedicated, 800, 5),
            constraint("A2XX-7", FamilyTag::Restricted, 1000, 20),
        ];
        let ctx = FallbackContext {
            snapshot: &snapshot,
            origin: origin(),
            mode: OperationMode::Reduce,
            operation_qty: 1300,
            constraints: &constraints,
        };
        let outcome = planner.plan(&ctx, &[], &mut ledger).unwrap();
        assert!(outcome.triggered);

        // 专用族不换线: 先提前,由远及近（距今 5 天 -> 可提前 3 天,冻结到 1/8,故 1/8 -> 1/9）
        let j9: Vec<_> = outcome.moves.iter().filter(|m| m.item == "J9-11").collect();
        assert!(j9.iter().all(|m| m.to.line == AssemblyLine::Assy1));
        assert_eq!(j9[0].to.date, d(8));
        assert_eq!(j9[0].direction, MoveDirection::Advance);
        assert_eq!(j9[1].to.date, d(9));
        assert_eq!(j9[1].direction, MoveDirection::Advance);

        // 受限族可去 ASSY2,不可去 ASSY3
        let a2xx: Vec<_> = outcome.moves.iter().filter(|m| m.item == "A2XX-7").collect();
        assert_eq!(a2xx[0].to, Location::new(d(10), AssemblyLine::Assy2));
        assert!(a2xx.iter().all(|m| m.to.line != AssemblyLine::Assy3));

        for mv in &outcome.moves {
            assert_eq!(mv.qty % 100, 0);
            assert!(mv.qty > 0);
        }
        assert!(ledger.slots().all(|s| s.remaining >= 0 || s.consumed() == 0));
    }

    #[test]
    fn test_reduction_respects_buffer_days_and_max_movable() {
        let (config, planner) = planner(d(5));
        let snapshot = snapshot();
        let mut ledger = CapacityAnalyzer::new(&config).analyze(&snapshot, d(10), AssemblyLine::Assy1);
        let constraints = vec![constraint("J9-11", FamilyTag::Dedicated, 800, 2)];
        let ctx = FallbackContext {
            snapshot: &snapshot,
            origin: origin(),
            mode: OperationMode::Reduce,
            operation_qty: 5000,
            constraints: &constraints,
        };
        let outcome = planner.plan(&ctx, &[], &mut ledger).unwrap();
        assert_eq!(total_qty(&outcome.moves), 800);
        assert!(outcome
            .moves
            .iter()
            .filter(|m| m.direction == MoveDirection::Postpone)
            .all(|m| (m.to.date - d(10)).num_days() <= 2));
        assert!(!outcome.reached);
        assert!(outcome.exhaustion.is_some());
    }

    #[test]
    fn test_reduction_all_items_exhausted() {
        let (config, planner) = planner(d(5));
        let snapshot = snapshot();
        let mut ledger = CapacityAnalyzer::new(&config).analyze(&snapshot, d(10), AssemblyLine::Assy1);
        let constraints = vec![constraint("T6-200", FamilyTag::Universal, 200, 20)];
        let validated = vec![Move {
            item: "T6-200".to_string(),
            qty: 200,
            pallets: 2,
            from: origin(),
            to: Location::new(d(10), AssemblyLine::Assy2),
            direction: MoveDirection::Transfer,
            origin: MoveOrigin::Proposer,
            reason: "test".to_string(),
            adjusted: false,
            original_qty: None,
        }];
        let ctx = FallbackContext {
            snapshot: &snapshot,
            origin: origin(),
            mode: OperationMode::Reduce,
            operation_qty: 1000,
            constraints: &constraints,
        };
        let outcome = planner.plan(&ctx, &validated, &mut ledger).unwrap();
        assert!(outcome.moves.is_empty());
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].kind, ViolationKind::FallbackExhausted);
    }

    // ==========================================
    // 增产
    // ==========================================

    #[test]
    fn test_increase_pulls_universal_transfer_then_future() {
        let (config, planner) = planner(d(5));
        let snapshot = snapshot();
        let mut ledger = CapacityAnalyzer::new(&config).analyze(&snapshot, d(10), AssemblyLine::Assy1);
        let ctx = FallbackContext {
            snapshot: &snapshot,
            origin: origin(),
            mode: OperationMode::Increase,
            operation_qty: 500,
            constraints: &[],
        };
        let outcome = planner.plan(&ctx, &[], &mut ledger).unwrap();
        assert!(outcome.reached);
        assert_eq!(outcome.moves.len(), 1);
        let mv = &outcome.moves[0];
        assert_eq!(mv.item, "T6-500");
        assert_eq!(mv.qty, 500);
        assert_eq!(mv.from, Location::new(d(10), AssemblyLine::Assy3));
        assert_eq!(mv.to, origin());
        assert_eq!(ledger.get("2026-01-10_ASSY1").unwrap().consumed(), 500);
    }

    #[test]
    fn test_increase_skips_quantity_already_pulled() {
        let (config, planner) = planner(d(5));
        let snapshot = snapshot();
        let mut ledger = CapacityAnalyzer::new(&config).analyze(&snapshot, d(10), AssemblyLine::Assy1);
        ledger.insert(CapacityAnalyzer::new(&config).slot_for(&snapshot, d(10), AssemblyLine::Assy1));
        // 提议已从 ASSY3 拉走 T6-500 的 3500,来源只剩 100
        let validated = vec![Move {
            item: "T6-500".to_string(),
            qty: 3500,
            pallets: 35,
            from: Location::new(d(10), AssemblyLine::Assy3),
            to: origin(),
            direction: MoveDirection::Transfer,
            origin: MoveOrigin::Proposer,
            reason: "test".to_string(),
            adjusted: false,
            original_qty: None,
        }];
        let ctx = FallbackContext {
            snapshot: &snapshot,
            origin: origin(),
            mode: OperationMode::Increase,
            operation_qty: 4000,
            constraints: &[],
        };
        let outcome = planner.plan(&ctx, &validated, &mut ledger).unwrap();
        let from_assy3: i64 = outcome
            .moves
            .iter()
            .filter(|m| m.item == "T6-500" && m.from.line == AssemblyLine::Assy3)
            .map(|m| m.qty)
            .sum();
        assert!(from_assy3 <= 100);
    }

    #[test]
    fn test_pull_sources_order() {
        let (_, planner) = planner(d(5));
        let sources = planner.pull_sources(&snapshot(), origin());
        // 他线只有通用族 T6-500,之后是同线未来日由近及远
        assert_eq!(sources[0].item, "T6-500");
        assert_eq!(sources[0].days, 0);
        assert!(sources[1..].iter().all(|s| s.location.line == AssemblyLine::Assy1));
        assert!(sources[1..].windows(2).all(|w| w[0].days <= w[1].days));
    }

    #[test]
    fn test_increase_bounded_by_target_capacity() {
        let (config, planner) = planner(d(5));
        let snapshot = snapshot();
        let mut ledger = CapacityAnalyzer::new(&config).analyze(&snapshot, d(10), AssemblyLine::Assy1);
        // 目标槽只剩 500
        let ctx = FallbackContext {
            snapshot: &snapshot,
            origin: origin(),
            mode: OperationMode::Increase,
            operation_qty: 4000,
            constraints: &[],
        };
        let outcome = planner.plan(&ctx, &[], &mut ledger).unwrap();
        assert_eq!(total_qty(&outcome.moves), 500);
        assert!(!outcome.reached);
        assert!(outcome.exhaustion.is_some());
        assert_eq!(ledger.get("2026-01-10_ASSY1").unwrap().remaining, 0);
    }
}
