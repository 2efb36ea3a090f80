// ==========================================
// 装配线产能再平衡系统 - 提议校验器
// ==========================================
// 职责: 逐条校验外部提议的移动,产能不足时自动缩量
// 输入: 提议移动（不可信）+ 约束表 + 产能账本(&mut) + 工作日历
// 输出: 通过的移动 + 处置日志
// ==========================================
// 校验顺序（首个失败即拒绝,继续下一条）:
// 1) 品目在可移动清单内
// 2) 数量 <= 剩余可移量
// 3) 数量 > 0 且为托盘整数倍
// 4) 目的地格式 YYYY-MM-DD_<线体>
// 5) 产品族/线体兼容
// 6) 目的地有产能数据
// 7) 目的地为工作日
// 8) 产能: 足够则扣减; 不足但 >= 1 托盘则缩量; 否则拒绝
// ==========================================
// 增产（validate_increase）: 移动方向相反,目的地必须是目标日/线
// 1) 品目在可拉入来源中  2) 数量 > 0  3) 目的地 == 目标日/线
// 4) 来源（from,缺省取该品目首个来源）  5) 托盘整数倍  6) 来源余量
// 7) 目标槽产能: 足够则扣减; 不足但 >= 1 托盘则缩量; 否则拒绝
// ==========================================
// 红线: 每条提议有且只有一条终态处置
// 红线: 被拒绝的移动不得消耗账本
// ==========================================

use crate::domain::analysis::ItemConstraint;
use crate::domain::capacity::CapacityLedger;
use crate::domain::move_plan::{Move, ProposedMove, Violation};
use crate::domain::plan::{Location, WorkdayCalendar};
use crate::domain::types::{FamilyTag, MoveOrigin, ViolationKind};
use crate::engine::error::EngineResult;
use crate::engine::fallback::PullSource;
use crate::i18n::{t, t_with_args};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// 校验结果
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub moves: Vec<Move>,
    pub violations: Vec<Violation>,
}

#[derive(Debug, Default)]
pub struct PlanValidator;

impl PlanValidator {
    pub fn new() -> Self {
        Self
    }

    /// 校验全部提议
    ///
    /// # 参数
    /// - proposed: 外部提议（顺序即处理顺序）
    /// - constraints: 可移动品目约束表
    /// - ledger: 产能账本（通过/缩量时原地扣减）
    /// - calendar: 工作日历
    /// - origin: 目标日/线（所有移动的出发地）
    #[instrument(skip_all, fields(origin = %origin, proposed = proposed.len()))]
    pub fn validate(
        &self,
        proposed: &[ProposedMove],
        constraints: &[ItemConstraint],
        ledger: &mut CapacityLedger,
        calendar: &WorkdayCalendar,
        origin: Location,
    ) -> EngineResult<ValidationOutcome> {
        let mut outcome = ValidationOutcome::default();
        // 同一品目被多条提议拆分时,累计不得超过 max_movable
        let mut moved_by_item: HashMap<&str, i64> = HashMap::new();

        for (offset, proposal) in proposed.iter().enumerate() {
            let index = offset + 1;
            let idx = index.to_string();

            // ===== 1) 品目 =====
            let item_name = proposal.item.as_deref().unwrap_or("?");
            let Some(constraint) = constraints
                .iter()
                .find(|c| Some(c.product_name.as_str()) == proposal.item.as_deref())
            else {
                outcome.violations.push(Violation::rejected(
                    index,
                    proposal.item.as_deref(),
                    ViolationKind::UnknownItem,
                    t_with_args("validator.unknown_item", &[("index", &idx), ("item", item_name)]),
                ));
                continue;
            };
            let item = constraint.product_name.as_str();
            let qty = proposal.qty;
            let pallet = constraint.pallet_unit;

            // ===== 2) 松弛 =====
            let already = moved_by_item.get(item).copied().unwrap_or(0);
            let movable_left = constraint.max_movable - already;
            if qty > movable_left {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::ExceedsSlack,
                    t_with_args(
                        "validator.exceeds_slack",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("requested", &qty.to_string()),
                            ("max", &movable_left.to_string()),
                        ],
                    ),
                ));
                continue;
            }

            // ===== 3) 数量/托盘 =====
            if qty <= 0 {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::NonPositiveQty,
                    t_with_args(
                        "validator.non_positive_qty",
                        &[("index", &idx), ("item", item), ("requested", &qty.to_string())],
                    ),
                ));
                continue;
            }
            if pallet <= 0 || qty % pallet != 0 {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::PalletMismatch,
                    t_with_args(
                        "validator.pallet_mismatch",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("requested", &qty.to_string()),
                            ("pallet", &pallet.to_string()),
                        ],
                    ),
                ));
                continue;
            }

            // ===== 4) 目的地 =====
            let to = match proposal.to.parse::<Location>() {
                Ok(loc) => loc,
                Err(e) => {
                    outcome.violations.push(Violation::rejected(
                        index,
                        Some(item),
                        ViolationKind::MalformedDestination,
                        t_with_args(
                            "validator.malformed_destination",
                            &[("index", &idx), ("item", item), ("input", &proposal.to), ("error", &e)],
                        ),
                    ));
                    continue;
                }
            };

            // ===== 5) 线体兼容 =====
            if constraint.family == FamilyTag::Restricted && constraint.forbidden_line == Some(to.line) {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::ForbiddenLine,
                    t_with_args(
                        "validator.forbidden_line",
                        &[("index", &idx), ("item", item), ("line", to.line.code())],
                    ),
                ));
                continue;
            }
            if constraint.family == FamilyTag::Dedicated && to.line != origin.line {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::CrossLineDedicated,
                    t_with_args(
                        "validator.cross_line_dedicated",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("origin", origin.line.code()),
                            ("requested", to.line.code()),
                        ],
                    ),
                ));
                continue;
            }

            // ===== 6) 产能数据 =====
            let key = to.key();
            let Some(slot) = ledger.get(&key) else {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::NoCapacityData,
                    t_with_args(
                        "validator.no_capacity_data",
                        &[("index", &idx), ("item", item), ("key", &key)],
                    ),
                ));
                continue;
            };
            let remaining = slot.remaining;

            // ===== 7) 工作日（先于扣减）=====
            if !calendar.is_workday(to.date) {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::NonWorkday,
                    t_with_args(
                        "validator.non_workday",
                        &[("index", &idx), ("item", item), ("date", &to.date.to_string())],
                    ),
                ));
                continue;
            }

            // ===== 8) 产能 =====
            let (final_qty, adjusted) = if qty <= remaining {
                (qty, false)
            } else if remaining >= pallet {
                ((remaining / pallet) * pallet, true)
            } else {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::CapacityExhausted,
                    t_with_args(
                        "validator.capacity_exhausted",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("requested", &qty.to_string()),
                            ("remaining", &remaining.to_string()),
                        ],
                    ),
                ));
                continue;
            };

            ledger.consume(&key, final_qty)?;
            *moved_by_item.entry(item).or_insert(0) += final_qty;

            if adjusted {
                debug!(item, requested = qty, adjusted = final_qty, dest = %to, "产能不足,自动缩量");
                outcome.violations.push(Violation::adjusted(
                    index,
                    item,
                    t_with_args(
                        "validator.capacity_adjusted",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("from", &qty.to_string()),
                            ("to", &final_qty.to_string()),
                        ],
                    ),
                ));
            } else {
                outcome.violations.push(Violation::accepted(
                    index,
                    item,
                    t_with_args(
                        "validator.accepted",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("qty", &final_qty.to_string()),
                            ("to", &key),
                        ],
                    ),
                ));
            }

            let reason = if proposal.reason.trim().is_empty() {
                t("validator.default_reason")
            } else {
                proposal.reason.clone()
            };

            outcome.moves.push(Move {
                item: item.to_string(),
                qty: final_qty,
                pallets: final_qty / pallet,
                from: origin,
                to,
                direction: Move::infer_direction(&origin, &to),
                origin: MoveOrigin::Proposer,
                reason,
                adjusted,
                original_qty: adjusted.then_some(qty),
            });
        }

        info!(
            accepted = outcome.moves.len(),
            rejected = outcome.violations.iter().filter(|v| v.is_rejection()).count(),
            adjusted = outcome.violations.iter().filter(|v| v.is_adjustment()).count(),
            "提议校验完成"
        );
        Ok(outcome)
    }

    /// 校验增产提议（从来源拉入目标日/线）
    ///
    /// sources 为可拉入来源（同日他线通用族 + 同线未来日）,ledger 中须已有目标槽
    #[instrument(skip_all, fields(origin = %origin, proposed = proposed.len()))]
    pub fn validate_increase(
        &self,
        proposed: &[ProposedMove],
        sources: &[PullSource],
        ledger: &mut CapacityLedger,
        origin: Location,
    ) -> EngineResult<ValidationOutcome> {
        let mut outcome = ValidationOutcome::default();
        let target_key = origin.key();
        let mut pulled: HashMap<(&str, Location), i64> = HashMap::new();

        for (offset, proposal) in proposed.iter().enumerate() {
            let index = offset + 1;
            let idx = index.to_string();
            let item_name = proposal.item.as_deref().unwrap_or("?");
            let qty = proposal.qty;

            // ===== 1) 品目 =====
            let Some(item) = sources
                .iter()
                .map(|s| s.item.as_str())
                .find(|name| Some(*name) == proposal.item.as_deref())
            else {
                outcome.violations.push(Violation::rejected(
                    index,
                    proposal.item.as_deref(),
                    ViolationKind::UnknownItem,
                    t_with_args("validator.unknown_item", &[("index", &idx), ("item", item_name)]),
                ));
                continue;
            };

            // ===== 2) 数量 =====
            if qty <= 0 {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::NonPositiveQty,
                    t_with_args(
                        "validator.non_positive_qty",
                        &[("index", &idx), ("item", item), ("requested", &qty.to_string())],
                    ),
                ));
                continue;
            }

            // ===== 3) 方向 =====
            let to = match proposal.to.parse::<Location>() {
                Ok(loc) => loc,
                Err(e) => {
                    outcome.violations.push(Violation::rejected(
                        index,
                        Some(item),
                        ViolationKind::MalformedDestination,
                        t_with_args(
                            "validator.malformed_destination",
                            &[("index", &idx), ("item", item), ("input", &proposal.to), ("error", &e)],
                        ),
                    ));
                    continue;
                }
            };
            if to != origin {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::WrongDirection,
                    t_with_args(
                        "validator.wrong_direction",
                        &[("index", &idx), ("item", item), ("to", &to.key()), ("origin", &target_key)],
                    ),
                ));
                continue;
            }

            // ===== 4) 来源 =====
            let requested_from = proposal
                .from
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty());
            let source = match requested_from {
                Some(raw) => raw
                    .parse::<Location>()
                    .ok()
                    .and_then(|loc| sources.iter().find(|s| s.item == item && s.location == loc)),
                None => sources.iter().find(|s| {
                    s.item == item
                        && s.qty - pulled.get(&(item, s.location)).copied().unwrap_or(0) >= s.pallet_unit
                }),
            };
            let Some(source) = source else {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::UnknownSource,
                    t_with_args(
                        "validator.unknown_source",
                        &[("index", &idx), ("item", item), ("from", requested_from.unwrap_or("?"))],
                    ),
                ));
                continue;
            };
            let pallet = source.pallet_unit;

            // ===== 5) 托盘 =====
            if pallet <= 0 || qty % pallet != 0 {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::PalletMismatch,
                    t_with_args(
                        "validator.pallet_mismatch",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("requested", &qty.to_string()),
                            ("pallet", &pallet.to_string()),
                        ],
                    ),
                ));
                continue;
            }

            // ===== 6) 来源余量 =====
            let source_left = source.qty - pulled.get(&(item, source.location)).copied().unwrap_or(0);
            if qty > source_left {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::ExceedsSlack,
                    t_with_args(
                        "validator.exceeds_slack",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("requested", &qty.to_string()),
                            ("max", &source_left.to_string()),
                        ],
                    ),
                ));
                continue;
            }

            // ===== 7) 目标槽产能 =====
            let Some(slot) = ledger.get(&target_key) else {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::NoCapacityData,
                    t_with_args(
                        "validator.no_capacity_data",
                        &[("index", &idx), ("item", item), ("key", &target_key)],
                    ),
                ));
                continue;
            };
            let remaining = slot.remaining;
            let (final_qty, adjusted) = if qty <= remaining {
                (qty, false)
            } else if remaining >= pallet {
                ((remaining / pallet) * pallet, true)
            } else {
                outcome.violations.push(Violation::rejected(
                    index,
                    Some(item),
                    ViolationKind::CapacityExhausted,
                    t_with_args(
                        "validator.capacity_exhausted",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("requested", &qty.to_string()),
                            ("remaining", &remaining.to_string()),
                        ],
                    ),
                ));
                continue;
            };

            ledger.consume(&target_key, final_qty)?;
            *pulled.entry((item, source.location)).or_insert(0) += final_qty;
            let from = source.location;

            if adjusted {
                debug!(item, requested = qty, adjusted = final_qty, from = %from, "目标槽产能不足,自动缩量");
                outcome.violations.push(Violation::adjusted(
                    index,
                    item,
                    t_with_args(
                        "validator.capacity_adjusted",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("from", &qty.to_string()),
                            ("to", &final_qty.to_string()),
                        ],
                    ),
                ));
            } else {
                outcome.violations.push(Violation::accepted(
                    index,
                    item,
                    t_with_args(
                        "validator.pull_accepted",
                        &[
                            ("index", &idx),
                            ("item", item),
                            ("qty", &final_qty.to_string()),
                            ("from", &from.key()),
                        ],
                    ),
                ));
            }

            let reason = if proposal.reason.trim().is_empty() {
                t("validator.default_reason")
            } else {
                proposal.reason.clone()
            };

            outcome.moves.push(Move {
                item: item.to_string(),
                qty: final_qty,
                pallets: final_qty / pallet,
                from,
                to: origin,
                direction: Move::infer_direction(&from, &origin),
                origin: MoveOrigin::Proposer,
                reason,
                adjusted,
                original_qty: adjusted.then_some(qty),
            });
        }

        info!(
            accepted = outcome.moves.len(),
            rejected = outcome.violations.iter().filter(|v| v.is_rejection()).count(),
            "增产提议校验完成"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::capacity::CapacitySlot;
    use crate::domain::plan::{PlanEntry, PlanSnapshot};
    use crate::domain::types::{AssemblyLine, Disposition, MoveDirection};
    use chrono::NaiveDate;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, day).unwrap()
    }

    fn origin() -> Location {
        Location::new(d(8), AssemblyLine::Assy1)
    }

    fn constraint(name: &str, family: FamilyTag, max_movable: i64) -> ItemConstraint {
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
            buffer_days: 10,
            family,
            origin_line: AssemblyLine::Assy1,
            allowed_lines: allowed,
            forbidden_line: forbidden,
            description: String::new(),
            priority_hint: String::new(),
        }
    }

    fn proposal(item: &str, qty: i64, to: &str) -> ProposedMove {
        ProposedMove {
            item: Some(item.to_string()),
            qty,
            from: None,
            to: to.to_string(),
            reason: "测试".to_string(),
        }
    }

    fn calendar() -> WorkdayCalendar {
        let rows = [(8, true), (9, true), (10, false)]
            .into_iter()
            .map(|(day, work)| PlanEntry {
                product_name: "P".to_string(),
                plan_date: d(day),
                line: AssemblyLine::Assy1,
                produced_qty: 0,
                due_qty: 0,
                pallet_unit: 100,
                is_workday: Some(work),
            })
            .collect();
        PlanSnapshot::new(rows).calendar().clone()
    }

    fn ledger() -> CapacityLedger {
        let mut ledger = CapacityLedger::new();
        ledger.insert(CapacitySlot::new(d(8), AssemblyLine::Assy2, 3450, 3700)); // 250
        ledger.insert(CapacitySlot::new(d(8), AssemblyLine::Assy3, 3000, 3600)); // 600
        ledger.insert(CapacitySlot::new(d(9), AssemblyLine::Assy1, 2000, 3300)); // 1300
        ledger.insert(CapacitySlot::new(d(10), AssemblyLine::Assy1, 0, 3300));
        ledger
    }

    fn run(proposed: &[ProposedMove], constraints: &[ItemConstraint], ledger: &mut CapacityLedger) -> ValidationOutcome {
        PlanValidator::new()
            .validate(proposed, constraints, ledger, &calendar(), origin())
            .unwrap()
    }

    // ==========================================
    // 逐项规则
    // ==========================================

    #[test]
    fn test_accept_decrements_ledger() {
        let mut ledger = ledger();
        let out = run(
            &[proposal("T6-200", 200, "2026-01-08_ASSY3")],
            &[constraint("T6-200", FamilyTag::Universal, 500)],
            &mut ledger,
        );
        assert_eq!(out.moves.len(), 1);
        assert_eq!(out.moves[0].direction, MoveDirection::Transfer);
        assert_eq!(out.moves[0].pallets, 2);
        assert_eq!(ledger.get("2026-01-08_ASSY3").unwrap().remaining, 400);
        assert_eq!(out.violations[0].disposition, Disposition::Accepted);
    }

    #[test]
    fn test_auto_shrink_to_pallet_multiple() {
        let mut ledger = ledger();
        let out = run(
            &[proposal("T6-200", 400, "2026-01-08_ASSY2")],
            &[constraint("T6-200", FamilyTag::Universal, 500)],
            &mut ledger,
        );
        let mv = &out.moves[0];
        assert_eq!(mv.qty, 200);
        assert!(mv.adjusted);
        assert_eq!(mv.original_qty, Some(400));
        assert_eq!(ledger.get("2026-01-08_ASSY2").unwrap().remaining, 50);
        assert_eq!(out.violations[0].kind, ViolationKind::CapacityAdjusted);
    }

    #[test]
    fn test_rejections_in_order() {
        let mut ledger = ledger();
        let constraints = [
            constraint("T6-200", FamilyTag::Universal, 300),
            constraint("A2XX-7", FamilyTag::Restricted, 500),
            constraint("J9-11", FamilyTag::Dedicated, 500),
        ];
        let out = run(
            &[
                proposal("UNKNOWN", 100, "2026-01-08_ASSY2"),
                proposal("T6-200", 400, "2026-01-08_ASSY2"),
                proposal("T6-200", 150, "2026-01-08_ASSY2"),
                proposal("T6-200", 0, "2026-01-08_ASSY2"),
                proposal("T6-200", 100, "2026-01-08-ASSY2"),
                proposal("A2XX-7", 100, "2026-01-08_ASSY3"),
                proposal("J9-11", 100, "2026-01-08_ASSY2"),
                proposal("J9-11", 100, "2026-01-11_ASSY1"),
                proposal("J9-11", 100, "2026-01-10_ASSY1"),
            ],
            &constraints,
            &mut ledger,
        );
        let kinds: Vec<_> = out.violations.iter().map(|v| v.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ViolationKind::UnknownItem,
                ViolationKind::ExceedsSlack,
                ViolationKind::PalletMismatch,
                ViolationKind::NonPositiveQty,
                ViolationKind::MalformedDestination,
                ViolationKind::ForbiddenLine,
                ViolationKind::CrossLineDedicated,
                ViolationKind::NoCapacityData,
                ViolationKind::NonWorkday,
            ]
        );
        assert!(out.moves.is_empty());
        assert_eq!(ledger.total_consumed(), 0);
    }

    #[test]
    fn test_capacity_exhausted_rejects() {
        let mut ledger = ledger();
        ledger.consume("2026-01-08_ASSY2", 200).unwrap(); // 剩 50
        let out = run(
            &[proposal("T6-200", 100, "2026-01-08_ASSY2")],
            &[constraint("T6-200", FamilyTag::Universal, 500)],
            &mut ledger,
        );
        assert!(out.moves.is_empty());
        assert_eq!(out.violations[0].kind, ViolationKind::CapacityExhausted);
    }

    #[test]
    fn test_split_proposals_respect_max_movable() {
        let mut ledger = ledger();
        let out = run(
            &[
                proposal("T6-200", 200, "2026-01-08_ASSY3"),
                proposal("T6-200", 200, "2026-01-09_ASSY1"),
            ],
            &[constraint("T6-200", FamilyTag::Universal, 300)],
            &mut ledger,
        );
        assert_eq!(out.moves.len(), 1);
        assert_eq!(out.violations[1].kind, ViolationKind::ExceedsSlack);
    }

    #[test]
    fn test_one_terminal_disposition_per_proposal() {
        let mut ledger = ledger();
        let proposals = [
            proposal("T6-200", 200, "2026-01-08_ASSY3"),
            proposal("T6-200", 100, "2026-01-09_ASSY1"),
            proposal("X", 100, "2026-01-09_ASSY1"),
        ];
        let out = run(
            &proposals,
            &[constraint("T6-200", FamilyTag::Universal, 500)],
            &mut ledger,
        );
        for index in 1..=proposals.len() {
            let terminal = out
                .violations
                .iter()
                .filter(|v| v.move_index == Some(index) && v.disposition.is_terminal())
                .count();
            assert_eq!(terminal, 1);
        }
    }

    // ==========================================
    // 增产
    // ==========================================

    fn pull_source(item: &str, location: Location, qty: i64) -> PullSource {
        PullSource {
            days: (location.date - origin().date).num_days(),
            location,
            item: item.to_string(),
            qty,
            pallet_unit: 100,
        }
    }

    fn increase_ledger(remaining: i64) -> CapacityLedger {
        let mut ledger = CapacityLedger::new();
        ledger.insert(CapacitySlot::new(d(8), AssemblyLine::Assy1, 3300 - remaining, 3300));
        ledger
    }

    fn increase_sources() -> Vec<PullSource> {
        vec![
            pull_source("T6-200", Location::new(d(8), AssemblyLine::Assy2), 500),
            pull_source("Z", Location::new(d(9), AssemblyLine::Assy1), 300),
        ]
    }

    #[test]
    fn test_increase_rejects_move_out_of_target() {
        let mut ledger = increase_ledger(1000);
        let out = PlanValidator::new()
            .validate_increase(
                &[proposal("T6-200", 500, "2026-01-08_ASSY2")],
                &increase_sources(),
                &mut ledger,
                origin(),
            )
            .unwrap();
        assert!(out.moves.is_empty());
        assert_eq!(out.violations[0].kind, ViolationKind::WrongDirection);
        assert_eq!(ledger.get("2026-01-08_ASSY1").unwrap().remaining, 1000);
    }

    #[test]
    fn test_increase_pull_into_target() {
        let mut ledger = increase_ledger(1000);
        let mut pull = proposal("T6-200", 300, "2026-01-08_ASSY1");
        pull.from = Some("2026-01-08_ASSY2".to_string());
        let out = PlanValidator::new()
            .validate_increase(&[pull], &increase_sources(), &mut ledger, origin())
            .unwrap();
        let mv = &out.moves[0];
        assert_eq!(mv.from, Location::new(d(8), AssemblyLine::Assy2));
        assert_eq!(mv.to, origin());
        assert_eq!(mv.qty, 300);
        assert_eq!(mv.direction, MoveDirection::Transfer);
        assert_eq!(ledger.get("2026-01-08_ASSY1").unwrap().remaining, 700);
    }

    #[test]
    fn test_increase_source_checks() {
        let mut ledger = increase_ledger(250);
        let mut wrong_source = proposal("T6-200", 100, "2026-01-08_ASSY1");
        wrong_source.from = Some("2026-01-08_ASSY3".to_string());
        let out = PlanValidator::new()
            .validate_increase(
                &[
                    wrong_source,
                    proposal("Z", 400, "2026-01-08_ASSY1"),
                    proposal("Z", 300, "2026-01-08_ASSY1"),
                    proposal("Z", 100, "2026-01-08_ASSY1"),
                ],
                &increase_sources(),
                &mut ledger,
                origin(),
            )
            .unwrap();
        assert_eq!(out.violations[0].kind, ViolationKind::UnknownSource);
        assert_eq!(out.violations[1].kind, ViolationKind::ExceedsSlack);
        // 目标槽只剩 250: 300 缩量为 200
        assert_eq!(out.violations[2].kind, ViolationKind::CapacityAdjusted);
        assert_eq!(out.moves[0].qty, 200);
        assert_eq!(out.moves[0].from, Location::new(d(9), AssemblyLine::Assy1));
        assert_eq!(out.moves[0].direction, MoveDirection::Advance);
        assert_eq!(out.violations[3].kind, ViolationKind::CapacityExhausted);
        assert_eq!(ledger.get("2026-01-08_ASSY1").unwrap().remaining, 50);
    }
}
