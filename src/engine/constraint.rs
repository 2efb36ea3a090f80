// ==========================================
// 装配线产能再平衡系统 - 线体约束分类
// ==========================================
// 职责: 给可移动品目打产品族标签,并给出可换线目的地
// 输入: ItemSlack 列表（仅 movable 参与）+ 原线体
// 输出: ItemConstraint 列表
// ==========================================
// 产品族:
// - 通用族: 三条线均可
// - 受限族: 一条线禁止,其余可
// - 专用族: 只能改日期,不能换线
// ==========================================

use crate::config::FamilyMarkers;
use crate::domain::analysis::{ItemConstraint, ItemSlack};
use crate::domain::types::{AssemblyLine, FamilyTag};
use crate::i18n::{t, t_with_args};
use std::sync::Arc;
use tracing::debug;

// ==========================================
// Trait: FamilyClassifier
// ==========================================
// 用途: 产品名 -> 产品族 的可替换规则
pub trait FamilyClassifier: Send + Sync {
    fn classify(&self, product_name: &str) -> FamilyTag;

    /// 受限族禁止的线体
    fn restricted_forbidden_line(&self) -> AssemblyLine;
}

// ==========================================
// MarkerClassifier - 名称标记分类（默认实现）
// ==========================================
#[derive(Debug, Clone)]
pub struct MarkerClassifier {
    universal: String,
    restricted: String,
    forbidden_line: AssemblyLine,
}

impl MarkerClassifier {
    pub fn new(markers: &FamilyMarkers) -> Self {
        Self {
            universal: markers.universal.trim().to_uppercase(),
            restricted: markers.restricted.trim().to_uppercase(),
            forbidden_line: markers.restricted_forbidden_line,
        }
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new(&FamilyMarkers::default())
    }
}

impl FamilyClassifier for MarkerClassifier {
    fn classify(&self, product_name: &str) -> FamilyTag {
        let name = product_name.to_uppercase();
        if !self.universal.is_empty() && name.contains(&self.universal) {
            FamilyTag::Universal
        } else if !self.restricted.is_empty() && name.contains(&self.restricted) {
            FamilyTag::Restricted
        } else {
            FamilyTag::Dedicated
        }
    }

    fn restricted_forbidden_line(&self) -> AssemblyLine {
        self.forbidden_line
    }
}

// ==========================================
// ConstraintClassifier
// ==========================================
#[derive(Clone)]
pub struct ConstraintClassifier {
    classifier: Arc<dyn FamilyClassifier>,
}

impl ConstraintClassifier {
    pub fn new(classifier: Arc<dyn FamilyClassifier>) -> Self {
        Self { classifier }
    }

    pub fn family_of(&self, product_name: &str) -> FamilyTag {
        self.classifier.classify(product_name)
    }

    pub fn classify(&self, slack_table: &[ItemSlack], origin_line: AssemblyLine) -> Vec<ItemConstraint> {
        let forbidden = self.classifier.restricted_forbidden_line();

        let constraints: Vec<ItemConstraint> = slack_table
            .iter()
            .filter(|s| s.movable)
            .map(|s| {
                let family = self.classifier.classify(&s.product_name);
                let (allowed_lines, forbidden_line, description, priority_hint) = match family {
                    FamilyTag::Universal => (
                        origin_line.others().collect::<Vec<_>>(),
                        None,
                        t("constraint.universal"),
                        t("constraint.hint_universal"),
                    ),
                    FamilyTag::Restricted => {
                        let allowed: Vec<_> = origin_line.others().filter(|l| *l != forbidden).collect();
                        let allowed_text = allowed
                            .iter()
                            .map(|l| l.code())
                            .collect::<Vec<_>>()
                            .join("/");
                        (
                            allowed,
                            Some(forbidden),
                            t_with_args("constraint.restricted", &[("forbidden", forbidden.code())]),
                            t_with_args("constraint.hint_restricted", &[("lines", allowed_text.as_str())]),
                        )
                    }
                    FamilyTag::Dedicated => (
                        Vec::new(),
                        None,
                        t_with_args("constraint.dedicated", &[("line", origin_line.code())]),
                        t("constraint.hint_dedicated"),
                    ),
                };

                ItemConstraint {
                    product_name: s.product_name.clone(),
                    qty: s.qty,
                    pallet_unit: s.pallet_unit,
                    max_movable: s.max_movable,
                    buffer_days: s.buffer_days,
                    family,
                    origin_line,
                    allowed_lines,
                    forbidden_line,
                    description,
                    priority_hint,
                }
            })
            .collect();

        debug!(
            movable = constraints.len(),
            skipped = slack_table.len() - constraints.len(),
            "约束分类完成"
        );
        constraints
    }
}
