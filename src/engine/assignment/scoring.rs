// ==========================================
// 派工匹配评分
// ==========================================
// 评分口径（满分 115）:
//   机器类型匹配       +40
//   技能等级达标       +30（不达标 +10）
//   效率 > 110%        +15（> 100% +10）
//   质量得分 > 95      +10（> 90 +5）
//   状态 AVAILABLE     +20
// 同分并列取 current_workload 低者,再按工号字典序保证确定性
// ==========================================

use crate::domain::bundle::BundleOperation;
use crate::domain::operator::OperatorSnapshot;
use crate::domain::types::OperatorStatus;

/// 计算工人对工序的匹配得分
pub fn compute_match_score(operation: &BundleOperation, operator: &OperatorSnapshot) -> i32 {
    let mut score = 0;

    // 机器类型
    if operator.can_operate(&operation.machine_type) {
        score += 40;
    }

    // 技能等级
    score += if operator.skill_level >= operation.required_skill {
        30
    } else {
        10
    };

    // 效率
    if operator.efficiency_pct > 110.0 {
        score += 15;
    } else if operator.efficiency_pct > 100.0 {
        score += 10;
    }

    // 质量得分
    if operator.quality_score > 95.0 {
        score += 10;
    } else if operator.quality_score > 90.0 {
        score += 5;
    }

    // 状态
    if operator.status == OperatorStatus::Available {
        score += 20;
    }

    score
}

/// 在 AVAILABLE 工人中选出最高分者
///
/// # 返回
/// - `Some((快照, 得分))`: 中选工人
/// - `None`: 快照池中无 AVAILABLE 工人
pub(super) fn select_best<'a>(
    operation: &BundleOperation,
    snapshots: &'a [OperatorSnapshot],
) -> Option<(&'a OperatorSnapshot, i32)> {
    snapshots
        .iter()
        .filter(|s| s.status == OperatorStatus::Available)
        .map(|s| (s, compute_match_score(operation, s)))
        .max_by(|(a, score_a), (b, score_b)| {
            score_a
                .cmp(score_b)
                // 同分取负荷低者
                .then_with(|| b.current_workload.cmp(&a.current_workload))
                // 再按工号字典序,保证结果确定
                .then_with(|| b.operator_id.cmp(&a.operator_id))
        })
}
