// ==========================================
// 状态转换合法性表
// ==========================================
// 红线: 穷举匹配,新增状态时编译器强制补全此表
// ==========================================

use crate::domain::types::{BundleStatus, OperationStatus};

/// 工序状态转换是否合法
///
/// 主线: WAITING → READY → ASSIGNED → IN_PROGRESS → COMPLETED
/// 冻结: READY|ASSIGNED → FROZEN → 原状态
/// 质检: IN_PROGRESS → QUALITY_FAILED
/// 跳过: WAITING|READY → SKIPPED
pub fn operation_transition_allowed(from: OperationStatus, to: OperationStatus) -> bool {
    use OperationStatus::*;

    match (from, to) {
        (Waiting, Ready) => true,
        (Waiting, Skipped) => true,
        (Ready, Assigned) => true,
        (Ready, Frozen) => true,
        (Ready, Skipped) => true,
        (Assigned, InProgress) => true,
        (Assigned, Frozen) => true,
        (InProgress, Completed) => true,
        (InProgress, QualityFailed) => true,
        (Frozen, Ready) => true,
        (Frozen, Assigned) => true,

        // 终态不可再转换,其余组合一律非法
        (Waiting, _)
        | (Ready, _)
        | (Assigned, _)
        | (InProgress, _)
        | (Frozen, _)
        | (Completed, _)
        | (QualityFailed, _)
        | (Skipped, _) => false,
    }
}

/// 捆扎状态转换是否合法
///
/// 主线: DRAFT → CUTTING → READY → IN_PROGRESS → COMPLETED
/// 挂起: 任意非终态 → ON_HOLD → 原状态
/// 终止: IN_PROGRESS → CANCELLED
pub fn bundle_transition_allowed(from: BundleStatus, to: BundleStatus) -> bool {
    use BundleStatus::*;

    match (from, to) {
        (Draft, Cutting) => true,
        (Cutting, Ready) => true,
        (Ready, InProgress) => true,
        (InProgress, Completed) => true,
        (InProgress, Cancelled) => true,

        // 挂起: 任意非终态可进,恢复目标由 held_from 决定
        (Draft, OnHold) | (Cutting, OnHold) | (Ready, OnHold) | (InProgress, OnHold) => true,
        (OnHold, Draft) | (OnHold, Cutting) | (OnHold, Ready) | (OnHold, InProgress) => true,

        (Draft, _)
        | (Cutting, _)
        | (Ready, _)
        | (InProgress, _)
        | (OnHold, _)
        | (Completed, _)
        | (Cancelled, _) => false,
    }
}
