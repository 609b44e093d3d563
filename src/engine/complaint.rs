// ==========================================
// 服装车间捆扎生产与工序派工系统 - 物料投诉处理引擎
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 7. Parts Complaint Handler
// 红线: 未决投诉冻结目标工序及其全部传递后继
// 红线: 解冻只放行不再被任何未决投诉覆盖的工序
// ==========================================
// 职责: 坏片/缺片投诉的上报与状态流转,驱动状态机冻结/解冻
// 输入: 工人上报 + 班组长处置指令
// 输出: PartsComplaint 状态写入 + 工序冻结集合变更 + 事件发布
// ==========================================

use crate::domain::complaint::PartsComplaint;
use crate::domain::types::ComplaintStatus;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{BundleEvent, BundleEventType, OptionalEventPublisher};
use crate::engine::lifecycle::{transitive_dependents, LifecycleStateMachine};
use crate::repository::{BundleOperationRepository, PartsComplaintRepository};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// 投诉状态转换是否合法
///
/// 主线: REPORTED → ACKNOWLEDGED → REPLACING → RESOLVED
/// 支线: 任意未决状态 → REJECTED
pub fn complaint_transition_allowed(from: ComplaintStatus, to: ComplaintStatus) -> bool {
    use ComplaintStatus::*;

    match (from, to) {
        (Reported, Acknowledged) => true,
        (Acknowledged, Replacing) => true,
        (Replacing, Resolved) => true,
        (Reported, Rejected) | (Acknowledged, Rejected) | (Replacing, Rejected) => true,

        (Reported, _)
        | (Acknowledged, _)
        | (Replacing, _)
        | (Resolved, _)
        | (Rejected, _) => false,
    }
}

// ==========================================
// PartsComplaintHandler - 物料投诉处理引擎
// ==========================================
pub struct PartsComplaintHandler {
    operation_repo: Arc<BundleOperationRepository>,
    complaint_repo: Arc<PartsComplaintRepository>,
    lifecycle: Arc<LifecycleStateMachine>,
    events: OptionalEventPublisher,
}

impl PartsComplaintHandler {
    /// 构造函数
    pub fn new(
        operation_repo: Arc<BundleOperationRepository>,
        complaint_repo: Arc<PartsComplaintRepository>,
        lifecycle: Arc<LifecycleStateMachine>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            operation_repo,
            complaint_repo,
            lifecycle,
            events,
        }
    }

    /// 上报坏片/缺片投诉
    ///
    /// 创建 REPORTED 投诉,并立即冻结目标工序与其全部传递后继:
    /// 上游裁片已知受损时,后继工序继续生产只会扩大损失。
    ///
    /// # 返回
    /// - `Err(EngineError::Validation)`: 工序不属于该捆扎 / 工序已收口 / 未报受损裁片
    pub fn report(
        &self,
        bundle_id: &str,
        operation_id: &str,
        reported_parts: Vec<String>,
        description: Option<String>,
        reported_by: Option<String>,
    ) -> EngineResult<PartsComplaint> {
        let op = self.operation_repo.get_by_id(operation_id)?;

        if op.bundle_id != bundle_id {
            return Err(EngineError::Validation(format!(
                "工序 {} 不属于捆扎 {}",
                operation_id, bundle_id
            )));
        }
        if op.status.is_terminal() {
            return Err(EngineError::Validation(format!(
                "工序 {} 已收口（{}）,不可上报投诉",
                operation_id, op.status
            )));
        }
        if reported_parts.is_empty() {
            return Err(EngineError::Validation(
                "投诉必须至少列出一个受损/缺失裁片".to_string(),
            ));
        }

        let now = Utc::now();
        let complaint = PartsComplaint {
            complaint_id: Uuid::new_v4().to_string(),
            bundle_id: bundle_id.to_string(),
            operation_id: operation_id.to_string(),
            status: ComplaintStatus::Reported,
            reported_parts,
            description,
            reported_by,
            created_at: now,
            updated_at: now,
        };
        self.complaint_repo.create(&complaint)?;

        // 冻结目标工序 + 全部传递后继
        let all_ops = self.operation_repo.find_by_bundle(bundle_id)?;
        let mut freeze_set: HashSet<String> = transitive_dependents(&all_ops, operation_id);
        freeze_set.insert(operation_id.to_string());
        let frozen = self.lifecycle.freeze_operation_set(bundle_id, &freeze_set)?;

        self.events.publish(BundleEvent::operation(
            BundleEventType::ComplaintRaised,
            bundle_id.to_string(),
            operation_id.to_string(),
            complaint.reported_by.clone(),
        ));

        tracing::warn!(
            "物料投诉上报: complaint_id={}, operation_id={}, 冻结工序数={}",
            complaint.complaint_id,
            operation_id,
            frozen
        );
        Ok(complaint)
    }

    /// 班组长确认投诉（REPORTED → ACKNOWLEDGED）
    pub fn acknowledge(&self, complaint_id: &str) -> EngineResult<PartsComplaint> {
        self.advance(complaint_id, ComplaintStatus::Acknowledged)
    }

    /// 开始补片（ACKNOWLEDGED → REPLACING）
    pub fn start_replacement(&self, complaint_id: &str) -> EngineResult<PartsComplaint> {
        self.advance(complaint_id, ComplaintStatus::Replacing)
    }

    /// 投诉解决（REPLACING → RESOLVED）
    ///
    /// 解冻受影响工序中不再被其他未决投诉覆盖的那部分,
    /// 随后状态机重跑就绪级联。
    pub fn resolve(&self, complaint_id: &str) -> EngineResult<PartsComplaint> {
        let complaint = self.close(complaint_id, ComplaintStatus::Resolved)?;

        self.events.publish(BundleEvent::operation(
            BundleEventType::ComplaintResolved,
            complaint.bundle_id.clone(),
            complaint.operation_id.clone(),
            None,
        ));

        tracing::info!("物料投诉解决: complaint_id={}", complaint_id);
        Ok(complaint)
    }

    /// 投诉驳回（任意未决状态 → REJECTED）
    ///
    /// 驳回同样解冻,但不代表裁片已补换。
    pub fn reject(&self, complaint_id: &str) -> EngineResult<PartsComplaint> {
        let complaint = self.close(complaint_id, ComplaintStatus::Rejected)?;

        self.events.publish(BundleEvent::operation(
            BundleEventType::ComplaintResolved,
            complaint.bundle_id.clone(),
            complaint.operation_id.clone(),
            None,
        ));

        tracing::info!("物料投诉驳回: complaint_id={}", complaint_id);
        Ok(complaint)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 推进投诉状态（不涉及冻结集合变化）
    fn advance(
        &self,
        complaint_id: &str,
        to: ComplaintStatus,
    ) -> EngineResult<PartsComplaint> {
        let complaint = self.complaint_repo.get_by_id(complaint_id)?;

        if !complaint_transition_allowed(complaint.status, to) {
            return Err(Self::illegal(&complaint, to));
        }

        self.complaint_repo.update_status(complaint_id, to)?;

        tracing::info!(
            "投诉状态推进: complaint_id={}, {} → {}",
            complaint_id,
            complaint.status,
            to
        );
        self.complaint_repo.get_by_id(complaint_id).map_err(Into::into)
    }

    /// 关闭投诉（RESOLVED/REJECTED）并解冻不再被覆盖的工序
    fn close(
        &self,
        complaint_id: &str,
        to: ComplaintStatus,
    ) -> EngineResult<PartsComplaint> {
        let complaint = self.complaint_repo.get_by_id(complaint_id)?;

        if !complaint_transition_allowed(complaint.status, to) {
            return Err(Self::illegal(&complaint, to));
        }

        self.complaint_repo.update_status(complaint_id, to)?;

        // 受影响集合 = 目标工序 + 传递后继;逐一复查是否仍被其他未决投诉覆盖
        let all_ops = self.operation_repo.find_by_bundle(&complaint.bundle_id)?;
        let mut affected: HashSet<String> =
            transitive_dependents(&all_ops, &complaint.operation_id);
        affected.insert(complaint.operation_id.clone());

        let mut to_unfreeze: HashSet<String> = HashSet::new();
        for op in all_ops.iter().filter(|o| affected.contains(&o.operation_id)) {
            if self.lifecycle.find_blocking_complaint(op, &all_ops)?.is_none() {
                to_unfreeze.insert(op.operation_id.clone());
            }
        }

        let unfrozen = self
            .lifecycle
            .unfreeze_operation_set(&complaint.bundle_id, &to_unfreeze)?;

        tracing::info!(
            "投诉关闭: complaint_id={}, status={}, 解冻工序数={}",
            complaint_id,
            to,
            unfrozen
        );
        self.complaint_repo.get_by_id(complaint_id).map_err(Into::into)
    }

    fn illegal(complaint: &PartsComplaint, to: ComplaintStatus) -> EngineError {
        EngineError::IllegalTransition {
            entity: "PartsComplaint".to_string(),
            id: complaint.complaint_id.clone(),
            from: complaint.status.to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complaint_main_line_transitions() {
        use ComplaintStatus::*;
        assert!(complaint_transition_allowed(Reported, Acknowledged));
        assert!(complaint_transition_allowed(Acknowledged, Replacing));
        assert!(complaint_transition_allowed(Replacing, Resolved));
    }

    #[test]
    fn test_complaint_reject_from_any_open_state() {
        use ComplaintStatus::*;
        assert!(complaint_transition_allowed(Reported, Rejected));
        assert!(complaint_transition_allowed(Acknowledged, Rejected));
        assert!(complaint_transition_allowed(Replacing, Rejected));
    }

    #[test]
    fn test_complaint_no_skipping_and_closed_is_final() {
        use ComplaintStatus::*;
        // 不允许跳级解决
        assert!(!complaint_transition_allowed(Reported, Resolved));
        assert!(!complaint_transition_allowed(Acknowledged, Resolved));
        assert!(!complaint_transition_allowed(Reported, Replacing));

        // 已决投诉不可再流转
        for from in [Resolved, Rejected] {
            for to in [Reported, Acknowledged, Replacing, Resolved, Rejected] {
                assert!(!complaint_transition_allowed(from, to), "{} → {}", from, to);
            }
        }
    }
}
