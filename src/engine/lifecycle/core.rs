// ==========================================
// LifecycleStateMachine - 生命周期状态机核心
// ==========================================
// 红线: 状态写入全部走 revision 乐观锁,冲突原样上抛
// 红线: 工人上报（开工/完工/质检）只认 ASSIGNED 工人本人
// ==========================================

use crate::domain::assignment::EarningsRecord;
use crate::domain::bundle::{BundleOperation, ProductionBundle};
use crate::domain::complaint::PartsComplaint;
use crate::domain::types::{AssignmentStatus, BundleStatus, OperationStatus, QualityGrade};
use crate::engine::earnings::EarningsCalculator;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{BundleEvent, BundleEventType, OptionalEventPublisher};
use crate::engine::lifecycle::transitions::{bundle_transition_allowed, operation_transition_allowed};
use crate::repository::{
    BundleOperationRepository, EarningsRepository, PartsComplaintRepository,
    ProductionBundleRepository, WorkAssignmentRepository,
};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

// ==========================================
// 依赖图遍历辅助函数
// ==========================================

/// 收集传递后继（所有直接/间接依赖 root 的工序 id）
pub fn transitive_dependents(ops: &[BundleOperation], root_id: &str) -> HashSet<String> {
    let mut result: HashSet<String> = HashSet::new();
    let mut frontier = vec![root_id.to_string()];

    while let Some(current) = frontier.pop() {
        for op in ops {
            if op.dependencies.contains(&current) && result.insert(op.operation_id.clone()) {
                frontier.push(op.operation_id.clone());
            }
        }
    }

    result
}

/// 收集传递前置（root 直接/间接依赖的全部工序 id）
pub fn transitive_dependencies(ops: &[BundleOperation], root_id: &str) -> HashSet<String> {
    let by_id: HashMap<&str, &BundleOperation> = ops
        .iter()
        .map(|op| (op.operation_id.as_str(), op))
        .collect();

    let mut result: HashSet<String> = HashSet::new();
    let mut frontier = vec![root_id.to_string()];

    while let Some(current) = frontier.pop() {
        if let Some(op) = by_id.get(current.as_str()) {
            for dep in &op.dependencies {
                if result.insert(dep.clone()) {
                    frontier.push(dep.clone());
                }
            }
        }
    }

    result
}

// ==========================================
// LifecycleStateMachine - 生命周期状态机
// ==========================================
pub struct LifecycleStateMachine {
    bundle_repo: Arc<ProductionBundleRepository>,
    operation_repo: Arc<BundleOperationRepository>,
    assignment_repo: Arc<WorkAssignmentRepository>,
    complaint_repo: Arc<PartsComplaintRepository>,
    earnings_repo: Arc<EarningsRepository>,
    earnings_calculator: EarningsCalculator,
    events: OptionalEventPublisher,
}

impl LifecycleStateMachine {
    /// 构造函数
    pub fn new(
        bundle_repo: Arc<ProductionBundleRepository>,
        operation_repo: Arc<BundleOperationRepository>,
        assignment_repo: Arc<WorkAssignmentRepository>,
        complaint_repo: Arc<PartsComplaintRepository>,
        earnings_repo: Arc<EarningsRepository>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            bundle_repo,
            operation_repo,
            assignment_repo,
            complaint_repo,
            earnings_repo,
            earnings_calculator: EarningsCalculator::new(),
            events,
        }
    }

    // ==========================================
    // 投诉冻结判定
    // ==========================================

    /// 查找冻结该工序的未决投诉（目标工序本身或任一传递前置）
    pub fn find_blocking_complaint(
        &self,
        operation: &BundleOperation,
        all_ops: &[BundleOperation],
    ) -> EngineResult<Option<PartsComplaint>> {
        let mut check_ids: Vec<String> = vec![operation.operation_id.clone()];
        check_ids.extend(transitive_dependencies(all_ops, &operation.operation_id));

        for id in check_ids {
            let open = self.complaint_repo.find_open_by_operation(&id)?;
            if let Some(complaint) = open.into_iter().next() {
                return Ok(Some(complaint));
            }
        }

        Ok(None)
    }

    fn reject_if_complaint_blocked(
        &self,
        operation: &BundleOperation,
        all_ops: &[BundleOperation],
    ) -> EngineResult<()> {
        if let Some(complaint) = self.find_blocking_complaint(operation, all_ops)? {
            return Err(EngineError::ComplaintBlocking {
                operation_id: operation.operation_id.clone(),
                complaint_id: complaint.complaint_id,
            });
        }
        Ok(())
    }

    // ==========================================
    // 工序转换 - 工人上报入口
    // ==========================================

    /// 工人开工
    ///
    /// - 仅 ASSIGNED 状态且工人本人可开工
    /// - 重复开工为幂等 no-op
    /// - 冻结/未决投诉 → ComplaintBlocking
    pub fn start_operation(&self, operation_id: &str, operator_id: &str) -> EngineResult<()> {
        let op = self.operation_repo.get_by_id(operation_id)?;

        // 重复开工保护
        if op.status == OperationStatus::InProgress
            && op.assigned_operator_id.as_deref() == Some(operator_id)
        {
            tracing::debug!("工序 {} 已开工,忽略重复开工", operation_id);
            return Ok(());
        }

        let all_ops = self.operation_repo.find_by_bundle(&op.bundle_id)?;
        self.reject_if_complaint_blocked(&op, &all_ops)?;

        if op.status != OperationStatus::Assigned {
            return Err(Self::illegal_operation(&op, OperationStatus::InProgress));
        }
        if op.assigned_operator_id.as_deref() != Some(operator_id) {
            // 非派工本人开工视为非法转换尝试
            return Err(Self::illegal_operation(&op, OperationStatus::InProgress));
        }

        let mut updated = op.clone();
        updated.status = OperationStatus::InProgress;
        updated.updated_at = Utc::now();
        self.operation_repo.update(&updated)?;

        tracing::info!("工序开工: operation_id={}, operator_id={}", operation_id, operator_id);
        Ok(())
    }

    /// 工人完工上报（含计件结算与就绪级联）
    ///
    /// - 仅 IN_PROGRESS 状态且工人本人可完工
    /// - 0 < completed_pieces <= assigned_pieces
    /// - 重复完工 → AlreadyCompleted（不产生第二条计件记录）
    pub fn complete_operation(
        &self,
        operation_id: &str,
        operator_id: &str,
        completed_pieces: i32,
        quality_grade: Option<QualityGrade>,
    ) -> EngineResult<EarningsRecord> {
        let op = self.operation_repo.get_by_id(operation_id)?;

        if op.status == OperationStatus::Completed {
            return Err(EngineError::AlreadyCompleted(operation_id.to_string()));
        }

        let all_ops = self.operation_repo.find_by_bundle(&op.bundle_id)?;
        self.reject_if_complaint_blocked(&op, &all_ops)?;

        if op.status != OperationStatus::InProgress {
            return Err(Self::illegal_operation(&op, OperationStatus::Completed));
        }
        if op.assigned_operator_id.as_deref() != Some(operator_id) {
            return Err(Self::illegal_operation(&op, OperationStatus::Completed));
        }
        if completed_pieces <= 0 {
            return Err(EngineError::Validation(format!(
                "完成件数必须为正: {}",
                completed_pieces
            )));
        }
        if completed_pieces > op.assigned_pieces {
            return Err(EngineError::CapacityExceeded {
                operation_id: operation_id.to_string(),
                completed: completed_pieces,
                assigned: op.assigned_pieces,
            });
        }

        // 状态写入
        let mut updated = op.clone();
        updated.status = OperationStatus::Completed;
        updated.completed_pieces = completed_pieces;
        updated.quality_grade = quality_grade;
        updated.updated_at = Utc::now();
        self.operation_repo.update(&updated)?;

        // 关闭派工单
        self.assignment_repo
            .close_active(operation_id, AssignmentStatus::Closed)?;

        // 计件结算（工序状态已置 COMPLETED,重复调用在上方被拦截）
        let record =
            self.earnings_calculator
                .settle(&updated, operator_id, completed_pieces, quality_grade);
        self.earnings_repo.insert(&record)?;

        // 就绪级联 + 捆扎完工判定
        self.cascade_ready(&op.bundle_id)?;
        self.check_bundle_completion(&op.bundle_id)?;

        self.events.publish(BundleEvent::operation(
            BundleEventType::OperationCompleted,
            op.bundle_id.clone(),
            operation_id.to_string(),
            Some(operator_id.to_string()),
        ));

        tracing::info!(
            "工序完工: operation_id={}, operator_id={}, pieces={}, amount={}",
            operation_id,
            operator_id,
            completed_pieces,
            record.amount
        );
        Ok(record)
    }

    /// 工人质检失败上报
    ///
    /// QUALITY_FAILED 为终态: 返工以新工序实例落地（见 requeue_failed_operation）,
    /// 不复活失败实例,避免旧派工锁死灰复燃。
    pub fn fail_operation(
        &self,
        operation_id: &str,
        operator_id: &str,
        quality_grade: QualityGrade,
    ) -> EngineResult<()> {
        let op = self.operation_repo.get_by_id(operation_id)?;

        let all_ops = self.operation_repo.find_by_bundle(&op.bundle_id)?;
        self.reject_if_complaint_blocked(&op, &all_ops)?;

        if op.status != OperationStatus::InProgress {
            return Err(Self::illegal_operation(&op, OperationStatus::QualityFailed));
        }
        if op.assigned_operator_id.as_deref() != Some(operator_id) {
            return Err(Self::illegal_operation(&op, OperationStatus::QualityFailed));
        }

        let mut updated = op.clone();
        updated.status = OperationStatus::QualityFailed;
        updated.quality_grade = Some(quality_grade);
        updated.updated_at = Utc::now();
        self.operation_repo.update(&updated)?;

        // 释放派工单
        self.assignment_repo
            .close_active(operation_id, AssignmentStatus::Released)?;

        self.events.publish(BundleEvent::operation(
            BundleEventType::OperationFailed,
            op.bundle_id.clone(),
            operation_id.to_string(),
            Some(operator_id.to_string()),
        ));

        tracing::warn!(
            "工序质检失败: operation_id={}, operator_id={}, grade={}",
            operation_id,
            operator_id,
            quality_grade
        );
        Ok(())
    }

    /// 班组长跳过工序（仅 WAITING/READY,终态）
    pub fn skip_operation(&self, operation_id: &str) -> EngineResult<()> {
        let op = self.operation_repo.get_by_id(operation_id)?;

        let all_ops = self.operation_repo.find_by_bundle(&op.bundle_id)?;
        self.reject_if_complaint_blocked(&op, &all_ops)?;

        if !operation_transition_allowed(op.status, OperationStatus::Skipped) {
            return Err(Self::illegal_operation(&op, OperationStatus::Skipped));
        }

        let mut updated = op.clone();
        updated.status = OperationStatus::Skipped;
        updated.updated_at = Utc::now();
        self.operation_repo.update(&updated)?;

        // 跳过同样放行后继
        self.cascade_ready(&op.bundle_id)?;
        self.check_bundle_completion(&op.bundle_id)?;

        tracing::info!("工序跳过: operation_id={}", operation_id);
        Ok(())
    }

    /// 质检失败工序重排（生成新工序实例）
    ///
    /// - 新实例继承工艺要求与依赖,派工/完工字段清零
    /// - 后继工序的依赖重指向新实例
    /// - 失败实例标记 superseded_by,不再阻塞捆扎完工
    pub fn requeue_failed_operation(&self, operation_id: &str) -> EngineResult<BundleOperation> {
        let op = self.operation_repo.get_by_id(operation_id)?;

        if op.status != OperationStatus::QualityFailed {
            return Err(Self::illegal_operation(&op, OperationStatus::Ready));
        }
        if let Some(existing) = &op.superseded_by {
            return Err(EngineError::Validation(format!(
                "失败工序已重排: operation_id={}, 替代实例={}",
                operation_id, existing
            )));
        }

        let all_ops = self.operation_repo.find_by_bundle(&op.bundle_id)?;
        let now = Utc::now();
        let new_id = Uuid::new_v4().to_string();

        let mut new_op = op.clone();
        new_op.operation_id = new_id.clone();
        new_op.status = OperationStatus::Waiting;
        new_op.frozen_from = None;
        new_op.assigned_operator_id = None;
        new_op.assigned_pieces = 0;
        new_op.completed_pieces = 0;
        new_op.quality_grade = None;
        new_op.superseded_by = None;
        new_op.revision = 0;
        new_op.created_at = now;
        new_op.updated_at = now;

        self.operation_repo.batch_insert(&[new_op.clone()])?;

        // 失败实例标记被替代
        let mut old = op.clone();
        old.superseded_by = Some(new_id.clone());
        old.updated_at = now;
        self.operation_repo.update(&old)?;

        // 后继依赖重指向新实例
        for dependent in all_ops
            .iter()
            .filter(|o| o.dependencies.contains(&op.operation_id))
        {
            let mut redirected = dependent.clone();
            redirected.dependencies = redirected
                .dependencies
                .iter()
                .map(|id| {
                    if id == &op.operation_id {
                        new_id.clone()
                    } else {
                        id.clone()
                    }
                })
                .collect();
            redirected.updated_at = now;
            self.operation_repo.update(&redirected)?;
        }

        // 依赖已满足且无投诉冻结则直接 READY
        let refreshed_ops = self.operation_repo.find_by_bundle(&op.bundle_id)?;
        let fresh = self.operation_repo.get_by_id(&new_id)?;
        let deps_satisfied = fresh.dependencies.iter().all(|dep| {
            refreshed_ops
                .iter()
                .find(|o| &o.operation_id == dep)
                .map(|o| o.status.satisfies_dependency())
                .unwrap_or(false)
        });
        if deps_satisfied && self.find_blocking_complaint(&fresh, &refreshed_ops)?.is_none() {
            let mut promoted = fresh;
            promoted.status = OperationStatus::Ready;
            promoted.updated_at = Utc::now();
            self.operation_repo.update(&promoted)?;
        }

        tracing::info!(
            "失败工序重排: operation_id={} → new_operation_id={}",
            operation_id,
            new_id
        );
        self.operation_repo.get_by_id(&new_id).map_err(Into::into)
    }

    // ==========================================
    // 就绪级联与捆扎完工
    // ==========================================

    /// 就绪级联: 把依赖全部满足且未被投诉冻结的 WAITING 工序提升为 READY
    ///
    /// 依赖只指向同捆兄弟工序,级联不跨捆,与其他捆扎零争用。
    pub fn cascade_ready(&self, bundle_id: &str) -> EngineResult<usize> {
        let ops = self.operation_repo.find_by_bundle(bundle_id)?;
        let mut promoted = 0usize;

        for op in ops.iter().filter(|o| o.status == OperationStatus::Waiting) {
            let deps_satisfied = op.dependencies.iter().all(|dep| {
                ops.iter()
                    .find(|o| &o.operation_id == dep)
                    .map(|o| o.status.satisfies_dependency())
                    .unwrap_or(false)
            });
            if !deps_satisfied {
                continue;
            }
            if self.find_blocking_complaint(op, &ops)?.is_some() {
                continue;
            }

            let mut updated = op.clone();
            updated.status = OperationStatus::Ready;
            updated.updated_at = Utc::now();
            self.operation_repo.update(&updated)?;
            promoted += 1;

            tracing::debug!("工序就绪: operation_id={}", op.operation_id);
        }

        Ok(promoted)
    }

    /// 捆扎完工判定: 全部工序 COMPLETED/SKIPPED（或已被替代的 QUALITY_FAILED）时收口
    pub fn check_bundle_completion(&self, bundle_id: &str) -> EngineResult<bool> {
        let ops = self.operation_repo.find_by_bundle(bundle_id)?;
        if ops.is_empty() {
            return Ok(false);
        }

        let all_done = ops.iter().all(|o| {
            o.status.satisfies_dependency()
                || (o.status == OperationStatus::QualityFailed && o.superseded_by.is_some())
        });
        if !all_done {
            return Ok(false);
        }

        let bundle = self.bundle_repo.get_by_id(bundle_id)?;
        let completed = match bundle.status {
            BundleStatus::InProgress => {
                self.apply_bundle_transition(&bundle, BundleStatus::Completed)?;
                true
            }
            // 全部工序被跳过时捆扎可能尚未开工,补走主线再收口
            BundleStatus::Ready => {
                let in_progress =
                    self.apply_bundle_transition(&bundle, BundleStatus::InProgress)?;
                self.apply_bundle_transition(&in_progress, BundleStatus::Completed)?;
                true
            }
            _ => false,
        };

        if completed {
            self.events.publish(BundleEvent::bundle(
                BundleEventType::BundleCompleted,
                bundle_id.to_string(),
            ));
            tracing::info!("捆扎完工: bundle_id={}", bundle_id);
        }

        Ok(completed)
    }

    // ==========================================
    // 投诉冻结/解冻（由投诉处理引擎调用）
    // ==========================================

    /// 冻结指定工序集合中处于 READY/ASSIGNED 的工序
    ///
    /// WAITING 工序不改状态（就绪级联会因未决投诉拒绝提升）,
    /// IN_PROGRESS 工序不强行打断（完工上报会被投诉拦截）。
    pub fn freeze_operation_set(
        &self,
        bundle_id: &str,
        operation_ids: &HashSet<String>,
    ) -> EngineResult<usize> {
        let ops = self.operation_repo.find_by_bundle(bundle_id)?;
        let mut frozen = 0usize;

        for op in ops
            .iter()
            .filter(|o| operation_ids.contains(&o.operation_id))
        {
            match op.status {
                OperationStatus::Ready | OperationStatus::Assigned => {
                    let mut updated = op.clone();
                    updated.frozen_from = Some(op.status);
                    updated.status = OperationStatus::Frozen;
                    updated.updated_at = Utc::now();
                    self.operation_repo.update(&updated)?;
                    frozen += 1;
                }
                _ => {}
            }
        }

        Ok(frozen)
    }

    /// 解冻指定工序集合（恢复冻结前状态）,随后重跑就绪级联
    pub fn unfreeze_operation_set(
        &self,
        bundle_id: &str,
        operation_ids: &HashSet<String>,
    ) -> EngineResult<usize> {
        let ops = self.operation_repo.find_by_bundle(bundle_id)?;
        let mut unfrozen = 0usize;

        for op in ops
            .iter()
            .filter(|o| operation_ids.contains(&o.operation_id))
        {
            if op.status != OperationStatus::Frozen {
                continue;
            }

            let mut updated = op.clone();
            updated.status = op.frozen_from.unwrap_or(OperationStatus::Ready);
            updated.frozen_from = None;
            updated.updated_at = Utc::now();
            self.operation_repo.update(&updated)?;
            unfrozen += 1;
        }

        self.cascade_ready(bundle_id)?;
        Ok(unfrozen)
    }

    // ==========================================
    // 捆扎转换
    // ==========================================

    /// 开裁（DRAFT → CUTTING）
    pub fn begin_cutting(&self, bundle_id: &str) -> EngineResult<ProductionBundle> {
        let bundle = self.bundle_repo.get_by_id(bundle_id)?;
        self.apply_bundle_transition(&bundle, BundleStatus::Cutting)
    }

    /// 裁剪完成（CUTTING → READY）
    pub fn mark_cutting_complete(&self, bundle_id: &str) -> EngineResult<ProductionBundle> {
        let bundle = self.bundle_repo.get_by_id(bundle_id)?;
        self.apply_bundle_transition(&bundle, BundleStatus::Ready)
    }

    /// 捆扎挂起（任意非终态 → ON_HOLD,记录挂起前状态）
    pub fn hold_bundle(&self, bundle_id: &str) -> EngineResult<ProductionBundle> {
        let bundle = self.bundle_repo.get_by_id(bundle_id)?;

        if !bundle_transition_allowed(bundle.status, BundleStatus::OnHold) {
            return Err(Self::illegal_bundle(&bundle, BundleStatus::OnHold));
        }

        let mut updated = bundle.clone();
        updated.held_from = Some(bundle.status);
        updated.status = BundleStatus::OnHold;
        updated.updated_at = Utc::now();
        self.bundle_repo.update(&updated)?;
        updated.revision += 1;

        tracing::info!("捆扎挂起: bundle_id={}, held_from={}", bundle_id, bundle.status);
        Ok(updated)
    }

    /// 捆扎恢复（ON_HOLD → 挂起前状态）
    pub fn resume_bundle(&self, bundle_id: &str) -> EngineResult<ProductionBundle> {
        let bundle = self.bundle_repo.get_by_id(bundle_id)?;

        if bundle.status != BundleStatus::OnHold {
            return Err(Self::illegal_bundle(
                &bundle,
                bundle.held_from.unwrap_or(BundleStatus::Ready),
            ));
        }

        let target = bundle.held_from.ok_or_else(|| {
            EngineError::Validation(format!("捆扎 {} 挂起前状态缺失,无法恢复", bundle_id))
        })?;

        let mut updated = bundle.clone();
        updated.status = target;
        updated.held_from = None;
        updated.updated_at = Utc::now();
        self.bundle_repo.update(&updated)?;
        updated.revision += 1;

        tracing::info!("捆扎恢复: bundle_id={}, status={}", bundle_id, target);
        Ok(updated)
    }

    /// 捆扎取消（仅 IN_PROGRESS,终态）
    ///
    /// 取消只封住未派工工序（派工引擎按捆扎状态拒绝）;
    /// 已开工工序须由工人显式完工或质检失败收口,不强行回收。
    pub fn cancel_bundle(&self, bundle_id: &str) -> EngineResult<ProductionBundle> {
        let bundle = self.bundle_repo.get_by_id(bundle_id)?;
        let cancelled = self.apply_bundle_transition(&bundle, BundleStatus::Cancelled)?;

        tracing::warn!("捆扎取消: bundle_id={}", bundle_id);
        Ok(cancelled)
    }

    /// 首次派工后把 READY 捆扎推进为 IN_PROGRESS（幂等）
    pub fn mark_bundle_in_progress(&self, bundle_id: &str) -> EngineResult<()> {
        let bundle = self.bundle_repo.get_by_id(bundle_id)?;
        if bundle.status == BundleStatus::Ready {
            self.apply_bundle_transition(&bundle, BundleStatus::InProgress)?;
        }
        Ok(())
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn apply_bundle_transition(
        &self,
        bundle: &ProductionBundle,
        to: BundleStatus,
    ) -> EngineResult<ProductionBundle> {
        if !bundle_transition_allowed(bundle.status, to) {
            return Err(Self::illegal_bundle(bundle, to));
        }

        let mut updated = bundle.clone();
        updated.status = to;
        if to != BundleStatus::OnHold {
            updated.held_from = None;
        }
        updated.updated_at = Utc::now();
        self.bundle_repo.update(&updated)?;
        // 仓储层 update 成功即 revision+1,回写内存对象以便链式转换
        updated.revision += 1;

        tracing::debug!("捆扎转换: bundle_id={}, {} → {}", bundle.bundle_id, bundle.status, to);
        Ok(updated)
    }

    fn illegal_operation(op: &BundleOperation, to: OperationStatus) -> EngineError {
        EngineError::IllegalTransition {
            entity: "BundleOperation".to_string(),
            id: op.operation_id.clone(),
            from: op.status.to_string(),
            to: to.to_string(),
        }
    }

    fn illegal_bundle(bundle: &ProductionBundle, to: BundleStatus) -> EngineError {
        EngineError::IllegalTransition {
            entity: "ProductionBundle".to_string(),
            id: bundle.bundle_id.clone(),
            from: bundle.status.to_string(),
            to: to.to_string(),
        }
    }
}
