// ==========================================
// 服装车间捆扎生产与工序派工系统 - 派工与完工 API
// ==========================================
// 职责: 派工请求、开工/完工/质检上报、跳过与重排、负荷与计件查询
// 依据: Bundle_MES_Dev_Spec.md - PART E 对外接口
// 并发语义: 派工冲突（AlreadyAssigned）为可重试错误,其余原样上抛
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::assignment::{EarningsRecord, OperatorEarningsSummary, WorkAssignment};
use crate::domain::bundle::BundleOperation;
use crate::domain::operator::{OperatorSnapshot, OperatorWorkload};
use crate::domain::types::QualityGrade;
use crate::engine::assignment::AssignmentMatcher;
use crate::engine::lifecycle::LifecycleStateMachine;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::assignment_repo::WorkAssignmentRepository;
use crate::repository::earnings_repo::EarningsRepository;
use crate::repository::operation_repo::BundleOperationRepository;

// ==========================================
// AssignmentApi - 派工与完工 API
// ==========================================

/// 派工与完工API
///
/// 职责：
/// 1. 派工请求（同步封装异步派工引擎）
/// 2. 工人开工/完工/质检失败上报
/// 3. 班组长跳过工序、失败工序重排
/// 4. 工人负荷与计件工资查询
/// 5. ActionLog记录
pub struct AssignmentApi {
    operation_repo: Arc<BundleOperationRepository>,
    assignment_repo: Arc<WorkAssignmentRepository>,
    earnings_repo: Arc<EarningsRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    lifecycle: Arc<LifecycleStateMachine>,
    matcher: Arc<AssignmentMatcher<ConfigManager>>,
}

impl AssignmentApi {
    /// 创建新的AssignmentApi实例
    pub fn new(
        operation_repo: Arc<BundleOperationRepository>,
        assignment_repo: Arc<WorkAssignmentRepository>,
        earnings_repo: Arc<EarningsRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        lifecycle: Arc<LifecycleStateMachine>,
        matcher: Arc<AssignmentMatcher<ConfigManager>>,
    ) -> Self {
        Self {
            operation_repo,
            assignment_repo,
            earnings_repo,
            action_log_repo,
            lifecycle,
            matcher,
        }
    }

    // ==========================================
    // 派工
    // ==========================================

    /// 请求派工
    ///
    /// 在工人快照池中评分选人并原子抢占工序。两个并发请求
    /// 落在同一工序时恰有一个成功,另一个得到 AlreadyAssigned。
    ///
    /// # 参数
    /// - `operation_id`: 目标工序（须为 READY）
    /// - `snapshots`: 工人快照池（外部花名册的匹配时刻只读快照）
    /// - `min_score`: 最低可接受得分（None 时取配置 min_match_score）
    /// - `actor`: 发起派工的班组长
    pub fn request_assignment(
        &self,
        operation_id: &str,
        snapshots: &[OperatorSnapshot],
        min_score: Option<i32>,
        actor: &str,
    ) -> ApiResult<WorkAssignment> {
        let assignment = self.run_matcher(operation_id, snapshots, min_score)?;

        self.log_action(
            ActionType::OperationAssigned,
            actor,
            None,
            Some(operation_id.to_string()),
            Some(json!({
                "assignment_id": assignment.assignment_id,
                "operator_id": assignment.operator_id,
                "version_token": assignment.version_token,
            })),
        )?;

        Ok(assignment)
    }

    /// 查询工序当前有效派工单
    pub fn get_active_assignment(&self, operation_id: &str) -> ApiResult<Option<WorkAssignment>> {
        Ok(self.assignment_repo.find_active_by_operation(operation_id)?)
    }

    // ==========================================
    // 工人上报
    // ==========================================

    /// 工人开工（ASSIGNED → IN_PROGRESS,重复开工为幂等 no-op）
    pub fn start_operation(&self, operation_id: &str, operator_id: &str) -> ApiResult<()> {
        self.lifecycle.start_operation(operation_id, operator_id)?;

        self.log_action(
            ActionType::OperationStarted,
            operator_id,
            None,
            Some(operation_id.to_string()),
            None,
        )?;
        Ok(())
    }

    /// 工人完工上报,返回计件工资记录
    ///
    /// 重复完工返回 AlreadyCompleted,不产生第二条计件记录。
    pub fn complete_operation(
        &self,
        operation_id: &str,
        operator_id: &str,
        completed_pieces: i32,
        quality_grade: Option<QualityGrade>,
    ) -> ApiResult<EarningsRecord> {
        let record = self.lifecycle.complete_operation(
            operation_id,
            operator_id,
            completed_pieces,
            quality_grade,
        )?;

        self.log_action(
            ActionType::OperationCompleted,
            operator_id,
            Some(record.bundle_id.clone()),
            Some(operation_id.to_string()),
            Some(json!({
                "completed_pieces": completed_pieces,
                "amount": record.amount,
                "quality_grade": quality_grade.map(|g| g.to_db_str()),
            })),
        )?;

        Ok(record)
    }

    /// 工人质检失败上报（IN_PROGRESS → QUALITY_FAILED,终态）
    pub fn fail_operation(
        &self,
        operation_id: &str,
        operator_id: &str,
        quality_grade: QualityGrade,
    ) -> ApiResult<()> {
        self.lifecycle
            .fail_operation(operation_id, operator_id, quality_grade)?;

        self.log_action(
            ActionType::OperationFailed,
            operator_id,
            None,
            Some(operation_id.to_string()),
            Some(json!({ "quality_grade": quality_grade.to_db_str() })),
        )?;
        Ok(())
    }

    // ==========================================
    // 班组长处置
    // ==========================================

    /// 跳过工序（仅 WAITING/READY,须给出理由）
    pub fn skip_operation(
        &self,
        operation_id: &str,
        actor: &str,
        reason: &str,
    ) -> ApiResult<()> {
        if reason.trim().is_empty() {
            return Err(ApiError::InvalidInput("跳过工序必须给出理由".to_string()));
        }

        self.lifecycle.skip_operation(operation_id)?;

        self.log_action_with_detail(
            ActionType::OperationSkipped,
            actor,
            Some(operation_id.to_string()),
            reason,
        )?;
        Ok(())
    }

    /// 质检失败工序重排（生成新工序实例,后继依赖重指向）
    pub fn requeue_failed_operation(
        &self,
        operation_id: &str,
        actor: &str,
    ) -> ApiResult<BundleOperation> {
        let new_op = self.lifecycle.requeue_failed_operation(operation_id)?;

        self.log_action(
            ActionType::OperationRequeued,
            actor,
            Some(new_op.bundle_id.clone()),
            Some(operation_id.to_string()),
            Some(json!({ "new_operation_id": new_op.operation_id })),
        )?;

        Ok(new_op)
    }

    // ==========================================
    // 负荷与计件查询
    // ==========================================

    /// 工人在产负荷（有效派工单数 + 在产派工件数）
    pub fn get_operator_workload(&self, operator_id: &str) -> ApiResult<OperatorWorkload> {
        Ok(self.assignment_repo.get_workload(operator_id)?)
    }

    /// 工人计件记录明细
    pub fn list_operator_earnings(&self, operator_id: &str) -> ApiResult<Vec<EarningsRecord>> {
        Ok(self.earnings_repo.list_by_operator(operator_id)?)
    }

    /// 工人计件汇总（笔数/件数/金额）
    pub fn summarize_operator_earnings(
        &self,
        operator_id: &str,
    ) -> ApiResult<OperatorEarningsSummary> {
        Ok(self.earnings_repo.summarize_operator(operator_id)?)
    }

    /// 查询工序明细
    pub fn get_operation(&self, operation_id: &str) -> ApiResult<BundleOperation> {
        Ok(self.operation_repo.get_by_id(operation_id)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 同步封装异步派工引擎
    fn run_matcher(
        &self,
        operation_id: &str,
        snapshots: &[OperatorSnapshot],
        min_score: Option<i32>,
    ) -> ApiResult<WorkAssignment> {
        let matcher = self.matcher.clone();

        let result = if let Ok(handle) = tokio::runtime::Handle::try_current() {
            // 已在 tokio 运行时中,使用 block_in_place 运行异步代码
            tokio::task::block_in_place(|| {
                handle.block_on(async move {
                    matcher
                        .request_assignment(operation_id, snapshots, min_score)
                        .await
                })
            })
        } else {
            // 不在运行时中,创建新的运行时
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| ApiError::InternalError(format!("tokio 运行时创建失败: {}", e)))?;
            rt.block_on(async move {
                matcher
                    .request_assignment(operation_id, snapshots, min_score)
                    .await
            })
        };

        result.map_err(Into::into)
    }

    fn log_action(
        &self,
        action_type: ActionType,
        actor: &str,
        bundle_id: Option<String>,
        operation_id: Option<String>,
        payload_json: Option<serde_json::Value>,
    ) -> ApiResult<()> {
        self.action_log_repo.insert(&ActionLog {
            action_id: Uuid::new_v4().to_string(),
            action_type,
            action_ts: Utc::now(),
            actor: actor.to_string(),
            bundle_id,
            operation_id,
            payload_json,
            detail: None,
        })?;
        Ok(())
    }

    fn log_action_with_detail(
        &self,
        action_type: ActionType,
        actor: &str,
        operation_id: Option<String>,
        detail: &str,
    ) -> ApiResult<()> {
        self.action_log_repo.insert(&ActionLog {
            action_id: Uuid::new_v4().to_string(),
            action_type,
            action_ts: Utc::now(),
            actor: actor.to_string(),
            bundle_id: None,
            operation_id,
            payload_json: None,
            detail: Some(detail.to_string()),
        })?;
        Ok(())
    }
}
