// ==========================================
// 服装车间捆扎生产与工序派工系统 - 物料投诉 API
// ==========================================
// 职责: 坏片/缺片投诉的上报、处置流转与查询
// 依据: Bundle_MES_Dev_Spec.md - PART E 对外接口
// 说明: 冻结/解冻语义全部在投诉处理引擎内,本层只做编排与审计
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::complaint::PartsComplaint;
use crate::engine::complaint::PartsComplaintHandler;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::complaint_repo::PartsComplaintRepository;

/// 投诉处置结果
///
/// ResolveComplaint 的 outcome 参数: 补片完成（RESOLVED）或驳回（REJECTED）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComplaintOutcome {
    Resolved,
    Rejected,
}

// ==========================================
// ComplaintApi - 物料投诉 API
// ==========================================

/// 物料投诉API
///
/// 职责：
/// 1. 工人上报坏片/缺片投诉
/// 2. 班组长确认/补片/解决/驳回
/// 3. 投诉查询
/// 4. ActionLog记录
pub struct ComplaintApi {
    complaint_repo: Arc<PartsComplaintRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    handler: Arc<PartsComplaintHandler>,
}

impl ComplaintApi {
    /// 创建新的ComplaintApi实例
    pub fn new(
        complaint_repo: Arc<PartsComplaintRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        handler: Arc<PartsComplaintHandler>,
    ) -> Self {
        Self {
            complaint_repo,
            action_log_repo,
            handler,
        }
    }

    /// 上报投诉（立即冻结目标工序及其传递后继）
    pub fn report_complaint(
        &self,
        bundle_id: &str,
        operation_id: &str,
        damaged_parts: Vec<String>,
        description: Option<String>,
        reported_by: &str,
    ) -> ApiResult<PartsComplaint> {
        let complaint = self.handler.report(
            bundle_id,
            operation_id,
            damaged_parts,
            description,
            Some(reported_by.to_string()),
        )?;

        self.log_action(
            ActionType::ComplaintReported,
            reported_by,
            Some(bundle_id.to_string()),
            Some(operation_id.to_string()),
            Some(json!({
                "complaint_id": complaint.complaint_id,
                "reported_parts": complaint.reported_parts,
            })),
        )?;

        Ok(complaint)
    }

    /// 班组长确认投诉
    pub fn acknowledge_complaint(
        &self,
        complaint_id: &str,
        actor: &str,
    ) -> ApiResult<PartsComplaint> {
        let complaint = self.handler.acknowledge(complaint_id)?;
        self.log_advance(actor, &complaint)?;
        Ok(complaint)
    }

    /// 开始补片
    pub fn start_replacement(
        &self,
        complaint_id: &str,
        actor: &str,
    ) -> ApiResult<PartsComplaint> {
        let complaint = self.handler.start_replacement(complaint_id)?;
        self.log_advance(actor, &complaint)?;
        Ok(complaint)
    }

    /// 投诉处置收口（补片完成或驳回）
    ///
    /// 解冻不再被其他未决投诉覆盖的工序。
    pub fn resolve_complaint(
        &self,
        complaint_id: &str,
        outcome: ComplaintOutcome,
        actor: &str,
    ) -> ApiResult<PartsComplaint> {
        let (complaint, action_type) = match outcome {
            ComplaintOutcome::Resolved => {
                (self.handler.resolve(complaint_id)?, ActionType::ComplaintResolved)
            }
            ComplaintOutcome::Rejected => {
                (self.handler.reject(complaint_id)?, ActionType::ComplaintRejected)
            }
        };

        self.log_action(
            action_type,
            actor,
            Some(complaint.bundle_id.clone()),
            Some(complaint.operation_id.clone()),
            Some(json!({ "complaint_id": complaint.complaint_id })),
        )?;

        Ok(complaint)
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 查询单个投诉
    pub fn get_complaint(&self, complaint_id: &str) -> ApiResult<PartsComplaint> {
        Ok(self.complaint_repo.get_by_id(complaint_id)?)
    }

    /// 查询捆扎的未决投诉
    pub fn list_open_complaints(&self, bundle_id: &str) -> ApiResult<Vec<PartsComplaint>> {
        Ok(self.complaint_repo.find_open_by_bundle(bundle_id)?)
    }

    /// 查询捆扎的全部投诉（含已决,审计用）
    pub fn list_complaints(&self, bundle_id: &str) -> ApiResult<Vec<PartsComplaint>> {
        Ok(self.complaint_repo.list_by_bundle(bundle_id)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    fn log_advance(&self, actor: &str, complaint: &PartsComplaint) -> ApiResult<()> {
        self.log_action(
            ActionType::ComplaintAdvanced,
            actor,
            Some(complaint.bundle_id.clone()),
            Some(complaint.operation_id.clone()),
            Some(json!({
                "complaint_id": complaint.complaint_id,
                "status": complaint.status.to_db_str(),
            })),
        )
    }

    fn log_action(
        &self,
        action_type: ActionType,
        actor: &str,
        bundle_id: Option<String>,
        operation_id: Option<String>,
        payload_json: Option<serde_json::Value>,
    ) -> ApiResult<()> {
        self.action_log_repo
            .insert(&ActionLog {
                action_id: Uuid::new_v4().to_string(),
                action_type,
                action_ts: Utc::now(),
                actor: actor.to_string(),
                bundle_id,
                operation_id,
                payload_json,
                detail: None,
            })
            .map_err(ApiError::from)?;
        Ok(())
    }
}
