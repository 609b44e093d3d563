// ==========================================
// 服装车间捆扎生产与工序派工系统 - 操作日志领域模型
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART A 审计要求
// 红线: 所有人工/工人写操作必须记录
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 用途: 审计追踪（谁在何时对哪个捆扎/工序做了什么）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,            // 日志标识（UUID）
    pub action_type: ActionType,      // 操作类型
    pub action_ts: DateTime<Utc>,     // 操作时间戳
    pub actor: String,                // 操作人（班组长工号/工人工号/系统标识）
    pub bundle_id: Option<String>,    // 关联捆扎
    pub operation_id: Option<String>, // 关联工序
    pub payload_json: Option<JsonValue>, // 操作参数（JSON）
    pub detail: Option<String>,       // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    RollRecorded,       // 录入面料卷
    SizesAllocated,     // 尺码分配
    BundlesCreated,     // 创建捆扎
    CuttingStarted,     // 开裁
    CuttingCompleted,   // 裁剪完成
    BundleHeld,         // 捆扎挂起
    BundleResumed,      // 捆扎恢复
    BundleCancelled,    // 捆扎取消
    OperationAssigned,  // 工序派工
    OperationStarted,   // 工序开工
    OperationCompleted, // 工序完工
    OperationFailed,    // 工序质检失败
    OperationSkipped,   // 工序跳过
    OperationRequeued,  // 失败工序重排
    ComplaintReported,  // 投诉上报
    ComplaintAdvanced,  // 投诉状态推进
    ComplaintResolved,  // 投诉解决
    ComplaintRejected,  // 投诉驳回
}

impl ActionType {
    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionType::RollRecorded => "ROLL_RECORDED",
            ActionType::SizesAllocated => "SIZES_ALLOCATED",
            ActionType::BundlesCreated => "BUNDLES_CREATED",
            ActionType::CuttingStarted => "CUTTING_STARTED",
            ActionType::CuttingCompleted => "CUTTING_COMPLETED",
            ActionType::BundleHeld => "BUNDLE_HELD",
            ActionType::BundleResumed => "BUNDLE_RESUMED",
            ActionType::BundleCancelled => "BUNDLE_CANCELLED",
            ActionType::OperationAssigned => "OPERATION_ASSIGNED",
            ActionType::OperationStarted => "OPERATION_STARTED",
            ActionType::OperationCompleted => "OPERATION_COMPLETED",
            ActionType::OperationFailed => "OPERATION_FAILED",
            ActionType::OperationSkipped => "OPERATION_SKIPPED",
            ActionType::OperationRequeued => "OPERATION_REQUEUED",
            ActionType::ComplaintReported => "COMPLAINT_REPORTED",
            ActionType::ComplaintAdvanced => "COMPLAINT_ADVANCED",
            ActionType::ComplaintResolved => "COMPLAINT_RESOLVED",
            ActionType::ComplaintRejected => "COMPLAINT_REJECTED",
        }
    }

    /// 从字符串解析操作类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ROLL_RECORDED" => Some(ActionType::RollRecorded),
            "SIZES_ALLOCATED" => Some(ActionType::SizesAllocated),
            "BUNDLES_CREATED" => Some(ActionType::BundlesCreated),
            "CUTTING_STARTED" => Some(ActionType::CuttingStarted),
            "CUTTING_COMPLETED" => Some(ActionType::CuttingCompleted),
            "BUNDLE_HELD" => Some(ActionType::BundleHeld),
            "BUNDLE_RESUMED" => Some(ActionType::BundleResumed),
            "BUNDLE_CANCELLED" => Some(ActionType::BundleCancelled),
            "OPERATION_ASSIGNED" => Some(ActionType::OperationAssigned),
            "OPERATION_STARTED" => Some(ActionType::OperationStarted),
            "OPERATION_COMPLETED" => Some(ActionType::OperationCompleted),
            "OPERATION_FAILED" => Some(ActionType::OperationFailed),
            "OPERATION_SKIPPED" => Some(ActionType::OperationSkipped),
            "OPERATION_REQUEUED" => Some(ActionType::OperationRequeued),
            "COMPLAINT_REPORTED" => Some(ActionType::ComplaintReported),
            "COMPLAINT_ADVANCED" => Some(ActionType::ComplaintAdvanced),
            "COMPLAINT_RESOLVED" => Some(ActionType::ComplaintResolved),
            "COMPLAINT_REJECTED" => Some(ActionType::ComplaintRejected),
            _ => None,
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
