// ==========================================
// 服装车间捆扎生产与工序派工系统 - 物料投诉领域模型
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART C 数据与状态体系
// 红线: 未决投诉冻结目标工序及其全部传递后继
// ==========================================

use crate::domain::types::ComplaintStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// PartsComplaint - 物料投诉
// ==========================================
// 用途: 工人上报坏片/缺片,投诉处理引擎驱动状态流转
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartsComplaint {
    pub complaint_id: String,         // 投诉标识（UUID）
    pub bundle_id: String,            // 所属捆扎
    pub operation_id: String,         // 目标工序
    pub status: ComplaintStatus,      // 投诉状态
    pub reported_parts: Vec<String>,  // 受损/缺失裁片名列表
    pub description: Option<String>,  // 描述
    pub reported_by: Option<String>,  // 上报人
    pub created_at: DateTime<Utc>,    // 上报时间
    pub updated_at: DateTime<Utc>,    // 最后更新时间
}

impl PartsComplaint {
    /// 是否未决（未决期间相关工序冻结）
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }
}
