// ==========================================
// 服装车间捆扎生产与工序派工系统 - 派工与计件领域模型
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART C 数据与状态体系
// 红线: 同一工序至多一条 ACTIVE 派工单（派工原子性）
// 红线: 计件记录一经生成不可变,一个工序至多一条（防重复结算）
// ==========================================

use crate::domain::types::{AssignmentStatus, QualityGrade};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// WorkAssignment - 派工单
// ==========================================
// 用途: 工序与工人的绑定记录,创建即“锁”
// version_token: 抢占成功时工序的 revision,用于审计与冲突诊断
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkAssignment {
    pub assignment_id: String,        // 派工单标识（UUID）
    pub operation_id: String,         // 工序
    pub operator_id: String,          // 工人
    pub assigned_at: DateTime<Utc>,   // 派工时间
    pub version_token: i32,           // 抢占成功时的工序修订号
    pub status: AssignmentStatus,     // 派工单状态
    pub closed_at: Option<DateTime<Utc>>, // 关闭/释放时间
}

// ==========================================
// EarningsRecord - 计件工资记录
// ==========================================
// 用途: 工序完工时由计件引擎一次性生成
// 红线: amount == completed_pieces * price_per_piece,不可二次结算
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsRecord {
    pub earnings_id: String,          // 记录标识（UUID）
    pub operation_id: String,         // 工序（唯一）
    pub bundle_id: String,            // 所属捆扎
    pub operator_id: String,          // 结算工人
    pub completed_pieces: i32,        // 完成件数
    pub price_per_piece: f64,         // 单件计件单价
    pub amount: f64,                  // 结算金额
    pub quality_grade: Option<QualityGrade>, // 质检等级
    pub settled_at: DateTime<Utc>,    // 结算时间
}

// ==========================================
// OperatorEarningsSummary - 工人计件汇总
// ==========================================
// 用途: 计件工资单查询接口的聚合输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorEarningsSummary {
    pub operator_id: String,
    pub record_count: i32,   // 结算笔数
    pub total_pieces: i32,   // 完成件数合计
    pub total_amount: f64,   // 结算金额合计
}
