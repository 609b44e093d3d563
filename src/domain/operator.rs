// ==========================================
// 服装车间捆扎生产与工序派工系统 - 工人快照领域模型
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART C 数据与状态体系
// 红线: 花名册归外部工人注册表所有,引擎只在派工时读取快照,不落库
// ==========================================

use crate::domain::types::{OperatorStatus, SkillLevel};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ==========================================
// OperatorSnapshot - 工人快照
// ==========================================
// 用途: 派工引擎评分输入（匹配时刻的只读快照）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSnapshot {
    pub operator_id: String,            // 工号
    pub name: Option<String>,           // 姓名（展示用,可缺省）
    pub machine_types: HashSet<String>, // 可操作机器类型集合
    pub skill_level: SkillLevel,        // 技能等级
    pub efficiency_pct: f64,            // 效率（100.0 = 标准工时持平）
    pub quality_score: f64,             // 质量得分（0-100）
    pub current_workload: i32,          // 当前在产派工数
    pub status: OperatorStatus,         // 当前状态
}

impl OperatorSnapshot {
    /// 是否可操作指定机器类型
    pub fn can_operate(&self, machine_type: &str) -> bool {
        self.machine_types.contains(machine_type)
    }
}

// ==========================================
// OperatorWorkload - 工人在产负荷
// ==========================================
// 用途: 派工看板的聚合输出（由本系统的派工单统计,区别于快照中的花名册口径）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorWorkload {
    pub operator_id: String,
    pub active_assignments: i32, // 有效派工单数
    pub assigned_pieces: i32,    // 在产派工件数合计
}
