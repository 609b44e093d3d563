// ==========================================
// 服装车间捆扎生产与工序派工系统 - 款式模板领域模型
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART C 数据与状态体系
// 红线: 模板库为外部协作方,引擎只读,不提供模板维护接口
// ==========================================

use crate::domain::bundle::GarmentPart;
use crate::domain::types::SkillLevel;
use serde::{Deserialize, Serialize};

// ==========================================
// OperationTemplate - 工序模板条目
// ==========================================
// 用途: 建图引擎按此实例化 BundleOperation
// 红线: prerequisites 为模板内相对下标,必须构成 DAG
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationTemplate {
    pub name: String,               // 工序名（如 SHOULDER_JOIN）
    pub machine_type: String,       // 机器类型
    pub required_skill: SkillLevel, // 最低技能等级
    pub price_per_piece: f64,       // 单件计件单价
    pub standard_minutes: f64,      // 单件标准工时（SAM,分钟）
    pub prerequisites: Vec<usize>,  // 前置工序（模板内相对下标,0 起）
}

// ==========================================
// GarmentTemplate - 款式模板
// ==========================================
// 用途: 一个款式的裁片与工序全集,按声明顺序实例化
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarmentTemplate {
    pub template_id: String,              // 模板标识
    pub style_name: String,               // 款式名
    pub parts: Vec<GarmentPart>,          // 裁片清单（可为空 = 整件成衣流转）
    pub operations: Vec<OperationTemplate>, // 工序清单（有序）
}

impl GarmentTemplate {
    /// 工序数量
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }
}
