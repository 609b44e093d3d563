// ==========================================
// 服装车间捆扎生产与工序派工系统 - 捆扎领域模型
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART C 数据与状态体系
// 红线: bundle_operation 只属于所在捆扎,依赖只引用同捆兄弟工序
// ==========================================

use crate::domain::types::{BundleStatus, OperationStatus, QualityGrade, SkillLevel};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 整件成衣的虚拟裁片名（模板未声明裁片时使用）
pub const WHOLE_GARMENT_PART: &str = "WHOLE_GARMENT";

// ==========================================
// FabricRoll - 面料卷
// ==========================================
// 红线: 录入后不可变,仅作为裁剪输入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FabricRoll {
    pub roll_id: String,              // 面料卷唯一标识
    pub lot_id: String,               // 裁床批次号
    pub color: String,                // 颜色
    pub weight_kg: Option<f64>,       // 重量（kg）
    pub layer_count: i32,             // 拉布层数
    pub recorded_by: Option<String>,  // 录入人
    pub created_at: DateTime<Utc>,    // 录入时间
}

// ==========================================
// SizeAllocation - 尺码分配
// ==========================================
// 用途: RatioAllocator 输出,分捆输入
// 红线: 各尺码分配量之和 == 总层数,余数全部落在最后一个尺码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeAllocation {
    pub size: String,             // 尺码标签（如 L / XL / 2XL）
    pub ratio_weight: i64,        // 配比权重（正整数）
    pub allocated_quantity: i64,  // 分配数量（件）
}

// ==========================================
// ProductionBundle - 生产捆扎
// ==========================================
// 用途: 分捆引擎一次性创建,此后状态由生命周期状态机独占修改
// 红线: quantity 不超过配置的最大捆扎件数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionBundle {
    // ===== 主键与归属 =====
    pub bundle_id: String,            // 捆扎唯一标识（UUID）
    pub lot_id: String,               // 裁床批次号
    pub color: String,                // 颜色
    pub size: String,                 // 尺码
    pub part_name: String,            // 裁片名（整件成衣为 WHOLE_GARMENT）
    pub bundle_no: i32,               // 同 (批次,颜色,尺码,裁片) 内的确定性序号,从 1 起

    // ===== 数量与模板 =====
    pub quantity: i32,                // 捆内件数
    pub template_id: String,          // 款式模板标识（模板库为外部协作方,此处仅引用）

    // ===== 状态 =====
    pub status: BundleStatus,         // 捆扎状态
    pub held_from: Option<BundleStatus>, // 挂起前状态（恢复时回填,仅 ON_HOLD 期间非空）

    // ===== 并发控制 =====
    pub revision: i32,                // 乐观锁修订号

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,    // 创建时间
    pub updated_at: DateTime<Utc>,    // 最后更新时间
}

// ==========================================
// BundleOperation - 捆扎工序
// ==========================================
// 用途: 建图引擎按模板实例化,依赖为同捆工序 id 集合
// 红线: completed_pieces <= assigned_pieces <= bundle.quantity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleOperation {
    // ===== 主键与归属 =====
    pub operation_id: String,         // 工序唯一标识（UUID）
    pub bundle_id: String,            // 所属捆扎
    pub sequence: i32,                // 模板内顺序号,从 1 起

    // ===== 工艺要求 =====
    pub name: String,                 // 工序名（如 SHOULDER_JOIN）
    pub machine_type: String,         // 机器类型（如 OVERLOCK / FLATLOCK）
    pub required_skill: SkillLevel,   // 最低技能等级
    pub price_per_piece: f64,         // 单件计件单价
    pub standard_minutes: f64,        // 单件标准工时（SAM,分钟）

    // ===== 依赖 =====
    pub dependencies: Vec<String>,    // 前置工序 id（仅同捆兄弟工序）

    // ===== 状态 =====
    pub status: OperationStatus,      // 工序状态
    pub frozen_from: Option<OperationStatus>, // 冻结前状态（解冻时回填,仅 FROZEN 期间非空）

    // ===== 派工与完工 =====
    pub assigned_operator_id: Option<String>, // 当前派工工人
    pub assigned_pieces: i32,         // 派工件数（派工时取捆内件数）
    pub completed_pieces: i32,        // 完成件数
    pub quality_grade: Option<QualityGrade>, // 质检等级（完工/质检失败时记录）
    pub superseded_by: Option<String>, // 质检失败重排后的替代工序 id（被替代的失败实例不再阻塞捆扎完工）

    // ===== 并发控制 =====
    pub revision: i32,                // 乐观锁修订号

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,    // 创建时间
    pub updated_at: DateTime<Utc>,    // 最后更新时间
}

impl BundleOperation {
    /// 是否处于可派工状态
    pub fn is_assignable(&self) -> bool {
        self.status == OperationStatus::Ready
    }
}

// ==========================================
// GarmentPart - 裁片定义
// ==========================================
// 来源: 款式模板（外部协作方）,引擎只读
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GarmentPart {
    pub name: String,                   // 裁片名（如 FRONT_PANEL）
    pub quantity_per_garment: i32,      // 单件成衣所需片数
    pub cutting_minutes_per_piece: f64, // 单片裁剪工时（分钟）
}

// ==========================================
// BundleProgress - 捆扎进度汇总
// ==========================================
// 用途: 看板/查询接口的聚合输出
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleProgress {
    pub bundle_id: String,
    pub status: BundleStatus,         // 捆扎状态
    pub total_operations: i32,        // 工序总数
    pub waiting: i32,
    pub ready: i32,
    pub assigned: i32,
    pub in_progress: i32,
    pub frozen: i32,
    pub completed: i32,
    pub quality_failed: i32,
    pub skipped: i32,
    pub completion_pct: f64,          // 完成率 = (completed + skipped) / total
}
