// ==========================================
// 服装车间捆扎生产与工序派工系统 - 领域类型定义
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART C 数据与状态体系
// 红线: 状态为封闭枚举,不用松散字符串
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 捆扎状态 (Bundle Status)
// ==========================================
// 主线: DRAFT → CUTTING → READY → IN_PROGRESS → COMPLETED
// 支线: 任意非终态 → ON_HOLD → 原状态 (可恢复)
// 终止: IN_PROGRESS → CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BundleStatus {
    Draft,      // 草稿（分捆完成,未开裁）
    Cutting,    // 裁剪中
    Ready,      // 裁剪完成,可派工
    InProgress, // 生产中
    OnHold,     // 挂起
    Completed,  // 完工
    Cancelled,  // 已取消
}

impl BundleStatus {
    /// 是否终态（终态不可再转换）
    pub fn is_terminal(&self) -> bool {
        matches!(self, BundleStatus::Completed | BundleStatus::Cancelled)
    }

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DRAFT" => BundleStatus::Draft,
            "CUTTING" => BundleStatus::Cutting,
            "READY" => BundleStatus::Ready,
            "IN_PROGRESS" => BundleStatus::InProgress,
            "ON_HOLD" => BundleStatus::OnHold,
            "COMPLETED" => BundleStatus::Completed,
            "CANCELLED" => BundleStatus::Cancelled,
            _ => BundleStatus::Draft, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BundleStatus::Draft => "DRAFT",
            BundleStatus::Cutting => "CUTTING",
            BundleStatus::Ready => "READY",
            BundleStatus::InProgress => "IN_PROGRESS",
            BundleStatus::OnHold => "ON_HOLD",
            BundleStatus::Completed => "COMPLETED",
            BundleStatus::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 工序状态 (Operation Status)
// ==========================================
// 主线: WAITING → READY → ASSIGNED → IN_PROGRESS → COMPLETED
// 冻结: READY|ASSIGNED → FROZEN → 原状态 (由投诉处理驱动)
// 质检: IN_PROGRESS → QUALITY_FAILED (终态,重做以新工序实例落地)
// 跳过: WAITING|READY → SKIPPED (人工决定,终态)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Waiting,       // 等待前置工序
    Ready,         // 可派工
    Assigned,      // 已派工
    InProgress,    // 生产中
    Frozen,        // 物料投诉冻结
    Completed,     // 完工
    QualityFailed, // 质检失败
    Skipped,       // 已跳过
}

impl OperationStatus {
    /// 是否终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OperationStatus::Completed | OperationStatus::QualityFailed | OperationStatus::Skipped
        )
    }

    /// 是否视为“前置已满足”（完工或人工跳过均放行后续工序）
    pub fn satisfies_dependency(&self) -> bool {
        matches!(self, OperationStatus::Completed | OperationStatus::Skipped)
    }

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "WAITING" => OperationStatus::Waiting,
            "READY" => OperationStatus::Ready,
            "ASSIGNED" => OperationStatus::Assigned,
            "IN_PROGRESS" => OperationStatus::InProgress,
            "FROZEN" => OperationStatus::Frozen,
            "COMPLETED" => OperationStatus::Completed,
            "QUALITY_FAILED" => OperationStatus::QualityFailed,
            "SKIPPED" => OperationStatus::Skipped,
            _ => OperationStatus::Waiting, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OperationStatus::Waiting => "WAITING",
            OperationStatus::Ready => "READY",
            OperationStatus::Assigned => "ASSIGNED",
            OperationStatus::InProgress => "IN_PROGRESS",
            OperationStatus::Frozen => "FROZEN",
            OperationStatus::Completed => "COMPLETED",
            OperationStatus::QualityFailed => "QUALITY_FAILED",
            OperationStatus::Skipped => "SKIPPED",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 物料投诉状态 (Complaint Status)
// ==========================================
// 主线: REPORTED → ACKNOWLEDGED → REPLACING → RESOLVED
// 支线: 任意未决状态 → REJECTED
// 未决 (REPORTED/ACKNOWLEDGED/REPLACING) 期间相关工序冻结
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    Reported,     // 已上报
    Acknowledged, // 已确认
    Replacing,    // 补片中
    Resolved,     // 已解决
    Rejected,     // 已驳回
}

impl ComplaintStatus {
    /// 是否未决（未决投诉冻结相关工序）
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            ComplaintStatus::Reported | ComplaintStatus::Acknowledged | ComplaintStatus::Replacing
        )
    }

    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "REPORTED" => ComplaintStatus::Reported,
            "ACKNOWLEDGED" => ComplaintStatus::Acknowledged,
            "REPLACING" => ComplaintStatus::Replacing,
            "RESOLVED" => ComplaintStatus::Resolved,
            "REJECTED" => ComplaintStatus::Rejected,
            _ => ComplaintStatus::Reported, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Reported => "REPORTED",
            ComplaintStatus::Acknowledged => "ACKNOWLEDGED",
            ComplaintStatus::Replacing => "REPLACING",
            ComplaintStatus::Resolved => "RESOLVED",
            ComplaintStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 工人状态 (Operator Status)
// ==========================================
// 来源: 工人花名册（外部协作方）,引擎只读快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatorStatus {
    Available, // 空闲可派
    Busy,      // 在产
    OnLeave,   // 请假
}

impl OperatorStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "AVAILABLE" => OperatorStatus::Available,
            "BUSY" => OperatorStatus::Busy,
            "ON_LEAVE" => OperatorStatus::OnLeave,
            _ => OperatorStatus::OnLeave, // 默认值（未知状态不派工）
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OperatorStatus::Available => "AVAILABLE",
            OperatorStatus::Busy => "BUSY",
            OperatorStatus::OnLeave => "ON_LEAVE",
        }
    }
}

impl fmt::Display for OperatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 技能等级 (Skill Level)
// ==========================================
// 红线: 等级制,可比较 (JUNIOR < INTERMEDIATE < SENIOR < EXPERT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillLevel {
    Junior,       // 初级
    Intermediate, // 中级
    Senior,       // 高级
    Expert,       // 技师
}

impl SkillLevel {
    /// 从字符串解析技能等级
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "JUNIOR" => SkillLevel::Junior,
            "INTERMEDIATE" => SkillLevel::Intermediate,
            "SENIOR" => SkillLevel::Senior,
            "EXPERT" => SkillLevel::Expert,
            _ => SkillLevel::Junior, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            SkillLevel::Junior => "JUNIOR",
            SkillLevel::Intermediate => "INTERMEDIATE",
            SkillLevel::Senior => "SENIOR",
            SkillLevel::Expert => "EXPERT",
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 质检等级 (Quality Grade)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityGrade {
    A, // 合格
    B, // 轻微瑕疵
    C, // 返修
}

impl QualityGrade {
    /// 从字符串解析质检等级
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "A" => Some(QualityGrade::A),
            "B" => Some(QualityGrade::B),
            "C" => Some(QualityGrade::C),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            QualityGrade::A => "A",
            QualityGrade::B => "B",
            QualityGrade::C => "C",
        }
    }
}

impl fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 派工单状态 (Assignment Status)
// ==========================================
// ACTIVE: 当前有效（同一工序至多一条）
// RELEASED: 质检失败/取消后释放
// CLOSED: 工序完工正常关闭
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignmentStatus {
    Active,   // 有效
    Released, // 已释放
    Closed,   // 已关闭
}

impl AssignmentStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ACTIVE" => AssignmentStatus::Active,
            "RELEASED" => AssignmentStatus::Released,
            "CLOSED" => AssignmentStatus::Closed,
            _ => AssignmentStatus::Closed, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Active => "ACTIVE",
            AssignmentStatus::Released => "RELEASED",
            AssignmentStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
