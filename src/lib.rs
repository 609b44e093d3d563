// ==========================================
// 服装车间捆扎生产与工序派工系统 - 核心库
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 系统宪法
// 技术栈: Rust + SQLite
// 系统定位: 生产执行引擎 (捆扎生命周期 + 工序派工)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AssignmentStatus, BundleStatus, ComplaintStatus, OperationStatus, OperatorStatus,
    QualityGrade, SkillLevel,
};

// 领域实体
pub use domain::{
    ActionLog, ActionType, BundleOperation, EarningsRecord, FabricRoll, GarmentPart,
    GarmentTemplate, OperationTemplate, OperatorSnapshot, PartsComplaint, ProductionBundle,
    SizeAllocation, WorkAssignment,
};

// 引擎
pub use engine::{
    AssignmentMatcher, BundleChunker, EarningsCalculator, LifecycleStateMachine,
    OperationGraphBuilder, PartsComplaintHandler, RatioAllocator,
};

// 引擎错误
pub use engine::error::{EngineError, EngineResult};

// API
pub use api::{AssignmentApi, BundleApi, ComplaintApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "服装车间捆扎生产与工序派工系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
