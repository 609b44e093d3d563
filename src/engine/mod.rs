// ==========================================
// 服装车间捆扎生产与工序派工系统 - 引擎层
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART D 引擎体系
// ==========================================
// 职责: 实现业务规则引擎
// 红线: 状态转换合法性只在生命周期状态机集中裁决
// 红线: 所有失败以类型化错误返回调用方,不吞错、不静默补偿
// ==========================================

pub mod assignment;
pub mod bundle_chunker;
pub mod complaint;
pub mod earnings;
pub mod error;
pub mod events;
pub mod lifecycle;
pub mod operation_graph;
pub mod ratio_allocator;

// 重导出核心引擎
pub use assignment::AssignmentMatcher;
pub use bundle_chunker::BundleChunker;
pub use complaint::PartsComplaintHandler;
pub use earnings::EarningsCalculator;
pub use error::{EngineError, EngineResult};
pub use events::{
    BundleEvent, BundleEventPublisher, BundleEventType, NoOpEventPublisher,
    OptionalEventPublisher,
};
pub use lifecycle::LifecycleStateMachine;
pub use operation_graph::OperationGraphBuilder;
pub use ratio_allocator::RatioAllocator;
