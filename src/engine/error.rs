// ==========================================
// 服装车间捆扎生产与工序派工系统 - 引擎层错误类型
// ==========================================
// 红线: 所有失败以类型化错误返回调用方,不吞错、不静默补偿
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    // ===== 结构性错误（建捆阶段） =====
    #[error("尺码配比无效: {0}")]
    InvalidRatio(String),

    #[error("工序模板图无效: {0}")]
    TemplateGraph(String),

    // ===== 状态机错误 =====
    #[error("非法状态转换: {entity} id={id}, from={from} to={to}")]
    IllegalTransition {
        entity: String,
        id: String,
        from: String,
        to: String,
    },

    // ===== 派工错误 =====
    #[error("工序已被派工: operation_id={operation_id}, 当前工人={operator_id}")]
    AlreadyAssigned {
        operation_id: String,
        operator_id: String,
    },

    #[error("无可匹配工人: operation_id={operation_id}, 最高得分={best_score}, 阈值={min_score}")]
    NoCompatibleOperator {
        operation_id: String,
        best_score: i32,
        min_score: i32,
    },

    // ===== 投诉冻结 =====
    #[error("工序被物料投诉冻结: operation_id={operation_id}, complaint_id={complaint_id}")]
    ComplaintBlocking {
        operation_id: String,
        complaint_id: String,
    },

    // ===== 完工结算 =====
    #[error("工序已完工,不可重复结算: operation_id={0}")]
    AlreadyCompleted(String),

    #[error("完成数量超过派工数量: operation_id={operation_id}, completed={completed}, assigned={assigned}")]
    CapacityExceeded {
        operation_id: String,
        completed: i32,
        assigned: i32,
    },

    // ===== 数据校验 =====
    #[error("数据验证失败: {0}")]
    Validation(String),

    // ===== 透传 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
