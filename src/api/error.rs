// ==========================================
// 服装车间捆扎生产与工序派工系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型,转换引擎/仓储错误为用户可读的错误消息
// 红线: 错误分类保持类型化,调用方可按变体分支处理
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 建捆阶段错误
    // ==========================================
    /// 尺码配比无效（权重数不匹配/权重非正/总层数为负）
    #[error("尺码配比无效: {0}")]
    InvalidRatio(String),

    /// 工序模板图无效（成环/下标越界/空模板）
    #[error("工序模板图无效: {0}")]
    TemplateGraph(String),

    // ==========================================
    // 状态机错误
    // ==========================================
    #[error("非法状态转换: {entity} id={id}, from={from} to={to}")]
    IllegalTransition {
        entity: String,
        id: String,
        from: String,
        to: String,
    },

    // ==========================================
    // 派工错误
    // ==========================================
    /// 并发冲突: 工序已被他人派工（可在重读后重试）
    #[error("工序已被派工: operation_id={operation_id}, 当前工人={operator_id}")]
    AlreadyAssigned {
        operation_id: String,
        operator_id: String,
    },

    /// 业务条件: 无满足阈值的工人（不是故障）
    #[error("无可匹配工人: operation_id={operation_id}, 最高得分={best_score}, 阈值={min_score}")]
    NoCompatibleOperator {
        operation_id: String,
        best_score: i32,
        min_score: i32,
    },

    // ==========================================
    // 投诉冻结错误
    // ==========================================
    #[error("工序被物料投诉冻结: operation_id={operation_id}, complaint_id={complaint_id}")]
    ComplaintBlocking {
        operation_id: String,
        complaint_id: String,
    },

    // ==========================================
    // 完工结算错误
    // ==========================================
    #[error("工序已完工,不可重复结算: operation_id={0}")]
    AlreadyCompleted(String),

    #[error("完成数量超过派工数量: operation_id={operation_id}, completed={completed}, assigned={assigned}")]
    CapacityExceeded {
        operation_id: String,
        completed: i32,
        assigned: i32,
    },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("乐观锁冲突: {0}")]
    OptimisticLockFailure(String),

    #[error("版本冲突: {0}")]
    VersionConflict(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将仓储层的技术错误转换为用户可读的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                entity,
                id,
                expected,
                actual,
            } => ApiError::OptimisticLockFailure(format!(
                "{}(id={})已被其他用户修改（期望revision={}，实际revision={}）",
                entity, id, expected, actual
            )),
            RepositoryError::VersionConflict { message } => ApiError::VersionConflict(message),

            // 数据库错误
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 业务规则错误
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),

            // 数据质量错误
            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// 目的: 引擎层的类型化错误原样透出,调用方可按变体分支
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::InvalidRatio(msg) => ApiError::InvalidRatio(msg),
            EngineError::TemplateGraph(msg) => ApiError::TemplateGraph(msg),
            EngineError::IllegalTransition {
                entity,
                id,
                from,
                to,
            } => ApiError::IllegalTransition {
                entity,
                id,
                from,
                to,
            },
            EngineError::AlreadyAssigned {
                operation_id,
                operator_id,
            } => ApiError::AlreadyAssigned {
                operation_id,
                operator_id,
            },
            EngineError::NoCompatibleOperator {
                operation_id,
                best_score,
                min_score,
            } => ApiError::NoCompatibleOperator {
                operation_id,
                best_score,
                min_score,
            },
            EngineError::ComplaintBlocking {
                operation_id,
                complaint_id,
            } => ApiError::ComplaintBlocking {
                operation_id,
                complaint_id,
            },
            EngineError::AlreadyCompleted(operation_id) => {
                ApiError::AlreadyCompleted(operation_id)
            }
            EngineError::CapacityExceeded {
                operation_id,
                completed,
                assigned,
            } => ApiError::CapacityExceeded {
                operation_id,
                completed,
                assigned,
            },
            EngineError::Validation(msg) => ApiError::ValidationError(msg),
            EngineError::Repository(repo_err) => repo_err.into(),
            EngineError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
