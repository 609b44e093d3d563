// ==========================================
// 服装车间捆扎生产与工序派工系统 - 数据仓储层
// ==========================================
// 职责: SQLite 数据访问,乐观锁并发控制
// 红线: 仓储不做业务判定,状态转换合法性归引擎层
// ==========================================

pub mod action_log_repo;
pub mod assignment_repo;
pub mod bundle_repo;
pub mod complaint_repo;
pub mod earnings_repo;
pub mod error;
pub mod fabric_repo;
pub mod operation_repo;

// 重导出核心类型
pub use action_log_repo::ActionLogRepository;
pub use assignment_repo::WorkAssignmentRepository;
pub use bundle_repo::ProductionBundleRepository;
pub use complaint_repo::PartsComplaintRepository;
pub use earnings_repo::EarningsRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use fabric_repo::FabricRepository;
pub use operation_repo::{BundleOperationRepository, ClaimOutcome};

use chrono::{DateTime, NaiveDateTime, Utc};

/// 数据库时间戳格式（与 schema 的 datetime('now') 对齐）
pub(crate) const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 格式化时间戳为数据库字符串
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.format(TS_FORMAT).to_string()
}

/// 从数据库字符串解析时间戳
pub(crate) fn parse_ts(col: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT)
        .map(|ndt| ndt.and_utc())
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(col, rusqlite::types::Type::Text, Box::new(e))
        })
}
