// ==========================================
// 服装车间捆扎生产与工序派工系统 - 派工单仓储
// ==========================================
// 说明: ACTIVE 派工单的创建走 BundleOperationRepository::claim_for_operator
//       的抢占事务,此仓储负责查询与关闭/释放
// ==========================================

use crate::domain::assignment::WorkAssignment;
use crate::domain::operator::OperatorWorkload;
use crate::domain::types::AssignmentStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// WorkAssignmentRepository - 派工单仓储
// ==========================================
pub struct WorkAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl WorkAssignmentRepository {
    /// 创建新的 WorkAssignmentRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询工序的 ACTIVE 派工单（至多一条,由部分唯一索引保证）
    pub fn find_active_by_operation(
        &self,
        operation_id: &str,
    ) -> RepositoryResult<Option<WorkAssignment>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT assignment_id, operation_id, operator_id, assigned_at,
                      version_token, status, closed_at
               FROM work_assignment
               WHERE operation_id = ? AND status = 'ACTIVE'"#,
            params![operation_id],
            |row| Self::map_row(row),
        ) {
            Ok(assignment) => Ok(Some(assignment)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询工人的 ACTIVE 派工单列表
    pub fn list_active_by_operator(
        &self,
        operator_id: &str,
    ) -> RepositoryResult<Vec<WorkAssignment>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT assignment_id, operation_id, operator_id, assigned_at,
                      version_token, status, closed_at
               FROM work_assignment
               WHERE operator_id = ? AND status = 'ACTIVE'
               ORDER BY assigned_at"#,
        )?;

        let assignments = stmt
            .query_map(params![operator_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<WorkAssignment>, _>>()?;

        Ok(assignments)
    }

    /// 关闭/释放工序的 ACTIVE 派工单
    ///
    /// # 参数
    /// - `operation_id`: 工序
    /// - `final_status`: CLOSED（完工）或 RELEASED（质检失败/取消）
    ///
    /// # 返回
    /// - Ok(true): 存在 ACTIVE 派工单并已关闭
    /// - Ok(false): 无 ACTIVE 派工单（幂等,不视为错误）
    pub fn close_active(
        &self,
        operation_id: &str,
        final_status: AssignmentStatus,
    ) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE work_assignment
               SET status = ?, closed_at = ?
               WHERE operation_id = ? AND status = 'ACTIVE'"#,
            params![
                final_status.to_db_str(),
                format_ts(&Utc::now()),
                operation_id,
            ],
        )?;

        Ok(rows_affected > 0)
    }

    /// 统计工人在产负荷（ACTIVE 派工单数 + 派工件数合计）
    pub fn get_workload(&self, operator_id: &str) -> RepositoryResult<OperatorWorkload> {
        let conn = self.get_conn()?;

        let (count, pieces): (i32, i32) = conn.query_row(
            r#"SELECT COUNT(*), COALESCE(SUM(bo.assigned_pieces), 0)
               FROM work_assignment wa
               JOIN bundle_operation bo ON bo.operation_id = wa.operation_id
               WHERE wa.operator_id = ? AND wa.status = 'ACTIVE'"#,
            params![operator_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        Ok(OperatorWorkload {
            operator_id: operator_id.to_string(),
            active_assignments: count,
            assigned_pieces: pieces,
        })
    }

    /// 映射数据库行到 WorkAssignment 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<WorkAssignment> {
        let status_str: String = row.get(5)?;
        let closed_at: Option<String> = row.get(6)?;
        Ok(WorkAssignment {
            assignment_id: row.get(0)?,
            operation_id: row.get(1)?,
            operator_id: row.get(2)?,
            assigned_at: parse_ts(3, &row.get::<_, String>(3)?)?,
            version_token: row.get(4)?,
            status: AssignmentStatus::from_str(&status_str),
            closed_at: match closed_at {
                Some(raw) => Some(parse_ts(6, &raw)?),
                None => None,
            },
        })
    }
}
