// ==========================================
// 服装车间捆扎生产与工序派工系统 - 物料投诉仓储
// ==========================================

use crate::domain::complaint::PartsComplaint;
use crate::domain::types::ComplaintStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// PartsComplaintRepository - 物料投诉仓储
// ==========================================
pub struct PartsComplaintRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PartsComplaintRepository {
    /// 创建新的 PartsComplaintRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建投诉
    pub fn create(&self, complaint: &PartsComplaint) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO parts_complaint (
                complaint_id, bundle_id, operation_id, status, reported_parts,
                description, reported_by, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &complaint.complaint_id,
                &complaint.bundle_id,
                &complaint.operation_id,
                complaint.status.to_db_str(),
                serde_json::to_string(&complaint.reported_parts)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                &complaint.description,
                &complaint.reported_by,
                format_ts(&complaint.created_at),
                format_ts(&complaint.updated_at),
            ],
        )?;

        Ok(complaint.complaint_id.clone())
    }

    /// 按 complaint_id 查询投诉（不存在即 NotFound）
    pub fn get_by_id(&self, complaint_id: &str) -> RepositoryResult<PartsComplaint> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE complaint_id = ?", Self::SELECT_BASE),
            params![complaint_id],
            |row| Self::map_row(row),
        ) {
            Ok(complaint) => Ok(complaint),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(RepositoryError::NotFound {
                entity: "PartsComplaint".to_string(),
                id: complaint_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// 更新投诉状态
    pub fn update_status(
        &self,
        complaint_id: &str,
        status: ComplaintStatus,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            "UPDATE parts_complaint SET status = ?, updated_at = ? WHERE complaint_id = ?",
            params![status.to_db_str(), format_ts(&Utc::now()), complaint_id],
        )?;

        if rows_affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "PartsComplaint".to_string(),
                id: complaint_id.to_string(),
            });
        }

        Ok(())
    }

    /// 查询直接针对某工序的未决投诉
    pub fn find_open_by_operation(
        &self,
        operation_id: &str,
    ) -> RepositoryResult<Vec<PartsComplaint>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE operation_id = ? AND status IN ('REPORTED', 'ACKNOWLEDGED', 'REPLACING') ORDER BY created_at",
            Self::SELECT_BASE
        ))?;

        let complaints = stmt
            .query_map(params![operation_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<PartsComplaint>, _>>()?;

        Ok(complaints)
    }

    /// 查询捆扎内全部未决投诉
    pub fn find_open_by_bundle(&self, bundle_id: &str) -> RepositoryResult<Vec<PartsComplaint>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE bundle_id = ? AND status IN ('REPORTED', 'ACKNOWLEDGED', 'REPLACING') ORDER BY created_at",
            Self::SELECT_BASE
        ))?;

        let complaints = stmt
            .query_map(params![bundle_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<PartsComplaint>, _>>()?;

        Ok(complaints)
    }

    /// 查询捆扎内全部投诉（含已决,审计用）
    pub fn list_by_bundle(&self, bundle_id: &str) -> RepositoryResult<Vec<PartsComplaint>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE bundle_id = ? ORDER BY created_at",
            Self::SELECT_BASE
        ))?;

        let complaints = stmt
            .query_map(params![bundle_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<PartsComplaint>, _>>()?;

        Ok(complaints)
    }

    const SELECT_BASE: &'static str = r#"SELECT complaint_id, bundle_id, operation_id, status, reported_parts,
               description, reported_by, created_at, updated_at
        FROM parts_complaint"#;

    /// 映射数据库行到 PartsComplaint 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<PartsComplaint> {
        let status_str: String = row.get(3)?;
        let parts_raw: String = row.get(4)?;
        let reported_parts: Vec<String> = serde_json::from_str(&parts_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(PartsComplaint {
            complaint_id: row.get(0)?,
            bundle_id: row.get(1)?,
            operation_id: row.get(2)?,
            status: ComplaintStatus::from_str(&status_str),
            reported_parts,
            description: row.get(5)?,
            reported_by: row.get(6)?,
            created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
            updated_at: parse_ts(8, &row.get::<_, String>(8)?)?,
        })
    }
}
