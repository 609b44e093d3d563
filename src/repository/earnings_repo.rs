// ==========================================
// 服装车间捆扎生产与工序派工系统 - 计件工资仓储
// ==========================================
// 红线: operation_id 唯一约束兜底“一个工序至多一条结算”
// ==========================================

use crate::domain::assignment::{EarningsRecord, OperatorEarningsSummary};
use crate::domain::types::QualityGrade;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// EarningsRepository - 计件工资仓储
// ==========================================
pub struct EarningsRepository {
    conn: Arc<Mutex<Connection>>,
}

impl EarningsRepository {
    /// 创建新的 EarningsRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入计件记录（同工序第二次写入触发唯一约束违反）
    pub fn insert(&self, record: &EarningsRecord) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO earnings_record (
                earnings_id, operation_id, bundle_id, operator_id,
                completed_pieces, price_per_piece, amount, quality_grade, settled_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &record.earnings_id,
                &record.operation_id,
                &record.bundle_id,
                &record.operator_id,
                &record.completed_pieces,
                &record.price_per_piece,
                &record.amount,
                record.quality_grade.map(|g| g.to_db_str()),
                format_ts(&record.settled_at),
            ],
        )?;

        Ok(record.earnings_id.clone())
    }

    /// 按工序查询计件记录
    pub fn find_by_operation(&self, operation_id: &str) -> RepositoryResult<Option<EarningsRecord>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE operation_id = ?", Self::SELECT_BASE),
            params![operation_id],
            |row| Self::map_row(row),
        ) {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询工人的全部计件记录
    pub fn list_by_operator(&self, operator_id: &str) -> RepositoryResult<Vec<EarningsRecord>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE operator_id = ? ORDER BY settled_at",
            Self::SELECT_BASE
        ))?;

        let records = stmt
            .query_map(params![operator_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<EarningsRecord>, _>>()?;

        Ok(records)
    }

    /// 工人计件汇总（笔数/件数/金额）
    pub fn summarize_operator(
        &self,
        operator_id: &str,
    ) -> RepositoryResult<OperatorEarningsSummary> {
        let conn = self.get_conn()?;

        let (count, pieces, amount): (i32, i32, f64) = conn.query_row(
            r#"SELECT COUNT(*), COALESCE(SUM(completed_pieces), 0), COALESCE(SUM(amount), 0.0)
               FROM earnings_record
               WHERE operator_id = ?"#,
            params![operator_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;

        Ok(OperatorEarningsSummary {
            operator_id: operator_id.to_string(),
            record_count: count,
            total_pieces: pieces,
            total_amount: amount,
        })
    }

    const SELECT_BASE: &'static str = r#"SELECT earnings_id, operation_id, bundle_id, operator_id,
               completed_pieces, price_per_piece, amount, quality_grade, settled_at
        FROM earnings_record"#;

    /// 映射数据库行到 EarningsRecord 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<EarningsRecord> {
        let grade: Option<String> = row.get(7)?;
        Ok(EarningsRecord {
            earnings_id: row.get(0)?,
            operation_id: row.get(1)?,
            bundle_id: row.get(2)?,
            operator_id: row.get(3)?,
            completed_pieces: row.get(4)?,
            price_per_piece: row.get(5)?,
            amount: row.get(6)?,
            quality_grade: grade.and_then(|g| QualityGrade::from_str(&g)),
            settled_at: parse_ts(8, &row.get::<_, String>(8)?)?,
        })
    }
}
