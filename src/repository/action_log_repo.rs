// ==========================================
// 服装车间捆扎生产与工序派工系统 - 操作日志仓储
// ==========================================
// 红线: 所有人工/工人写操作必须记录
// ==========================================

use crate::domain::action_log::{ActionLog, ActionType};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ActionLogRepository {
    /// 创建新的 ActionLogRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入操作日志
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO action_log (
                action_id, action_type, action_ts, actor,
                bundle_id, operation_id, payload_json, detail
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &log.action_id,
                log.action_type.to_db_str(),
                format_ts(&log.action_ts),
                &log.actor,
                &log.bundle_id,
                &log.operation_id,
                log.payload_json
                    .as_ref()
                    .map(|v| v.to_string()),
                &log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 查询最近的操作日志
    pub fn list_recent(&self, limit: i32) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY action_ts DESC LIMIT ?",
            Self::SELECT_BASE
        ))?;

        let logs = stmt
            .query_map(params![limit], |row| Self::map_row(row))?
            .collect::<Result<Vec<ActionLog>, _>>()?;

        Ok(logs)
    }

    /// 查询捆扎相关的操作日志
    pub fn list_by_bundle(&self, bundle_id: &str) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE bundle_id = ? ORDER BY action_ts",
            Self::SELECT_BASE
        ))?;

        let logs = stmt
            .query_map(params![bundle_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<ActionLog>, _>>()?;

        Ok(logs)
    }

    const SELECT_BASE: &'static str = r#"SELECT action_id, action_type, action_ts, actor,
               bundle_id, operation_id, payload_json, detail
        FROM action_log"#;

    /// 映射数据库行到 ActionLog 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ActionLog> {
        let type_str: String = row.get(1)?;
        let action_type = ActionType::from_str(&type_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                1,
                rusqlite::types::Type::Text,
                format!("未知操作类型: {}", type_str).into(),
            )
        })?;
        let payload_raw: Option<String> = row.get(6)?;
        let payload_json = match payload_raw {
            Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?),
            None => None,
        };

        Ok(ActionLog {
            action_id: row.get(0)?,
            action_type,
            action_ts: parse_ts(2, &row.get::<_, String>(2)?)?,
            actor: row.get(3)?,
            bundle_id: row.get(4)?,
            operation_id: row.get(5)?,
            payload_json,
            detail: row.get(7)?,
        })
    }
}
