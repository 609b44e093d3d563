// ==========================================
// 服装车间捆扎生产与工序派工系统 - 工序仓储
// ==========================================
// 并发控制: revision 乐观锁
// 红线: 派工抢占 (claim_for_operator) 必须在单个事务内完成
//       “状态检查 + 状态写入 + 派工单插入”,先写者赢
// ==========================================

use crate::domain::assignment::WorkAssignment;
use crate::domain::bundle::BundleOperation;
use crate::domain::types::{AssignmentStatus, OperationStatus, QualityGrade, SkillLevel};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

// ==========================================
// ClaimOutcome - 派工抢占结果
// ==========================================
// 说明: 抢占失败的三种情形由引擎层翻译为对应的业务错误
#[derive(Debug)]
pub enum ClaimOutcome {
    /// 抢占成功,返回更新后的工序与新建派工单
    Claimed {
        operation: BundleOperation,
        assignment: WorkAssignment,
    },
    /// 工序已不在 READY 状态（已被派工/冻结/终态）
    NotReady {
        current: OperationStatus,
        assigned_operator_id: Option<String>,
    },
    /// 工序仍为 READY 但 revision 已变化（可安全重读重试）
    RevisionConflict,
}

// ==========================================
// BundleOperationRepository - 工序仓储
// ==========================================
pub struct BundleOperationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BundleOperationRepository {
    /// 创建新的 BundleOperationRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 批量插入工序（建捆时一次性写入,单事务）
    pub fn batch_insert(&self, operations: &[BundleOperation]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        for op in operations {
            tx.execute(
                r#"INSERT INTO bundle_operation (
                    operation_id, bundle_id, sequence, name, machine_type,
                    required_skill, price_per_piece, standard_minutes, dependencies,
                    status, frozen_from, assigned_operator_id, assigned_pieces,
                    completed_pieces, quality_grade, superseded_by, revision,
                    created_at, updated_at
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &op.operation_id,
                    &op.bundle_id,
                    &op.sequence,
                    &op.name,
                    &op.machine_type,
                    op.required_skill.to_db_str(),
                    &op.price_per_piece,
                    &op.standard_minutes,
                    serde_json::to_string(&op.dependencies)
                        .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                    op.status.to_db_str(),
                    op.frozen_from.map(|s| s.to_db_str()),
                    &op.assigned_operator_id,
                    &op.assigned_pieces,
                    &op.completed_pieces,
                    op.quality_grade.map(|g| g.to_db_str()),
                    &op.superseded_by,
                    &op.revision,
                    format_ts(&op.created_at),
                    format_ts(&op.updated_at),
                ],
            )?;
        }

        tx.commit()?;
        Ok(operations.len())
    }

    /// 按 operation_id 查询工序
    pub fn find_by_id(&self, operation_id: &str) -> RepositoryResult<Option<BundleOperation>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            &format!("{} WHERE operation_id = ?", Self::SELECT_BASE),
            params![operation_id],
            |row| Self::map_row(row),
        ) {
            Ok(op) => Ok(Some(op)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 operation_id 查询工序（不存在即 NotFound）
    pub fn get_by_id(&self, operation_id: &str) -> RepositoryResult<BundleOperation> {
        self.find_by_id(operation_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "BundleOperation".to_string(),
            id: operation_id.to_string(),
        })
    }

    /// 查询捆扎的全部工序（按 sequence 排序）
    pub fn find_by_bundle(&self, bundle_id: &str) -> RepositoryResult<Vec<BundleOperation>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "{} WHERE bundle_id = ? ORDER BY sequence",
            Self::SELECT_BASE
        ))?;

        let ops = stmt
            .query_map(params![bundle_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<BundleOperation>, _>>()?;

        Ok(ops)
    }

    /// 更新工序（带乐观锁检查）
    ///
    /// # 并发控制
    /// 使用乐观锁 (revision 字段) 防止并发更新冲突
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: revision 不匹配（他人已更新）
    /// - `RepositoryError::NotFound`: operation_id 不存在
    pub fn update(&self, op: &BundleOperation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE bundle_operation
               SET status = ?, frozen_from = ?, assigned_operator_id = ?,
                   assigned_pieces = ?, completed_pieces = ?, quality_grade = ?,
                   superseded_by = ?, dependencies = ?, updated_at = ?, revision = revision + 1
               WHERE operation_id = ? AND revision = ?"#,
            params![
                op.status.to_db_str(),
                op.frozen_from.map(|s| s.to_db_str()),
                &op.assigned_operator_id,
                &op.assigned_pieces,
                &op.completed_pieces,
                op.quality_grade.map(|g| g.to_db_str()),
                &op.superseded_by,
                serde_json::to_string(&op.dependencies)
                    .map_err(|e| RepositoryError::InternalError(e.to_string()))?,
                format_ts(&op.updated_at),
                &op.operation_id,
                &op.revision,
            ],
        )?;

        if rows_affected == 0 {
            let exists: Result<i32, _> = conn.query_row(
                "SELECT revision FROM bundle_operation WHERE operation_id = ?",
                params![&op.operation_id],
                |row| row.get(0),
            );

            match exists {
                Ok(actual_revision) => {
                    return Err(RepositoryError::OptimisticLockFailure {
                        entity: "BundleOperation".to_string(),
                        id: op.operation_id.clone(),
                        expected: op.revision,
                        actual: actual_revision,
                    });
                }
                Err(_) => {
                    return Err(RepositoryError::NotFound {
                        entity: "BundleOperation".to_string(),
                        id: op.operation_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// 派工抢占（原子 CAS）
    ///
    /// 在单个事务内完成:
    /// 1. `UPDATE ... WHERE revision = ? AND status = 'READY'` 抢占工序
    /// 2. 抢占成功则插入 ACTIVE 派工单
    ///
    /// 两个并发调用者中先提交者赢,后者得到 `NotReady` 或 `RevisionConflict`。
    ///
    /// # 参数
    /// - `operation_id`: 目标工序
    /// - `operator_id`: 中选工人
    /// - `expected_revision`: 调用方读取到的工序修订号
    /// - `assigned_pieces`: 派工件数（取捆内件数）
    pub fn claim_for_operator(
        &self,
        operation_id: &str,
        operator_id: &str,
        expected_revision: i32,
        assigned_pieces: i32,
    ) -> RepositoryResult<ClaimOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now();

        let rows_affected = tx.execute(
            r#"UPDATE bundle_operation
               SET status = 'ASSIGNED', assigned_operator_id = ?,
                   assigned_pieces = ?, updated_at = ?, revision = revision + 1
               WHERE operation_id = ? AND revision = ? AND status = 'READY'"#,
            params![
                operator_id,
                assigned_pieces,
                format_ts(&now),
                operation_id,
                expected_revision,
            ],
        )?;

        if rows_affected == 0 {
            // 诊断失败原因: 不存在 / 状态已变 / revision 已变
            let current: Option<(String, Option<String>)> = match tx.query_row(
                "SELECT status, assigned_operator_id FROM bundle_operation WHERE operation_id = ?",
                params![operation_id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?)),
            ) {
                Ok(v) => Some(v),
                Err(rusqlite::Error::QueryReturnedNoRows) => None,
                Err(e) => return Err(e.into()),
            };

            tx.commit()?;

            return match current {
                None => Err(RepositoryError::NotFound {
                    entity: "BundleOperation".to_string(),
                    id: operation_id.to_string(),
                }),
                Some((status_str, assigned)) => {
                    let status = OperationStatus::from_str(&status_str);
                    if status == OperationStatus::Ready {
                        Ok(ClaimOutcome::RevisionConflict)
                    } else {
                        Ok(ClaimOutcome::NotReady {
                            current: status,
                            assigned_operator_id: assigned,
                        })
                    }
                }
            };
        }

        // 抢占成功,插入派工单（部分唯一索引兜底同工序重复 ACTIVE）
        let assignment = WorkAssignment {
            assignment_id: Uuid::new_v4().to_string(),
            operation_id: operation_id.to_string(),
            operator_id: operator_id.to_string(),
            assigned_at: now,
            version_token: expected_revision + 1,
            status: AssignmentStatus::Active,
            closed_at: None,
        };

        tx.execute(
            r#"INSERT INTO work_assignment (
                assignment_id, operation_id, operator_id, assigned_at,
                version_token, status, closed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &assignment.assignment_id,
                &assignment.operation_id,
                &assignment.operator_id,
                format_ts(&assignment.assigned_at),
                &assignment.version_token,
                assignment.status.to_db_str(),
                Option::<String>::None,
            ],
        )?;

        let operation = tx.query_row(
            &format!("{} WHERE operation_id = ?", Self::SELECT_BASE),
            params![operation_id],
            |row| Self::map_row(row),
        )?;

        tx.commit()?;

        Ok(ClaimOutcome::Claimed {
            operation,
            assignment,
        })
    }

    const SELECT_BASE: &'static str = r#"SELECT operation_id, bundle_id, sequence, name, machine_type,
               required_skill, price_per_piece, standard_minutes, dependencies,
               status, frozen_from, assigned_operator_id, assigned_pieces,
               completed_pieces, quality_grade, superseded_by, revision,
               created_at, updated_at
        FROM bundle_operation"#;

    /// 映射数据库行到 BundleOperation 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<BundleOperation> {
        let skill_str: String = row.get(5)?;
        let deps_raw: String = row.get(8)?;
        let dependencies: Vec<String> = serde_json::from_str(&deps_raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
        })?;
        let status_str: String = row.get(9)?;
        let frozen_from: Option<String> = row.get(10)?;
        let grade: Option<String> = row.get(14)?;

        Ok(BundleOperation {
            operation_id: row.get(0)?,
            bundle_id: row.get(1)?,
            sequence: row.get(2)?,
            name: row.get(3)?,
            machine_type: row.get(4)?,
            required_skill: SkillLevel::from_str(&skill_str),
            price_per_piece: row.get(6)?,
            standard_minutes: row.get(7)?,
            dependencies,
            status: OperationStatus::from_str(&status_str),
            frozen_from: frozen_from.map(|s| OperationStatus::from_str(&s)),
            assigned_operator_id: row.get(11)?,
            assigned_pieces: row.get(12)?,
            completed_pieces: row.get(13)?,
            quality_grade: grade.and_then(|g| QualityGrade::from_str(&g)),
            superseded_by: row.get(15)?,
            revision: row.get(16)?,
            created_at: parse_ts(17, &row.get::<_, String>(17)?)?,
            updated_at: parse_ts(18, &row.get::<_, String>(18)?)?,
        })
    }
}
