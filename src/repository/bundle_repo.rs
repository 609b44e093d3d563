// ==========================================
// 服装车间捆扎生产与工序派工系统 - 捆扎仓储
// ==========================================
// 并发控制: revision 乐观锁,update 带修订号检查
// ==========================================

use crate::domain::bundle::ProductionBundle;
use crate::domain::types::BundleStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// ProductionBundleRepository - 捆扎仓储
// ==========================================
pub struct ProductionBundleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProductionBundleRepository {
    /// 创建新的 ProductionBundleRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 创建捆扎
    pub fn create(&self, bundle: &ProductionBundle) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO production_bundle (
                bundle_id, lot_id, color, size, part_name, bundle_no,
                quantity, template_id, status, held_from, revision,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &bundle.bundle_id,
                &bundle.lot_id,
                &bundle.color,
                &bundle.size,
                &bundle.part_name,
                &bundle.bundle_no,
                &bundle.quantity,
                &bundle.template_id,
                bundle.status.to_db_str(),
                bundle.held_from.map(|s| s.to_db_str()),
                &bundle.revision,
                format_ts(&bundle.created_at),
                format_ts(&bundle.updated_at),
            ],
        )?;

        Ok(bundle.bundle_id.clone())
    }

    /// 按 bundle_id 查询捆扎
    pub fn find_by_id(&self, bundle_id: &str) -> RepositoryResult<Option<ProductionBundle>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT bundle_id, lot_id, color, size, part_name, bundle_no,
                      quantity, template_id, status, held_from, revision,
                      created_at, updated_at
               FROM production_bundle
               WHERE bundle_id = ?"#,
            params![bundle_id],
            |row| Self::map_row(row),
        ) {
            Ok(bundle) => Ok(Some(bundle)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按 bundle_id 查询捆扎（不存在即 NotFound）
    pub fn get_by_id(&self, bundle_id: &str) -> RepositoryResult<ProductionBundle> {
        self.find_by_id(bundle_id)?.ok_or_else(|| RepositoryError::NotFound {
            entity: "ProductionBundle".to_string(),
            id: bundle_id.to_string(),
        })
    }

    /// 查询批次的全部捆扎（按颜色/尺码/裁片/序号稳定排序）
    pub fn find_by_lot(&self, lot_id: &str) -> RepositoryResult<Vec<ProductionBundle>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT bundle_id, lot_id, color, size, part_name, bundle_no,
                      quantity, template_id, status, held_from, revision,
                      created_at, updated_at
               FROM production_bundle
               WHERE lot_id = ?
               ORDER BY color, size, part_name, bundle_no"#,
        )?;

        let bundles = stmt
            .query_map(params![lot_id], |row| Self::map_row(row))?
            .collect::<Result<Vec<ProductionBundle>, _>>()?;

        Ok(bundles)
    }

    /// 按状态查询捆扎
    pub fn find_by_status(&self, status: BundleStatus) -> RepositoryResult<Vec<ProductionBundle>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT bundle_id, lot_id, color, size, part_name, bundle_no,
                      quantity, template_id, status, held_from, revision,
                      created_at, updated_at
               FROM production_bundle
               WHERE status = ?
               ORDER BY lot_id, color, size, part_name, bundle_no"#,
        )?;

        let bundles = stmt
            .query_map(params![status.to_db_str()], |row| Self::map_row(row))?
            .collect::<Result<Vec<ProductionBundle>, _>>()?;

        Ok(bundles)
    }

    /// 更新捆扎（带乐观锁检查）
    ///
    /// # 并发控制
    /// 使用乐观锁 (revision 字段) 防止并发更新冲突
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: revision 不匹配（他人已更新）
    /// - `RepositoryError::NotFound`: bundle_id 不存在
    pub fn update(&self, bundle: &ProductionBundle) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE production_bundle
               SET status = ?, held_from = ?, updated_at = ?, revision = revision + 1
               WHERE bundle_id = ? AND revision = ?"#,
            params![
                bundle.status.to_db_str(),
                bundle.held_from.map(|s| s.to_db_str()),
                format_ts(&bundle.updated_at),
                &bundle.bundle_id,
                &bundle.revision,
            ],
        )?;

        if rows_affected == 0 {
            // 判断是记录不存在还是 revision 冲突
            let exists: Result<i32, _> = conn.query_row(
                "SELECT revision FROM production_bundle WHERE bundle_id = ?",
                params![&bundle.bundle_id],
                |row| row.get(0),
            );

            match exists {
                Ok(actual_revision) => {
                    return Err(RepositoryError::OptimisticLockFailure {
                        entity: "ProductionBundle".to_string(),
                        id: bundle.bundle_id.clone(),
                        expected: bundle.revision,
                        actual: actual_revision,
                    });
                }
                Err(_) => {
                    return Err(RepositoryError::NotFound {
                        entity: "ProductionBundle".to_string(),
                        id: bundle.bundle_id.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// 映射数据库行到 ProductionBundle 对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<ProductionBundle> {
        let status_str: String = row.get(8)?;
        let held_from: Option<String> = row.get(9)?;
        Ok(ProductionBundle {
            bundle_id: row.get(0)?,
            lot_id: row.get(1)?,
            color: row.get(2)?,
            size: row.get(3)?,
            part_name: row.get(4)?,
            bundle_no: row.get(5)?,
            quantity: row.get(6)?,
            template_id: row.get(7)?,
            status: BundleStatus::from_str(&status_str),
            held_from: held_from.map(|s| BundleStatus::from_str(&s)),
            revision: row.get(10)?,
            created_at: parse_ts(11, &row.get::<_, String>(11)?)?,
            updated_at: parse_ts(12, &row.get::<_, String>(12)?)?,
        })
    }
}
