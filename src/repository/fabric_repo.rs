// ==========================================
// 服装车间捆扎生产与工序派工系统 - 面料卷与尺码分配仓储
// ==========================================
// 红线: 面料卷录入后不可变（无 update 接口）
// ==========================================

use crate::domain::bundle::{FabricRoll, SizeAllocation};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::{format_ts, parse_ts};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// FabricRepository - 面料卷/尺码分配仓储
// ==========================================
pub struct FabricRepository {
    conn: Arc<Mutex<Connection>>,
}

impl FabricRepository {
    /// 创建新的 FabricRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 录入面料卷
    pub fn create_roll(&self, roll: &FabricRoll) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO fabric_roll (
                roll_id, lot_id, color, weight_kg, layer_count, recorded_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &roll.roll_id,
                &roll.lot_id,
                &roll.color,
                &roll.weight_kg,
                &roll.layer_count,
                &roll.recorded_by,
                format_ts(&roll.created_at),
            ],
        )?;

        Ok(roll.roll_id.clone())
    }

    /// 查询批次的全部面料卷
    pub fn find_rolls_by_lot(&self, lot_id: &str) -> RepositoryResult<Vec<FabricRoll>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT roll_id, lot_id, color, weight_kg, layer_count, recorded_by, created_at
               FROM fabric_roll
               WHERE lot_id = ?
               ORDER BY created_at"#,
        )?;

        let rolls = stmt
            .query_map(params![lot_id], |row| Self::map_roll_row(row))?
            .collect::<Result<Vec<FabricRoll>, _>>()?;

        Ok(rolls)
    }

    /// 统计批次某颜色的总拉布层数
    pub fn total_layers(&self, lot_id: &str, color: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(layer_count), 0) FROM fabric_roll WHERE lot_id = ? AND color = ?",
            params![lot_id, color],
            |row| row.get(0),
        )?;

        Ok(total)
    }

    /// 保存尺码分配结果（同批次同颜色重算时覆盖）
    pub fn save_allocations(
        &self,
        lot_id: &str,
        color: &str,
        allocations: &[SizeAllocation],
    ) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let now = format_ts(&Utc::now());

        for alloc in allocations {
            tx.execute(
                r#"INSERT OR REPLACE INTO size_allocation (
                    lot_id, color, size, ratio_weight, allocated_quantity, created_at
                ) VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    lot_id,
                    color,
                    &alloc.size,
                    &alloc.ratio_weight,
                    &alloc.allocated_quantity,
                    &now,
                ],
            )?;
        }

        tx.commit()?;
        Ok(allocations.len())
    }

    /// 查询批次某颜色的尺码分配
    pub fn find_allocations(
        &self,
        lot_id: &str,
        color: &str,
    ) -> RepositoryResult<Vec<SizeAllocation>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT size, ratio_weight, allocated_quantity
               FROM size_allocation
               WHERE lot_id = ? AND color = ?
               ORDER BY rowid"#,
        )?;

        let allocations = stmt
            .query_map(params![lot_id, color], |row| {
                Ok(SizeAllocation {
                    size: row.get(0)?,
                    ratio_weight: row.get(1)?,
                    allocated_quantity: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<SizeAllocation>, _>>()?;

        Ok(allocations)
    }

    /// 映射数据库行到 FabricRoll 对象
    fn map_roll_row(row: &rusqlite::Row) -> rusqlite::Result<FabricRoll> {
        Ok(FabricRoll {
            roll_id: row.get(0)?,
            lot_id: row.get(1)?,
            color: row.get(2)?,
            weight_kg: row.get(3)?,
            layer_count: row.get(4)?,
            recorded_by: row.get(5)?,
            created_at: parse_ts(6, &row.get::<_, String>(6)?)?,
        })
    }
}
