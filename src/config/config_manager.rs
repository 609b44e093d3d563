// ==========================================
// 服装车间捆扎生产与工序派工系统 - 配置管理器
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 配置项全集
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config_trait::EngineConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

/// 最大捆扎件数默认值
pub const DEFAULT_MAX_BUNDLE_SIZE: i32 = 25;
/// 派工重试上限默认值
pub const DEFAULT_ASSIGN_RETRY_LIMIT: i32 = 3;
/// 最低匹配得分默认值
pub const DEFAULT_MIN_MATCH_SCORE: i32 = 60;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 从 config_kv 表读取整数配置,解析失败或缺失时返回默认值
    fn get_i32_or_default(&self, key: &str, default: i32) -> Result<i32, Box<dyn Error>> {
        match self.get_config_value(key)? {
            Some(raw) => match raw.trim().parse::<i32>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!("配置 {} 值非法: {},使用默认值 {}", key, raw, default);
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// 写入 global scope 配置值
    pub fn set_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            r#"INSERT INTO config_kv (scope_id, key, value, updated_at)
               VALUES ('global', ?1, ?2, datetime('now'))
               ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')"#,
            params![key, value],
        )?;

        Ok(())
    }

    /// 获取所有配置的快照（JSON 格式）
    ///
    /// # 用途
    /// - 审计: 记录批次创建时刻的配置
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }
}

// ==========================================
// EngineConfigReader 实现
// ==========================================
#[async_trait]
impl EngineConfigReader for ConfigManager {
    async fn get_max_bundle_size(&self) -> Result<i32, Box<dyn Error>> {
        let v = self.get_i32_or_default("max_bundle_size", DEFAULT_MAX_BUNDLE_SIZE)?;
        if v <= 0 {
            tracing::warn!("max_bundle_size 配置非正数: {},使用默认值", v);
            return Ok(DEFAULT_MAX_BUNDLE_SIZE);
        }
        Ok(v)
    }

    async fn get_assign_retry_limit(&self) -> Result<i32, Box<dyn Error>> {
        let v = self.get_i32_or_default("assign_retry_limit", DEFAULT_ASSIGN_RETRY_LIMIT)?;
        Ok(v.max(0))
    }

    async fn get_min_match_score(&self) -> Result<i32, Box<dyn Error>> {
        self.get_i32_or_default("min_match_score", DEFAULT_MIN_MATCH_SCORE)
    }
}
