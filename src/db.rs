// ==========================================
// 服装车间捆扎生产与工序派工系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句（main 初始化与测试共用同一份 DDL）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 获取默认数据库路径（{data_dir}/garment-bundle-mes/bundle_mes.db）
pub fn get_default_db_path() -> String {
    let base = dirs::data_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
    let dir = base.join("garment-bundle-mes");
    let _ = std::fs::create_dir_all(&dir);
    dir.join("bundle_mes.db").to_string_lossy().to_string()
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 初始化数据库 schema（幂等）
///
/// 说明：
/// - 所有状态字段以 SCREAMING_SNAKE_CASE 文本存储，与领域枚举的 to_db_str 对齐
/// - production_bundle / bundle_operation 携带 revision 乐观锁列
/// - work_assignment 的部分唯一索引保证同一工序至多一条 ACTIVE 派工
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS fabric_roll (
            roll_id TEXT PRIMARY KEY,
            lot_id TEXT NOT NULL,
            color TEXT NOT NULL,
            weight_kg REAL,
            layer_count INTEGER NOT NULL,
            recorded_by TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_fabric_roll_lot ON fabric_roll(lot_id);

        CREATE TABLE IF NOT EXISTS size_allocation (
            lot_id TEXT NOT NULL,
            color TEXT NOT NULL,
            size TEXT NOT NULL,
            ratio_weight INTEGER NOT NULL,
            allocated_quantity INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            PRIMARY KEY (lot_id, color, size)
        );

        CREATE TABLE IF NOT EXISTS production_bundle (
            bundle_id TEXT PRIMARY KEY,
            lot_id TEXT NOT NULL,
            color TEXT NOT NULL,
            size TEXT NOT NULL,
            part_name TEXT NOT NULL,
            bundle_no INTEGER NOT NULL,
            quantity INTEGER NOT NULL,
            template_id TEXT NOT NULL,
            status TEXT NOT NULL,
            held_from TEXT,
            revision INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(lot_id, color, size, part_name, bundle_no)
        );

        CREATE INDEX IF NOT EXISTS idx_bundle_lot ON production_bundle(lot_id);
        CREATE INDEX IF NOT EXISTS idx_bundle_status ON production_bundle(status);

        CREATE TABLE IF NOT EXISTS bundle_operation (
            operation_id TEXT PRIMARY KEY,
            bundle_id TEXT NOT NULL REFERENCES production_bundle(bundle_id) ON DELETE CASCADE,
            sequence INTEGER NOT NULL,
            name TEXT NOT NULL,
            machine_type TEXT NOT NULL,
            required_skill TEXT NOT NULL,
            price_per_piece REAL NOT NULL,
            standard_minutes REAL NOT NULL,
            dependencies TEXT NOT NULL DEFAULT '[]',
            status TEXT NOT NULL,
            frozen_from TEXT,
            assigned_operator_id TEXT,
            assigned_pieces INTEGER NOT NULL DEFAULT 0,
            completed_pieces INTEGER NOT NULL DEFAULT 0,
            quality_grade TEXT,
            superseded_by TEXT,
            revision INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_operation_bundle ON bundle_operation(bundle_id);
        CREATE INDEX IF NOT EXISTS idx_operation_status ON bundle_operation(status);

        CREATE TABLE IF NOT EXISTS work_assignment (
            assignment_id TEXT PRIMARY KEY,
            operation_id TEXT NOT NULL REFERENCES bundle_operation(operation_id) ON DELETE CASCADE,
            operator_id TEXT NOT NULL,
            assigned_at TEXT NOT NULL,
            version_token INTEGER NOT NULL,
            status TEXT NOT NULL,
            closed_at TEXT
        );

        -- 同一工序至多一条 ACTIVE 派工（派工原子性的数据库兜底）
        CREATE UNIQUE INDEX IF NOT EXISTS idx_assignment_active_unique
            ON work_assignment(operation_id) WHERE status = 'ACTIVE';
        CREATE INDEX IF NOT EXISTS idx_assignment_operator ON work_assignment(operator_id);

        CREATE TABLE IF NOT EXISTS parts_complaint (
            complaint_id TEXT PRIMARY KEY,
            bundle_id TEXT NOT NULL REFERENCES production_bundle(bundle_id) ON DELETE CASCADE,
            operation_id TEXT NOT NULL REFERENCES bundle_operation(operation_id) ON DELETE CASCADE,
            status TEXT NOT NULL,
            reported_parts TEXT NOT NULL DEFAULT '[]',
            description TEXT,
            reported_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_complaint_operation ON parts_complaint(operation_id);
        CREATE INDEX IF NOT EXISTS idx_complaint_bundle ON parts_complaint(bundle_id);

        CREATE TABLE IF NOT EXISTS earnings_record (
            earnings_id TEXT PRIMARY KEY,
            operation_id TEXT NOT NULL UNIQUE REFERENCES bundle_operation(operation_id),
            bundle_id TEXT NOT NULL,
            operator_id TEXT NOT NULL,
            completed_pieces INTEGER NOT NULL,
            price_per_piece REAL NOT NULL,
            amount REAL NOT NULL,
            quality_grade TEXT,
            settled_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_earnings_operator ON earnings_record(operator_id);

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            bundle_id TEXT,
            operation_id TEXT,
            payload_json TEXT,
            detail TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_action_log_bundle ON action_log(bundle_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}
