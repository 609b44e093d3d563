// ==========================================
// 服装车间捆扎生产与工序派工系统 - 主入口
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md
// 技术栈: Rust + SQLite
// 系统定位: 生产执行引擎（库模式为主，此入口负责初始化数据库）
// ==========================================

use garment_bundle_mes::{db, logging};

fn main() {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", garment_bundle_mes::APP_NAME);
    tracing::info!("系统版本: {}", garment_bundle_mes::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径（可用环境变量覆盖）
    let db_path = std::env::var("BUNDLE_MES_DB").unwrap_or_else(|_| db::get_default_db_path());
    tracing::info!("使用数据库: {}", db_path);

    // 打开连接并初始化 schema（幂等）
    let conn = match db::open_sqlite_connection(&db_path) {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("数据库连接失败: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = db::init_schema(&conn) {
        tracing::error!("schema 初始化失败: {}", e);
        std::process::exit(1);
    }

    match db::read_schema_version(&conn) {
        Ok(Some(v)) => tracing::info!("schema_version = {}", v),
        Ok(None) => tracing::warn!("schema_version 表缺失"),
        Err(e) => tracing::warn!("schema_version 读取失败: {}", e),
    }

    tracing::info!("数据库初始化完成，业务接口请通过库模式调用:");
    tracing::info!("use garment_bundle_mes::api::{{BundleApi, AssignmentApi, ComplaintApi}};");
}
