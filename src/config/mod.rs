// ==========================================
// 服装车间捆扎生产与工序派工系统 - 配置层
// ==========================================
// 职责: 系统配置的读取与管理
// ==========================================

pub mod config_manager;
pub mod engine_config_trait;

pub use config_manager::{
    ConfigManager, DEFAULT_ASSIGN_RETRY_LIMIT, DEFAULT_MAX_BUNDLE_SIZE, DEFAULT_MIN_MATCH_SCORE,
};
pub use engine_config_trait::EngineConfigReader;
