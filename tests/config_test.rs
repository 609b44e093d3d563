// ==========================================
// 配置管理测试
// ==========================================
// 测试范围:
// 1. 配置缺省值与覆写
// 2. 非法配置值回退
// 3. 配置快照
// ==========================================

mod test_helpers;

use garment_bundle_mes::config::config_manager::ConfigManager;
use garment_bundle_mes::config::engine_config_trait::EngineConfigReader;
use garment_bundle_mes::config::{
    DEFAULT_ASSIGN_RETRY_LIMIT, DEFAULT_MAX_BUNDLE_SIZE, DEFAULT_MIN_MATCH_SCORE,
};

#[tokio::test]
async fn test_config_defaults_when_unset() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();

    assert_eq!(
        manager.get_max_bundle_size().await.unwrap(),
        DEFAULT_MAX_BUNDLE_SIZE
    );
    assert_eq!(
        manager.get_assign_retry_limit().await.unwrap(),
        DEFAULT_ASSIGN_RETRY_LIMIT
    );
    assert_eq!(
        manager.get_min_match_score().await.unwrap(),
        DEFAULT_MIN_MATCH_SCORE
    );
}

#[tokio::test]
async fn test_config_override_and_snapshot() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();

    manager.set_config_value("max_bundle_size", "30").unwrap();
    manager.set_config_value("min_match_score", "75").unwrap();

    assert_eq!(manager.get_max_bundle_size().await.unwrap(), 30);
    assert_eq!(manager.get_min_match_score().await.unwrap(), 75);
    assert_eq!(
        manager.get_global_config_value("max_bundle_size").unwrap(),
        Some("30".to_string())
    );

    // 同 key 覆写
    manager.set_config_value("max_bundle_size", "40").unwrap();
    assert_eq!(manager.get_max_bundle_size().await.unwrap(), 40);

    // 快照包含全部 global 配置
    let snapshot = manager.get_config_snapshot().unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&snapshot).unwrap();
    assert_eq!(parsed["max_bundle_size"], "40");
    assert_eq!(parsed["min_match_score"], "75");
}

#[tokio::test]
async fn test_config_invalid_values_fall_back() {
    let (_temp, db_path) = test_helpers::create_test_db().unwrap();
    let manager = ConfigManager::new(&db_path).unwrap();

    // 非数字回退缺省值
    manager.set_config_value("max_bundle_size", "abc").unwrap();
    assert_eq!(
        manager.get_max_bundle_size().await.unwrap(),
        DEFAULT_MAX_BUNDLE_SIZE
    );

    // 非正数回退缺省值（零件数捆上限无意义）
    manager.set_config_value("max_bundle_size", "0").unwrap();
    assert_eq!(
        manager.get_max_bundle_size().await.unwrap(),
        DEFAULT_MAX_BUNDLE_SIZE
    );

    // 重试上限为负按 0 处理（只禁用重试,不禁用派工）
    manager.set_config_value("assign_retry_limit", "-2").unwrap();
    assert_eq!(manager.get_assign_retry_limit().await.unwrap(), 0);
}
