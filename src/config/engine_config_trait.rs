// ==========================================
// 服装车间捆扎生产与工序派工系统 - 引擎配置读取 Trait
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - PART E 工程结构
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use async_trait::async_trait;
use std::error::Error;

// ==========================================
// EngineConfigReader Trait
// ==========================================
// 用途: 分捆/派工引擎所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait EngineConfigReader: Send + Sync {
    // ===== 分捆配置 =====

    /// 获取最大捆扎件数
    ///
    /// # 默认值
    /// - 25
    async fn get_max_bundle_size(&self) -> Result<i32, Box<dyn Error>>;

    // ===== 派工配置 =====

    /// 获取派工版本冲突重试上限
    ///
    /// 说明: 仅乐观锁冲突可重试,业务性失败一律直接上抛
    ///
    /// # 默认值
    /// - 3
    async fn get_assign_retry_limit(&self) -> Result<i32, Box<dyn Error>>;

    /// 获取最低匹配得分阈值（调用方未显式给出时使用）
    ///
    /// # 默认值
    /// - 60
    async fn get_min_match_score(&self) -> Result<i32, Box<dyn Error>>;
}
