// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 提供API层集成测试的通用辅助函数
// ==========================================

#[path = "../test_helpers.rs"]
mod test_helpers;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use tempfile::NamedTempFile;

use garment_bundle_mes::api::{AssignmentApi, BundleApi, ComplaintApi};
use garment_bundle_mes::config::config_manager::ConfigManager;
use garment_bundle_mes::domain::bundle::{BundleOperation, ProductionBundle, SizeAllocation};
use garment_bundle_mes::domain::template::GarmentTemplate;
use garment_bundle_mes::engine::assignment::AssignmentMatcher;
use garment_bundle_mes::engine::complaint::PartsComplaintHandler;
use garment_bundle_mes::engine::events::OptionalEventPublisher;
use garment_bundle_mes::engine::lifecycle::LifecycleStateMachine;
use garment_bundle_mes::repository::{
    ActionLogRepository, BundleOperationRepository, EarningsRepository, FabricRepository,
    PartsComplaintRepository, ProductionBundleRepository, WorkAssignmentRepository,
};

// ==========================================
// API测试环境
// ==========================================

/// API测试环境
///
/// 包含所有API实例和必要的依赖
pub struct ApiTestEnv {
    pub db_path: String,
    pub bundle_api: Arc<BundleApi>,
    pub assignment_api: Arc<AssignmentApi>,
    pub complaint_api: Arc<ComplaintApi>,

    // Repository层（用于测试数据准备与断言）
    pub fabric_repo: Arc<FabricRepository>,
    pub bundle_repo: Arc<ProductionBundleRepository>,
    pub operation_repo: Arc<BundleOperationRepository>,
    pub assignment_repo: Arc<WorkAssignmentRepository>,
    pub complaint_repo: Arc<PartsComplaintRepository>,
    pub earnings_repo: Arc<EarningsRepository>,
    pub action_log_repo: Arc<ActionLogRepository>,

    // 引擎层（用于直接驱动状态机的边界测试）
    pub lifecycle: Arc<LifecycleStateMachine>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl ApiTestEnv {
    /// 创建新的API测试环境
    ///
    /// # 说明
    /// - 使用临时数据库文件
    /// - 初始化所有Repository、Engine和API
    /// - 写入默认测试配置
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) =
            test_helpers::create_test_db().map_err(|e| format!("创建测试数据库失败: {}", e))?;

        let raw_conn = test_helpers::open_test_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        test_helpers::insert_test_config(&raw_conn)
            .map_err(|e| format!("插入测试配置失败: {}", e))?;
        let conn: Arc<Mutex<Connection>> = Arc::new(Mutex::new(raw_conn));

        // Repository层
        let fabric_repo = Arc::new(FabricRepository::new(conn.clone()));
        let bundle_repo = Arc::new(ProductionBundleRepository::new(conn.clone()));
        let operation_repo = Arc::new(BundleOperationRepository::new(conn.clone()));
        let assignment_repo = Arc::new(WorkAssignmentRepository::new(conn.clone()));
        let complaint_repo = Arc::new(PartsComplaintRepository::new(conn.clone()));
        let earnings_repo = Arc::new(EarningsRepository::new(conn.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(conn.clone()));

        let config_manager =
            Arc::new(ConfigManager::new(&db_path).map_err(|e| format!("配置管理器创建失败: {}", e))?);

        // 引擎层
        let lifecycle = Arc::new(LifecycleStateMachine::new(
            bundle_repo.clone(),
            operation_repo.clone(),
            assignment_repo.clone(),
            complaint_repo.clone(),
            earnings_repo.clone(),
            OptionalEventPublisher::none(),
        ));
        let matcher = Arc::new(AssignmentMatcher::new(
            operation_repo.clone(),
            bundle_repo.clone(),
            lifecycle.clone(),
            config_manager.clone(),
            OptionalEventPublisher::none(),
        ));
        let complaint_handler = Arc::new(PartsComplaintHandler::new(
            operation_repo.clone(),
            complaint_repo.clone(),
            lifecycle.clone(),
            OptionalEventPublisher::none(),
        ));

        // API层
        let bundle_api = Arc::new(BundleApi::new(
            fabric_repo.clone(),
            bundle_repo.clone(),
            operation_repo.clone(),
            action_log_repo.clone(),
            config_manager.clone(),
            lifecycle.clone(),
        ));
        let assignment_api = Arc::new(AssignmentApi::new(
            operation_repo.clone(),
            assignment_repo.clone(),
            earnings_repo.clone(),
            action_log_repo.clone(),
            lifecycle.clone(),
            matcher,
        ));
        let complaint_api = Arc::new(ComplaintApi::new(
            complaint_repo.clone(),
            action_log_repo.clone(),
            complaint_handler,
        ));

        Ok(Self {
            db_path,
            bundle_api,
            assignment_api,
            complaint_api,
            fabric_repo,
            bundle_repo,
            operation_repo,
            assignment_repo,
            complaint_repo,
            earnings_repo,
            action_log_repo,
            lifecycle,
            _temp_file: temp_file,
        })
    }

    /// 建一个已裁毕（READY）的捆扎并返回其工序列表
    ///
    /// 快捷路径: 单尺码分配 → 建捆 → 开裁 → 裁毕
    pub fn create_ready_bundle(
        &self,
        quantity: i64,
        template: &GarmentTemplate,
    ) -> (ProductionBundle, Vec<BundleOperation>) {
        let allocations = vec![SizeAllocation {
            size: "L".to_string(),
            ratio_weight: 1,
            allocated_quantity: quantity,
        }];

        let bundles = self
            .bundle_api
            .create_bundles("LOT1", "NAVY", &allocations, template, None, "supervisor")
            .expect("建捆失败");
        assert!(!bundles.is_empty(), "建捆结果为空");

        for bundle in &bundles {
            self.bundle_api
                .begin_cutting(&bundle.bundle_id, "supervisor")
                .expect("开裁失败");
            self.bundle_api
                .mark_cutting_complete(&bundle.bundle_id, "supervisor")
                .expect("裁毕失败");
        }

        let bundle = self
            .bundle_repo
            .get_by_id(&bundles[0].bundle_id)
            .expect("捆扎读取失败");
        let operations = self
            .operation_repo
            .find_by_bundle(&bundle.bundle_id)
            .expect("工序读取失败");

        (bundle, operations)
    }
}
