// ==========================================
// 服装车间捆扎生产与工序派工系统 - 捆扎管理 API
// ==========================================
// 职责: 面料录入、尺码分配、建捆建图、捆扎状态管理、进度查询
// 依据: Bundle_MES_Dev_Spec.md - PART E 对外接口
// ==========================================

use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::config::engine_config_trait::EngineConfigReader;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::bundle::{
    BundleOperation, BundleProgress, FabricRoll, ProductionBundle, SizeAllocation,
    WHOLE_GARMENT_PART,
};
use crate::domain::template::GarmentTemplate;
use crate::domain::types::OperationStatus;
use crate::engine::bundle_chunker::BundleChunker;
use crate::engine::lifecycle::LifecycleStateMachine;
use crate::engine::operation_graph::OperationGraphBuilder;
use crate::engine::ratio_allocator::RatioAllocator;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::bundle_repo::ProductionBundleRepository;
use crate::repository::fabric_repo::FabricRepository;
use crate::repository::operation_repo::BundleOperationRepository;

// ==========================================
// BundleApi - 捆扎管理 API
// ==========================================

/// 捆扎管理API
///
/// 职责：
/// 1. 面料卷录入与尺码分配
/// 2. 建捆（分捆 + 按模板建工序图）
/// 3. 捆扎状态管理（开裁/裁毕/挂起/恢复/取消）
/// 4. 捆扎与工序查询、进度汇总
/// 5. ActionLog记录
pub struct BundleApi {
    fabric_repo: Arc<FabricRepository>,
    bundle_repo: Arc<ProductionBundleRepository>,
    operation_repo: Arc<BundleOperationRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Arc<ConfigManager>,
    lifecycle: Arc<LifecycleStateMachine>,
    ratio_allocator: RatioAllocator,
    bundle_chunker: BundleChunker,
    graph_builder: OperationGraphBuilder,
}

impl BundleApi {
    /// 创建新的BundleApi实例
    pub fn new(
        fabric_repo: Arc<FabricRepository>,
        bundle_repo: Arc<ProductionBundleRepository>,
        operation_repo: Arc<BundleOperationRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config_manager: Arc<ConfigManager>,
        lifecycle: Arc<LifecycleStateMachine>,
    ) -> Self {
        Self {
            fabric_repo,
            bundle_repo,
            operation_repo,
            action_log_repo,
            config_manager,
            lifecycle,
            ratio_allocator: RatioAllocator::new(),
            bundle_chunker: BundleChunker::new(),
            graph_builder: OperationGraphBuilder::new(),
        }
    }

    // ==========================================
    // 面料录入与尺码分配
    // ==========================================

    /// 录入面料卷（录入后不可变）
    pub fn record_fabric_roll(
        &self,
        lot_id: &str,
        color: &str,
        weight_kg: Option<f64>,
        layer_count: i32,
        recorded_by: &str,
    ) -> ApiResult<FabricRoll> {
        if layer_count <= 0 {
            return Err(ApiError::InvalidInput(format!(
                "拉布层数必须为正: {}",
                layer_count
            )));
        }

        let roll = FabricRoll {
            roll_id: Uuid::new_v4().to_string(),
            lot_id: lot_id.to_string(),
            color: color.to_string(),
            weight_kg,
            layer_count,
            recorded_by: Some(recorded_by.to_string()),
            created_at: Utc::now(),
        };
        self.fabric_repo.create_roll(&roll)?;

        self.log_action(
            ActionType::RollRecorded,
            recorded_by,
            None,
            None,
            Some(json!({
                "roll_id": roll.roll_id,
                "lot_id": lot_id,
                "color": color,
                "layer_count": layer_count,
            })),
        )?;

        Ok(roll)
    }

    /// 按配比分配拉布层数到各尺码,并持久化分配结果
    ///
    /// `total_layers` 缺省时按该批次/颜色已录入面料卷的层数合计重算,
    /// 面料卷集合变化后重新调用即得到最新分配。
    pub fn allocate_sizes(
        &self,
        lot_id: &str,
        color: &str,
        sizes: &[String],
        weights: &[i64],
        total_layers: Option<i64>,
        actor: &str,
    ) -> ApiResult<Vec<SizeAllocation>> {
        let total = match total_layers {
            Some(v) => v,
            None => self.fabric_repo.total_layers(lot_id, color)?,
        };

        let allocations = self.ratio_allocator.allocate(sizes, weights, total)?;
        self.fabric_repo.save_allocations(lot_id, color, &allocations)?;

        self.log_action(
            ActionType::SizesAllocated,
            actor,
            None,
            None,
            Some(json!({
                "lot_id": lot_id,
                "color": color,
                "total_layers": total,
                "allocations": allocations,
            })),
        )?;

        Ok(allocations)
    }

    /// 查询批次/颜色的尺码分配
    pub fn get_allocations(&self, lot_id: &str, color: &str) -> ApiResult<Vec<SizeAllocation>> {
        Ok(self.fabric_repo.find_allocations(lot_id, color)?)
    }

    // ==========================================
    // 建捆建图
    // ==========================================

    /// 按尺码分配建捆,并为每个捆扎实例化模板工序图
    ///
    /// - 模板声明裁片时按 (尺码 × 裁片) 建捆,否则整件成衣流转
    /// - 每个捆扎不超过最大捆扎件数（缺省取配置 max_bundle_size）
    /// - 捆内件数之和 == 对应尺码分配量
    pub fn create_bundles(
        &self,
        lot_id: &str,
        color: &str,
        allocations: &[SizeAllocation],
        template: &GarmentTemplate,
        max_bundle_size: Option<i32>,
        actor: &str,
    ) -> ApiResult<Vec<ProductionBundle>> {
        if allocations.is_empty() {
            return Err(ApiError::InvalidInput("尺码分配为空,无捆可建".to_string()));
        }

        let max = match max_bundle_size {
            Some(v) if v > 0 => v,
            Some(v) => {
                return Err(ApiError::InvalidInput(format!(
                    "最大捆扎件数必须为正: {}",
                    v
                )))
            }
            None => self.read_max_bundle_size()?,
        };

        let part_names: Vec<String> = if template.parts.is_empty() {
            vec![WHOLE_GARMENT_PART.to_string()]
        } else {
            template.parts.iter().map(|p| p.name.clone()).collect()
        };

        let mut created: Vec<ProductionBundle> = Vec::new();
        for alloc in allocations.iter().filter(|a| a.allocated_quantity > 0) {
            for part_name in &part_names {
                let bundles = self.bundle_chunker.chunk(
                    lot_id,
                    color,
                    &alloc.size,
                    part_name,
                    &template.template_id,
                    alloc.allocated_quantity,
                    max,
                )?;

                for bundle in bundles {
                    let operations = self.graph_builder.build(&bundle, template)?;
                    self.bundle_repo.create(&bundle)?;
                    self.operation_repo.batch_insert(&operations)?;
                    created.push(bundle);
                }
            }
        }

        self.log_action(
            ActionType::BundlesCreated,
            actor,
            None,
            None,
            Some(json!({
                "lot_id": lot_id,
                "color": color,
                "template_id": template.template_id,
                "max_bundle_size": max,
                "bundle_count": created.len(),
            })),
        )?;

        tracing::info!(
            "建捆完成: lot_id={}, color={}, 捆数={}, 模板={}",
            lot_id,
            color,
            created.len(),
            template.template_id
        );
        Ok(created)
    }

    // ==========================================
    // 捆扎状态管理
    // ==========================================

    /// 开裁（DRAFT → CUTTING）
    pub fn begin_cutting(&self, bundle_id: &str, actor: &str) -> ApiResult<ProductionBundle> {
        let bundle = self.lifecycle.begin_cutting(bundle_id)?;
        self.log_bundle_action(ActionType::CuttingStarted, actor, bundle_id, "开裁")?;
        Ok(bundle)
    }

    /// 裁剪完成（CUTTING → READY,工序进入可派工窗口）
    pub fn mark_cutting_complete(
        &self,
        bundle_id: &str,
        actor: &str,
    ) -> ApiResult<ProductionBundle> {
        let bundle = self.lifecycle.mark_cutting_complete(bundle_id)?;
        self.log_bundle_action(ActionType::CuttingCompleted, actor, bundle_id, "裁剪完成")?;
        Ok(bundle)
    }

    /// 捆扎挂起（任意非终态 → ON_HOLD）
    pub fn hold_bundle(&self, bundle_id: &str, actor: &str) -> ApiResult<ProductionBundle> {
        let bundle = self.lifecycle.hold_bundle(bundle_id)?;
        self.log_bundle_action(ActionType::BundleHeld, actor, bundle_id, "捆扎挂起")?;
        Ok(bundle)
    }

    /// 捆扎恢复（ON_HOLD → 挂起前状态）
    pub fn resume_bundle(&self, bundle_id: &str, actor: &str) -> ApiResult<ProductionBundle> {
        let bundle = self.lifecycle.resume_bundle(bundle_id)?;
        self.log_bundle_action(ActionType::BundleResumed, actor, bundle_id, "捆扎恢复")?;
        Ok(bundle)
    }

    /// 捆扎取消（仅 IN_PROGRESS,终态）
    pub fn cancel_bundle(&self, bundle_id: &str, actor: &str) -> ApiResult<ProductionBundle> {
        let bundle = self.lifecycle.cancel_bundle(bundle_id)?;
        self.log_bundle_action(ActionType::BundleCancelled, actor, bundle_id, "捆扎取消")?;
        Ok(bundle)
    }

    // ==========================================
    // 查询与进度汇总
    // ==========================================

    /// 查询单个捆扎
    pub fn get_bundle(&self, bundle_id: &str) -> ApiResult<ProductionBundle> {
        Ok(self.bundle_repo.get_by_id(bundle_id)?)
    }

    /// 查询批次的全部捆扎
    pub fn list_bundles_by_lot(&self, lot_id: &str) -> ApiResult<Vec<ProductionBundle>> {
        Ok(self.bundle_repo.find_by_lot(lot_id)?)
    }

    /// 查询捆扎的全部工序（按 sequence 排序）
    pub fn list_operations(&self, bundle_id: &str) -> ApiResult<Vec<BundleOperation>> {
        Ok(self.operation_repo.find_by_bundle(bundle_id)?)
    }

    /// 捆扎进度汇总（按工序状态计数 + 完成率）
    pub fn get_bundle_progress(&self, bundle_id: &str) -> ApiResult<BundleProgress> {
        let bundle = self.bundle_repo.get_by_id(bundle_id)?;
        let ops = self.operation_repo.find_by_bundle(bundle_id)?;

        let mut progress = BundleProgress {
            bundle_id: bundle_id.to_string(),
            status: bundle.status,
            total_operations: ops.len() as i32,
            waiting: 0,
            ready: 0,
            assigned: 0,
            in_progress: 0,
            frozen: 0,
            completed: 0,
            quality_failed: 0,
            skipped: 0,
            completion_pct: 0.0,
        };

        for op in &ops {
            match op.status {
                OperationStatus::Waiting => progress.waiting += 1,
                OperationStatus::Ready => progress.ready += 1,
                OperationStatus::Assigned => progress.assigned += 1,
                OperationStatus::InProgress => progress.in_progress += 1,
                OperationStatus::Frozen => progress.frozen += 1,
                OperationStatus::Completed => progress.completed += 1,
                OperationStatus::QualityFailed => progress.quality_failed += 1,
                OperationStatus::Skipped => progress.skipped += 1,
            }
        }

        if progress.total_operations > 0 {
            progress.completion_pct = (progress.completed + progress.skipped) as f64
                / progress.total_operations as f64
                * 100.0;
        }

        Ok(progress)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 读取最大捆扎件数配置（同步 API 桥接异步配置读取）
    fn read_max_bundle_size(&self) -> ApiResult<i32> {
        let config = self.config_manager.clone();

        let value = if let Ok(handle) = tokio::runtime::Handle::try_current() {
            // 已在 tokio 运行时中,使用 block_in_place 运行异步代码
            tokio::task::block_in_place(|| {
                handle.block_on(async move { config.get_max_bundle_size().await })
            })
        } else {
            // 不在运行时中,创建新的运行时
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| ApiError::InternalError(format!("tokio 运行时创建失败: {}", e)))?;
            rt.block_on(async move { config.get_max_bundle_size().await })
        };

        value.map_err(|e| ApiError::InternalError(format!("配置读取失败: {}", e)))
    }

    fn log_bundle_action(
        &self,
        action_type: ActionType,
        actor: &str,
        bundle_id: &str,
        detail: &str,
    ) -> ApiResult<()> {
        self.action_log_repo.insert(&ActionLog {
            action_id: Uuid::new_v4().to_string(),
            action_type,
            action_ts: Utc::now(),
            actor: actor.to_string(),
            bundle_id: Some(bundle_id.to_string()),
            operation_id: None,
            payload_json: None,
            detail: Some(detail.to_string()),
        })?;
        Ok(())
    }

    fn log_action(
        &self,
        action_type: ActionType,
        actor: &str,
        bundle_id: Option<String>,
        operation_id: Option<String>,
        payload_json: Option<serde_json::Value>,
    ) -> ApiResult<()> {
        self.action_log_repo.insert(&ActionLog {
            action_id: Uuid::new_v4().to_string(),
            action_type,
            action_ts: Utc::now(),
            actor: actor.to_string(),
            bundle_id,
            operation_id,
            payload_json,
            detail: None,
        })?;
        Ok(())
    }
}
