// ==========================================
// AssignmentMatcher - 派工引擎核心
// ==========================================
// 并发语义: 两个并发派工请求落在同一工序时,先写者赢,
//           后者得到 AlreadyAssigned;仅 revision 漂移
//           （工序仍 READY）时有界重读重试。
// ==========================================

use super::scoring;
use crate::config::EngineConfigReader;
use crate::domain::assignment::WorkAssignment;
use crate::domain::operator::OperatorSnapshot;
use crate::domain::types::{BundleStatus, OperationStatus};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::events::{BundleEvent, BundleEventType, OptionalEventPublisher};
use crate::engine::lifecycle::LifecycleStateMachine;
use crate::repository::{
    BundleOperationRepository, ClaimOutcome, ProductionBundleRepository, RepositoryError,
};
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// AssignmentMatcher - 派工引擎
// ==========================================
pub struct AssignmentMatcher<C>
where
    C: EngineConfigReader,
{
    operation_repo: Arc<BundleOperationRepository>,
    bundle_repo: Arc<ProductionBundleRepository>,
    lifecycle: Arc<LifecycleStateMachine>,
    config: Arc<C>,
    events: OptionalEventPublisher,
}

impl<C> AssignmentMatcher<C>
where
    C: EngineConfigReader,
{
    /// 构造函数
    pub fn new(
        operation_repo: Arc<BundleOperationRepository>,
        bundle_repo: Arc<ProductionBundleRepository>,
        lifecycle: Arc<LifecycleStateMachine>,
        config: Arc<C>,
        events: OptionalEventPublisher,
    ) -> Self {
        Self {
            operation_repo,
            bundle_repo,
            lifecycle,
            config,
            events,
        }
    }

    /// 请求派工
    ///
    /// 流程:
    /// 1. 读取工序,校验 READY / 未冻结 / 捆扎可派工
    /// 2. 在 AVAILABLE 快照中评分选人（低于阈值 → NoCompatibleOperator）
    /// 3. 以读取到的 revision 做 CAS 抢占,成功即落派工单
    /// 4. 版本冲突有界重试（重读 + 重新评分）,其余失败直接上抛
    ///
    /// # 参数
    /// - `operation_id`: 目标工序
    /// - `snapshots`: 工人快照池（匹配时刻的花名册只读快照）
    /// - `min_score`: 最低可接受得分（None 时取配置值）
    #[instrument(skip(self, snapshots), fields(operation_id = %operation_id))]
    pub async fn request_assignment(
        &self,
        operation_id: &str,
        snapshots: &[OperatorSnapshot],
        min_score: Option<i32>,
    ) -> EngineResult<WorkAssignment> {
        let retry_limit = self
            .config
            .get_assign_retry_limit()
            .await
            .map_err(|e| EngineError::Other(anyhow::anyhow!("配置读取失败: {}", e)))?;
        let min_score = match min_score {
            Some(v) => v,
            None => self
                .config
                .get_min_match_score()
                .await
                .map_err(|e| EngineError::Other(anyhow::anyhow!("配置读取失败: {}", e)))?,
        };

        let mut attempt = 0;
        loop {
            let op = self.operation_repo.get_by_id(operation_id)?;
            let all_ops = self.operation_repo.find_by_bundle(&op.bundle_id)?;

            // 冻结/未决投诉拦截
            if let Some(complaint) = self.lifecycle.find_blocking_complaint(&op, &all_ops)? {
                return Err(EngineError::ComplaintBlocking {
                    operation_id: operation_id.to_string(),
                    complaint_id: complaint.complaint_id,
                });
            }

            // 工序状态校验
            match op.status {
                OperationStatus::Ready => {}
                OperationStatus::Assigned | OperationStatus::InProgress => {
                    return Err(EngineError::AlreadyAssigned {
                        operation_id: operation_id.to_string(),
                        operator_id: op.assigned_operator_id.clone().unwrap_or_default(),
                    });
                }
                _ => {
                    return Err(EngineError::IllegalTransition {
                        entity: "BundleOperation".to_string(),
                        id: operation_id.to_string(),
                        from: op.status.to_string(),
                        to: OperationStatus::Assigned.to_string(),
                    });
                }
            }

            // 捆扎可派工性: 挂起/取消的捆扎对未派工工序立即封口
            let bundle = self.bundle_repo.get_by_id(&op.bundle_id)?;
            if !matches!(bundle.status, BundleStatus::Ready | BundleStatus::InProgress) {
                return Err(EngineError::Validation(format!(
                    "捆扎 {} 状态 {} 不可派工",
                    bundle.bundle_id, bundle.status
                )));
            }

            // 评分选人
            let best = scoring::select_best(&op, snapshots);
            let (operator, score) = match best {
                Some(pair) => pair,
                None => {
                    // 无 AVAILABLE 工人: 用全池最高分提示距离阈值有多远
                    let best_score = snapshots
                        .iter()
                        .map(|s| scoring::compute_match_score(&op, s))
                        .max()
                        .unwrap_or(0);
                    return Err(EngineError::NoCompatibleOperator {
                        operation_id: operation_id.to_string(),
                        best_score,
                        min_score,
                    });
                }
            };

            if score < min_score {
                return Err(EngineError::NoCompatibleOperator {
                    operation_id: operation_id.to_string(),
                    best_score: score,
                    min_score,
                });
            }

            // CAS 抢占（派工件数取捆内件数）
            match self.operation_repo.claim_for_operator(
                operation_id,
                &operator.operator_id,
                op.revision,
                bundle.quantity,
            )? {
                ClaimOutcome::Claimed { operation, assignment } => {
                    // 首次派工推进捆扎 IN_PROGRESS
                    self.lifecycle.mark_bundle_in_progress(&operation.bundle_id)?;

                    self.events.publish(BundleEvent::operation(
                        BundleEventType::OperationAssigned,
                        operation.bundle_id.clone(),
                        operation_id.to_string(),
                        Some(operator.operator_id.clone()),
                    ));

                    tracing::info!(
                        "派工成功: operation_id={}, operator_id={}, score={}",
                        operation_id,
                        operator.operator_id,
                        score
                    );
                    return Ok(assignment);
                }
                ClaimOutcome::NotReady {
                    current,
                    assigned_operator_id,
                } => {
                    return match current {
                        OperationStatus::Assigned | OperationStatus::InProgress => {
                            Err(EngineError::AlreadyAssigned {
                                operation_id: operation_id.to_string(),
                                operator_id: assigned_operator_id.unwrap_or_default(),
                            })
                        }
                        OperationStatus::Frozen => {
                            // 抢占窗口内被投诉冻结
                            let fresh = self.operation_repo.get_by_id(operation_id)?;
                            let complaint_id = self
                                .lifecycle
                                .find_blocking_complaint(&fresh, &all_ops)?
                                .map(|c| c.complaint_id)
                                .unwrap_or_else(|| "UNKNOWN".to_string());
                            Err(EngineError::ComplaintBlocking {
                                operation_id: operation_id.to_string(),
                                complaint_id,
                            })
                        }
                        other => Err(EngineError::IllegalTransition {
                            entity: "BundleOperation".to_string(),
                            id: operation_id.to_string(),
                            from: other.to_string(),
                            to: OperationStatus::Assigned.to_string(),
                        }),
                    };
                }
                ClaimOutcome::RevisionConflict => {
                    attempt += 1;
                    if attempt > retry_limit {
                        return Err(EngineError::Repository(RepositoryError::VersionConflict {
                            message: format!(
                                "派工版本冲突重试超限: operation_id={}, attempts={}",
                                operation_id, attempt
                            ),
                        }));
                    }
                    tracing::debug!(
                        "派工版本冲突,重读重试: operation_id={}, attempt={}/{}",
                        operation_id,
                        attempt,
                        retry_limit
                    );
                    continue;
                }
            }
        }
    }
}
