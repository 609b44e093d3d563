// ==========================================
// 服装车间捆扎生产与工序派工系统 - 引擎层事件发布
// ==========================================
// 职责: 定义生产事件发布 trait，实现依赖倒置
// 说明: Engine 层定义 trait，通知/看板层实现适配器
// 红线: 引擎不关心订阅方是谁,发布失败只记日志不阻断主流程
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 生产事件类型
// ==========================================

/// 生产事件触发类型
///
/// Engine 层定义的事件类型，用于通知下游系统（消息推送/看板刷新）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BundleEventType {
    /// 工序已派工
    OperationAssigned,
    /// 工序已完工
    OperationCompleted,
    /// 工序质检失败
    OperationFailed,
    /// 物料投诉上报
    ComplaintRaised,
    /// 物料投诉解决
    ComplaintResolved,
    /// 捆扎完工
    BundleCompleted,
}

impl BundleEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            BundleEventType::OperationAssigned => "OperationAssigned",
            BundleEventType::OperationCompleted => "OperationCompleted",
            BundleEventType::OperationFailed => "OperationFailed",
            BundleEventType::ComplaintRaised => "ComplaintRaised",
            BundleEventType::ComplaintResolved => "ComplaintResolved",
            BundleEventType::BundleCompleted => "BundleCompleted",
        }
    }
}

/// 生产事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleEvent {
    /// 事件类型
    pub event_type: BundleEventType,
    /// 关联捆扎
    pub bundle_id: String,
    /// 关联工序（捆扎级事件为 None）
    pub operation_id: Option<String>,
    /// 关联工人（无工人语义的事件为 None）
    pub operator_id: Option<String>,
    /// 事件来源描述
    pub source: Option<String>,
}

impl BundleEvent {
    /// 创建工序级事件
    pub fn operation(
        event_type: BundleEventType,
        bundle_id: String,
        operation_id: String,
        operator_id: Option<String>,
    ) -> Self {
        Self {
            event_type,
            bundle_id,
            operation_id: Some(operation_id),
            operator_id,
            source: None,
        }
    }

    /// 创建捆扎级事件
    pub fn bundle(event_type: BundleEventType, bundle_id: String) -> Self {
        Self {
            event_type,
            bundle_id,
            operation_id: None,
            operator_id: None,
            source: None,
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 生产事件发布者 Trait
///
/// Engine 层定义，通知/看板层实现
/// 通过 trait 实现依赖倒置，引擎不依赖任何下游
pub trait BundleEventPublisher: Send + Sync {
    /// 发布生产事件
    ///
    /// # 返回
    /// - `Ok(())`: 发布成功（或下游自行排队）
    /// - `Err`: 发布失败（调用方只记日志,不阻断业务）
    fn publish(&self, event: BundleEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl BundleEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: BundleEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - bundle_id={}, event_type={}",
            event.bundle_id,
            event.event_type.as_str()
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn BundleEventPublisher>> 的使用
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn BundleEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn BundleEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者,失败只记日志）
    pub fn publish(&self, event: BundleEvent) {
        if let Some(publisher) = &self.inner {
            if let Err(e) = publisher.publish(event.clone()) {
                tracing::warn!(
                    "事件发布失败 - bundle_id={}, event_type={}, err={}",
                    event.bundle_id,
                    event.event_type.as_str(),
                    e
                );
            }
        } else {
            tracing::debug!(
                "OptionalEventPublisher: 未配置发布者，跳过事件 - bundle_id={}, event_type={}",
                event.bundle_id,
                event.event_type.as_str()
            );
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
