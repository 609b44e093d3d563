// ==========================================
// 服装车间捆扎生产与工序派工系统 - 生命周期状态机
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 5. Lifecycle State Machine
// 红线: 状态转换合法性只在此处集中裁决,调用方不得自行改状态
// 红线: 非法转换以类型化错误上抛,不静默忽略、不自动重试
// ==========================================
// 职责: 捆扎/工序状态的唯一事实层
// 输入: 派工引擎的抢占结果、工人的开工/完工/质检上报、投诉冻结指令
// 输出: 状态写入 + 就绪级联 + 计件结算 + 事件发布
// ==========================================

mod core;
mod transitions;

#[cfg(test)]
mod tests;

pub use self::core::{transitive_dependencies, transitive_dependents, LifecycleStateMachine};
pub use transitions::{bundle_transition_allowed, operation_transition_allowed};
