// ==========================================
// 服装车间捆扎生产与工序派工系统 - 派工引擎
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 6. Assignment Matcher
// 红线: 同一工序至多一名有效派工工人,抢占走乐观锁 CAS
// 红线: 仅版本冲突可有界重试,业务性失败一律直接上抛
// ==========================================
// 职责: 工人/工序匹配评分 + 原子派工
// 输入: READY 工序 + 工人快照池（外部花名册只读）
// 输出: WorkAssignment
// ==========================================

mod core;
mod scoring;


pub use self::core::AssignmentMatcher;
pub use scoring::compute_match_score;
