// ==========================================
// 生命周期状态机 - 纯逻辑单元测试
// ==========================================
// 说明: 带数据库的状态机测试见 tests/state_boundary_test.rs
// ==========================================

use super::transitions::{bundle_transition_allowed, operation_transition_allowed};
use super::core::{transitive_dependencies, transitive_dependents};
use crate::domain::bundle::BundleOperation;
use crate::domain::types::{BundleStatus, OperationStatus, SkillLevel};
use chrono::Utc;

fn make_op(id: &str, dependencies: Vec<&str>) -> BundleOperation {
    let now = Utc::now();
    BundleOperation {
        operation_id: id.to_string(),
        bundle_id: "B001".to_string(),
        sequence: 1,
        name: format!("OP_{}", id),
        machine_type: "OVERLOCK".to_string(),
        required_skill: SkillLevel::Junior,
        price_per_piece: 1.0,
        standard_minutes: 1.0,
        dependencies: dependencies.iter().map(|s| s.to_string()).collect(),
        status: OperationStatus::Waiting,
        frozen_from: None,
        assigned_operator_id: None,
        assigned_pieces: 0,
        completed_pieces: 0,
        quality_grade: None,
        superseded_by: None,
        revision: 0,
        created_at: now,
        updated_at: now,
    }
}

// ==========================================
// 工序转换表
// ==========================================

#[test]
fn test_operation_main_line_transitions() {
    use OperationStatus::*;
    assert!(operation_transition_allowed(Waiting, Ready));
    assert!(operation_transition_allowed(Ready, Assigned));
    assert!(operation_transition_allowed(Assigned, InProgress));
    assert!(operation_transition_allowed(InProgress, Completed));
}

#[test]
fn test_operation_freeze_transitions() {
    use OperationStatus::*;
    assert!(operation_transition_allowed(Ready, Frozen));
    assert!(operation_transition_allowed(Assigned, Frozen));
    assert!(operation_transition_allowed(Frozen, Ready));
    assert!(operation_transition_allowed(Frozen, Assigned));

    // WAITING/IN_PROGRESS 不进冻结态
    assert!(!operation_transition_allowed(Waiting, Frozen));
    assert!(!operation_transition_allowed(InProgress, Frozen));
}

#[test]
fn test_operation_terminal_states_are_final() {
    use OperationStatus::*;
    for from in [Completed, QualityFailed, Skipped] {
        for to in [
            Waiting, Ready, Assigned, InProgress, Frozen, Completed, QualityFailed, Skipped,
        ] {
            assert!(
                !operation_transition_allowed(from, to),
                "{} → {} 不应合法",
                from,
                to
            );
        }
    }
}

#[test]
fn test_operation_illegal_shortcuts() {
    use OperationStatus::*;
    // 不允许跳级
    assert!(!operation_transition_allowed(Waiting, Assigned));
    assert!(!operation_transition_allowed(Ready, InProgress));
    assert!(!operation_transition_allowed(Ready, Completed));
    assert!(!operation_transition_allowed(Assigned, Completed));
    // 只有 IN_PROGRESS 可质检失败
    assert!(!operation_transition_allowed(Assigned, QualityFailed));
    // 已开工不可跳过
    assert!(!operation_transition_allowed(InProgress, Skipped));
    assert!(!operation_transition_allowed(Assigned, Skipped));
}

// ==========================================
// 捆扎转换表
// ==========================================

#[test]
fn test_bundle_main_line_transitions() {
    use BundleStatus::*;
    assert!(bundle_transition_allowed(Draft, Cutting));
    assert!(bundle_transition_allowed(Cutting, Ready));
    assert!(bundle_transition_allowed(Ready, InProgress));
    assert!(bundle_transition_allowed(InProgress, Completed));
    assert!(bundle_transition_allowed(InProgress, Cancelled));
}

#[test]
fn test_bundle_hold_resume_transitions() {
    use BundleStatus::*;
    for state in [Draft, Cutting, Ready, InProgress] {
        assert!(bundle_transition_allowed(state, OnHold), "{} → ON_HOLD", state);
        assert!(bundle_transition_allowed(OnHold, state), "ON_HOLD → {}", state);
    }

    // 终态不可挂起
    assert!(!bundle_transition_allowed(Completed, OnHold));
    assert!(!bundle_transition_allowed(Cancelled, OnHold));
}

#[test]
fn test_bundle_illegal_transitions() {
    use BundleStatus::*;
    assert!(!bundle_transition_allowed(Draft, Ready));
    assert!(!bundle_transition_allowed(Cutting, InProgress));
    assert!(!bundle_transition_allowed(Ready, Completed));
    // 仅 IN_PROGRESS 可取消
    assert!(!bundle_transition_allowed(Ready, Cancelled));
    assert!(!bundle_transition_allowed(OnHold, Cancelled));
    // 终态不可逆
    assert!(!bundle_transition_allowed(Completed, InProgress));
    assert!(!bundle_transition_allowed(Cancelled, InProgress));
}

// ==========================================
// 依赖图遍历
// ==========================================

#[test]
fn test_transitive_dependents_chain() {
    // op1 ← op2 ← op3, op1 ← op4
    let ops = vec![
        make_op("op1", vec![]),
        make_op("op2", vec!["op1"]),
        make_op("op3", vec!["op2"]),
        make_op("op4", vec!["op1"]),
    ];

    let dependents = transitive_dependents(&ops, "op1");
    assert_eq!(dependents.len(), 3);
    assert!(dependents.contains("op2"));
    assert!(dependents.contains("op3"));
    assert!(dependents.contains("op4"));

    let dependents_of_2 = transitive_dependents(&ops, "op2");
    assert_eq!(dependents_of_2.len(), 1);
    assert!(dependents_of_2.contains("op3"));
}

#[test]
fn test_transitive_dependencies_diamond() {
    // 菱形: op4 依赖 op2/op3,二者都依赖 op1
    let ops = vec![
        make_op("op1", vec![]),
        make_op("op2", vec!["op1"]),
        make_op("op3", vec!["op1"]),
        make_op("op4", vec!["op2", "op3"]),
    ];

    let deps = transitive_dependencies(&ops, "op4");
    assert_eq!(deps.len(), 3);
    assert!(deps.contains("op1"));
    assert!(deps.contains("op2"));
    assert!(deps.contains("op3"));

    assert!(transitive_dependencies(&ops, "op1").is_empty());
}
