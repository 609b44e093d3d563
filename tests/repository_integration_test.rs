// ==========================================
// 仓储层集成测试
// ==========================================
// 测试范围:
// 1. 捆扎/工序 CRUD 与 revision 乐观锁
// 2. 派工抢占事务的三种结果
// 3. ACTIVE 派工单部分唯一索引
// 4. 计件记录 operation_id 唯一约束
// 5. 面料卷/尺码分配/操作日志仓储
// ==========================================

mod test_helpers;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use garment_bundle_mes::domain::action_log::{ActionLog, ActionType};
use garment_bundle_mes::domain::assignment::EarningsRecord;
use garment_bundle_mes::domain::bundle::{
    BundleOperation, FabricRoll, ProductionBundle, SizeAllocation,
};
use garment_bundle_mes::domain::types::{
    AssignmentStatus, BundleStatus, OperationStatus, QualityGrade, SkillLevel,
};
use garment_bundle_mes::repository::error::RepositoryError;
use garment_bundle_mes::repository::{
    ActionLogRepository, BundleOperationRepository, ClaimOutcome, EarningsRepository,
    FabricRepository, ProductionBundleRepository, WorkAssignmentRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

// ==========================================
// 测试辅助函数
// ==========================================

fn setup() -> (tempfile::NamedTempFile, Arc<Mutex<Connection>>) {
    let (temp_file, db_path) = test_helpers::create_test_db().expect("创建测试数据库失败");
    let conn = test_helpers::open_test_connection(&db_path).expect("打开数据库失败");
    (temp_file, Arc::new(Mutex::new(conn)))
}

fn make_bundle(bundle_id: &str) -> ProductionBundle {
    let now = Utc::now();
    ProductionBundle {
        bundle_id: bundle_id.to_string(),
        lot_id: "LOT1".to_string(),
        color: "NAVY".to_string(),
        size: "L".to_string(),
        part_name: "WHOLE_GARMENT".to_string(),
        bundle_no: 1,
        quantity: 25,
        template_id: "TPL1".to_string(),
        status: BundleStatus::Ready,
        held_from: None,
        revision: 0,
        created_at: now,
        updated_at: now,
    }
}

fn make_operation(operation_id: &str, bundle_id: &str, status: OperationStatus) -> BundleOperation {
    let now = Utc::now();
    BundleOperation {
        operation_id: operation_id.to_string(),
        bundle_id: bundle_id.to_string(),
        sequence: 1,
        name: "SHOULDER_JOIN".to_string(),
        machine_type: "OVERLOCK".to_string(),
        required_skill: SkillLevel::Intermediate,
        price_per_piece: 1.5,
        standard_minutes: 2.0,
        dependencies: vec![],
        status,
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
// 捆扎仓储
// ==========================================

#[test]
fn test_bundle_crud_and_optimistic_lock() {
    let (_temp, conn) = setup();
    let repo = ProductionBundleRepository::new(conn);

    let bundle = make_bundle("B001");
    repo.create(&bundle).unwrap();

    let loaded = repo.get_by_id("B001").unwrap();
    assert_eq!(loaded.status, BundleStatus::Ready);
    assert_eq!(loaded.revision, 0);

    // 正常更新 revision+1
    let mut updated = loaded.clone();
    updated.status = BundleStatus::InProgress;
    repo.update(&updated).unwrap();
    assert_eq!(repo.get_by_id("B001").unwrap().revision, 1);

    // 过期 revision 更新冲突
    let mut stale = loaded;
    stale.status = BundleStatus::OnHold;
    assert!(matches!(
        repo.update(&stale),
        Err(RepositoryError::OptimisticLockFailure { .. })
    ));

    // 不存在的捆扎
    assert!(matches!(
        repo.get_by_id("B_MISSING"),
        Err(RepositoryError::NotFound { .. })
    ));
}

#[test]
fn test_bundle_queries_by_lot_and_status() {
    let (_temp, conn) = setup();
    let repo = ProductionBundleRepository::new(conn);

    for (id, no) in [("B001", 1), ("B002", 2)] {
        let mut bundle = make_bundle(id);
        bundle.bundle_no = no;
        repo.create(&bundle).unwrap();
    }

    let bundles = repo.find_by_lot("LOT1").unwrap();
    assert_eq!(bundles.len(), 2);
    assert_eq!(bundles[0].bundle_no, 1, "按捆号稳定排序");

    let ready = repo.find_by_status(BundleStatus::Ready).unwrap();
    assert_eq!(ready.len(), 2);
}

// ==========================================
// 工序仓储与派工抢占
// ==========================================

#[test]
fn test_operation_claim_outcomes() {
    let (_temp, conn) = setup();
    let bundle_repo = ProductionBundleRepository::new(conn.clone());
    let op_repo = BundleOperationRepository::new(conn);

    bundle_repo.create(&make_bundle("B001")).unwrap();
    op_repo
        .batch_insert(&[make_operation("OP001", "B001", OperationStatus::Ready)])
        .unwrap();

    // 抢占成功: 工序置 ASSIGNED,派工单 ACTIVE
    let outcome = op_repo.claim_for_operator("OP001", "W001", 0, 25).unwrap();
    match outcome {
        ClaimOutcome::Claimed { operation, assignment } => {
            assert_eq!(operation.status, OperationStatus::Assigned);
            assert_eq!(operation.assigned_pieces, 25);
            assert_eq!(assignment.operator_id, "W001");
            assert_eq!(assignment.status, AssignmentStatus::Active);
            assert_eq!(assignment.version_token, 1);
        }
        other => panic!("应抢占成功,实际: {:?}", other),
    }

    // 已被派工: NotReady
    let outcome = op_repo.claim_for_operator("OP001", "W002", 1, 25).unwrap();
    match outcome {
        ClaimOutcome::NotReady { current, assigned_operator_id } => {
            assert_eq!(current, OperationStatus::Assigned);
            assert_eq!(assigned_operator_id.as_deref(), Some("W001"));
        }
        other => panic!("应返回 NotReady,实际: {:?}", other),
    }

    // 仍 READY 但 revision 过期: RevisionConflict
    op_repo
        .batch_insert(&[make_operation("OP002", "B001", OperationStatus::Ready)])
        .unwrap();
    let fresh = op_repo.get_by_id("OP002").unwrap();
    let mut touched = fresh.clone();
    touched.updated_at = Utc::now();
    op_repo.update(&touched).unwrap(); // revision 0 → 1,状态仍 READY

    let outcome = op_repo
        .claim_for_operator("OP002", "W003", fresh.revision, 25)
        .unwrap();
    assert!(matches!(outcome, ClaimOutcome::RevisionConflict));
}

#[test]
fn test_active_assignment_unique_index() {
    let (_temp, conn) = setup();
    let bundle_repo = ProductionBundleRepository::new(conn.clone());
    let op_repo = BundleOperationRepository::new(conn.clone());

    bundle_repo.create(&make_bundle("B001")).unwrap();
    op_repo
        .batch_insert(&[make_operation("OP001", "B001", OperationStatus::Ready)])
        .unwrap();
    op_repo.claim_for_operator("OP001", "W001", 0, 25).unwrap();

    // 绕过抢占事务直接插入第二条 ACTIVE 派工单: 部分唯一索引兜底
    let guard = conn.lock().unwrap();
    let result = guard.execute(
        r#"INSERT INTO work_assignment (
            assignment_id, operation_id, operator_id, assigned_at,
            version_token, status, closed_at
        ) VALUES (?, 'OP001', 'W002', datetime('now'), 2, 'ACTIVE', NULL)"#,
        rusqlite::params![Uuid::new_v4().to_string()],
    );
    assert!(result.is_err(), "同一工序第二条 ACTIVE 派工单必须被唯一索引拒绝");
}

#[test]
fn test_assignment_close_and_workload() {
    let (_temp, conn) = setup();
    let bundle_repo = ProductionBundleRepository::new(conn.clone());
    let op_repo = BundleOperationRepository::new(conn.clone());
    let assignment_repo = WorkAssignmentRepository::new(conn);

    bundle_repo.create(&make_bundle("B001")).unwrap();
    op_repo
        .batch_insert(&[
            make_operation("OP001", "B001", OperationStatus::Ready),
            make_operation("OP002", "B001", OperationStatus::Ready),
        ])
        .unwrap();
    op_repo.claim_for_operator("OP001", "W001", 0, 25).unwrap();
    op_repo.claim_for_operator("OP002", "W001", 0, 25).unwrap();

    let workload = assignment_repo.get_workload("W001").unwrap();
    assert_eq!(workload.active_assignments, 2);
    assert_eq!(workload.assigned_pieces, 50);

    // 关闭后负荷下降;无 ACTIVE 单时关闭为幂等 no-op
    assert!(assignment_repo.close_active("OP001", AssignmentStatus::Closed).unwrap());
    assert!(!assignment_repo.close_active("OP001", AssignmentStatus::Closed).unwrap());

    let workload = assignment_repo.get_workload("W001").unwrap();
    assert_eq!(workload.active_assignments, 1);
    assert_eq!(workload.assigned_pieces, 25);
}

// ==========================================
// 计件记录
// ==========================================

#[test]
fn test_earnings_unique_per_operation() {
    let (_temp, conn) = setup();
    let bundle_repo = ProductionBundleRepository::new(conn.clone());
    let op_repo = BundleOperationRepository::new(conn.clone());
    let earnings_repo = EarningsRepository::new(conn);

    bundle_repo.create(&make_bundle("B001")).unwrap();
    op_repo
        .batch_insert(&[make_operation("OP001", "B001", OperationStatus::Completed)])
        .unwrap();

    let record = EarningsRecord {
        earnings_id: Uuid::new_v4().to_string(),
        operation_id: "OP001".to_string(),
        bundle_id: "B001".to_string(),
        operator_id: "W001".to_string(),
        completed_pieces: 20,
        price_per_piece: 2.5,
        amount: 50.0,
        quality_grade: Some(QualityGrade::A),
        settled_at: Utc::now(),
    };
    earnings_repo.insert(&record).unwrap();

    // 同工序二次结算触发唯一约束
    let mut duplicate = record.clone();
    duplicate.earnings_id = Uuid::new_v4().to_string();
    assert!(matches!(
        earnings_repo.insert(&duplicate),
        Err(RepositoryError::UniqueConstraintViolation(_))
    ));

    let summary = earnings_repo.summarize_operator("W001").unwrap();
    assert_eq!(summary.record_count, 1);
    assert_eq!(summary.total_amount, 50.0);
}

// ==========================================
// 面料卷与尺码分配
// ==========================================

#[test]
fn test_fabric_rolls_and_allocations() {
    let (_temp, conn) = setup();
    let repo = FabricRepository::new(conn);

    for (id, layers) in [("R001", 30), ("R002", 32)] {
        repo.create_roll(&FabricRoll {
            roll_id: id.to_string(),
            lot_id: "LOT1".to_string(),
            color: "NAVY".to_string(),
            weight_kg: Some(18.0),
            layer_count: layers,
            recorded_by: Some("cutting_master".to_string()),
            created_at: Utc::now(),
        })
        .unwrap();
    }

    assert_eq!(repo.total_layers("LOT1", "NAVY").unwrap(), 62);
    assert_eq!(repo.total_layers("LOT1", "WHITE").unwrap(), 0);

    // 分配保存与覆盖
    let first = vec![
        SizeAllocation { size: "L".to_string(), ratio_weight: 1, allocated_quantity: 31 },
        SizeAllocation { size: "XL".to_string(), ratio_weight: 1, allocated_quantity: 31 },
    ];
    repo.save_allocations("LOT1", "NAVY", &first).unwrap();

    let second = vec![
        SizeAllocation { size: "L".to_string(), ratio_weight: 1, allocated_quantity: 20 },
        SizeAllocation { size: "XL".to_string(), ratio_weight: 2, allocated_quantity: 42 },
    ];
    repo.save_allocations("LOT1", "NAVY", &second).unwrap();

    let loaded = repo.find_allocations("LOT1", "NAVY").unwrap();
    assert_eq!(loaded.len(), 2);
    let total: i64 = loaded.iter().map(|a| a.allocated_quantity).sum();
    assert_eq!(total, 62, "重算覆盖旧分配");
}

// ==========================================
// 操作日志
// ==========================================

#[test]
fn test_action_log_roundtrip() {
    let (_temp, conn) = setup();
    let repo = ActionLogRepository::new(conn);

    repo.insert(&ActionLog {
        action_id: Uuid::new_v4().to_string(),
        action_type: ActionType::OperationAssigned,
        action_ts: Utc::now(),
        actor: "supervisor".to_string(),
        bundle_id: Some("B001".to_string()),
        operation_id: Some("OP001".to_string()),
        payload_json: Some(serde_json::json!({ "operator_id": "W001" })),
        detail: None,
    })
    .unwrap();

    let logs = repo.list_by_bundle("B001").unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].action_type, ActionType::OperationAssigned);
    assert_eq!(
        logs[0].payload_json.as_ref().unwrap()["operator_id"],
        "W001"
    );

    assert_eq!(repo.list_recent(10).unwrap().len(), 1);
}
