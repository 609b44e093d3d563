// ==========================================
// 服装车间捆扎生产与工序派工系统 - 计件工资引擎
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 8. Earnings Calculator
// 红线: amount == completed_pieces * price_per_piece,一个工序只结算一次
// ==========================================
// 职责: 工序完工时派生计件工资记录（纯函数,重复结算由状态机拦截）
// ==========================================

use crate::domain::assignment::EarningsRecord;
use crate::domain::bundle::BundleOperation;
use crate::domain::types::QualityGrade;
use chrono::Utc;
use uuid::Uuid;

// ==========================================
// EarningsCalculator - 计件工资引擎
// ==========================================
// 无状态引擎,不需要注入依赖
pub struct EarningsCalculator {}

impl EarningsCalculator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 按完成件数派生计件记录
    ///
    /// # 参数
    /// - `operation`: 完工工序（调用方已校验状态与件数上限）
    /// - `operator_id`: 结算工人
    /// - `completed_pieces`: 完成件数
    /// - `quality_grade`: 质检等级
    pub fn settle(
        &self,
        operation: &BundleOperation,
        operator_id: &str,
        completed_pieces: i32,
        quality_grade: Option<QualityGrade>,
    ) -> EarningsRecord {
        EarningsRecord {
            earnings_id: Uuid::new_v4().to_string(),
            operation_id: operation.operation_id.clone(),
            bundle_id: operation.bundle_id.clone(),
            operator_id: operator_id.to_string(),
            completed_pieces,
            price_per_piece: operation.price_per_piece,
            amount: completed_pieces as f64 * operation.price_per_piece,
            quality_grade,
            settled_at: Utc::now(),
        }
    }
}

impl Default for EarningsCalculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{OperationStatus, SkillLevel};

    fn make_operation(price: f64) -> BundleOperation {
        let now = Utc::now();
        BundleOperation {
            operation_id: "OP001".to_string(),
            bundle_id: "B001".to_string(),
            sequence: 1,
            name: "SHOULDER_JOIN".to_string(),
            machine_type: "OVERLOCK".to_string(),
            required_skill: SkillLevel::Intermediate,
            price_per_piece: price,
            standard_minutes: 2.0,
            dependencies: vec![],
            status: OperationStatus::InProgress,
            frozen_from: None,
            assigned_operator_id: Some("W001".to_string()),
            assigned_pieces: 25,
            completed_pieces: 0,
            quality_grade: None,
            superseded_by: None,
            revision: 2,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_settle_exact_amount() {
        // 20 件 × 2.5 元 = 50.00 元
        let calculator = EarningsCalculator::new();
        let record = calculator.settle(&make_operation(2.5), "W001", 20, Some(QualityGrade::A));

        assert_eq!(record.completed_pieces, 20);
        assert_eq!(record.price_per_piece, 2.5);
        assert_eq!(record.amount, 50.0);
        assert_eq!(record.operator_id, "W001");
        assert_eq!(record.operation_id, "OP001");
    }

    #[test]
    fn test_settle_amount_matches_formula() {
        let calculator = EarningsCalculator::new();
        for (pieces, price) in [(1, 0.8), (25, 1.25), (13, 3.0)] {
            let record = calculator.settle(&make_operation(price), "W002", pieces, None);
            assert_eq!(record.amount, pieces as f64 * price);
        }
    }
}
