// ==========================================
// 服装车间捆扎生产与工序派工系统 - 分捆引擎
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 3. Bundle Chunker
// 红线: 单捆件数不超过最大捆扎件数,捆件数之和 == 输入数量
// 红线: 不产生零件数捆
// ==========================================
// 职责: 把 (颜色,尺码,裁片) 的数量切分为有界大小的生产捆
// 输出: 确定性编号的 ProductionBundle 列表（DRAFT 状态）
// ==========================================

use crate::domain::bundle::ProductionBundle;
use crate::domain::types::BundleStatus;
use crate::engine::error::{EngineError, EngineResult};
use chrono::Utc;
use uuid::Uuid;

// ==========================================
// BundleChunker - 分捆引擎
// ==========================================
// 无状态引擎,最大捆扎件数由调用方从配置读出后传入
pub struct BundleChunker {}

impl BundleChunker {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 切分数量为有界捆扎
    ///
    /// 规则:
    /// - 前 n-1 捆均为 max_bundle_size 件
    /// - 最后一捆为余数（整除时为 max_bundle_size）
    /// - bundle_no 自 1 起确定性递增
    ///
    /// # 参数
    /// - `lot_id` / `color` / `size` / `part_name`: 捆扎归属
    /// - `template_id`: 款式模板标识
    /// - `quantity`: 待切分数量（非负）
    /// - `max_bundle_size`: 最大捆扎件数（正整数,来自配置）
    ///
    /// # 返回
    /// - `Ok(Vec<ProductionBundle>)`: quantity 为 0 时返回空列表
    /// - `Err(EngineError::InvalidRatio)`: max_bundle_size 非正 / quantity 为负
    pub fn chunk(
        &self,
        lot_id: &str,
        color: &str,
        size: &str,
        part_name: &str,
        template_id: &str,
        quantity: i64,
        max_bundle_size: i32,
    ) -> EngineResult<Vec<ProductionBundle>> {
        if max_bundle_size <= 0 {
            return Err(EngineError::InvalidRatio(format!(
                "最大捆扎件数必须为正整数: {}",
                max_bundle_size
            )));
        }
        if quantity < 0 {
            return Err(EngineError::InvalidRatio(format!(
                "切分数量不能为负: {}",
                quantity
            )));
        }

        let max = max_bundle_size as i64;
        let now = Utc::now();
        let mut bundles = Vec::new();
        let mut remaining = quantity;
        let mut bundle_no = 1;

        while remaining > 0 {
            let this_quantity = remaining.min(max);

            bundles.push(ProductionBundle {
                bundle_id: Uuid::new_v4().to_string(),
                lot_id: lot_id.to_string(),
                color: color.to_string(),
                size: size.to_string(),
                part_name: part_name.to_string(),
                bundle_no,
                quantity: this_quantity as i32,
                template_id: template_id.to_string(),
                status: BundleStatus::Draft,
                held_from: None,
                revision: 0,
                created_at: now,
                updated_at: now,
            });

            remaining -= this_quantity;
            bundle_no += 1;
        }

        Ok(bundles)
    }
}

impl Default for BundleChunker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_quantities(quantity: i64, max: i32) -> Vec<i32> {
        BundleChunker::new()
            .chunk("LOT1", "NAVY", "L", "WHOLE_GARMENT", "TPL1", quantity, max)
            .unwrap()
            .iter()
            .map(|b| b.quantity)
            .collect()
    }

    #[test]
    fn test_chunk_with_remainder() {
        // 62 件,上限 25 → [25, 25, 12]
        assert_eq!(chunk_quantities(62, 25), vec![25, 25, 12]);
    }

    #[test]
    fn test_chunk_exact_multiple() {
        // 整除时最后一捆为满捆
        assert_eq!(chunk_quantities(75, 25), vec![25, 25, 25]);
    }

    #[test]
    fn test_chunk_below_max() {
        assert_eq!(chunk_quantities(10, 25), vec![10]);
    }

    #[test]
    fn test_chunk_zero_quantity_emits_nothing() {
        assert!(chunk_quantities(0, 25).is_empty());
    }

    #[test]
    fn test_chunk_sum_and_bound_invariants() {
        for quantity in [1i64, 24, 25, 26, 49, 50, 51, 200] {
            let bundles = BundleChunker::new()
                .chunk("LOT1", "NAVY", "L", "FRONT_PANEL", "TPL1", quantity, 25)
                .unwrap();

            let sum: i64 = bundles.iter().map(|b| b.quantity as i64).sum();
            assert_eq!(sum, quantity, "quantity={} 时捆件数之和必须等于输入", quantity);
            assert!(bundles.iter().all(|b| b.quantity > 0 && b.quantity <= 25));
        }
    }

    #[test]
    fn test_chunk_deterministic_numbering() {
        let bundles = BundleChunker::new()
            .chunk("LOT1", "NAVY", "L", "WHOLE_GARMENT", "TPL1", 60, 25)
            .unwrap();

        let numbers: Vec<i32> = bundles.iter().map(|b| b.bundle_no).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert!(bundles.iter().all(|b| b.status == BundleStatus::Draft));
    }

    #[test]
    fn test_chunk_rejects_bad_inputs() {
        let chunker = BundleChunker::new();
        assert!(chunker
            .chunk("LOT1", "NAVY", "L", "P", "TPL1", 10, 0)
            .is_err());
        assert!(chunker
            .chunk("LOT1", "NAVY", "L", "P", "TPL1", -1, 25)
            .is_err());
    }
}
