// ==========================================
// 服装车间捆扎生产与工序派工系统 - 尺码配比引擎
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 2. Ratio Allocator
// 红线: 各尺码分配量之和 == 总层数,取整余数不得静默丢弃
// ==========================================
// 职责: 按配比权重把拉布总层数分配到各尺码
// 输入: 尺码标签列表 + 等长权重列表 + 总层数
// 输出: Vec<SizeAllocation>
// ==========================================

use crate::domain::bundle::SizeAllocation;
use crate::engine::error::{EngineError, EngineResult};

// ==========================================
// RatioAllocator - 尺码配比引擎
// ==========================================
// 无状态引擎,不需要注入依赖
pub struct RatioAllocator {}

impl RatioAllocator {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 按配比分配总层数到各尺码
    ///
    /// 算法:
    /// 1) allocated[i] = floor(total * weight[i] / sum(weights))
    /// 2) 余数 total - sum(allocated) 全部加到最后一个尺码
    ///
    /// 余数集中到末位是确定性选择（裁床习惯把零头并入最大尺码层），
    /// 不做按比例摊分。
    ///
    /// # 参数
    /// - `sizes`: 尺码标签（有序）
    /// - `weights`: 配比权重（与 sizes 等长,均为正整数）
    /// - `total_layers`: 拉布总层数（非负）
    ///
    /// # 返回
    /// - `Ok(Vec<SizeAllocation>)`: 分配结果,顺序与 sizes 一致
    /// - `Err(EngineError::InvalidRatio)`: 权重数与尺码数不等 / 权重非正 / 总层数为负
    pub fn allocate(
        &self,
        sizes: &[String],
        weights: &[i64],
        total_layers: i64,
    ) -> EngineResult<Vec<SizeAllocation>> {
        if sizes.is_empty() {
            return Err(EngineError::InvalidRatio("尺码列表为空".to_string()));
        }
        if sizes.len() != weights.len() {
            return Err(EngineError::InvalidRatio(format!(
                "权重数({})与尺码数({})不一致",
                weights.len(),
                sizes.len()
            )));
        }
        if let Some(w) = weights.iter().find(|w| **w <= 0) {
            return Err(EngineError::InvalidRatio(format!("权重必须为正整数: {}", w)));
        }
        if total_layers < 0 {
            return Err(EngineError::InvalidRatio(format!(
                "总层数不能为负: {}",
                total_layers
            )));
        }

        let weight_sum: i64 = weights.iter().sum();

        let mut allocations: Vec<SizeAllocation> = sizes
            .iter()
            .zip(weights.iter())
            .map(|(size, weight)| SizeAllocation {
                size: size.clone(),
                ratio_weight: *weight,
                allocated_quantity: total_layers * weight / weight_sum,
            })
            .collect();

        // 余数全部落在最后一个尺码
        let allocated_sum: i64 = allocations.iter().map(|a| a.allocated_quantity).sum();
        let remainder = total_layers - allocated_sum;
        if let Some(last) = allocations.last_mut() {
            last.allocated_quantity += remainder;
        }

        Ok(allocations)
    }
}

impl Default for RatioAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_allocate_exact_split() {
        // 1:2:2:1 配比,60 层 → 10/20/20/10
        let allocator = RatioAllocator::new();
        let result = allocator
            .allocate(&sizes(&["L", "XL", "2XL", "3XL"]), &[1, 2, 2, 1], 60)
            .unwrap();

        let quantities: Vec<i64> = result.iter().map(|a| a.allocated_quantity).collect();
        assert_eq!(quantities, vec![10, 20, 20, 10]);
    }

    #[test]
    fn test_allocate_remainder_goes_to_last_size() {
        // 1:1:1 配比,100 层 → 33/33/34 (余数 1 落在最后)
        let allocator = RatioAllocator::new();
        let result = allocator
            .allocate(&sizes(&["M", "L", "XL"]), &[1, 1, 1], 100)
            .unwrap();

        let quantities: Vec<i64> = result.iter().map(|a| a.allocated_quantity).collect();
        assert_eq!(quantities, vec![33, 33, 34]);
    }

    #[test]
    fn test_allocate_sum_equals_total() {
        let allocator = RatioAllocator::new();
        for total in [0, 1, 7, 25, 61, 999] {
            let result = allocator
                .allocate(&sizes(&["S", "M", "L", "XL", "2XL"]), &[1, 3, 5, 3, 2], total)
                .unwrap();
            let sum: i64 = result.iter().map(|a| a.allocated_quantity).sum();
            assert_eq!(sum, total, "total={} 时分配和必须等于总层数", total);
        }
    }

    #[test]
    fn test_allocate_rounding_error_bounded() {
        // 每个尺码与精确比例份额的偏差 < 尺码个数
        let allocator = RatioAllocator::new();
        let weights = [2i64, 3, 4, 1];
        let total = 97i64;
        let result = allocator
            .allocate(&sizes(&["S", "M", "L", "XL"]), &weights, total)
            .unwrap();

        let weight_sum: i64 = weights.iter().sum();
        let n = weights.len() as f64;
        for alloc in &result {
            let exact = total as f64 * alloc.ratio_weight as f64 / weight_sum as f64;
            assert!(
                (alloc.allocated_quantity as f64 - exact).abs() < n,
                "尺码 {} 偏差过大: {} vs {}",
                alloc.size,
                alloc.allocated_quantity,
                exact
            );
        }
    }

    #[test]
    fn test_allocate_zero_total() {
        let allocator = RatioAllocator::new();
        let result = allocator
            .allocate(&sizes(&["M", "L"]), &[1, 1], 0)
            .unwrap();
        assert!(result.iter().all(|a| a.allocated_quantity == 0));
    }

    #[test]
    fn test_allocate_rejects_length_mismatch() {
        let allocator = RatioAllocator::new();
        let result = allocator.allocate(&sizes(&["M", "L"]), &[1, 2, 3], 10);
        assert!(matches!(result, Err(EngineError::InvalidRatio(_))));
    }

    #[test]
    fn test_allocate_rejects_non_positive_weight() {
        let allocator = RatioAllocator::new();
        assert!(matches!(
            allocator.allocate(&sizes(&["M", "L"]), &[1, 0], 10),
            Err(EngineError::InvalidRatio(_))
        ));
        assert!(matches!(
            allocator.allocate(&sizes(&["M", "L"]), &[-2, 3], 10),
            Err(EngineError::InvalidRatio(_))
        ));
    }

    #[test]
    fn test_allocate_rejects_negative_total() {
        let allocator = RatioAllocator::new();
        let result = allocator.allocate(&sizes(&["M", "L"]), &[1, 1], -5);
        assert!(matches!(result, Err(EngineError::InvalidRatio(_))));
    }
}
