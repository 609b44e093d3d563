// ==========================================
// 服装车间捆扎生产与工序派工系统 - 工序建图引擎
// ==========================================
// 依据: Bundle_MES_Dev_Spec.md - 4. Operation Graph Builder
// 红线: 模板前置关系必须构成 DAG,依赖只指向同捆兄弟工序
// ==========================================
// 职责: 按款式模板为捆扎实例化工序集
// 输入: ProductionBundle + GarmentTemplate
// 输出: Vec<BundleOperation>（下标依赖翻译为具体工序 id）
// ==========================================

use crate::domain::bundle::{BundleOperation, ProductionBundle};
use crate::domain::template::GarmentTemplate;
use crate::domain::types::OperationStatus;
use crate::engine::error::{EngineError, EngineResult};
use chrono::Utc;
use uuid::Uuid;

// ==========================================
// OperationGraphBuilder - 工序建图引擎
// ==========================================
// 无状态引擎,不需要注入依赖
pub struct OperationGraphBuilder {}

impl OperationGraphBuilder {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    /// 为捆扎实例化模板工序
    ///
    /// - 每个模板条目生成一个 BundleOperation,sequence 自 1 起
    /// - prerequisites（模板内相对下标）翻译为本捆工序 id
    /// - 无前置的工序初始 READY,其余 WAITING
    ///
    /// 模板本应在模板库录入时完成 DAG 校验,此处再验一遍作为运行期
    /// 兜底: 成环的模板直接拒绝建图,而不是留下永远无法 READY 的工序。
    ///
    /// # 返回
    /// - `Err(EngineError::TemplateGraph)`: 模板为空 / 下标越界或自指 / 成环
    pub fn build(
        &self,
        bundle: &ProductionBundle,
        template: &GarmentTemplate,
    ) -> EngineResult<Vec<BundleOperation>> {
        let op_count = template.operations.len();
        if op_count == 0 {
            return Err(EngineError::TemplateGraph(format!(
                "模板 {} 未声明任何工序",
                template.template_id
            )));
        }

        // 下标合法性检查
        for (idx, op_tpl) in template.operations.iter().enumerate() {
            for &pre in &op_tpl.prerequisites {
                if pre >= op_count {
                    return Err(EngineError::TemplateGraph(format!(
                        "模板 {} 工序[{}] 前置下标越界: {}",
                        template.template_id, idx, pre
                    )));
                }
                if pre == idx {
                    return Err(EngineError::TemplateGraph(format!(
                        "模板 {} 工序[{}] 前置指向自身",
                        template.template_id, idx
                    )));
                }
            }
        }

        // DAG 校验（Kahn 拓扑排序）
        Self::assert_acyclic(template)?;

        // 先分配全部工序 id,再翻译依赖
        let ids: Vec<String> = (0..op_count).map(|_| Uuid::new_v4().to_string()).collect();
        let now = Utc::now();

        let operations = template
            .operations
            .iter()
            .enumerate()
            .map(|(idx, op_tpl)| {
                let dependencies: Vec<String> = op_tpl
                    .prerequisites
                    .iter()
                    .map(|&pre| ids[pre].clone())
                    .collect();

                let status = if dependencies.is_empty() {
                    OperationStatus::Ready
                } else {
                    OperationStatus::Waiting
                };

                BundleOperation {
                    operation_id: ids[idx].clone(),
                    bundle_id: bundle.bundle_id.clone(),
                    sequence: (idx + 1) as i32,
                    name: op_tpl.name.clone(),
                    machine_type: op_tpl.machine_type.clone(),
                    required_skill: op_tpl.required_skill,
                    price_per_piece: op_tpl.price_per_piece,
                    standard_minutes: op_tpl.standard_minutes,
                    dependencies,
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
            })
            .collect();

        Ok(operations)
    }

    /// Kahn 拓扑排序验证模板无环
    fn assert_acyclic(template: &GarmentTemplate) -> EngineResult<()> {
        let op_count = template.operations.len();
        let mut in_degree = vec![0usize; op_count];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); op_count];

        for (idx, op_tpl) in template.operations.iter().enumerate() {
            in_degree[idx] = op_tpl.prerequisites.len();
            for &pre in &op_tpl.prerequisites {
                dependents[pre].push(idx);
            }
        }

        let mut queue: Vec<usize> = (0..op_count).filter(|&i| in_degree[i] == 0).collect();
        let mut visited = 0usize;

        while let Some(idx) = queue.pop() {
            visited += 1;
            for &dep in &dependents[idx] {
                in_degree[dep] -= 1;
                if in_degree[dep] == 0 {
                    queue.push(dep);
                }
            }
        }

        if visited != op_count {
            return Err(EngineError::TemplateGraph(format!(
                "模板 {} 前置关系成环: {} 个工序无法完成拓扑排序",
                template.template_id,
                op_count - visited
            )));
        }

        Ok(())
    }
}

impl Default for OperationGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
