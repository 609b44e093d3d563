// ==========================================
// 测试数据构建器
// ==========================================
// 职责: 提供款式模板与工人快照的测试数据构建
// ==========================================

use garment_bundle_mes::domain::bundle::GarmentPart;
use garment_bundle_mes::domain::operator::OperatorSnapshot;
use garment_bundle_mes::domain::template::{GarmentTemplate, OperationTemplate};
use garment_bundle_mes::domain::types::{OperatorStatus, SkillLevel};
use std::collections::HashSet;

// ==========================================
// 款式模板构建器
// ==========================================

/// 款式模板构建器
pub struct TemplateBuilder {
    template_id: String,
    style_name: String,
    parts: Vec<GarmentPart>,
    operations: Vec<OperationTemplate>,
}

impl TemplateBuilder {
    pub fn new(template_id: &str) -> Self {
        Self {
            template_id: template_id.to_string(),
            style_name: "BASIC_TEE".to_string(),
            parts: Vec::new(),
            operations: Vec::new(),
        }
    }

    pub fn with_style_name(mut self, style_name: &str) -> Self {
        self.style_name = style_name.to_string();
        self
    }

    pub fn with_part(mut self, name: &str, quantity_per_garment: i32, cutting_minutes: f64) -> Self {
        self.parts.push(GarmentPart {
            name: name.to_string(),
            quantity_per_garment,
            cutting_minutes_per_piece: cutting_minutes,
        });
        self
    }

    pub fn with_operation(
        mut self,
        name: &str,
        machine_type: &str,
        required_skill: SkillLevel,
        price_per_piece: f64,
        standard_minutes: f64,
        prerequisites: &[usize],
    ) -> Self {
        self.operations.push(OperationTemplate {
            name: name.to_string(),
            machine_type: machine_type.to_string(),
            required_skill,
            price_per_piece,
            standard_minutes,
            prerequisites: prerequisites.to_vec(),
        });
        self
    }

    pub fn build(self) -> GarmentTemplate {
        GarmentTemplate {
            template_id: self.template_id,
            style_name: self.style_name,
            parts: self.parts,
            operations: self.operations,
        }
    }
}

/// 基础T恤模板: 肩缝 → (上袖 | 上领) → 卷下摆
///
/// 工序 0 无前置,1/2 依赖 0,3 依赖 1 和 2（菱形依赖）
pub fn basic_tee_template(template_id: &str) -> GarmentTemplate {
    TemplateBuilder::new(template_id)
        .with_operation("SHOULDER_JOIN", "OVERLOCK", SkillLevel::Intermediate, 1.5, 2.0, &[])
        .with_operation("SLEEVE_ATTACH", "OVERLOCK", SkillLevel::Intermediate, 2.0, 3.0, &[0])
        .with_operation("COLLAR_ATTACH", "FLATLOCK", SkillLevel::Senior, 2.5, 3.5, &[0])
        .with_operation("HEM_FOLD", "COVERSTITCH", SkillLevel::Junior, 1.0, 1.5, &[1, 2])
        .build()
}

/// 单工序模板（最小化场景）
pub fn single_operation_template(template_id: &str) -> GarmentTemplate {
    TemplateBuilder::new(template_id)
        .with_operation("LABEL_SEW", "LOCKSTITCH", SkillLevel::Junior, 0.8, 1.0, &[])
        .build()
}

/// 三工序直线链模板: 0 → 1 → 2
pub fn chain_template(template_id: &str) -> GarmentTemplate {
    TemplateBuilder::new(template_id)
        .with_operation("SHOULDER_JOIN", "OVERLOCK", SkillLevel::Intermediate, 1.5, 2.0, &[])
        .with_operation("SIDE_SEAM", "OVERLOCK", SkillLevel::Intermediate, 1.8, 2.5, &[0])
        .with_operation("HEM_FOLD", "COVERSTITCH", SkillLevel::Junior, 1.0, 1.5, &[1])
        .build()
}

// ==========================================
// 工人快照构建器
// ==========================================

/// 工人快照构建器
pub struct OperatorBuilder {
    snapshot: OperatorSnapshot,
}

impl OperatorBuilder {
    pub fn new(operator_id: &str) -> Self {
        Self {
            snapshot: OperatorSnapshot {
                operator_id: operator_id.to_string(),
                name: None,
                machine_types: HashSet::new(),
                skill_level: SkillLevel::Intermediate,
                efficiency_pct: 100.0,
                quality_score: 90.0,
                current_workload: 0,
                status: OperatorStatus::Available,
            },
        }
    }

    pub fn with_machines(mut self, machines: &[&str]) -> Self {
        self.snapshot.machine_types = machines.iter().map(|m| m.to_string()).collect();
        self
    }

    pub fn with_skill(mut self, skill: SkillLevel) -> Self {
        self.snapshot.skill_level = skill;
        self
    }

    pub fn with_efficiency(mut self, efficiency_pct: f64) -> Self {
        self.snapshot.efficiency_pct = efficiency_pct;
        self
    }

    pub fn with_quality(mut self, quality_score: f64) -> Self {
        self.snapshot.quality_score = quality_score;
        self
    }

    pub fn with_workload(mut self, current_workload: i32) -> Self {
        self.snapshot.current_workload = current_workload;
        self
    }

    pub fn with_status(mut self, status: OperatorStatus) -> Self {
        self.snapshot.status = status;
        self
    }

    pub fn build(self) -> OperatorSnapshot {
        self.snapshot
    }
}

/// 标准班组: 覆盖基础T恤模板全部机器类型的三名在岗工人
pub fn standard_crew() -> Vec<OperatorSnapshot> {
    vec![
        OperatorBuilder::new("W001")
            .with_machines(&["OVERLOCK", "LOCKSTITCH"])
            .with_skill(SkillLevel::Senior)
            .with_efficiency(112.0)
            .with_quality(96.0)
            .build(),
        OperatorBuilder::new("W002")
            .with_machines(&["FLATLOCK", "OVERLOCK"])
            .with_skill(SkillLevel::Senior)
            .with_efficiency(105.0)
            .with_quality(92.0)
            .build(),
        OperatorBuilder::new("W003")
            .with_machines(&["COVERSTITCH", "LOCKSTITCH"])
            .with_skill(SkillLevel::Intermediate)
            .with_efficiency(98.0)
            .with_quality(91.0)
            .build(),
    ]
}
