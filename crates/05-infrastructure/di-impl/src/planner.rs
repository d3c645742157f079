//! 注册计划
//!
//! 根据暴露模式和排除列表确定组件对外暴露的契约，再按实例共享模式展开为注册条目。

use di_abstractions::{
    Component, DiagnosticsSink, Exposure, Finding, InstanceSharing, PredicateNode, RegistrationEntry,
    RegistrationKind,
};
use infrastructure_common::TypeRef;
use tracing::debug;

/// 暴露契约的计算结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExposedContracts {
    /// 最终暴露的契约，按声明顺序
    pub contracts: Vec<TypeRef>,
    /// 排除了未实现契约的排除项（不参与计划）
    pub unnecessary_exclusions: Vec<TypeRef>,
}

impl ExposedContracts {
    /// 计算组件暴露的契约
    pub fn of(component: &Component) -> Self {
        let self_type = component.self_type();
        let candidates: Vec<&TypeRef> = match &component.exposure {
            Exposure::SelfOnly => Vec::new(),
            Exposure::AllContracts => component.contracts.iter().collect(),
            Exposure::ExplicitList(list) => list.iter().collect(),
        };

        let mut unnecessary_exclusions = Vec::new();
        let mut effective_exclusions = Vec::new();
        for exclusion in &component.excluded_contracts {
            if component.contracts.contains(exclusion) {
                effective_exclusions.push(exclusion);
            } else if !unnecessary_exclusions.contains(exclusion) {
                unnecessary_exclusions.push(exclusion.clone());
            }
        }

        let mut contracts: Vec<TypeRef> = Vec::with_capacity(candidates.len());
        for contract in candidates {
            if *contract == self_type || effective_exclusions.contains(&contract) || contracts.contains(contract) {
                continue;
            }
            contracts.push(contract.clone());
        }

        Self {
            contracts,
            unnecessary_exclusions,
        }
    }
}

/// 通过验证、可以进入注册计划的组件
#[derive(Debug, Clone)]
pub struct ValidatedComponent<'a> {
    /// 组件
    pub component: &'a Component,
    /// 编译后的条件谓词
    pub predicate: Option<PredicateNode>,
}

/// 注册计划器
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationPlanner;

impl RegistrationPlanner {
    /// 创建计划器
    pub fn new() -> Self {
        Self
    }

    /// 生成全局注册计划，按组件标识排序
    pub fn plan(&self, validated: &[ValidatedComponent<'_>]) -> Vec<RegistrationEntry> {
        let mut ordered: Vec<&ValidatedComponent<'_>> = validated.iter().collect();
        ordered.sort_by(|a, b| a.component.id.cmp(&b.component.id));

        let mut entries = Vec::new();
        for item in ordered {
            entries.extend(self.plan_component(item.component, item.predicate.as_ref()));
        }
        entries
    }

    /// 上报未实现契约的排除项
    ///
    /// 与注册是否被阻止无关，每个注册目标都要检查
    pub fn report_exclusions(&self, component: &Component, sink: &mut dyn DiagnosticsSink) {
        for contract in ExposedContracts::of(component).unnecessary_exclusions {
            sink.report(Finding::UnnecessaryExclusion {
                component: component.id.clone(),
                contract,
            });
        }
    }

    /// 生成单个组件的注册条目
    ///
    /// `Separate` 模式产生 1 个具体条目加 k 个独立条目，`Shared` 模式产生 1 个具体条目加 k 个转发条目
    pub fn plan_component(&self, component: &Component, predicate: Option<&PredicateNode>) -> Vec<RegistrationEntry> {
        let exposed = ExposedContracts::of(component);

        let entry = |service: TypeRef, kind: RegistrationKind| RegistrationEntry {
            component: component.id.clone(),
            service,
            kind,
            lifetime: component.lifetime,
            sharing: component.sharing,
            predicate: predicate.cloned(),
        };

        let contract_kind = match component.sharing {
            InstanceSharing::Separate => RegistrationKind::Independent,
            InstanceSharing::Shared => RegistrationKind::Forwarding,
        };

        let mut entries = Vec::with_capacity(exposed.contracts.len() + 1);
        entries.push(entry(component.self_type(), RegistrationKind::Concrete));
        entries.extend(
            exposed
                .contracts
                .into_iter()
                .map(|contract| entry(contract, contract_kind)),
        );

        debug!(
            "注册计划 {}: {} 个条目 ({:?}, {})",
            component.id,
            entries.len(),
            component.sharing,
            component.lifetime
        );
        entries
    }
}
