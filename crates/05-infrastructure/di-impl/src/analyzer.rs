//! 分析编排
//!
//! 数据单向流动：类型目录 → 规范化 → 继承合并 → {构造函数合成, 生命周期验证}
//! → 条件谓词编译 → 注册计划。所有阶段都按组件标识排序处理，
//! 因而合并结果和诊断顺序在重复运行之间完全一致。

use crate::lifetime::{ImplementationIndex, LifetimeValidator};
use crate::merge::{FlattenedDependency, InheritanceResolver, MergedComponent};
use crate::normalize::Normalizer;
use crate::planner::{RegistrationPlanner, ValidatedComponent};
use crate::predicate::PredicateCompiler;
use crate::synthesis::ConstructorSynthesizer;
use di_abstractions::{
    Component, ConstructorPlan, DiagnosticsSink, Finding, RegistrationEntry, TypeCatalog,
};
use infrastructure_common::{AnalysisSettings, ComponentId};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::{debug, info};

/// 分析输出
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisOutput {
    /// 每个组件展开后的依赖列表
    pub flattened: BTreeMap<ComponentId, Vec<FlattenedDependency>>,
    /// 每个组件的构造函数计划（静态组件除外）
    pub constructors: BTreeMap<ComponentId, ConstructorPlan>,
    /// 全局注册计划
    pub registrations: Vec<RegistrationEntry>,
}

impl AnalysisOutput {
    /// 某个组件的注册条目
    pub fn registrations_for(&self, id: &ComponentId) -> Vec<&RegistrationEntry> {
        self.registrations
            .iter()
            .filter(|entry| &entry.component == id)
            .collect()
    }

    /// 某个组件展开后的类型文本
    pub fn flattened_types(&self, id: &ComponentId) -> Vec<String> {
        self.flattened
            .get(id)
            .map(|entries| entries.iter().map(|entry| entry.type_ref().to_string()).collect())
            .unwrap_or_default()
    }
}

/// 依赖分析器
#[derive(Debug, Clone, Default)]
pub struct DependencyAnalyzer {
    settings: AnalysisSettings,
}

impl DependencyAnalyzer {
    /// 使用分析设置创建
    pub fn new(settings: AnalysisSettings) -> Self {
        Self { settings }
    }

    /// 分析设置
    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// 运行一次完整分析
    ///
    /// 数据问题只通过诊断接收器上报；致命诊断只影响相关组件
    pub fn analyze(&self, catalog: &dyn TypeCatalog, sink: &mut dyn DiagnosticsSink) -> AnalysisOutput {
        let ids: BTreeSet<ComponentId> = catalog.component_ids().into_iter().collect();
        info!("开始依赖分析，共 {} 个组件", ids.len());

        // 规范化
        let normalizer = Normalizer::new(&self.settings);
        let mut components = BTreeMap::new();
        let mut broken = Vec::new();
        for id in &ids {
            let Some(declaration) = catalog.declaration(id) else {
                debug!("类型目录未提供组件声明: {}", id);
                continue;
            };
            match normalizer.normalize(declaration) {
                Ok(component) => {
                    components.insert(id.clone(), component);
                }
                Err(reason) => {
                    sink.report(Finding::StructuralError {
                        component: id.clone(),
                        reason,
                    });
                    broken.push(id.clone());
                }
            }
        }

        // 继承合并
        let mut resolver = InheritanceResolver::new(&components, &ids);
        for id in broken {
            resolver.mark_broken(id);
        }
        let mut merged: BTreeMap<&ComponentId, Rc<MergedComponent>> = BTreeMap::new();
        for id in components.keys() {
            if let Some(result) = resolver.merge(id, sink) {
                merged.insert(id, result);
            }
        }
        info!("继承合并完成: {}/{} 个组件", merged.len(), ids.len());

        // 构造函数合成
        let synthesizer = ConstructorSynthesizer::new();
        let mut output = AnalysisOutput::default();
        for (id, result) in &merged {
            let component = &components[*id];
            output.flattened.insert((*id).clone(), result.flattened.clone());
            if component.flags.is_static {
                continue;
            }
            output
                .constructors
                .insert((*id).clone(), synthesizer.synthesize(component, result));
        }

        // 生命周期与依赖环
        let index = ImplementationIndex::build(merged.keys().map(|id| &components[*id]));
        let validator = LifetimeValidator::new(&index);
        let mut blocked: BTreeSet<&ComponentId> = BTreeSet::new();
        let mut edges: BTreeMap<ComponentId, BTreeSet<ComponentId>> = BTreeMap::new();
        for (id, result) in &merged {
            let component = &components[*id];
            if validator.validate(component, result, sink) {
                blocked.insert(*id);
            }
            if index.contains(id) {
                edges.insert((*id).clone(), validator.edges(result));
            }
        }
        validator.detect_cycles(&edges, sink);

        // 条件谓词与注册计划
        let compiler = PredicateCompiler::new();
        let planner = RegistrationPlanner::new();
        let mut validated = Vec::new();
        for id in merged.keys() {
            let component: &Component = &components[*id];
            if !component.is_registration_target() {
                continue;
            }
            planner.report_exclusions(component, sink);
            let predicate = match compiler.compile(id, &component.conditions) {
                Ok(predicate) => predicate,
                Err(finding) => {
                    sink.report(finding);
                    continue;
                }
            };
            if blocked.contains(id) {
                debug!("组件 {} 存在致命的生命周期违规，跳过注册", id);
                continue;
            }
            if !component.lifetime.is_resolved() {
                debug!("组件 {} 的生命周期未确定，跳过注册", id);
                continue;
            }
            validated.push(ValidatedComponent { component, predicate });
        }

        output.registrations = planner.plan(&validated);
        info!(
            "依赖分析完成: {} 个构造函数计划, {} 个注册条目",
            output.constructors.len(),
            output.registrations.len()
        );
        output
    }
}
