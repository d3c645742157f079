//! 继承合并与冗余检测
//!
//! 沿基类链从根到叶合并每一层声明的依赖。每个组件的合并结果按组件标识
//! 记忆化，在一次分析过程中只计算一次，之后只读。

use di_abstractions::{
    Component, DependencyOrigin, DependencySpec, DiagnosticsSink, Finding, RedundancyScope,
    StructuralReason,
};
use infrastructure_common::{ComponentId, TypeRef};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;
use tracing::debug;

/// 展开后的依赖条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlattenedDependency {
    /// 已替换泛型参数的依赖声明
    pub spec: DependencySpec,
    /// 实际声明该依赖的组件
    pub declared_by: ComponentId,
}

impl FlattenedDependency {
    /// 已解析的类型引用
    pub fn type_ref(&self) -> &TypeRef {
        &self.spec.type_ref
    }
}

/// 单个组件的合并结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedComponent {
    /// 组件标识
    pub id: ComponentId,
    /// 展开后的依赖列表：基类展开列表在前，本级新增条目在后
    pub flattened: Vec<FlattenedDependency>,
    /// 来自基类的条目数量
    pub inherited_len: usize,
    /// 基类构造函数参数类型，按基类展开列表的顺序（已替换泛型参数）
    pub forwarded_types: Vec<TypeRef>,
}

impl MergedComponent {
    /// 继承的条目
    pub fn inherited(&self) -> &[FlattenedDependency] {
        &self.flattened[..self.inherited_len]
    }

    /// 本级新增的条目
    pub fn own(&self) -> &[FlattenedDependency] {
        &self.flattened[self.inherited_len..]
    }

    /// 展开后的类型列表
    pub fn types(&self) -> Vec<&TypeRef> {
        self.flattened.iter().map(FlattenedDependency::type_ref).collect()
    }
}

/// 继承合并器
///
/// 持有规范化后组件的只读视图；未能规范化的组件通过 [`Self::mark_broken`] 标记
pub struct InheritanceResolver<'a> {
    components: &'a BTreeMap<ComponentId, Component>,
    known: &'a BTreeSet<ComponentId>,
    memo: BTreeMap<ComponentId, Option<Rc<MergedComponent>>>,
}

impl<'a> InheritanceResolver<'a> {
    /// 创建合并器
    ///
    /// `known` 是类型目录中的全部组件标识，用于区分缺失的基类和已损坏的基类
    pub fn new(
        components: &'a BTreeMap<ComponentId, Component>,
        known: &'a BTreeSet<ComponentId>,
    ) -> Self {
        Self {
            components,
            known,
            memo: BTreeMap::new(),
        }
    }

    /// 标记已损坏的组件（其结构性错误已经上报）
    pub fn mark_broken(&mut self, id: ComponentId) {
        self.memo.insert(id, None);
    }

    /// 已计算的合并结果
    pub fn merged(&self, id: &ComponentId) -> Option<Rc<MergedComponent>> {
        self.memo.get(id).cloned().flatten()
    }

    /// 合并组件
    ///
    /// 结构性错误时返回 `None`，相关诊断只在首次计算时上报一次
    pub fn merge(&mut self, id: &ComponentId, sink: &mut dyn DiagnosticsSink) -> Option<Rc<MergedComponent>> {
        if let Some(state) = self.memo.get(id) {
            return state.clone();
        }

        let result = match self.inheritance_cycle(id) {
            Some(chain) => {
                sink.report(Finding::StructuralError {
                    component: id.clone(),
                    reason: StructuralReason::InheritanceCycle { chain },
                });
                None
            }
            None => self.merge_level(id, sink).map(Rc::new),
        };

        self.memo.insert(id.clone(), result.clone());
        result
    }

    /// 沿基类链查找包含该组件自身的环
    fn inheritance_cycle(&self, id: &ComponentId) -> Option<Vec<ComponentId>> {
        let mut visited: Vec<ComponentId> = vec![id.clone()];
        let mut current = id;
        loop {
            let base = &self.components.get(current)?.base.as_ref()?.component;
            if base == id {
                return Some(visited);
            }
            if visited.contains(base) {
                // 基类链进入了一个不包含该组件的环，由环上的组件报告
                return None;
            }
            visited.push(base.clone());
            current = base;
        }
    }

    fn merge_level(&mut self, id: &ComponentId, sink: &mut dyn DiagnosticsSink) -> Option<MergedComponent> {
        let components = self.components;
        let component = components.get(id)?;

        let (inherited, forwarded_types) = match &component.base {
            None => (Vec::new(), Vec::new()),
            Some(base_ref) => {
                let base_id = &base_ref.component;
                if !self.known.contains(base_id) {
                    return fail(sink, id, StructuralReason::MissingBase { base: base_id.clone() });
                }
                let Some(base_merged) = self.merge(base_id, sink) else {
                    return fail(sink, id, StructuralReason::BrokenAncestor { ancestor: base_id.clone() });
                };
                let base_component = components.get(base_id)?;
                if base_component.type_params.len() != base_ref.type_args.len() {
                    return fail(
                        sink,
                        id,
                        StructuralReason::BaseArityMismatch {
                            base: base_id.clone(),
                            expected: base_component.type_params.len(),
                            actual: base_ref.type_args.len(),
                        },
                    );
                }

                let bindings: BTreeMap<String, TypeRef> = base_component
                    .type_params
                    .iter()
                    .cloned()
                    .zip(base_ref.type_args.iter().cloned())
                    .collect();

                match substitute_inherited(&base_merged.flattened, &bindings) {
                    Ok(substituted) => substituted,
                    Err(parameter) => {
                        return fail(sink, id, StructuralReason::UnresolvedGenericParameter { parameter })
                    }
                }
            }
        };

        let own = Self::merge_local(component, &inherited, sink);
        debug!(
            "合并组件 {}: 继承 {} 项，新增 {} 项",
            id,
            inherited.len(),
            own.len()
        );

        let inherited_len = inherited.len();
        let mut flattened = inherited;
        flattened.extend(own);

        Some(MergedComponent {
            id: id.clone(),
            flattened,
            inherited_len,
            forwarded_types,
        })
    }

    /// 合并本级声明，返回本级新增条目
    fn merge_local(
        component: &Component,
        inherited: &[FlattenedDependency],
        sink: &mut dyn DiagnosticsSink,
    ) -> Vec<FlattenedDependency> {
        let id = &component.id;

        // 批量声明：按声明顺序去重
        let mut bulk: Vec<&DependencySpec> = Vec::new();
        for spec in component
            .dependencies
            .iter()
            .filter(|spec| spec.origin == DependencyOrigin::BulkDeclared)
        {
            match first_group(&bulk, &spec.type_ref) {
                Some(first_group) => {
                    let scope = if first_group == spec.group {
                        RedundancyScope::DuplicateWithinGroup { group: spec.group }
                    } else {
                        RedundancyScope::DuplicateAcrossGroups {
                            first_group,
                            group: spec.group,
                        }
                    };
                    report_redundancy(sink, id, &spec.type_ref, scope);
                }
                None => bulk.push(spec),
            }
        }

        // 字段声明：每个字段自成一组
        let mut fields: Vec<&DependencySpec> = Vec::new();
        for spec in component
            .dependencies
            .iter()
            .filter(|spec| spec.origin == DependencyOrigin::FieldDeclared)
        {
            match first_group(&fields, &spec.type_ref) {
                Some(first_group) => report_redundancy(
                    sink,
                    id,
                    &spec.type_ref,
                    RedundancyScope::DuplicateAcrossGroups {
                        first_group,
                        group: spec.group,
                    },
                ),
                None => fields.push(spec),
            }
        }

        // 字段声明优先
        bulk.retain(|spec| {
            let shadowed = fields.iter().any(|field| field.type_ref == spec.type_ref);
            if shadowed {
                sink.report(Finding::ConflictWarning {
                    component: id.clone(),
                    dependency: spec.type_ref.clone(),
                });
            }
            !shadowed
        });

        let mut own = Vec::with_capacity(bulk.len() + fields.len());
        for spec in bulk.into_iter().chain(fields) {
            if let Some(entry) = inherited.iter().find(|entry| entry.spec.type_ref == spec.type_ref) {
                report_redundancy(
                    sink,
                    id,
                    &spec.type_ref,
                    RedundancyScope::Inherited {
                        ancestor: entry.declared_by.clone(),
                    },
                );
                continue;
            }
            own.push(FlattenedDependency {
                spec: spec.clone(),
                declared_by: id.clone(),
            });
        }
        own
    }
}

/// 替换基类展开列表中的泛型参数
///
/// 返回去重后的继承条目，以及与基类展开列表一一对应的类型列表
fn substitute_inherited(
    base_flattened: &[FlattenedDependency],
    bindings: &BTreeMap<String, TypeRef>,
) -> Result<(Vec<FlattenedDependency>, Vec<TypeRef>), String> {
    let mut inherited: Vec<FlattenedDependency> = Vec::with_capacity(base_flattened.len());
    let mut forwarded = Vec::with_capacity(base_flattened.len());
    for entry in base_flattened {
        let spec = entry.spec.substitute(bindings)?;
        forwarded.push(spec.type_ref.clone());
        // 不同的泛型参数可能被封闭为同一类型
        if inherited.iter().any(|kept| kept.spec.type_ref == spec.type_ref) {
            continue;
        }
        inherited.push(FlattenedDependency {
            spec,
            declared_by: entry.declared_by.clone(),
        });
    }
    Ok((inherited, forwarded))
}

fn first_group(kept: &[&DependencySpec], type_ref: &TypeRef) -> Option<usize> {
    kept.iter()
        .find(|spec| spec.type_ref == *type_ref)
        .map(|spec| spec.group)
}

fn fail(sink: &mut dyn DiagnosticsSink, id: &ComponentId, reason: StructuralReason) -> Option<MergedComponent> {
    sink.report(Finding::StructuralError {
        component: id.clone(),
        reason,
    });
    None
}

fn report_redundancy(
    sink: &mut dyn DiagnosticsSink,
    id: &ComponentId,
    dependency: &TypeRef,
    scope: RedundancyScope,
) {
    sink.report(Finding::RedundancyWarning {
        component: id.clone(),
        dependency: dependency.clone(),
        scope,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::Normalizer;
    use di_abstractions::{BaseReference, CollectingSink, ComponentDeclaration, FindingKind};
    use infrastructure_common::AnalysisSettings;

    fn ty(text: &str) -> TypeRef {
        text.parse().unwrap()
    }

    fn build(declarations: Vec<ComponentDeclaration>) -> (BTreeMap<ComponentId, Component>, BTreeSet<ComponentId>) {
        let normalizer = Normalizer::new(&AnalysisSettings::default());
        let components: BTreeMap<_, _> = declarations
            .iter()
            .map(|d| (d.id.clone(), normalizer.normalize(d).unwrap()))
            .collect();
        let known = components.keys().cloned().collect();
        (components, known)
    }

    fn types(merged: &MergedComponent) -> Vec<String> {
        merged.types().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_duplicates_within_and_across_groups() {
        let (components, known) = build(vec![ComponentDeclaration::new("Service")
            .with_bulk([ty("IA"), ty("IB"), ty("IA")])
            .with_bulk([ty("IB"), ty("IC")])]);
        let mut resolver = InheritanceResolver::new(&components, &known);
        let mut sink = CollectingSink::new();

        let merged = resolver.merge(&ComponentId::new("Service"), &mut sink).unwrap();
        assert_eq!(types(&merged), vec!["IA", "IB", "IC"]);

        let findings = sink.findings();
        assert_eq!(findings.len(), 2);
        assert!(matches!(
            &findings[0],
            Finding::RedundancyWarning { scope: RedundancyScope::DuplicateWithinGroup { group: 0 }, .. }
        ));
        assert!(matches!(
            &findings[1],
            Finding::RedundancyWarning {
                scope: RedundancyScope::DuplicateAcrossGroups { first_group: 0, group: 1 },
                ..
            }
        ));
    }

    #[test]
    fn test_field_declaration_takes_precedence() {
        let (components, known) = build(vec![ComponentDeclaration::new("Service")
            .with_bulk([ty("IA"), ty("IB")])
            .with_field(ty("IA"))]);
        let mut resolver = InheritanceResolver::new(&components, &known);
        let mut sink = CollectingSink::new();

        let merged = resolver.merge(&ComponentId::new("Service"), &mut sink).unwrap();
        assert_eq!(types(&merged), vec!["IB", "IA"]);
        assert_eq!(merged.flattened[1].spec.origin, DependencyOrigin::FieldDeclared);
        assert_eq!(sink.of_kind(FindingKind::ConflictWarning).len(), 1);
    }

    #[test]
    fn test_generic_base_is_substituted() {
        let (components, known) = build(vec![
            ComponentDeclaration::new("RepositoryBase")
                .with_type_params(["T"])
                .with_bulk([ty("ILogger<T>"), ty("IDbContext")])
                .with_flags(di_abstractions::ComponentFlags::abstract_base()),
            ComponentDeclaration::new("OrderRepository")
                .with_base(BaseReference::generic("RepositoryBase", vec![ty("Order")]))
                .with_bulk([ty("ILogger<Order>"), ty("IClock")]),
        ]);
        let mut resolver = InheritanceResolver::new(&components, &known);
        let mut sink = CollectingSink::new();

        let merged = resolver.merge(&ComponentId::new("OrderRepository"), &mut sink).unwrap();
        assert_eq!(types(&merged), vec!["ILogger<Order>", "IDbContext", "IClock"]);
        assert_eq!(merged.inherited_len, 2);
        assert_eq!(merged.flattened[0].spec.parameter_name, "orderLogger");
        assert_eq!(merged.flattened[0].declared_by, ComponentId::new("RepositoryBase"));

        let redundancies = sink.of_kind(FindingKind::RedundancyWarning);
        assert_eq!(redundancies.len(), 1);
        assert!(matches!(
            redundancies[0],
            Finding::RedundancyWarning { scope: RedundancyScope::Inherited { ancestor }, .. }
                if ancestor.as_str() == "RepositoryBase"
        ));
    }

    #[test]
    fn test_inheritance_cycle_is_isolated() {
        let (components, known) = build(vec![
            ComponentDeclaration::new("A").with_base(BaseReference::new("B")),
            ComponentDeclaration::new("B").with_base(BaseReference::new("A")),
            ComponentDeclaration::new("C").with_base(BaseReference::new("A")),
            ComponentDeclaration::new("D").with_bulk([ty("IA")]),
        ]);
        let mut resolver = InheritanceResolver::new(&components, &known);
        let mut sink = CollectingSink::new();

        for id in ["A", "B", "C", "D"] {
            resolver.merge(&ComponentId::new(id), &mut sink);
        }

        assert!(resolver.merged(&ComponentId::new("A")).is_none());
        assert!(resolver.merged(&ComponentId::new("B")).is_none());
        assert!(resolver.merged(&ComponentId::new("C")).is_none());
        assert!(resolver.merged(&ComponentId::new("D")).is_some());

        let reasons: Vec<&StructuralReason> = sink
            .findings()
            .iter()
            .filter_map(|finding| match finding {
                Finding::StructuralError { reason, .. } => Some(reason),
                _ => None,
            })
            .collect();
        assert_eq!(reasons.len(), 3);
        assert_eq!(
            reasons[0],
            &StructuralReason::InheritanceCycle {
                chain: vec![ComponentId::new("A"), ComponentId::new("B")]
            }
        );
        assert_eq!(
            reasons[2],
            &StructuralReason::BrokenAncestor {
                ancestor: ComponentId::new("A")
            }
        );
    }

    #[test]
    fn test_self_referential_base() {
        let (components, known) = build(vec![ComponentDeclaration::new("Loop").with_base(BaseReference::new("Loop"))]);
        let mut resolver = InheritanceResolver::new(&components, &known);
        let mut sink = CollectingSink::new();

        assert!(resolver.merge(&ComponentId::new("Loop"), &mut sink).is_none());
        assert_eq!(sink.findings().len(), 1);
    }

    #[test]
    fn test_missing_base_and_arity_mismatch() {
        let (components, known) = build(vec![
            ComponentDeclaration::new("Orphan").with_base(BaseReference::new("Nowhere")),
            ComponentDeclaration::new("Base").with_type_params(["T"]),
            ComponentDeclaration::new("Derived").with_base(BaseReference::new("Base")),
        ]);
        let mut resolver = InheritanceResolver::new(&components, &known);
        let mut sink = CollectingSink::new();

        assert!(resolver.merge(&ComponentId::new("Orphan"), &mut sink).is_none());
        assert!(resolver.merge(&ComponentId::new("Derived"), &mut sink).is_none());
        assert!(resolver.merge(&ComponentId::new("Base"), &mut sink).is_some());

        assert!(matches!(
            &sink.findings()[0],
            Finding::StructuralError { reason: StructuralReason::MissingBase { .. }, .. }
        ));
        assert!(matches!(
            &sink.findings()[1],
            Finding::StructuralError {
                reason: StructuralReason::BaseArityMismatch { expected: 1, actual: 0, .. },
                ..
            }
        ));
    }

    #[test]
    fn test_merge_is_memoized() {
        let (components, known) = build(vec![ComponentDeclaration::new("Service").with_bulk([ty("IA"), ty("IA")])]);
        let mut resolver = InheritanceResolver::new(&components, &known);
        let mut sink = CollectingSink::new();

        let first = resolver.merge(&ComponentId::new("Service"), &mut sink).unwrap();
        let second = resolver.merge(&ComponentId::new("Service"), &mut sink).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(sink.findings().len(), 1);
    }
}
