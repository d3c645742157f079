//! 生命周期兼容性与依赖环检测
//!
//! 依赖边 (X, Y) 表示 X 的某个展开依赖解析到已注册的具体组件 Y。
//! 持久度顺序为 `Transient < Scoped < Singleton`，宿主托管的组件不参与比较。

use crate::merge::MergedComponent;
use crate::planner::ExposedContracts;
use di_abstractions::{Component, DiagnosticsSink, Finding};
use infrastructure_common::{ComponentId, Lifetime, TypeRef};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// 实现索引
///
/// 记录每个可注册组件能满足的服务类型（自身类型和暴露的契约）
#[derive(Debug, Clone, Default)]
pub struct ImplementationIndex {
    services: Vec<(TypeRef, ComponentId)>,
    lifetimes: BTreeMap<ComponentId, Lifetime>,
}

impl ImplementationIndex {
    /// 从组件构建索引，只收录生命周期已确定的注册目标
    pub fn build<'a, I>(components: I) -> Self
    where
        I: IntoIterator<Item = &'a Component>,
    {
        let mut index = Self::default();
        for component in components {
            if !component.is_registration_target() || !component.lifetime.is_resolved() {
                continue;
            }
            index
                .services
                .push((component.self_type(), component.id.clone()));
            for contract in ExposedContracts::of(component).contracts {
                index.services.push((contract, component.id.clone()));
            }
            index.lifetimes.insert(component.id.clone(), component.lifetime);
        }
        index
    }

    /// 解析依赖类型到实现组件（按标识排序，去重）
    pub fn resolve(&self, dependency: &TypeRef) -> BTreeSet<&ComponentId> {
        self.services
            .iter()
            .filter(|(service, _)| dependency.matches(service))
            .map(|(_, id)| id)
            .collect()
    }

    /// 组件的生命周期
    pub fn lifetime(&self, id: &ComponentId) -> Option<Lifetime> {
        self.lifetimes.get(id).copied()
    }

    /// 是否收录了该组件
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.lifetimes.contains_key(id)
    }
}

/// 生命周期与依赖环验证器
#[derive(Debug)]
pub struct LifetimeValidator<'a> {
    index: &'a ImplementationIndex,
}

impl<'a> LifetimeValidator<'a> {
    /// 创建验证器
    pub fn new(index: &'a ImplementationIndex) -> Self {
        Self { index }
    }

    /// 组件的依赖边（外部依赖不产生边）
    pub fn edges(&self, merged: &MergedComponent) -> BTreeSet<ComponentId> {
        merged
            .flattened
            .iter()
            .filter(|entry| !entry.spec.external)
            .flat_map(|entry| self.index.resolve(entry.type_ref()))
            .cloned()
            .collect()
    }

    /// 检查单个组件的生命周期兼容性
    ///
    /// 每个 (X, Y) 组合至多上报一次；直接声明的边为致命错误，仅经继承引入的边为提示。
    /// 返回是否存在致命违规。
    pub fn validate(
        &self,
        component: &Component,
        merged: &MergedComponent,
        sink: &mut dyn DiagnosticsSink,
    ) -> bool {
        if component.lifetime != Lifetime::Singleton {
            return false;
        }

        // Y -> (首个依赖类型, 是否存在直接声明)
        let mut violations: BTreeMap<&ComponentId, (&TypeRef, bool)> = BTreeMap::new();
        for entry in merged.flattened.iter().filter(|entry| !entry.spec.external) {
            let direct = entry.declared_by == component.id || declares_locally(component, entry.type_ref());
            for target in self.index.resolve(entry.type_ref()) {
                let Some(target_lifetime) = self.index.lifetime(target) else {
                    continue;
                };
                if !matches!(target_lifetime, Lifetime::Scoped | Lifetime::Transient) {
                    continue;
                }
                violations
                    .entry(target)
                    .and_modify(|(type_ref, is_direct)| {
                        if direct && !*is_direct {
                            *type_ref = entry.type_ref();
                            *is_direct = true;
                        }
                    })
                    .or_insert((entry.type_ref(), direct));
            }
        }

        let mut fatal = false;
        for (target, (type_ref, direct)) in violations {
            fatal |= direct;
            sink.report(Finding::LifetimeViolation {
                component: component.id.clone(),
                dependency: target.clone(),
                dependency_type: type_ref.clone(),
                component_lifetime: component.lifetime,
                dependency_lifetime: self.index.lifetime(target).unwrap_or_default(),
                inherited: !direct,
            });
        }
        fatal
    }

    /// 在具体的已注册组件之间检测依赖环
    ///
    /// 使用带递归栈的迭代深度优先搜索；每个环旋转为以最小标识开头后去重
    pub fn detect_cycles(
        &self,
        edges: &BTreeMap<ComponentId, BTreeSet<ComponentId>>,
        sink: &mut dyn DiagnosticsSink,
    ) -> Vec<Vec<ComponentId>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }

        let mut marks: BTreeMap<&ComponentId, Mark> = BTreeMap::new();
        let mut cycles: BTreeSet<Vec<ComponentId>> = BTreeSet::new();

        for start in edges.keys() {
            if marks.contains_key(start) {
                continue;
            }

            let mut stack: Vec<(&ComponentId, Vec<&ComponentId>)> = vec![(start, neighbours(edges, start))];
            marks.insert(start, Mark::Visiting);

            while let Some((node, pending)) = stack.last_mut() {
                let node = *node;
                let Some(next) = pending.pop() else {
                    marks.insert(node, Mark::Done);
                    stack.pop();
                    continue;
                };

                match marks.get(next) {
                    Some(Mark::Visiting) => {
                        if let Some(position) = stack.iter().position(|(id, _)| *id == next) {
                            let cycle: Vec<ComponentId> =
                                stack[position..].iter().map(|(id, _)| (*id).clone()).collect();
                            cycles.insert(rotate_to_smallest(cycle));
                        }
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next, Mark::Visiting);
                        stack.push((next, neighbours(edges, next)));
                    }
                }
            }
        }

        let cycles: Vec<Vec<ComponentId>> = cycles.into_iter().collect();
        for cycle in &cycles {
            debug!("检测到依赖环: {:?}", cycle);
            sink.report(Finding::CycleWarning { cycle: cycle.clone() });
        }
        cycles
    }
}

/// 本级是否声明了该类型（包括因与基类重复而被合并丢弃的声明）
fn declares_locally(component: &Component, type_ref: &TypeRef) -> bool {
    component
        .dependencies
        .iter()
        .any(|spec| !spec.external && spec.type_ref == *type_ref)
}

/// 邻接节点，逆序存放以便按标识顺序弹出
fn neighbours<'e>(
    edges: &'e BTreeMap<ComponentId, BTreeSet<ComponentId>>,
    node: &ComponentId,
) -> Vec<&'e ComponentId> {
    edges
        .get(node)
        .map(|targets| targets.iter().filter(|target| edges.contains_key(*target)).rev().collect())
        .unwrap_or_default()
}

fn rotate_to_smallest(mut cycle: Vec<ComponentId>) -> Vec<ComponentId> {
    if let Some(position) = cycle
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map(|(position, _)| position)
    {
        cycle.rotate_left(position);
    }
    cycle
}
