//! 构造函数参数合成

use crate::merge::MergedComponent;
use di_abstractions::{Component, ConstructorPlan, Parameter};
use infrastructure_common::NamingConventions;
use std::collections::BTreeSet;
use tracing::debug;

/// 构造函数参数合成器
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstructorSynthesizer;

impl ConstructorSynthesizer {
    /// 创建合成器
    pub fn new() -> Self {
        Self
    }

    /// 为组件合成构造函数计划
    ///
    /// 参数名称在整个展开列表上去重，后出现的同名参数追加数字后缀（`clock`、`clock2`）。
    /// 本级参数与已有的非注入成员同名时沿用该成员的拼写。
    pub fn synthesize(&self, component: &Component, merged: &MergedComponent) -> ConstructorPlan {
        let mut used = BTreeSet::new();
        let mut names = Vec::with_capacity(merged.flattened.len());
        let mut own = Vec::with_capacity(merged.flattened.len() - merged.inherited_len);

        for (index, entry) in merged.flattened.iter().enumerate() {
            let derived = &entry.spec.parameter_name;
            if index < merged.inherited_len {
                names.push(claim(derived.clone(), &mut used));
                continue;
            }

            let existing = component
                .existing_members
                .iter()
                .find(|member| NamingConventions::member_key(member) == NamingConventions::member_key(derived));
            let candidate = existing.cloned().unwrap_or_else(|| derived.clone());
            let name = claim(candidate, &mut used);
            let reuses_existing_member = existing.is_some_and(|member| *member == name);

            names.push(name.clone());
            own.push(Parameter {
                name,
                type_ref: entry.spec.type_ref.clone(),
                origin: entry.spec.origin,
                reuses_existing_member,
            });
        }

        let forwarded = merged
            .forwarded_types
            .iter()
            .filter_map(|type_ref| {
                merged.flattened[..merged.inherited_len]
                    .iter()
                    .position(|entry| entry.spec.type_ref == *type_ref)
                    .map(|position| names[position].clone())
            })
            .collect();

        let locally_assigned = own.iter().map(|parameter| parameter.name.clone()).collect();

        debug!(
            "合成构造函数 {}: 转发 {} 个参数，本级 {} 个参数",
            component.id,
            merged.inherited_len,
            own.len()
        );

        ConstructorPlan {
            forwarded,
            own,
            locally_assigned,
        }
    }
}

/// 占用名称，冲突时追加数字后缀
fn claim(candidate: String, used: &mut BTreeSet<String>) -> String {
    if used.insert(NamingConventions::member_key(&candidate)) {
        return candidate;
    }
    let mut suffix = 2;
    loop {
        let name = format!("{candidate}{suffix}");
        if used.insert(NamingConventions::member_key(&name)) {
            return name;
        }
        suffix += 1;
    }
}
