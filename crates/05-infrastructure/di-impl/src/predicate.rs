//! 条件谓词编译

use di_abstractions::{eq_ignore_case, ConditionDeclaration, ContradictionReason, Finding, PredicateNode};
use infrastructure_common::ComponentId;
use tracing::debug;

/// 条件谓词编译器
#[derive(Debug, Clone, Copy, Default)]
pub struct PredicateCompiler;

impl PredicateCompiler {
    /// 创建编译器
    pub fn new() -> Self {
        Self
    }

    /// 编译组件的全部条件声明
    ///
    /// 没有声明时返回 `Ok(None)`。多个声明只有在能证明两两互斥时才以 `Or` 组合。
    pub fn compile(
        &self,
        component: &ComponentId,
        declarations: &[ConditionDeclaration],
    ) -> Result<Option<PredicateNode>, Finding> {
        let contradiction = |reason| Finding::ConditionContradiction {
            component: component.clone(),
            reason,
        };

        let mut compiled = Vec::with_capacity(declarations.len());
        for declaration in declarations {
            compiled.push(self.compile_one(declaration).map_err(contradiction)?);
        }

        for (index, first) in declarations.iter().enumerate() {
            for second in &declarations[index + 1..] {
                if !mutually_exclusive(first, second) {
                    return Err(contradiction(ContradictionReason::AmbiguousConditions {
                        declarations: declarations.len(),
                    }));
                }
            }
        }

        let predicate = match compiled.len() {
            0 => None,
            _ => Some(PredicateNode::or(compiled)),
        };
        if let Some(predicate) = &predicate {
            debug!("组件 {} 的条件谓词: {}", component, predicate);
        }
        Ok(predicate)
    }

    /// 编译单个条件声明
    pub fn compile_one(&self, declaration: &ConditionDeclaration) -> Result<PredicateNode, ContradictionReason> {
        if declaration.is_empty() {
            return Err(ContradictionReason::EmptyCondition);
        }

        let allowed = dedup_ignore_case(&declaration.allowed_environments);
        let denied = dedup_ignore_case(&declaration.denied_environments);
        if let Some(environment) = allowed
            .iter()
            .find(|env| denied.iter().any(|other| eq_ignore_case(env, other)))
        {
            return Err(ContradictionReason::EnvironmentAllowedAndDenied {
                environment: (*environment).to_string(),
            });
        }

        let mut parts = Vec::new();
        if !allowed.is_empty() {
            parts.push(PredicateNode::or(
                allowed.iter().map(|env| PredicateNode::env_equals(*env)).collect(),
            ));
        }
        if !denied.is_empty() {
            parts.push(PredicateNode::not(PredicateNode::or(
                denied.iter().map(|env| PredicateNode::env_equals(*env)).collect(),
            )));
        }
        parts.extend(compile_config(declaration)?);

        Ok(PredicateNode::and(parts))
    }
}

fn compile_config(declaration: &ConditionDeclaration) -> Result<Vec<PredicateNode>, ContradictionReason> {
    let equals = declaration.equals.as_deref();
    let not_equals = declaration.not_equals.as_deref();

    let Some(key) = declaration.config_key.as_deref() else {
        return match (equals, not_equals) {
            (None, None) => Ok(Vec::new()),
            _ => Err(ContradictionReason::OrphanedComparator),
        };
    };

    match (equals, not_equals) {
        (None, None) => Err(ContradictionReason::MissingComparator { key: key.to_string() }),
        (Some(value), None) => Ok(vec![PredicateNode::config_equals(key, value)]),
        (None, Some(value)) => Ok(vec![PredicateNode::config_not_equals(key, value)]),
        (Some(equal), Some(not_equal)) => {
            if eq_ignore_case(equal, not_equal) {
                Err(ContradictionReason::ConfigEqualAndNotEqual {
                    key: key.to_string(),
                    value: equal.to_string(),
                })
            } else if equal.is_empty() || not_equal.is_empty() {
                Err(ContradictionReason::ConflictingComparators { key: key.to_string() })
            } else {
                Ok(vec![
                    PredicateNode::config_equals(key, equal),
                    PredicateNode::config_not_equals(key, not_equal),
                ])
            }
        }
    }
}

/// 判断两个声明是否可证明互斥
fn mutually_exclusive(a: &ConditionDeclaration, b: &ConditionDeclaration) -> bool {
    environments_exclusive(a, b) || config_exclusive(a, b) || config_exclusive(b, a)
}

fn environments_exclusive(a: &ConditionDeclaration, b: &ConditionDeclaration) -> bool {
    fn contains(list: &[String], env: &str) -> bool {
        list.iter().any(|other| eq_ignore_case(other, env))
    }

    let disjoint_allow = !a.allowed_environments.is_empty()
        && !b.allowed_environments.is_empty()
        && a.allowed_environments
            .iter()
            .all(|env| !contains(&b.allowed_environments, env));

    let allow_denied = |x: &ConditionDeclaration, y: &ConditionDeclaration| {
        !x.allowed_environments.is_empty()
            && x.allowed_environments
                .iter()
                .all(|env| contains(&y.denied_environments, env))
    };

    disjoint_allow || allow_denied(a, b) || allow_denied(b, a)
}

fn config_exclusive(a: &ConditionDeclaration, b: &ConditionDeclaration) -> bool {
    let (Some(key_a), Some(key_b)) = (a.config_key.as_deref(), b.config_key.as_deref()) else {
        return false;
    };
    if !eq_ignore_case(key_a, key_b) {
        return false;
    }
    match (a.equals.as_deref(), b.equals.as_deref(), b.not_equals.as_deref()) {
        (Some(x), Some(y), _) if !eq_ignore_case(x, y) => true,
        (Some(x), _, Some(y)) => eq_ignore_case(x, y),
        _ => false,
    }
}

fn dedup_ignore_case(values: &[String]) -> Vec<&str> {
    let mut unique: Vec<&str> = Vec::with_capacity(values.len());
    for value in values {
        if !unique.iter().any(|kept| eq_ignore_case(kept, value)) {
            unique.push(value);
        }
    }
    unique
}
