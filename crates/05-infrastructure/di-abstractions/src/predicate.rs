//! 条件谓词模型
//!
//! 条件声明由前端适配器提供，编译后的谓词是一棵纯布尔表达式树，
//! 可以脱离任何容器运行时单独求值。

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// 原始条件声明
///
/// 一个组件可以附带多个声明；单个声明内允许列表、拒绝列表和配置比较以 `And` 组合
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditionDeclaration {
    /// 允许的环境名称
    pub allowed_environments: Vec<String>,
    /// 拒绝的环境名称
    pub denied_environments: Vec<String>,
    /// 配置键
    pub config_key: Option<String>,
    /// 配置值必须等于
    pub equals: Option<String>,
    /// 配置值必须不等于
    pub not_equals: Option<String>,
}

impl ConditionDeclaration {
    /// 创建空的条件声明
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加允许的环境
    pub fn allow_environment(mut self, environment: impl Into<String>) -> Self {
        self.allowed_environments.push(environment.into());
        self
    }

    /// 添加拒绝的环境
    pub fn deny_environment(mut self, environment: impl Into<String>) -> Self {
        self.denied_environments.push(environment.into());
        self
    }

    /// 设置配置键
    pub fn with_config_key(mut self, key: impl Into<String>) -> Self {
        self.config_key = Some(key.into());
        self
    }

    /// 设置相等比较
    pub fn equals(mut self, value: impl Into<String>) -> Self {
        self.equals = Some(value.into());
        self
    }

    /// 设置不等比较
    pub fn not_equals(mut self, value: impl Into<String>) -> Self {
        self.not_equals = Some(value.into());
        self
    }

    /// 声明是否不含任何片段
    pub fn is_empty(&self) -> bool {
        self.allowed_environments.is_empty()
            && self.denied_environments.is_empty()
            && self.config_key.is_none()
            && self.equals.is_none()
            && self.not_equals.is_none()
    }
}

/// 配置查询接口
///
/// 键按大小写不敏感匹配，与条件编译器的互斥判断保持一致
pub trait ConfigLookup {
    /// 获取配置值
    fn get(&self, key: &str) -> Option<&str>;
}

// 多个键仅大小写不同时取字典序最小的键，不论查询时使用哪种写法
impl ConfigLookup for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        self.iter()
            .filter(|(candidate, _)| eq_ignore_case(candidate, key))
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, value)| value.as_str())
    }
}

impl ConfigLookup for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        self.iter()
            .find(|(candidate, _)| eq_ignore_case(candidate, key))
            .map(|(_, value)| value.as_str())
    }
}

/// 谓词节点
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "op")]
pub enum PredicateNode {
    /// 所有子节点成立
    And { children: Vec<PredicateNode> },
    /// 任一子节点成立
    Or { children: Vec<PredicateNode> },
    /// 子节点不成立
    Not { child: Box<PredicateNode> },
    /// 当前环境名称等于
    EnvEquals { name: String },
    /// 配置值等于
    ConfigEquals { key: String, value: String },
    /// 配置值不等于（键不存在时成立）
    ConfigNotEquals { key: String, value: String },
}

impl PredicateNode {
    /// 组合为 `And`，只有一个子节点时直接返回该子节点
    pub fn and(mut children: Vec<PredicateNode>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Self::And { children }
        }
    }

    /// 组合为 `Or`，只有一个子节点时直接返回该子节点
    pub fn or(mut children: Vec<PredicateNode>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            Self::Or { children }
        }
    }

    /// 取反
    pub fn not(child: PredicateNode) -> Self {
        Self::Not {
            child: Box::new(child),
        }
    }

    /// 环境名称比较
    pub fn env_equals(name: impl Into<String>) -> Self {
        Self::EnvEquals { name: name.into() }
    }

    /// 配置相等比较
    pub fn config_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ConfigEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    /// 配置不等比较
    pub fn config_not_equals(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::ConfigNotEquals {
            key: key.into(),
            value: value.into(),
        }
    }

    /// 求值
    ///
    /// 所有比较均为大小写不敏感的字符串相等
    pub fn evaluate(&self, environment: &str, config: &dyn ConfigLookup) -> bool {
        match self {
            Self::And { children } => children.iter().all(|child| child.evaluate(environment, config)),
            Self::Or { children } => children.iter().any(|child| child.evaluate(environment, config)),
            Self::Not { child } => !child.evaluate(environment, config),
            Self::EnvEquals { name } => eq_ignore_case(name, environment),
            Self::ConfigEquals { key, value } => config
                .get(key)
                .is_some_and(|actual| eq_ignore_case(actual, value)),
            Self::ConfigNotEquals { key, value } => !config
                .get(key)
                .is_some_and(|actual| eq_ignore_case(actual, value)),
        }
    }
}

impl fmt::Display for PredicateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, children: &[PredicateNode], op: &str) -> fmt::Result {
            f.write_str("(")?;
            for (index, child) in children.iter().enumerate() {
                if index > 0 {
                    write!(f, " {op} ")?;
                }
                write!(f, "{child}")?;
            }
            f.write_str(")")
        }

        match self {
            Self::And { children } => join(f, children, "&&"),
            Self::Or { children } => join(f, children, "||"),
            Self::Not { child } => write!(f, "!{child}"),
            Self::EnvEquals { name } => write!(f, "env == \"{name}\""),
            Self::ConfigEquals { key, value } => write!(f, "config[\"{key}\"] == \"{value}\""),
            Self::ConfigNotEquals { key, value } => write!(f, "config[\"{key}\"] != \"{value}\""),
        }
    }
}

/// 大小写不敏感比较
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
