//! 分析输出模型
//!
//! 构造函数计划和注册计划交给外部的文本生成器，本层不关心具体容器 API

use crate::component::{DependencyOrigin, InstanceSharing};
use crate::predicate::PredicateNode;
use infrastructure_common::{ComponentId, Lifetime, TypeRef};
use serde::{Deserialize, Serialize};

/// 注册条目类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationKind {
    /// 具体类型自身
    Concrete,
    /// 契约，独立构造实例
    Independent,
    /// 契约，转发到同一作用域内已解析的具体实例
    Forwarding,
}

/// 注册条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEntry {
    /// 具体组件标识
    pub component: ComponentId,
    /// 暴露的服务类型
    pub service: TypeRef,
    /// 条目类型
    pub kind: RegistrationKind,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 实例共享模式
    pub sharing: InstanceSharing,
    /// 编译后的条件谓词
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicate: Option<PredicateNode>,
}

impl RegistrationEntry {
    /// 是否为转发条目
    pub fn is_forwarding(&self) -> bool {
        self.kind == RegistrationKind::Forwarding
    }
}

/// 构造函数参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// 参数名称
    pub name: String,
    /// 已解析的类型引用
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// 声明来源
    pub origin: DependencyOrigin,
    /// 名称沿用了已有的非注入成员
    #[serde(default)]
    pub reuses_existing_member: bool,
}

/// 构造函数计划
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructorPlan {
    /// 按顺序转发给基类构造函数的参数名称
    pub forwarded: Vec<String>,
    /// 本级新增参数
    pub own: Vec<Parameter>,
    /// 需要在本级赋值的成员名称
    pub locally_assigned: Vec<String>,
}

impl ConstructorPlan {
    /// 完整参数名称列表（转发参数在前）
    pub fn parameter_names(&self) -> Vec<&str> {
        self.forwarded
            .iter()
            .map(String::as_str)
            .chain(self.own.iter().map(|parameter| parameter.name.as_str()))
            .collect()
    }

    /// 本级参数名称
    pub fn own_names(&self) -> Vec<&str> {
        self.own.iter().map(|parameter| parameter.name.as_str()).collect()
    }
}
