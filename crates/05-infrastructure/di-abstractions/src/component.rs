//! 规范化后的组件模型
//!
//! 组件及其依赖声明在一次分析过程中只计算一次，之后只读

use crate::predicate::ConditionDeclaration;
use infrastructure_common::{ComponentId, Lifetime, NamingConventions, NamingOptions, TypeRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 依赖声明来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyOrigin {
    /// 字段级声明（显式可赋值成员）
    #[serde(alias = "field")]
    FieldDeclared,
    /// 类型级批量声明
    #[serde(alias = "bulk")]
    BulkDeclared,
}

/// 依赖声明
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// 声明来源
    pub origin: DependencyOrigin,
    /// 声明组序号（同一个批量声明中的类型共享序号）
    pub group: usize,
    /// 在组件内的声明顺序
    pub order: usize,
    /// 已解析的类型引用
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// 推导出的参数名称
    pub parameter_name: String,
    /// 推导名称时使用的命名选项
    pub naming: NamingOptions,
    /// 外部依赖，不参与生命周期检查
    pub external: bool,
}

impl DependencySpec {
    /// 创建依赖声明，参数名称由类型和命名选项推导
    pub fn new(
        origin: DependencyOrigin,
        group: usize,
        order: usize,
        type_ref: TypeRef,
        naming: NamingOptions,
        external: bool,
    ) -> Self {
        let parameter_name = NamingConventions::parameter_name(&type_ref, &naming);
        Self {
            origin,
            group,
            order,
            type_ref,
            parameter_name,
            naming,
            external,
        }
    }

    /// 替换泛型参数并重新推导参数名称
    ///
    /// 遇到未绑定的泛型参数时返回该参数名
    pub fn substitute(&self, bindings: &BTreeMap<String, TypeRef>) -> Result<Self, String> {
        if bindings.is_empty() {
            return Ok(self.clone());
        }
        let type_ref = self.type_ref.substitute(bindings)?;
        Ok(Self::new(
            self.origin,
            self.group,
            self.order,
            type_ref,
            self.naming.clone(),
            self.external,
        ))
    }
}

/// 服务暴露模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode", content = "contracts")]
pub enum Exposure {
    /// 只注册具体类型
    SelfOnly,
    /// 注册所有实现的契约
    AllContracts,
    /// 只注册显式列出的契约
    ExplicitList(Vec<TypeRef>),
}

impl Default for Exposure {
    fn default() -> Self {
        Self::SelfOnly
    }
}

/// 实例共享模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceSharing {
    /// 每个暴露的契约独立构造实例
    Separate,
    /// 所有契约在同一作用域内转发到同一个具体实例
    Shared,
}

impl Default for InstanceSharing {
    fn default() -> Self {
        Self::Separate
    }
}

/// 组件标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ComponentFlags {
    /// 抽象类型
    pub is_abstract: bool,
    /// 静态类型
    pub is_static: bool,
    /// 具体类型
    pub is_concrete: bool,
}

impl Default for ComponentFlags {
    fn default() -> Self {
        Self {
            is_abstract: false,
            is_static: false,
            is_concrete: true,
        }
    }
}

impl ComponentFlags {
    /// 抽象基类标志
    pub fn abstract_base() -> Self {
        Self {
            is_abstract: true,
            is_static: false,
            is_concrete: false,
        }
    }

    /// 静态类型标志
    pub fn static_type() -> Self {
        Self {
            is_abstract: false,
            is_static: true,
            is_concrete: false,
        }
    }

    /// 是否可以作为注册目标
    pub fn is_registration_target(self) -> bool {
        self.is_concrete && !self.is_abstract && !self.is_static
    }
}

/// 基类引用
///
/// 只是对基类组件的弱引用，不拥有基类；文本形式为 `Repository<Order>`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BaseReference {
    /// 基类组件标识
    pub component: ComponentId,
    /// 为基类泛型参数提供的封闭类型
    pub type_args: Vec<TypeRef>,
}

impl BaseReference {
    /// 创建非泛型基类引用
    pub fn new(component: impl Into<ComponentId>) -> Self {
        Self {
            component: component.into(),
            type_args: Vec::new(),
        }
    }

    /// 创建泛型基类引用
    pub fn generic(component: impl Into<ComponentId>, type_args: Vec<TypeRef>) -> Self {
        Self {
            component: component.into(),
            type_args,
        }
    }
}

impl fmt::Display for BaseReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let as_type = TypeRef::generic(self.component.as_str(), self.type_args.clone());
        write!(f, "{as_type}")
    }
}

impl FromStr for BaseReference {
    type Err = infrastructure_common::CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<TypeRef>()? {
            TypeRef::Named { name, args } => Ok(Self::generic(name, args)),
            TypeRef::Param(name) => Ok(Self::new(name)),
        }
    }
}

impl TryFrom<String> for BaseReference {
    type Error = infrastructure_common::CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BaseReference> for String {
    fn from(value: BaseReference) -> Self {
        value.to_string()
    }
}

/// 规范化后的组件
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    /// 组件标识
    pub id: ComponentId,
    /// 泛型参数名称
    pub type_params: Vec<String>,
    /// 基类引用
    pub base: Option<BaseReference>,
    /// 本级声明的依赖，按声明顺序
    pub dependencies: Vec<DependencySpec>,
    /// 生命周期
    pub lifetime: Lifetime,
    /// 实现的契约
    pub contracts: Vec<TypeRef>,
    /// 暴露模式
    pub exposure: Exposure,
    /// 显式排除的契约
    pub excluded_contracts: Vec<TypeRef>,
    /// 实例共享模式
    pub sharing: InstanceSharing,
    /// 条件声明
    pub conditions: Vec<ConditionDeclaration>,
    /// 组件标志
    pub flags: ComponentFlags,
    /// 非依赖注入方式声明的已有成员
    pub existing_members: Vec<String>,
}

impl Component {
    /// 组件自身的类型引用（泛型组件的参数保持开放）
    pub fn self_type(&self) -> TypeRef {
        TypeRef::generic(
            self.id.as_str(),
            self.type_params.iter().map(TypeRef::param).collect(),
        )
    }

    /// 是否可以作为注册目标
    pub fn is_registration_target(&self) -> bool {
        self.flags.is_registration_target()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_rederives_parameter_name() {
        let spec = DependencySpec::new(
            DependencyOrigin::BulkDeclared,
            0,
            0,
            TypeRef::generic("ILogger", vec![TypeRef::param("T")]),
            NamingOptions::default(),
            false,
        );
        assert_eq!(spec.parameter_name, "tLogger");

        let mut bindings = BTreeMap::new();
        bindings.insert("T".to_string(), TypeRef::named("Order"));
        let closed = spec.substitute(&bindings).unwrap();
        assert_eq!(closed.type_ref.to_string(), "ILogger<Order>");
        assert_eq!(closed.parameter_name, "orderLogger");
    }

    #[test]
    fn test_base_reference_text_form() {
        let base: BaseReference = "App.Repository<Order>".parse().unwrap();
        assert_eq!(base.component, ComponentId::new("App.Repository"));
        assert_eq!(base.type_args, vec![TypeRef::named("Order")]);
        assert_eq!(base.to_string(), "App.Repository<Order>");
    }

    #[test]
    fn test_registration_target_flags() {
        assert!(ComponentFlags::default().is_registration_target());
        assert!(!ComponentFlags::abstract_base().is_registration_target());
        assert!(!ComponentFlags::static_type().is_registration_target());
    }
}
