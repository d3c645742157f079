//! 类型目录抽象接口
//!
//! 类型目录由前端适配器实现，负责把具体语法中的声明转换为中立的
//! [`ComponentDeclaration`]；分析核心只通过 [`TypeCatalog`] 读取它们。

use crate::component::{BaseReference, ComponentFlags, DependencyOrigin, Exposure, InstanceSharing};
use crate::predicate::ConditionDeclaration;
use infrastructure_common::{ComponentId, Lifetime, NamingOptions, TypeRef};
use serde::{Deserialize, Serialize};

/// 原始依赖声明
///
/// 类型引用中可能仍包含未替换的泛型参数，命名选项可能缺省
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDependency {
    /// 声明来源
    pub origin: DependencyOrigin,
    /// 声明组序号
    #[serde(default)]
    pub group: usize,
    /// 原始类型引用
    #[serde(rename = "type")]
    pub type_ref: TypeRef,
    /// 命名选项，缺省时使用分析设置中的默认值
    #[serde(default)]
    pub naming: Option<NamingOptions>,
    /// 外部依赖
    #[serde(default)]
    pub external: bool,
}

impl RawDependency {
    /// 创建字段级依赖声明
    pub fn field(group: usize, type_ref: TypeRef) -> Self {
        Self {
            origin: DependencyOrigin::FieldDeclared,
            group,
            type_ref,
            naming: None,
            external: false,
        }
    }

    /// 创建批量依赖声明
    pub fn bulk(group: usize, type_ref: TypeRef) -> Self {
        Self {
            origin: DependencyOrigin::BulkDeclared,
            group,
            type_ref,
            naming: None,
            external: false,
        }
    }

    /// 设置命名选项
    pub fn with_naming(mut self, naming: NamingOptions) -> Self {
        self.naming = Some(naming);
        self
    }

    /// 标记为外部依赖
    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }
}

/// 组件声明
///
/// 类型目录为每个组件提供一份声明，分析过程中视为只读事实
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentDeclaration {
    /// 组件标识
    pub id: ComponentId,
    /// 泛型参数名称
    #[serde(default)]
    pub type_params: Vec<String>,
    /// 基类引用
    #[serde(default)]
    pub base: Option<BaseReference>,
    /// 原始依赖声明，按声明顺序
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
    /// 生命周期
    #[serde(default)]
    pub lifetime: Lifetime,
    /// 实现的契约
    #[serde(default)]
    pub contracts: Vec<TypeRef>,
    /// 暴露模式
    #[serde(default)]
    pub exposure: Exposure,
    /// 显式排除的契约
    #[serde(default)]
    pub excluded_contracts: Vec<TypeRef>,
    /// 实例共享模式
    #[serde(default)]
    pub sharing: InstanceSharing,
    /// 条件声明
    #[serde(default)]
    pub conditions: Vec<ConditionDeclaration>,
    /// 组件标志
    #[serde(default)]
    pub flags: ComponentFlags,
    /// 已有的非注入成员名称
    #[serde(default)]
    pub existing_members: Vec<String>,
}

impl ComponentDeclaration {
    /// 创建具体组件声明
    pub fn new(id: impl Into<ComponentId>) -> Self {
        Self {
            id: id.into(),
            type_params: Vec::new(),
            base: None,
            dependencies: Vec::new(),
            lifetime: Lifetime::Unresolved,
            contracts: Vec::new(),
            exposure: Exposure::SelfOnly,
            excluded_contracts: Vec::new(),
            sharing: InstanceSharing::Separate,
            conditions: Vec::new(),
            flags: ComponentFlags::default(),
            existing_members: Vec::new(),
        }
    }

    /// 设置泛型参数
    pub fn with_type_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_params = params.into_iter().map(Into::into).collect();
        self
    }

    /// 设置基类
    pub fn with_base(mut self, base: BaseReference) -> Self {
        self.base = Some(base);
        self
    }

    /// 添加一组批量依赖声明（同一组共享组序号）
    pub fn with_bulk<I>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = TypeRef>,
    {
        let group = self.next_group();
        self.dependencies
            .extend(types.into_iter().map(|type_ref| RawDependency::bulk(group, type_ref)));
        self
    }

    /// 添加字段级依赖声明
    pub fn with_field(mut self, type_ref: TypeRef) -> Self {
        let group = self.next_group();
        self.dependencies.push(RawDependency::field(group, type_ref));
        self
    }

    /// 添加原始依赖声明
    pub fn with_dependency(mut self, dependency: RawDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// 设置生命周期
    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// 添加实现的契约
    pub fn with_contract(mut self, contract: TypeRef) -> Self {
        self.contracts.push(contract);
        self
    }

    /// 设置暴露模式
    pub fn with_exposure(mut self, exposure: Exposure) -> Self {
        self.exposure = exposure;
        self
    }

    /// 排除契约
    pub fn excluding(mut self, contract: TypeRef) -> Self {
        self.excluded_contracts.push(contract);
        self
    }

    /// 设置实例共享模式
    pub fn with_sharing(mut self, sharing: InstanceSharing) -> Self {
        self.sharing = sharing;
        self
    }

    /// 添加条件声明
    pub fn with_condition(mut self, condition: ConditionDeclaration) -> Self {
        self.conditions.push(condition);
        self
    }

    /// 设置组件标志
    pub fn with_flags(mut self, flags: ComponentFlags) -> Self {
        self.flags = flags;
        self
    }

    /// 添加已有成员名称
    pub fn with_existing_member(mut self, name: impl Into<String>) -> Self {
        self.existing_members.push(name.into());
        self
    }

    fn next_group(&self) -> usize {
        self.dependencies
            .iter()
            .map(|dependency| dependency.group + 1)
            .max()
            .unwrap_or(0)
    }
}

/// 类型目录
///
/// 在一次分析过程中，同一标识必须返回同一份声明
pub trait TypeCatalog {
    /// 所有组件标识（顺序不作保证）
    fn component_ids(&self) -> Vec<ComponentId>;

    /// 获取组件声明
    fn declaration(&self, id: &ComponentId) -> Option<&ComponentDeclaration>;

    /// 组件数量
    fn len(&self) -> usize {
        self.component_ids().len()
    }

    /// 目录是否为空
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
