//! 声明规范化
//!
//! 把类型目录中的原始声明转换为只读的 [`Component`]：绑定泛型参数、
//! 分配声明顺序、补全命名选项并推导参数名称。

use di_abstractions::{
    BaseReference, Component, ComponentDeclaration, DependencySpec, Exposure, StructuralReason,
};
use infrastructure_common::{AnalysisSettings, ComponentConventions, Lifetime, TypeRef};
use tracing::debug;

/// 声明规范化器
#[derive(Debug, Clone)]
pub struct Normalizer {
    settings: AnalysisSettings,
    conventions: ComponentConventions,
}

impl Normalizer {
    /// 使用分析设置创建
    pub fn new(settings: &AnalysisSettings) -> Self {
        Self {
            settings: settings.clone(),
            conventions: settings.conventions(),
        }
    }

    /// 规范化单个组件声明
    pub fn normalize(&self, declaration: &ComponentDeclaration) -> Result<Component, StructuralReason> {
        let params = &declaration.type_params;

        let mut dependencies = Vec::with_capacity(declaration.dependencies.len());
        for (order, raw) in declaration.dependencies.iter().enumerate() {
            let type_ref = bind(&raw.type_ref, params)?;
            let naming = raw.naming.clone().unwrap_or_else(|| self.settings.naming.clone());
            dependencies.push(DependencySpec::new(
                raw.origin,
                raw.group,
                order,
                type_ref,
                naming,
                raw.external,
            ));
        }

        let base = match &declaration.base {
            Some(base) => Some(BaseReference::generic(
                base.component.clone(),
                bind_all(&base.type_args, params)?,
            )),
            None => None,
        };

        let exposure = match &declaration.exposure {
            Exposure::ExplicitList(list) => Exposure::ExplicitList(bind_all(list, params)?),
            other => other.clone(),
        };

        let lifetime = self.resolve_lifetime(declaration);

        Ok(Component {
            id: declaration.id.clone(),
            type_params: params.clone(),
            base,
            dependencies,
            lifetime,
            contracts: bind_all(&declaration.contracts, params)?,
            exposure,
            excluded_contracts: bind_all(&declaration.excluded_contracts, params)?,
            sharing: declaration.sharing,
            conditions: declaration.conditions.clone(),
            flags: declaration.flags,
            existing_members: declaration.existing_members.clone(),
        })
    }

    fn resolve_lifetime(&self, declaration: &ComponentDeclaration) -> Lifetime {
        if declaration.lifetime.is_resolved() || !self.settings.infer_lifetime_by_convention {
            return declaration.lifetime;
        }
        match self.conventions.infer_lifetime(declaration.id.short_name()) {
            Some(lifetime) => {
                debug!("组件 {} 按约定推断生命周期为 {}", declaration.id, lifetime);
                lifetime
            }
            None => Lifetime::Unresolved,
        }
    }
}

fn bind(type_ref: &TypeRef, params: &[String]) -> Result<TypeRef, StructuralReason> {
    let bound = type_ref.clone().bind_params(params);
    match bound.free_params().into_iter().find(|param| !params.contains(param)) {
        Some(parameter) => Err(StructuralReason::UnresolvedGenericParameter { parameter }),
        None => Ok(bound),
    }
}

fn bind_all(types: &[TypeRef], params: &[String]) -> Result<Vec<TypeRef>, StructuralReason> {
    types.iter().map(|type_ref| bind(type_ref, params)).collect()
}
