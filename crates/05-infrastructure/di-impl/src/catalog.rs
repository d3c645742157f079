//! 内存类型目录

use di_abstractions::{ComponentDeclaration, TypeCatalog};
use infrastructure_common::{CatalogError, CatalogResult, ComponentId};
use std::collections::BTreeMap;
use tracing::debug;

/// 基于内存的类型目录实现
#[derive(Debug, Clone, Default)]
pub struct InMemoryTypeCatalog {
    declarations: BTreeMap<ComponentId, ComponentDeclaration>,
}

impl InMemoryTypeCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 从声明列表创建目录
    pub fn from_declarations<I>(declarations: I) -> CatalogResult<Self>
    where
        I: IntoIterator<Item = ComponentDeclaration>,
    {
        let mut catalog = Self::new();
        for declaration in declarations {
            catalog.add(declaration)?;
        }
        Ok(catalog)
    }

    /// 添加组件声明
    pub fn add(&mut self, declaration: ComponentDeclaration) -> CatalogResult<()> {
        if self.declarations.contains_key(&declaration.id) {
            return Err(CatalogError::DuplicateComponent {
                component: declaration.id.to_string(),
            });
        }
        debug!("目录添加组件: {}", declaration.id);
        self.declarations.insert(declaration.id.clone(), declaration);
        Ok(())
    }

    /// 添加组件声明（构建器形式）
    pub fn with(mut self, declaration: ComponentDeclaration) -> CatalogResult<Self> {
        self.add(declaration)?;
        Ok(self)
    }

    /// 移除组件声明
    pub fn remove(&mut self, id: &ComponentId) -> CatalogResult<ComponentDeclaration> {
        self.declarations
            .remove(id)
            .ok_or_else(|| CatalogError::UnknownComponent {
                component: id.to_string(),
            })
    }

    /// 所有声明
    pub fn declarations(&self) -> impl Iterator<Item = &ComponentDeclaration> {
        self.declarations.values()
    }
}

impl TypeCatalog for InMemoryTypeCatalog {
    fn component_ids(&self) -> Vec<ComponentId> {
        self.declarations.keys().cloned().collect()
    }

    fn declaration(&self, id: &ComponentId) -> Option<&ComponentDeclaration> {
        self.declarations.get(id)
    }

    fn len(&self) -> usize {
        self.declarations.len()
    }
}
