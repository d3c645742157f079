//! 类型目录来源
//!
//! 组件清单可以来自 JSON/TOML 文件或内存中的声明列表，多个来源合并为一个类型目录；
//! 同一组件标识出现在多个来源中视为错误。

use async_trait::async_trait;
use di_abstractions::ComponentDeclaration;
use di_impl::InMemoryTypeCatalog;
use infrastructure_common::{CatalogError, ConfigError, ConfigResult, InfrastructureResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// 清单文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// JSON 文件
    Json,
    /// TOML 文件
    Toml,
}

impl ManifestFormat {
    /// 根据文件扩展名判断格式
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Self::Json),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }
}

/// 组件清单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogManifest {
    /// 组件声明
    #[serde(default)]
    pub components: Vec<ComponentDeclaration>,
}

impl CatalogManifest {
    /// 解析清单文本
    pub fn parse(content: &str, format: ManifestFormat) -> ConfigResult<Self> {
        match format {
            ManifestFormat::Json => serde_json::from_str(content).map_err(ConfigError::parse_error),
            ManifestFormat::Toml => toml::from_str(content).map_err(ConfigError::parse_error),
        }
    }
}

/// 类型目录来源
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// 来源名称
    fn name(&self) -> String;

    /// 加载组件声明
    async fn load(&self) -> InfrastructureResult<Vec<ComponentDeclaration>>;
}

/// 文件清单来源
#[derive(Debug, Clone)]
pub struct FileCatalogSource {
    path: PathBuf,
    format: ManifestFormat,
}

impl FileCatalogSource {
    /// 创建文件来源，格式由扩展名决定
    pub fn new(path: impl Into<PathBuf>) -> ConfigResult<Self> {
        let path = path.into();
        let format = ManifestFormat::from_path(&path)?;
        Ok(Self { path, format })
    }

    /// 显式指定格式
    pub fn with_format(path: impl Into<PathBuf>, format: ManifestFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// 文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    fn name(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> InfrastructureResult<Vec<ComponentDeclaration>> {
        if fs::metadata(&self.path).await.is_err() {
            return Err(ConfigError::FileNotFound {
                path: self.path.display().to_string(),
            }
            .into());
        }

        let content = fs::read_to_string(&self.path).await.map_err(ConfigError::from)?;
        let manifest = CatalogManifest::parse(&content, self.format)?;
        debug!("清单 {} 包含 {} 个组件", self.path.display(), manifest.components.len());
        Ok(manifest.components)
    }
}

/// 内存声明来源
#[derive(Debug, Clone)]
pub struct InlineCatalogSource {
    name: String,
    declarations: Vec<ComponentDeclaration>,
}

impl InlineCatalogSource {
    /// 创建内存来源
    pub fn new(name: impl Into<String>, declarations: Vec<ComponentDeclaration>) -> Self {
        Self {
            name: name.into(),
            declarations,
        }
    }
}

#[async_trait]
impl CatalogSource for InlineCatalogSource {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn load(&self) -> InfrastructureResult<Vec<ComponentDeclaration>> {
        Ok(self.declarations.clone())
    }
}

/// 依次加载所有来源并合并为类型目录
pub async fn load_catalog(sources: &[Box<dyn CatalogSource>]) -> InfrastructureResult<InMemoryTypeCatalog> {
    info!("开始加载类型目录，共有 {} 个来源", sources.len());

    let mut origins: BTreeMap<String, String> = BTreeMap::new();
    let mut catalog = InMemoryTypeCatalog::new();
    for source in sources {
        let name = source.name();
        for declaration in source.load().await? {
            let id = declaration.id.to_string();
            if let Some(first) = origins.get(&id) {
                debug!("组件 {} 同时出现在 {} 和 {}", id, first, name);
                return Err(CatalogError::DuplicateComponent { component: id }.into());
            }
            origins.insert(id, name.clone());
            catalog.add(declaration)?;
        }
    }

    info!("类型目录加载完成，共 {} 个组件", origins.len());
    Ok(catalog)
}
