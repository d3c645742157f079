//! 分析宿主构建器

use crate::catalog_sources::{CatalogSource, FileCatalogSource, InlineCatalogSource};
use crate::host::AnalysisHost;
use crate::settings::SettingsLoader;
use di_abstractions::ComponentDeclaration;
use infrastructure_common::{AnalysisSettings, InfrastructureError};
use std::collections::HashMap;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// 分析宿主构建器
///
/// 使用建造者模式收集清单来源、分析设置和日志配置
pub struct AnalysisBuilder {
    /// 类型目录来源列表
    sources: Vec<Box<dyn CatalogSource>>,
    /// 显式指定的分析设置，优先于设置加载器
    settings: Option<AnalysisSettings>,
    /// 设置加载器
    settings_loader: SettingsLoader,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl AnalysisBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
            settings: None,
            settings_loader: SettingsLoader::new(),
            logging_enabled: false,
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加组件清单文件（JSON 或 TOML）
    pub fn add_manifest<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!("清单文件不存在: {}", path.display()),
            });
        }

        info!("添加组件清单: {}", path.display());
        let source = FileCatalogSource::new(path)?;
        self.sources.push(Box::new(source));
        Ok(self)
    }

    /// 添加内存中的组件声明
    pub fn add_declarations<S: Into<String>>(mut self, name: S, declarations: Vec<ComponentDeclaration>) -> Self {
        let source = InlineCatalogSource::new(name, declarations);
        debug!("添加内存声明来源: {}", source.name());
        self.sources.push(Box::new(source));
        self
    }

    /// 添加自定义类型目录来源
    pub fn add_source<T: CatalogSource + 'static>(mut self, source: T) -> Self {
        info!("添加类型目录来源: {}", source.name());
        self.sources.push(Box::new(source));
        self
    }

    /// 直接指定分析设置
    pub fn with_settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// 从设置文件加载分析设置
    pub fn with_settings_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, InfrastructureError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(InfrastructureError::BootstrapFailed {
                message: format!("设置文件不存在: {}", path.display()),
            });
        }

        self.settings_loader = self.settings_loader.with_file(path);
        Ok(self)
    }

    /// 以给定变量表代替进程环境变量
    pub fn with_env_overrides(mut self, variables: HashMap<String, String>) -> Self {
        self.settings_loader = self.settings_loader.with_env_overrides(variables);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 构建分析宿主
    pub async fn build(self) -> Result<AnalysisHost, InfrastructureError> {
        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.initialize_logging()?;
        }

        info!("开始构建分析宿主，共 {} 个类型目录来源", self.sources.len());

        let settings = match self.settings {
            Some(settings) => settings,
            None => self.settings_loader.load()?,
        };

        info!("分析宿主构建完成");
        Ok(AnalysisHost::new(self.sources, settings))
    }

    /// 初始化日志系统
    ///
    /// `RUST_LOG` 存在时优先使用其中的过滤指令
    fn initialize_logging(&self) -> Result<(), InfrastructureError> {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.logging_config.level).into())
            .from_env_lossy();

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(self.logging_config.show_target)
            .with_thread_ids(self.logging_config.show_thread_ids)
            .with_file(self.logging_config.show_file)
            .with_line_number(self.logging_config.show_line_number);

        if self.logging_config.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}

impl Default for AnalysisBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 设置日志级别
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }
}
