//! 分析设置加载
//!
//! 设置文件（可选）在下，环境变量在上：`DIPLAN__INFER_LIFETIME_BY_CONVENTION=true`、
//! `DIPLAN__NAMING__PREFIX=_` 这样的变量会覆盖文件中的同名项。

use crate::catalog_sources::ManifestFormat;
use infrastructure_common::{AnalysisSettings, ConfigError, ConfigResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 默认环境变量前缀
pub const DEFAULT_ENV_PREFIX: &str = "DIPLAN";

impl From<ManifestFormat> for config::FileFormat {
    fn from(format: ManifestFormat) -> Self {
        match format {
            ManifestFormat::Json => config::FileFormat::Json,
            ManifestFormat::Toml => config::FileFormat::Toml,
        }
    }
}

/// 分析设置加载器
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    file: Option<PathBuf>,
    env_prefix: String,
    env_overrides: Option<HashMap<String, String>>,
}

impl SettingsLoader {
    /// 创建加载器
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env_overrides: None,
        }
    }

    /// 设置文件路径
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// 环境变量前缀
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// 以给定的变量表代替进程环境变量
    pub fn with_env_overrides(mut self, variables: HashMap<String, String>) -> Self {
        self.env_overrides = Some(variables);
        self
    }

    /// 设置文件路径
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// 加载分析设置
    pub fn load(&self) -> ConfigResult<AnalysisSettings> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            let format = ManifestFormat::from_path(path)?;
            info!("加载分析设置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path.as_path()).format(format.into()));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .separator("__")
                .try_parsing(true)
                .source(self.env_overrides.clone()),
        );

        let settings: AnalysisSettings = builder
            .build()
            .map_err(ConfigError::parse_error)?
            .try_deserialize()
            .map_err(ConfigError::parse_error)?;

        for rule in &settings.lifetime_conventions {
            if rule.pattern.trim().is_empty() {
                return Err(ConfigError::validation_error("生命周期约定规则的模式不能为空"));
            }
        }

        debug!("分析设置: {:?}", settings);
        Ok(settings)
    }
}

impl Default for SettingsLoader {
    fn default() -> Self {
        Self::new()
    }
}
