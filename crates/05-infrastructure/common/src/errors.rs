//! 错误类型定义
//!
//! 分析核心本身不通过错误值传播数据问题（统一以 Finding 形式上报），
//! 这里的错误类型只用于 I/O、解析和装配边界。

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置文件读取失败: {source}")]
    FileReadError {
        #[from]
        source: std::io::Error,
    },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },

    #[error("配置序列化失败: {source}")]
    SerializationError {
        #[from]
        source: serde_json::Error,
    },

    #[error("不支持的配置格式: {path}")]
    UnsupportedFormat { path: String },
}

impl ConfigError {
    /// 创建解析错误
    pub fn parse_error(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::ParseError {
            source: Box::new(source),
        }
    }

    /// 创建验证错误
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// 类型目录错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("组件重复声明: {component}")]
    DuplicateComponent { component: String },

    #[error("类型引用无效: {input}, 原因: {reason}")]
    InvalidTypeReference { input: String, reason: String },

    #[error("组件不存在: {component}")]
    UnknownComponent { component: String },
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("类型目录错误: {source}")]
    CatalogError {
        #[from]
        source: CatalogError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type CatalogResult<T> = Result<T, CatalogError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
