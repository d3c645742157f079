//! # 分析组合层
//!
//! 这个 crate 把依赖注入静态分析核心组装成可直接运行的分析宿主，
//! 负责核心之外的全部 I/O：清单加载、设置加载和日志初始化。
//!
//! ## 主要功能
//!
//! - **分析宿主构建器**: 使用构建者模式收集清单来源、设置和日志配置
//! - **类型目录来源**: 从 JSON/TOML 清单文件或内存声明加载组件
//! - **设置加载**: 设置文件与 `DIPLAN__*` 环境变量分层合并
//! - **分析报告**: 诊断、构造函数计划、注册计划和摘要，可渲染为 JSON
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::{AnalysisBuilder, LoggingConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = AnalysisBuilder::new()
//!         .add_manifest("components.toml")?
//!         .with_logging(LoggingConfig::development())
//!         .build()
//!         .await?;
//!
//!     let report = host.run().await?;
//!     println!("{}", report.to_json_pretty()?);
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod catalog_sources;
pub mod host;
pub mod settings;


// 重新导出主要类型
pub use builder::{AnalysisBuilder, LoggingConfig};
pub use catalog_sources::{
    load_catalog, CatalogManifest, CatalogSource, FileCatalogSource, InlineCatalogSource, ManifestFormat,
};
pub use host::{AnalysisHost, AnalysisReport, ReportSummary};
pub use settings::{SettingsLoader, DEFAULT_ENV_PREFIX};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
