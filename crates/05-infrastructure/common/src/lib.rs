//! # Infrastructure Common
//!
//! 这个 crate 提供了依赖注入静态分析各层共用的基础类型和约定。
//!
//! ## 核心组件
//!
//! - [`TypeRef`] / [`ComponentId`] - 类型引用和稳定的组件标识
//! - [`Lifetime`] - 组件生命周期及持久度比较
//! - [`NamingConventions`] - 参数命名约定
//! - [`ComponentConventions`] - 基于名称的生命周期约定
//! - [`AnalysisSettings`] - 分析设置
//!
//! ## 设计原则
//!
//! - 基于 Rust 类型系统的编译时安全
//! - 纯函数、确定性的输出
//! - 约定优于配置

pub mod configuration;
pub mod conventions;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use configuration::*;
pub use conventions::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
