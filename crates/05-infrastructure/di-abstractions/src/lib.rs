//! # Dependency Injection Abstractions
//!
//! 依赖注入静态分析的中立模型和接缝。
//!
//! ## 核心接口
//!
//! - [`TypeCatalog`] - 类型目录接口，由前端适配器实现
//! - [`DiagnosticsSink`] - 诊断接收器接口
//! - [`ConfigLookup`] - 条件谓词求值时的配置查询接口
//!
//! ## 核心模型
//!
//! - [`Component`] / [`DependencySpec`] - 规范化后的组件和依赖声明
//! - [`Finding`] - 封闭的诊断结果枚举
//! - [`PredicateNode`] - 条件谓词表达式树
//! - [`RegistrationEntry`] / [`ConstructorPlan`] - 分析输出

pub mod catalog;
pub mod component;
pub mod diagnostics;
pub mod predicate;
pub mod registration;

pub use catalog::*;
pub use component::*;
pub use diagnostics::*;
pub use predicate::*;
pub use registration::*;
