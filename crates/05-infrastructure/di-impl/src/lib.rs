//! # 依赖注入静态分析实现
//!
//! 提供继承合并、构造函数合成、生命周期验证、条件谓词编译和注册计划的具体实现。
//!
//! 整个分析过程是单线程、无副作用的同步计算：相同的类型目录和设置
//! 总是产生逐字节相同的输出（包括诊断顺序）。

pub mod analyzer;
pub mod catalog;
pub mod lifetime;
pub mod merge;
pub mod normalize;
pub mod planner;
pub mod predicate;
pub mod synthesis;

pub use analyzer::{AnalysisOutput, DependencyAnalyzer};
pub use catalog::InMemoryTypeCatalog;
pub use lifetime::{ImplementationIndex, LifetimeValidator};
pub use merge::{FlattenedDependency, InheritanceResolver, MergedComponent};
pub use normalize::Normalizer;
pub use planner::{ExposedContracts, RegistrationPlanner, ValidatedComponent};
pub use predicate::PredicateCompiler;
pub use synthesis::ConstructorSynthesizer;
