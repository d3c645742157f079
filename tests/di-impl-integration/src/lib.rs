//! 集中集成测试的共用夹具

use di_abstractions::{CollectingSink, ComponentDeclaration};
use di_impl::{AnalysisOutput, DependencyAnalyzer, InMemoryTypeCatalog};
use infrastructure_common::{AnalysisSettings, TypeRef};

/// 解析类型引用文本
pub fn ty(text: &str) -> TypeRef {
    text.parse()
        .unwrap_or_else(|e| panic!("无效的类型引用 {text}: {e}"))
}

/// 以默认设置分析一组声明
pub fn analyze(declarations: Vec<ComponentDeclaration>) -> (AnalysisOutput, CollectingSink) {
    analyze_with(AnalysisSettings::default(), declarations)
}

/// 以给定设置分析一组声明
pub fn analyze_with(
    settings: AnalysisSettings,
    declarations: Vec<ComponentDeclaration>,
) -> (AnalysisOutput, CollectingSink) {
    let catalog = InMemoryTypeCatalog::from_declarations(declarations)
        .unwrap_or_else(|e| panic!("无法构建类型目录: {e}"));
    let mut sink = CollectingSink::new();
    let output = DependencyAnalyzer::new(settings).analyze(&catalog, &mut sink);
    (output, sink)
}
