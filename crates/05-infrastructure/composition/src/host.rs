//! 分析宿主与分析报告

use crate::catalog_sources::{load_catalog, CatalogSource};
use di_abstractions::{
    CollectingSink, ConfigLookup, Finding, RegistrationEntry, Severity, TracingSink, TypeCatalog,
};
use di_impl::{AnalysisOutput, DependencyAnalyzer};
use infrastructure_common::{AnalysisSettings, ConfigError, ConfigResult, InfrastructureResult};
use serde::Serialize;
use tracing::{info, warn};

/// 分析宿主
///
/// 持有类型目录来源和分析设置，每次 [`run`](Self::run) 都重新加载来源并完整分析一遍
pub struct AnalysisHost {
    sources: Vec<Box<dyn CatalogSource>>,
    analyzer: DependencyAnalyzer,
}

impl AnalysisHost {
    /// 创建分析宿主
    pub fn new(sources: Vec<Box<dyn CatalogSource>>, settings: AnalysisSettings) -> Self {
        Self {
            sources,
            analyzer: DependencyAnalyzer::new(settings),
        }
    }

    /// 分析设置
    pub fn settings(&self) -> &AnalysisSettings {
        self.analyzer.settings()
    }

    /// 来源数量
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// 加载全部来源并运行分析
    pub async fn run(&self) -> InfrastructureResult<AnalysisReport> {
        let catalog = load_catalog(&self.sources).await?;
        Ok(self.analyze(&catalog))
    }

    /// 分析给定的类型目录
    pub fn analyze(&self, catalog: &dyn TypeCatalog) -> AnalysisReport {
        let mut sink = (CollectingSink::new(), TracingSink);
        let output = self.analyzer.analyze(catalog, &mut sink);
        let (collector, _) = sink;

        let report = AnalysisReport::new(catalog.len(), collector.into_findings(), output);
        if report.has_fatal() {
            warn!("分析发现 {} 个致命问题", report.summary.fatal);
        }
        info!(
            "分析完成: {} 个组件, {} 个注册条目, {} 个诊断",
            report.summary.components,
            report.summary.registrations,
            report.findings.len()
        );
        report
    }
}

/// 报告摘要
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    /// 类型目录中的组件数
    pub components: usize,
    /// 构造函数计划数
    pub constructors: usize,
    /// 注册条目数
    pub registrations: usize,
    /// 致命诊断数
    pub fatal: usize,
    /// 警告数
    pub warnings: usize,
    /// 提示数
    pub advisories: usize,
}

/// 分析报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    /// 摘要
    pub summary: ReportSummary,
    /// 诊断，按上报顺序
    pub findings: Vec<Finding>,
    /// 分析输出
    #[serde(flatten)]
    pub output: AnalysisOutput,
}

impl AnalysisReport {
    /// 由分析结果构造报告
    pub fn new(components: usize, findings: Vec<Finding>, output: AnalysisOutput) -> Self {
        let count = |severity: Severity| findings.iter().filter(|f| f.severity() == severity).count();
        let summary = ReportSummary {
            components,
            constructors: output.constructors.len(),
            registrations: output.registrations.len(),
            fatal: count(Severity::Fatal),
            warnings: count(Severity::Warning),
            advisories: count(Severity::Advisory),
        };
        Self {
            summary,
            findings,
            output,
        }
    }

    /// 是否存在致命诊断
    pub fn has_fatal(&self) -> bool {
        self.summary.fatal > 0
    }

    /// 在给定环境和配置下生效的注册条目
    pub fn active_registrations(&self, environment: &str, config: &dyn ConfigLookup) -> Vec<&RegistrationEntry> {
        self.output
            .registrations
            .iter()
            .filter(|entry| {
                entry
                    .predicate
                    .as_ref()
                    .map_or(true, |predicate| predicate.evaluate(environment, config))
            })
            .collect()
    }

    /// 渲染为格式化的 JSON
    pub fn to_json_pretty(&self) -> ConfigResult<String> {
        serde_json::to_string_pretty(self).map_err(ConfigError::from)
    }
}
