//! 分析配置定义

use crate::conventions::{ComponentConventions, LifetimeConventionRule, NamingOptions};
use serde::{Deserialize, Serialize};

/// 分析设置
///
/// 一次分析过程内只读，相同设置和相同目录必然得到相同输出
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    /// 默认参数命名选项，依赖声明未指定时使用
    pub naming: NamingOptions,
    /// 生命周期未声明时是否按名称约定推断
    pub infer_lifetime_by_convention: bool,
    /// 生命周期约定规则，为空时使用默认规则
    pub lifetime_conventions: Vec<LifetimeConventionRule>,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            naming: NamingOptions::default(),
            infer_lifetime_by_convention: false,
            lifetime_conventions: Vec::new(),
        }
    }
}

impl AnalysisSettings {
    /// 设置默认命名选项
    pub fn with_naming(mut self, naming: NamingOptions) -> Self {
        self.naming = naming;
        self
    }

    /// 启用按约定推断生命周期
    pub fn with_lifetime_inference(mut self, enabled: bool) -> Self {
        self.infer_lifetime_by_convention = enabled;
        self
    }

    /// 添加生命周期约定规则
    pub fn with_lifetime_convention(mut self, rule: LifetimeConventionRule) -> Self {
        self.lifetime_conventions.push(rule);
        self
    }

    /// 构建组件约定规范
    pub fn conventions(&self) -> ComponentConventions {
        if self.lifetime_conventions.is_empty() {
            ComponentConventions::new()
        } else {
            ComponentConventions::with_rules(self.lifetime_conventions.clone())
        }
    }
}
