//! 约定规范定义
//!
//! 提供参数命名约定和基于名称的生命周期推断约定

use crate::lifecycle::Lifetime;
use crate::metadata::TypeRef;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// 命名风格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// orderRepository
    CamelCase,
    /// OrderRepository
    PascalCase,
    /// order_repository
    SnakeCase,
    /// _orderRepository
    UnderscoreCamelCase,
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self::CamelCase
    }
}

/// 参数命名选项
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingOptions {
    /// 命名风格
    pub convention: NamingConvention,
    /// 自定义前缀
    pub prefix: Option<String>,
    /// 是否去除接口标记（前导 `I`）
    pub strip_interface_marker: bool,
}

impl Default for NamingOptions {
    fn default() -> Self {
        Self {
            convention: NamingConvention::CamelCase,
            prefix: None,
            strip_interface_marker: true,
        }
    }
}

impl NamingOptions {
    /// 设置命名风格
    pub fn with_convention(mut self, convention: NamingConvention) -> Self {
        self.convention = convention;
        self
    }

    /// 设置前缀
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// 设置是否去除接口标记
    pub fn with_strip_interface_marker(mut self, strip: bool) -> Self {
        self.strip_interface_marker = strip;
        self
    }
}

/// 命名约定规范
#[derive(Debug)]
pub struct NamingConventions;

impl NamingConventions {
    /// 从类型引用推导参数名称
    ///
    /// 泛型实参的简短名称位于类型名称之前：`ILogger<OrderService>` → `orderServiceLogger`
    pub fn parameter_name(type_ref: &TypeRef, options: &NamingOptions) -> String {
        let mut words = Vec::new();
        Self::collect_words(type_ref, options.strip_interface_marker, &mut words);

        let name = match options.convention {
            NamingConvention::CamelCase => Self::to_camel_case(&words),
            NamingConvention::PascalCase => Self::to_pascal_case(&words),
            NamingConvention::SnakeCase => Self::to_snake_case(&words),
            NamingConvention::UnderscoreCamelCase => format!("_{}", Self::to_camel_case(&words)),
        };

        match &options.prefix {
            Some(prefix) => format!("{prefix}{name}"),
            None => name,
        }
    }

    /// 成员名称比较键
    ///
    /// 忽略下划线和大小写，`_orderRepository` 与 `order_repository` 视为同一成员
    pub fn member_key(name: &str) -> String {
        name.chars()
            .filter(|ch| *ch != '_')
            .flat_map(char::to_lowercase)
            .collect()
    }

    /// 去除前导接口标记
    pub fn strip_interface_marker(name: &str) -> &str {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some('I'), Some(second)) if second.is_uppercase() => &name[1..],
            _ => name,
        }
    }

    fn collect_words(type_ref: &TypeRef, strip_marker: bool, words: &mut Vec<String>) {
        for arg in type_ref.args() {
            Self::collect_words(arg, strip_marker, words);
        }

        let simple = type_ref.simple_name();
        let simple = if strip_marker && matches!(type_ref, TypeRef::Named { .. }) {
            Self::strip_interface_marker(simple)
        } else {
            simple
        };
        words.extend(Self::split_words(simple));
    }

    /// 将标识符拆分为单词（处理驼峰、缩写和下划线）
    fn split_words(s: &str) -> Vec<String> {
        let chars: Vec<char> = s.chars().collect();
        let mut words = Vec::new();
        let mut current = String::new();

        for (index, &ch) in chars.iter().enumerate() {
            if ch == '_' || !ch.is_alphanumeric() {
                if !current.is_empty() {
                    words.push(std::mem::take(&mut current));
                }
                continue;
            }

            if ch.is_uppercase() && !current.is_empty() {
                let prev = chars[index - 1];
                let next_is_lower = chars.get(index + 1).is_some_and(|next| next.is_lowercase());
                if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(ch);
        }

        if !current.is_empty() {
            words.push(current);
        }
        words
    }

    fn capitalize(word: &str) -> String {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }

    fn to_camel_case(words: &[String]) -> String {
        words
            .iter()
            .enumerate()
            .map(|(index, word)| {
                if index == 0 {
                    word.to_lowercase()
                } else {
                    Self::capitalize(word)
                }
            })
            .collect()
    }

    fn to_pascal_case(words: &[String]) -> String {
        words.iter().map(|word| Self::capitalize(word)).collect()
    }

    fn to_snake_case(words: &[String]) -> String {
        words
            .iter()
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join("_")
    }
}

/// 生命周期约定规则
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeConventionRule {
    /// 名称模式，支持单个 `*` 通配符
    pub pattern: String,
    /// 推断出的生命周期
    pub lifetime: Lifetime,
    /// 优先级
    #[serde(default)]
    pub priority: i32,
}

impl LifetimeConventionRule {
    /// 创建新的约定规则
    pub fn new(pattern: impl Into<String>, lifetime: Lifetime) -> Self {
        Self {
            pattern: pattern.into(),
            lifetime,
            priority: 0,
        }
    }

    /// 设置优先级
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// 检查名称是否匹配此规则
    pub fn matches(&self, name: &str) -> bool {
        match self.pattern.split_once('*') {
            Some((prefix, suffix)) => {
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix)
                    && name.ends_with(suffix)
            }
            None => name == self.pattern,
        }
    }
}

/// 组件约定规范
#[derive(Debug, Clone)]
pub struct ComponentConventions {
    rules: Vec<LifetimeConventionRule>,
}

impl ComponentConventions {
    /// 创建带默认约定的组件约定规范
    pub fn new() -> Self {
        Self::with_rules(Self::default_rules())
    }

    /// 使用给定规则创建
    pub fn with_rules(rules: Vec<LifetimeConventionRule>) -> Self {
        let mut conventions = Self { rules: Vec::new() };
        for rule in rules {
            conventions.add_convention(rule);
        }
        conventions
    }

    /// 默认约定规则
    pub fn default_rules() -> Vec<LifetimeConventionRule> {
        vec![
            LifetimeConventionRule::new("*HostedService", Lifetime::HostManaged).with_priority(100),
            LifetimeConventionRule::new("*Worker", Lifetime::HostManaged).with_priority(100),
            LifetimeConventionRule::new("*Service", Lifetime::Singleton).with_priority(90),
            LifetimeConventionRule::new("*Manager", Lifetime::Singleton).with_priority(90),
            LifetimeConventionRule::new("*Provider", Lifetime::Scoped).with_priority(80),
            LifetimeConventionRule::new("*Repository", Lifetime::Scoped).with_priority(80),
            LifetimeConventionRule::new("*Strategy", Lifetime::Transient).with_priority(70),
            LifetimeConventionRule::new("*Handler", Lifetime::Transient).with_priority(70),
        ]
    }

    /// 添加约定规则
    pub fn add_convention(&mut self, rule: LifetimeConventionRule) {
        self.rules.push(rule);
        // 稳定排序，同优先级保持添加顺序
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    /// 获取所有约定规则
    pub fn rules(&self) -> &[LifetimeConventionRule] {
        &self.rules
    }

    /// 根据名称推断生命周期
    pub fn infer_lifetime(&self, name: &str) -> Option<Lifetime> {
        let rule = self.rules.iter().find(|rule| rule.matches(name))?;
        debug!("约定推断生命周期: {} -> {} (规则 {})", name, rule.lifetime, rule.pattern);
        Some(rule.lifetime)
    }
}

impl Default for ComponentConventions {
    fn default() -> Self {
        Self::new()
    }
}
