//! 诊断结果抽象
//!
//! 分析过程中的所有问题都以 [`Finding`] 的形式交给 [`DiagnosticsSink`]，
//! 消息文本和诊断编号由展示层自行决定。

use infrastructure_common::{ComponentId, Lifetime, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// 严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// 提示，不影响生成
    Advisory,
    /// 警告，生成继续
    Warning,
    /// 致命，阻止相关组件的输出
    Fatal,
}

/// 诊断类别（不带负载）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// 结构性错误
    StructuralError,
    /// 冗余声明
    RedundancyWarning,
    /// 字段与批量声明冲突
    ConflictWarning,
    /// 生命周期违规
    LifetimeViolation,
    /// 条件声明矛盾
    ConditionContradiction,
    /// 无效的契约排除
    UnnecessaryExclusion,
    /// 依赖环
    CycleWarning,
}

/// 结构性错误原因
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum StructuralReason {
    /// 继承链自引用或成环
    InheritanceCycle { chain: Vec<ComponentId> },
    /// 基类不在类型目录中
    MissingBase { base: ComponentId },
    /// 基类泛型实参数量不匹配
    BaseArityMismatch {
        base: ComponentId,
        expected: usize,
        actual: usize,
    },
    /// 引用了未声明的泛型参数
    UnresolvedGenericParameter { parameter: String },
    /// 祖先组件存在结构性错误
    BrokenAncestor { ancestor: ComponentId },
}

/// 冗余范围
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "scope")]
pub enum RedundancyScope {
    /// 同一声明组内重复
    DuplicateWithinGroup { group: usize },
    /// 同一层级不同声明组之间重复
    DuplicateAcrossGroups { first_group: usize, group: usize },
    /// 祖先已声明
    Inherited { ancestor: ComponentId },
}

/// 条件矛盾原因
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum ContradictionReason {
    /// 环境同时出现在允许和拒绝列表中
    EnvironmentAllowedAndDenied { environment: String },
    /// 配置键被断言同时等于和不等于同一个值
    ConfigEqualAndNotEqual { key: String, value: String },
    /// 同时存在相等和不等比较，但其中一个缺少值
    ConflictingComparators { key: String },
    /// 比较符缺少配置键
    OrphanedComparator,
    /// 配置键缺少比较符
    MissingComparator { key: String },
    /// 条件声明不含任何片段
    EmptyCondition,
    /// 多个条件声明无法证明互斥
    AmbiguousConditions { declarations: usize },
}

/// 诊断结果
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Finding {
    /// 结构性错误（致命，只影响相关组件）
    StructuralError {
        component: ComponentId,
        #[serde(flatten)]
        reason: StructuralReason,
    },
    /// 重复声明已折叠
    RedundancyWarning {
        component: ComponentId,
        dependency: TypeRef,
        #[serde(flatten)]
        scope: RedundancyScope,
    },
    /// 批量声明让位于字段声明
    ConflictWarning {
        component: ComponentId,
        dependency: TypeRef,
    },
    /// 生命周期不兼容
    LifetimeViolation {
        component: ComponentId,
        dependency: ComponentId,
        dependency_type: TypeRef,
        component_lifetime: Lifetime,
        dependency_lifetime: Lifetime,
        /// 仅通过继承引入
        inherited: bool,
    },
    /// 条件谓词无法一致编译
    ConditionContradiction {
        component: ComponentId,
        #[serde(flatten)]
        reason: ContradictionReason,
    },
    /// 排除了未实现的契约
    UnnecessaryExclusion {
        component: ComponentId,
        contract: TypeRef,
    },
    /// 具体组件之间存在依赖环
    CycleWarning { cycle: Vec<ComponentId> },
}

impl Finding {
    /// 诊断类别
    pub fn kind(&self) -> FindingKind {
        match self {
            Self::StructuralError { .. } => FindingKind::StructuralError,
            Self::RedundancyWarning { .. } => FindingKind::RedundancyWarning,
            Self::ConflictWarning { .. } => FindingKind::ConflictWarning,
            Self::LifetimeViolation { .. } => FindingKind::LifetimeViolation,
            Self::ConditionContradiction { .. } => FindingKind::ConditionContradiction,
            Self::UnnecessaryExclusion { .. } => FindingKind::UnnecessaryExclusion,
            Self::CycleWarning { .. } => FindingKind::CycleWarning,
        }
    }

    /// 严重程度
    pub fn severity(&self) -> Severity {
        match self {
            Self::StructuralError { .. } | Self::ConditionContradiction { .. } => Severity::Fatal,
            Self::LifetimeViolation { inherited: false, .. } => Severity::Fatal,
            Self::LifetimeViolation { inherited: true, .. } => Severity::Advisory,
            Self::RedundancyWarning { .. }
            | Self::ConflictWarning { .. }
            | Self::UnnecessaryExclusion { .. }
            | Self::CycleWarning { .. } => Severity::Warning,
        }
    }

    /// 是否致命
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// 主要相关组件（依赖环取环上第一个组件）
    pub fn component(&self) -> Option<&ComponentId> {
        match self {
            Self::StructuralError { component, .. }
            | Self::RedundancyWarning { component, .. }
            | Self::ConflictWarning { component, .. }
            | Self::LifetimeViolation { component, .. }
            | Self::ConditionContradiction { component, .. }
            | Self::UnnecessaryExclusion { component, .. } => Some(component),
            Self::CycleWarning { cycle } => cycle.first(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StructuralError { component, reason } => {
                write!(f, "[{:?}] {component}: {reason:?}", self.kind())
            }
            Self::RedundancyWarning {
                component,
                dependency,
                scope,
            } => write!(f, "[{:?}] {component}: {dependency} ({scope:?})", self.kind()),
            Self::ConflictWarning {
                component,
                dependency,
            } => write!(f, "[{:?}] {component}: {dependency}", self.kind()),
            Self::LifetimeViolation {
                component,
                dependency,
                component_lifetime,
                dependency_lifetime,
                inherited,
                ..
            } => write!(
                f,
                "[{:?}] {component} ({component_lifetime}) -> {dependency} ({dependency_lifetime}){}",
                self.kind(),
                if *inherited { " [inherited]" } else { "" }
            ),
            Self::ConditionContradiction { component, reason } => {
                write!(f, "[{:?}] {component}: {reason:?}", self.kind())
            }
            Self::UnnecessaryExclusion {
                component,
                contract,
            } => write!(f, "[{:?}] {component}: {contract}", self.kind()),
            Self::CycleWarning { cycle } => {
                let chain = cycle
                    .iter()
                    .map(ComponentId::as_str)
                    .collect::<Vec<_>>()
                    .join(" -> ");
                write!(f, "[{:?}] {chain}", self.kind())
            }
        }
    }
}

/// 诊断接收器
///
/// 接收器不得因数据形态问题失败
pub trait DiagnosticsSink {
    /// 上报诊断结果
    fn report(&mut self, finding: Finding);
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for &mut S {
    fn report(&mut self, finding: Finding) {
        (**self).report(finding);
    }
}

impl<A: DiagnosticsSink, B: DiagnosticsSink> DiagnosticsSink for (A, B) {
    fn report(&mut self, finding: Finding) {
        self.0.report(finding.clone());
        self.1.report(finding);
    }
}

/// 收集型接收器
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectingSink {
    findings: Vec<Finding>,
}

impl CollectingSink {
    /// 创建新的收集型接收器
    pub fn new() -> Self {
        Self::default()
    }

    /// 按上报顺序获取所有诊断结果
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// 取出所有诊断结果
    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }

    /// 按类别筛选
    pub fn of_kind(&self, kind: FindingKind) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.kind() == kind).collect()
    }

    /// 是否存在致命诊断
    pub fn has_fatal(&self) -> bool {
        self.findings.iter().any(Finding::is_fatal)
    }
}

impl DiagnosticsSink for CollectingSink {
    fn report(&mut self, finding: Finding) {
        self.findings.push(finding);
    }
}

/// 日志接收器
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn report(&mut self, finding: Finding) {
        match finding.severity() {
            Severity::Fatal => warn!(severity = ?finding.severity(), "{}", finding),
            Severity::Warning | Severity::Advisory => {
                debug!(severity = ?finding.severity(), "{}", finding);
            }
        }
    }
}
