//! 元数据定义
//!
//! 提供组件标识和类型引用的元数据信息

use crate::errors::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 组件标识
///
/// 在一次分析过程中稳定且唯一，所有排序均以此为键
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// 创建新的组件标识
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// 获取标识字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 获取简短名称（不包含命名空间）
    pub fn short_name(&self) -> &str {
        simple_segment(&self.0)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ComponentId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 类型引用
///
/// 具名类型（可带泛型实参）或尚未替换的泛型参数
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeRef {
    /// 具名类型
    Named {
        /// 完整类型名称
        name: String,
        /// 泛型实参
        args: Vec<TypeRef>,
    },
    /// 泛型参数
    Param(String),
}

impl TypeRef {
    /// 创建非泛型类型引用
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// 创建泛型类型引用
    pub fn generic(name: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self::Named {
            name: name.into(),
            args,
        }
    }

    /// 创建泛型参数引用
    pub fn param(name: impl Into<String>) -> Self {
        Self::Param(name.into())
    }

    /// 获取简短名称（不包含命名空间和泛型实参）
    pub fn simple_name(&self) -> &str {
        match self {
            Self::Named { name, .. } => simple_segment(name),
            Self::Param(name) => name,
        }
    }

    /// 泛型实参列表
    pub fn args(&self) -> &[TypeRef] {
        match self {
            Self::Named { args, .. } => args,
            Self::Param(_) => &[],
        }
    }

    /// 是否为封闭类型（不含任何泛型参数）
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Named { args, .. } => args.iter().all(TypeRef::is_closed),
            Self::Param(_) => false,
        }
    }

    /// 按出现顺序收集自由泛型参数（去重）
    pub fn free_params(&self) -> Vec<String> {
        let mut params = Vec::new();
        self.collect_params(&mut params);
        params
    }

    fn collect_params(&self, out: &mut Vec<String>) {
        match self {
            Self::Named { args, .. } => {
                for arg in args {
                    arg.collect_params(out);
                }
            }
            Self::Param(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
        }
    }

    /// 将与声明的泛型参数同名的无实参类型转换为泛型参数
    pub fn bind_params(self, params: &[String]) -> Self {
        match self {
            Self::Named { name, args } if args.is_empty() && params.contains(&name) => {
                Self::Param(name)
            }
            Self::Named { name, args } => Self::Named {
                name,
                args: args.into_iter().map(|arg| arg.bind_params(params)).collect(),
            },
            param @ Self::Param(_) => param,
        }
    }

    /// 使用绑定替换泛型参数
    ///
    /// 遇到未绑定的参数时返回该参数名
    pub fn substitute(&self, bindings: &BTreeMap<String, TypeRef>) -> Result<TypeRef, String> {
        match self {
            Self::Named { name, args } => {
                let args = args
                    .iter()
                    .map(|arg| arg.substitute(bindings))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self::Named {
                    name: name.clone(),
                    args,
                })
            }
            Self::Param(name) => bindings.get(name).cloned().ok_or_else(|| name.clone()),
        }
    }

    /// 检查是否匹配给定模式
    ///
    /// 模式中的泛型参数可匹配任意类型，但同名参数必须绑定到同一类型
    pub fn matches(&self, pattern: &TypeRef) -> bool {
        let mut bindings = BTreeMap::new();
        self.match_into(pattern, &mut bindings)
    }

    fn match_into(&self, pattern: &TypeRef, bindings: &mut BTreeMap<String, TypeRef>) -> bool {
        match pattern {
            Self::Param(param) => match bindings.get(param) {
                Some(bound) => bound == self,
                None => {
                    bindings.insert(param.clone(), self.clone());
                    true
                }
            },
            Self::Named {
                name: pattern_name,
                args: pattern_args,
            } => match self {
                Self::Named { name, args } => {
                    name == pattern_name
                        && args.len() == pattern_args.len()
                        && args
                            .iter()
                            .zip(pattern_args)
                            .all(|(arg, pattern_arg)| arg.match_into(pattern_arg, bindings))
                }
                Self::Param(_) => false,
            },
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (index, arg) in args.iter().enumerate() {
                        if index > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Param(name) => f.write_str(name),
        }
    }
}

impl FromStr for TypeRef {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeRefParser {
            input: s,
            chars: s.char_indices().peekable(),
        };
        let parsed = parser.parse_type()?;
        parser.skip_whitespace();
        if let Some((offset, ch)) = parser.chars.next() {
            return Err(parser.error(format!("位置 {offset} 处存在多余字符 '{ch}'")));
        }
        Ok(parsed)
    }
}

impl TryFrom<String> for TypeRef {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeRef> for String {
    fn from(value: TypeRef) -> Self {
        value.to_string()
    }
}

/// 类型引用文本解析器
struct TypeRefParser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl TypeRefParser<'_> {
    fn parse_type(&mut self) -> Result<TypeRef, CatalogError> {
        self.skip_whitespace();
        let mut name = String::new();
        while let Some(&(_, ch)) = self.chars.peek() {
            if ch.is_alphanumeric() || matches!(ch, '_' | '.' | ':') {
                name.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }

        if name.is_empty() {
            return Err(self.error("缺少类型名称"));
        }

        self.skip_whitespace();
        let mut args = Vec::new();
        if matches!(self.chars.peek(), Some(&(_, '<'))) {
            self.chars.next();
            loop {
                args.push(self.parse_type()?);
                self.skip_whitespace();
                match self.chars.next() {
                    Some((_, ',')) => continue,
                    Some((_, '>')) => break,
                    Some((offset, ch)) => {
                        return Err(self.error(format!("位置 {offset} 处期望 ',' 或 '>'，实际为 '{ch}'")))
                    }
                    None => return Err(self.error("泛型实参列表未闭合")),
                }
            }
        }

        Ok(TypeRef::Named { name, args })
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(&(_, ch)) if ch.is_whitespace()) {
            self.chars.next();
        }
    }

    fn error(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::InvalidTypeReference {
            input: self.input.to_string(),
            reason: reason.into(),
        }
    }
}

fn simple_segment(name: &str) -> &str {
    let after_path = name.rsplit("::").next().unwrap_or(name);
    after_path.rsplit('.').next().unwrap_or(after_path)
}
