//! 组件生命周期定义

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// 瞬时模式 - 每次请求都创建新实例
    Transient,
    /// 作用域模式 - 在同一作用域内共享实例
    Scoped,
    /// 单例模式 - 整个应用生命周期内只创建一个实例
    Singleton,
    /// 宿主托管 - 由外部宿主进程管理，不参与持久度比较
    HostManaged,
    /// 未确定
    Unresolved,
}

impl Default for Lifetime {
    fn default() -> Self {
        Self::Unresolved
    }
}

impl Lifetime {
    /// 持久度等级
    ///
    /// `Transient < Scoped < Singleton`；宿主托管和未确定的生命周期没有等级
    pub fn durability(self) -> Option<u8> {
        match self {
            Self::Transient => Some(0),
            Self::Scoped => Some(1),
            Self::Singleton => Some(2),
            Self::HostManaged | Self::Unresolved => None,
        }
    }

    /// 是否比另一个生命周期更短
    ///
    /// 任一方没有持久度等级时返回 false
    pub fn is_shorter_than(self, other: Self) -> bool {
        match (self.durability(), other.durability()) {
            (Some(this), Some(that)) => this < that,
            _ => false,
        }
    }

    /// 是否可用于注册
    pub fn is_resolved(self) -> bool {
        !matches!(self, Self::Unresolved)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Transient => "transient",
            Self::Scoped => "scoped",
            Self::Singleton => "singleton",
            Self::HostManaged => "host_managed",
            Self::Unresolved => "unresolved",
        };
        f.write_str(name)
    }
}

impl FromStr for Lifetime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "transient" => Ok(Self::Transient),
            "scoped" => Ok(Self::Scoped),
            "singleton" => Ok(Self::Singleton),
            "hostmanaged" | "hosted" => Ok(Self::HostManaged),
            "unresolved" => Ok(Self::Unresolved),
            _ => Err(format!("未知的生命周期: {s}")),
        }
    }
}
