//! 组件接口与包的标识

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// 组件接口标识
///
/// 每个能力接口对应一个稳定的字符串标识，同一标识在同一时刻最多绑定一个实例。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentInterfaceId(Cow<'static, str>);

impl ComponentInterfaceId {
    /// 从静态字符串创建标识
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// 从任意字符串创建标识
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// 获取标识字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentInterfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ComponentInterfaceId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

/// 包标识
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(Cow<'static, str>);

impl PackageId {
    /// 从静态字符串创建标识
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// 从任意字符串创建标识
    pub fn new(id: impl Into<Cow<'static, str>>) -> Self {
        Self(id.into())
    }

    /// 获取标识字符串
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for PackageId {
    fn from(id: &'static str) -> Self {
        Self::from_static(id)
    }
}

/// 组件接口声明 trait
///
/// 为每个能力定义一个零大小的标记类型并实现此 trait：
///
/// ```rust
/// use services_common::ComponentInterface;
///
/// pub trait Clock: Send + Sync {
///     fn now_millis(&self) -> u64;
/// }
///
/// pub struct ClockInterface;
///
/// impl ComponentInterface for ClockInterface {
///     const ID: &'static str = "services.clock";
///     type Instance = dyn Clock;
/// }
/// ```
pub trait ComponentInterface: 'static {
    /// 稳定的接口标识
    const ID: &'static str;

    /// 注册表中保存的实例类型，通常是 `dyn Trait`
    type Instance: ?Sized + Send + Sync + 'static;

    /// 获取接口标识
    fn id() -> ComponentInterfaceId {
        ComponentInterfaceId::from_static(Self::ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NameInterface;

    impl ComponentInterface for NameInterface {
        const ID: &'static str = "test.name";
        type Instance = String;
    }

    #[test]
    fn test_interface_id_is_stable() {
        assert_eq!(NameInterface::id(), ComponentInterfaceId::from("test.name"));
        assert_eq!(NameInterface::id().to_string(), "test.name");
    }

    #[test]
    fn test_owned_and_static_ids_compare_equal() {
        let owned = PackageId::new(String::from("core"));
        assert_eq!(owned, PackageId::from_static("core"));
    }
}
