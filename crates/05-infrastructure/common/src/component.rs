//! 组件实例句柄与占位符
//!
//! 注册表按接口标识保存 [`ComponentSlot`]，区分“已声明但尚未提供”和“已提供”。

use crate::identity::{ComponentInterface, ComponentInterfaceId};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的组件实例
///
/// 内部保存 `Arc<I::Instance>`，注册表与依赖方共享所有权。
#[derive(Clone)]
pub struct ComponentHandle {
    instance: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ComponentHandle {
    /// 为接口 `I` 包装一个实例
    pub fn new<I>(instance: Arc<I::Instance>) -> Self
    where
        I: ComponentInterface,
    {
        Self {
            instance: Arc::new(instance),
            type_name: std::any::type_name::<I::Instance>(),
        }
    }

    /// 还原为接口 `I` 的实例，类型不匹配时返回 `None`
    pub fn downcast<I>(&self) -> Option<Arc<I::Instance>>
    where
        I: ComponentInterface,
    {
        self.instance
            .downcast_ref::<Arc<I::Instance>>()
            .cloned()
    }

    /// 实例类型名称
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentHandle")
            .field("type_name", &self.type_name)
            .field("instance", &"<component>")
            .finish()
    }
}

/// 缺失组件占位符
///
/// 某个包声明了对接口的依赖，但提供者尚未注册实例。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingComponent {
    /// 期望的接口标识
    pub intended: ComponentInterfaceId,
}

impl MissingComponent {
    /// 创建占位符
    pub fn new(intended: ComponentInterfaceId) -> Self {
        Self { intended }
    }
}

/// 注册表中的组件槽位
#[derive(Debug, Clone)]
pub enum ComponentSlot {
    /// 已声明，尚未提供
    Missing(MissingComponent),
    /// 已提供的实例
    Provided(ComponentHandle),
}

impl ComponentSlot {
    /// 为接口创建占位槽位
    pub fn missing(intended: ComponentInterfaceId) -> Self {
        Self::Missing(MissingComponent::new(intended))
    }

    /// 是否已提供实例
    pub fn is_provided(&self) -> bool {
        matches!(self, Self::Provided(_))
    }

    /// 获取已提供的实例
    pub fn handle(&self) -> Option<&ComponentHandle> {
        match self {
            Self::Provided(handle) => Some(handle),
            Self::Missing(_) => None,
        }
    }

    /// 用于诊断输出的标识
    pub fn describe(&self) -> String {
        match self {
            Self::Provided(handle) => handle.type_name().to_string(),
            Self::Missing(missing) => format!("missing<{}>", missing.intended),
        }
    }
}
