//! 组件注册表抽象接口

use services_common::{
    ComponentHandle, ComponentInterface, ComponentInterfaceId, ComponentSlot, RegistryError,
    RegistryResult,
};
use std::collections::HashMap;
use std::sync::Arc;

/// 组件注册表 trait
///
/// 按接口标识保存组件槽位。每个标识最多绑定一个已提供的实例。
pub trait ComponentRegistry: Send + Sync {
    /// 注册组件实例
    ///
    /// 标识已绑定实例时返回 [`RegistryError::DuplicateComponent`]，占位符可以被替换。
    fn register_service_component(
        &mut self,
        interface: ComponentInterfaceId,
        handle: ComponentHandle,
    ) -> RegistryResult<()>;

    /// 获取组件实例
    fn get_service_component(&self, interface: &ComponentInterfaceId)
        -> RegistryResult<ComponentHandle>;

    /// 用新的槽位表整体替换当前内容
    fn reset_provided_components(
        &mut self,
        components: HashMap<ComponentInterfaceId, ComponentSlot>,
    ) -> RegistryResult<()>;

    /// 是否已提供实例
    fn is_provided(&self, interface: &ComponentInterfaceId) -> bool;

    /// 所有已知的接口标识（包括占位符）
    fn component_ids(&self) -> Vec<ComponentInterfaceId>;

    /// 是否已锁定
    fn is_locked(&self) -> bool {
        false
    }
}

/// 组件注册表的类型化扩展
pub trait ComponentRegistryExt: ComponentRegistry {
    /// 按接口类型注册实例
    fn register_component<I>(&mut self, instance: Arc<I::Instance>) -> RegistryResult<()>
    where
        I: ComponentInterface,
    {
        self.register_service_component(I::id(), ComponentHandle::new::<I>(instance))
    }

    /// 按接口类型获取实例
    fn get_component<I>(&self) -> RegistryResult<Arc<I::Instance>>
    where
        I: ComponentInterface,
    {
        let handle = self.get_service_component(&I::id())?;
        handle
            .downcast::<I>()
            .ok_or_else(|| RegistryError::ComponentTypeMismatch {
                interface: I::id(),
                expected: std::any::type_name::<I::Instance>(),
                actual: handle.type_name(),
            })
    }
}

impl<R> ComponentRegistryExt for R where R: ComponentRegistry + ?Sized {}
