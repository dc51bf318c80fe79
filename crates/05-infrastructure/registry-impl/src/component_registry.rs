//! 组件注册表实现

use registry_abstractions::ComponentRegistry;
use services_common::{
    ComponentHandle, ComponentInterfaceId, ComponentSlot, RegistryError, RegistryResult,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// 组件注册表实现
///
/// 不做内部同步，调用方通过 `&mut` 独占修改。
#[derive(Debug, Default)]
pub struct ComponentRegistryImpl {
    /// 接口标识到组件槽位
    components: HashMap<ComponentInterfaceId, ComponentSlot>,
}

impl ComponentRegistryImpl {
    /// 创建空的组件注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 以给定槽位表创建注册表
    pub fn with_components(components: HashMap<ComponentInterfaceId, ComponentSlot>) -> Self {
        Self { components }
    }

    /// 当前槽位数量
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl ComponentRegistry for ComponentRegistryImpl {
    fn register_service_component(
        &mut self,
        interface: ComponentInterfaceId,
        handle: ComponentHandle,
    ) -> RegistryResult<()> {
        if let Some(ComponentSlot::Provided(_)) = self.components.get(&interface) {
            return Err(RegistryError::DuplicateComponent { interface });
        }

        info!("注册组件: {} ({})", interface, handle.type_name());
        self.components
            .insert(interface, ComponentSlot::Provided(handle));
        Ok(())
    }

    fn get_service_component(
        &self,
        interface: &ComponentInterfaceId,
    ) -> RegistryResult<ComponentHandle> {
        match self.components.get(interface) {
            Some(ComponentSlot::Provided(handle)) => Ok(handle.clone()),
            Some(ComponentSlot::Missing(_)) => Err(RegistryError::ComponentMissing {
                interface: interface.clone(),
            }),
            None => Err(RegistryError::ComponentNotDeclared {
                interface: interface.clone(),
            }),
        }
    }

    fn reset_provided_components(
        &mut self,
        components: HashMap<ComponentInterfaceId, ComponentSlot>,
    ) -> RegistryResult<()> {
        debug!(
            "重置组件注册表: 丢弃 {} 个槽位，装入 {} 个槽位",
            self.components.len(),
            components.len()
        );
        self.components = components;
        Ok(())
    }

    fn is_provided(&self, interface: &ComponentInterfaceId) -> bool {
        self.components
            .get(interface)
            .map(ComponentSlot::is_provided)
            .unwrap_or(false)
    }

    fn component_ids(&self) -> Vec<ComponentInterfaceId> {
        let mut ids: Vec<_> = self.components.keys().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use registry_abstractions::ComponentRegistryExt;
    use services_common::ComponentInterface;
    use std::sync::Arc;

    struct PortInterface;

    impl ComponentInterface for PortInterface {
        const ID: &'static str = "test.port";
        type Instance = u16;
    }

    struct NameInterface;

    impl ComponentInterface for NameInterface {
        const ID: &'static str = "test.name";
        type Instance = String;
    }

    #[test]
    fn test_register_and_get() {
        let mut registry = ComponentRegistryImpl::new();
        registry
            .register_component::<PortInterface>(Arc::new(8080))
            .unwrap();

        let port = registry.get_component::<PortInterface>().unwrap();
        assert_eq!(*port, 8080);
        assert!(registry.is_provided(&PortInterface::id()));
    }

    #[test]
    fn test_second_registration_fails() {
        let mut registry = ComponentRegistryImpl::new();
        registry
            .register_component::<PortInterface>(Arc::new(1))
            .unwrap();

        let err = registry
            .register_component::<PortInterface>(Arc::new(2))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateComponent {
                interface: PortInterface::id()
            }
        );
        // 第一次注册的值保持不变
        assert_eq!(*registry.get_component::<PortInterface>().unwrap(), 1);
    }

    #[test]
    fn test_never_declared_and_missing_are_distinct() {
        let mut slots = HashMap::new();
        slots.insert(PortInterface::id(), ComponentSlot::missing(PortInterface::id()));
        let registry = ComponentRegistryImpl::with_components(slots);

        assert_eq!(
            registry.get_component::<PortInterface>().unwrap_err(),
            RegistryError::ComponentMissing {
                interface: PortInterface::id()
            }
        );
        assert_eq!(
            registry.get_component::<NameInterface>().unwrap_err(),
            RegistryError::ComponentNotDeclared {
                interface: NameInterface::id()
            }
        );
    }

    #[test]
    fn test_placeholder_can_be_replaced() {
        let mut slots = HashMap::new();
        slots.insert(NameInterface::id(), ComponentSlot::missing(NameInterface::id()));
        let mut registry = ComponentRegistryImpl::with_components(slots);

        registry
            .register_component::<NameInterface>(Arc::new("core".to_string()))
            .unwrap();
        assert_eq!(registry.get_component::<NameInterface>().unwrap().as_str(), "core");
    }

    #[test]
    fn test_type_mismatch_reported() {
        let mut registry = ComponentRegistryImpl::new();
        // 用错误的实例类型占用 PortInterface 的标识
        registry
            .register_service_component(
                PortInterface::id(),
                ComponentHandle::new::<NameInterface>(Arc::new("oops".to_string())),
            )
            .unwrap();

        let err = registry.get_component::<PortInterface>().unwrap_err();
        assert!(matches!(err, RegistryError::ComponentTypeMismatch { .. }));
    }

    #[test]
    fn test_reset_with_empty_map_clears_everything() {
        let mut registry = ComponentRegistryImpl::new();
        registry
            .register_component::<PortInterface>(Arc::new(1))
            .unwrap();
        registry
            .register_component::<NameInterface>(Arc::new("x".to_string()))
            .unwrap();

        registry.reset_provided_components(HashMap::new()).unwrap();

        assert!(registry.is_empty());
        assert!(registry.get_component::<PortInterface>().unwrap_err().is_not_found());
        assert!(registry.get_component::<NameInterface>().unwrap_err().is_not_found());
    }

    #[test]
    fn test_reset_overwrites_instead_of_merging() {
        let mut registry = ComponentRegistryImpl::new();
        registry
            .register_component::<PortInterface>(Arc::new(1))
            .unwrap();

        let mut replacement = HashMap::new();
        replacement.insert(
            NameInterface::id(),
            ComponentSlot::Provided(ComponentHandle::new::<NameInterface>(Arc::new(
                "fresh".to_string(),
            ))),
        );
        registry.reset_provided_components(replacement).unwrap();

        assert_eq!(registry.component_ids(), vec![NameInterface::id()]);
        assert!(!registry.is_provided(&PortInterface::id()));
    }
}
