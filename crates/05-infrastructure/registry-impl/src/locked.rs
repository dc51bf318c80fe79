//! 锁定包装器
//!
//! 启动阶段结束后，注册表被包装为只读版本：查询照常委托，所有修改立即失败。

use registry_abstractions::{
    ComponentRegistry, DependencyTree, InitializablePackage, PackageDeclaration, PackageRegistry,
};
use services_common::{
    ComponentHandle, ComponentInterfaceId, ComponentSlot, PackageId, RegistryError,
    RegistryResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

fn locked<T>(operation: &'static str) -> RegistryResult<T> {
    warn!("注册表已锁定，拒绝操作: {}", operation);
    Err(RegistryError::RegistryLocked { operation })
}

/// 只读组件注册表
pub struct LockedComponentRegistry {
    inner: Box<dyn ComponentRegistry>,
}

impl LockedComponentRegistry {
    /// 包装一个组件注册表
    pub fn new(inner: Box<dyn ComponentRegistry>) -> Self {
        Self { inner }
    }
}

impl ComponentRegistry for LockedComponentRegistry {
    fn register_service_component(
        &mut self,
        _interface: ComponentInterfaceId,
        _handle: ComponentHandle,
    ) -> RegistryResult<()> {
        locked("register_service_component")
    }

    fn get_service_component(
        &self,
        interface: &ComponentInterfaceId,
    ) -> RegistryResult<ComponentHandle> {
        self.inner.get_service_component(interface)
    }

    fn reset_provided_components(
        &mut self,
        _components: HashMap<ComponentInterfaceId, ComponentSlot>,
    ) -> RegistryResult<()> {
        locked("reset_provided_components")
    }

    fn is_provided(&self, interface: &ComponentInterfaceId) -> bool {
        self.inner.is_provided(interface)
    }

    fn component_ids(&self) -> Vec<ComponentInterfaceId> {
        self.inner.component_ids()
    }

    fn is_locked(&self) -> bool {
        true
    }
}

/// 只读包注册表
///
/// 依赖树仍可被启动流程取走。
pub struct LockedPackageRegistry {
    inner: Box<dyn PackageRegistry>,
}

impl LockedPackageRegistry {
    /// 包装一个包注册表
    pub fn new(inner: Box<dyn PackageRegistry>) -> Self {
        Self { inner }
    }
}

impl PackageRegistry for LockedPackageRegistry {
    fn register_package(
        &mut self,
        _package: Arc<dyn InitializablePackage>,
    ) -> RegistryResult<PackageId> {
        locked("register_package")
    }

    fn register_dependency(
        &mut self,
        _package: &PackageId,
        _component: ComponentInterfaceId,
    ) -> RegistryResult<()> {
        locked("register_dependency")
    }

    fn register_optional_dependency(
        &mut self,
        _package: &PackageId,
        _component: ComponentInterfaceId,
    ) -> RegistryResult<()> {
        locked("register_optional_dependency")
    }

    fn register_provision(
        &mut self,
        _package: &PackageId,
        _component: ComponentInterfaceId,
    ) -> RegistryResult<()> {
        locked("register_provision")
    }

    fn register_declaration(
        &mut self,
        _declaration: PackageDeclaration,
    ) -> RegistryResult<PackageId> {
        locked("register_declaration")
    }

    fn tree(&self) -> Option<&DependencyTree> {
        self.inner.tree()
    }

    fn take_tree(&mut self) -> RegistryResult<DependencyTree> {
        self.inner.take_tree()
    }

    fn is_locked(&self) -> bool {
        true
    }
}
