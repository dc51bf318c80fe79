//! 核心注册表
//!
//! 组合一个包注册表和一个组件注册表，提供类型化的注册与查询，以及单向的锁定迁移。

use crate::component_registry::ComponentRegistryImpl;
use crate::locked::{LockedComponentRegistry, LockedPackageRegistry};
use crate::package_registry::PackageRegistryImpl;
use registry_abstractions::{
    ComponentRegistry, ComponentRegistryExt, InitializablePackage, PackageDeclaration,
    PackageRegistry,
};
use services_common::{
    ComponentInterface, PackageId, RegistryResult, RegistryState,
};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// 核心注册表
///
/// 显式构造并以引用传递给启动流程和各个包的初始化器。
pub struct CoreRegistry {
    package_registry: Box<dyn PackageRegistry>,
    component_registry: Box<dyn ComponentRegistry>,
}

impl CoreRegistry {
    /// 创建新的核心注册表
    pub fn new() -> Self {
        Self::with_registries(
            Box::new(PackageRegistryImpl::new()),
            Box::new(ComponentRegistryImpl::new()),
        )
    }

    /// 使用指定的注册表实现创建核心注册表
    pub fn with_registries(
        package_registry: Box<dyn PackageRegistry>,
        component_registry: Box<dyn ComponentRegistry>,
    ) -> Self {
        Self {
            package_registry,
            component_registry,
        }
    }

    /// 注册包，返回可以继续声明依赖与提供组件的句柄
    pub fn register_package(
        &mut self,
        package: Arc<dyn InitializablePackage>,
    ) -> RegistryResult<CoreRegistration<'_>> {
        let id = self.package_registry.register_package(package)?;
        Ok(CoreRegistration {
            registry: self.package_registry.as_mut(),
            package: id,
        })
    }

    /// 原子地注册一份包声明
    pub fn register_declaration(
        &mut self,
        declaration: PackageDeclaration,
    ) -> RegistryResult<PackageId> {
        self.package_registry.register_declaration(declaration)
    }

    /// 注册组件实例
    pub fn register_service_component<I>(&mut self, instance: Arc<I::Instance>) -> RegistryResult<()>
    where
        I: ComponentInterface,
    {
        self.component_registry.register_component::<I>(instance)
    }

    /// 获取组件实例
    pub fn get_service_component<I>(&self) -> RegistryResult<Arc<I::Instance>>
    where
        I: ComponentInterface,
    {
        self.component_registry.get_component::<I>()
    }

    /// 包注册表
    pub fn package_registry(&self) -> &dyn PackageRegistry {
        self.package_registry.as_ref()
    }

    /// 可变包注册表
    pub fn package_registry_mut(&mut self) -> &mut dyn PackageRegistry {
        self.package_registry.as_mut()
    }

    /// 组件注册表
    pub fn component_registry(&self) -> &dyn ComponentRegistry {
        self.component_registry.as_ref()
    }

    /// 可变组件注册表
    pub fn component_registry_mut(&mut self) -> &mut dyn ComponentRegistry {
        self.component_registry.as_mut()
    }

    /// 锁定包注册，重复调用无副作用
    pub fn lock_package_registration(&mut self) {
        if self.package_registry.is_locked() {
            return;
        }

        let open = std::mem::replace(
            &mut self.package_registry,
            Box::new(PackageRegistryImpl::new()),
        );
        self.package_registry = Box::new(LockedPackageRegistry::new(open));
        info!("包注册已锁定");
    }

    /// 锁定组件注册，重复调用无副作用
    pub fn lock_component_registration(&mut self) {
        if self.component_registry.is_locked() {
            return;
        }

        let open = std::mem::replace(
            &mut self.component_registry,
            Box::new(ComponentRegistryImpl::new()),
        );
        self.component_registry = Box::new(LockedComponentRegistry::new(open));
        info!("组件注册已锁定");
    }

    /// 包注册状态
    pub fn package_state(&self) -> RegistryState {
        if self.package_registry.is_locked() {
            RegistryState::Locked
        } else {
            RegistryState::Open
        }
    }

    /// 组件注册状态
    pub fn component_state(&self) -> RegistryState {
        if self.component_registry.is_locked() {
            RegistryState::Locked
        } else {
            RegistryState::Open
        }
    }
}

impl Default for CoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreRegistry")
            .field("package_state", &self.package_state())
            .field("component_state", &self.component_state())
            .field("components", &self.component_registry.component_ids())
            .finish()
    }
}

/// 包注册句柄
///
/// 链式声明同一个包的依赖与提供的组件：
///
/// ```rust,ignore
/// registry
///     .register_package(Arc::new(AuthPackage))?
///     .depends_on::<ProjectConfigurationInterface>()?
///     .optionally_depends_on::<AnalyticsInterface>()?
///     .provides_component::<AuthInterface>()?;
/// ```
pub struct CoreRegistration<'a> {
    registry: &'a mut dyn PackageRegistry,
    package: PackageId,
}

impl<'a> CoreRegistration<'a> {
    /// 注册的包标识
    pub fn package(&self) -> &PackageId {
        &self.package
    }

    /// 声明必需依赖
    pub fn depends_on<I: ComponentInterface>(self) -> RegistryResult<Self> {
        self.registry.register_dependency(&self.package, I::id())?;
        Ok(self)
    }

    /// 声明可选依赖
    pub fn optionally_depends_on<I: ComponentInterface>(self) -> RegistryResult<Self> {
        self.registry
            .register_optional_dependency(&self.package, I::id())?;
        Ok(self)
    }

    /// 声明提供的组件
    pub fn provides_component<I: ComponentInterface>(self) -> RegistryResult<Self> {
        self.registry.register_provision(&self.package, I::id())?;
        Ok(self)
    }
}

impl fmt::Debug for CoreRegistration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreRegistration")
            .field("package", &self.package)
            .finish()
    }
}
