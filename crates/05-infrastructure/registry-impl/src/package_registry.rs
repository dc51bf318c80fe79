//! 包注册表实现

use registry_abstractions::{DependencyKind, DependencyTree, InitializablePackage, PackageRegistry};
use services_common::{ComponentInterfaceId, PackageId, RegistryError, RegistryResult};
use std::sync::Arc;
use tracing::info;

/// 包注册表实现
///
/// 依赖树被启动流程取走后，所有注册操作返回 [`RegistryError::TreeUnavailable`]。
#[derive(Debug)]
pub struct PackageRegistryImpl {
    tree: Option<DependencyTree>,
}

impl PackageRegistryImpl {
    /// 创建带空依赖树的包注册表
    pub fn new() -> Self {
        Self::with_tree(DependencyTree::new())
    }

    /// 使用给定依赖树创建包注册表
    pub fn with_tree(tree: DependencyTree) -> Self {
        Self { tree: Some(tree) }
    }

    fn tree_mut(&mut self) -> RegistryResult<&mut DependencyTree> {
        self.tree.as_mut().ok_or(RegistryError::TreeUnavailable)
    }
}

impl Default for PackageRegistryImpl {
    fn default() -> Self {
        Self::new()
    }
}

impl PackageRegistry for PackageRegistryImpl {
    fn register_package(
        &mut self,
        package: Arc<dyn InitializablePackage>,
    ) -> RegistryResult<PackageId> {
        let id = self.tree_mut()?.add_package(package)?;
        info!("注册包: {}", id);
        Ok(id)
    }

    fn register_dependency(
        &mut self,
        package: &PackageId,
        component: ComponentInterfaceId,
    ) -> RegistryResult<()> {
        self.tree_mut()?
            .add_dependency(package, component, DependencyKind::Required)
    }

    fn register_optional_dependency(
        &mut self,
        package: &PackageId,
        component: ComponentInterfaceId,
    ) -> RegistryResult<()> {
        self.tree_mut()?
            .add_dependency(package, component, DependencyKind::Optional)
    }

    fn register_provision(
        &mut self,
        package: &PackageId,
        component: ComponentInterfaceId,
    ) -> RegistryResult<()> {
        self.tree_mut()?.add_provision(package, component)
    }

    fn tree(&self) -> Option<&DependencyTree> {
        self.tree.as_ref()
    }

    fn take_tree(&mut self) -> RegistryResult<DependencyTree> {
        self.tree.take().ok_or(RegistryError::TreeUnavailable)
    }
}
