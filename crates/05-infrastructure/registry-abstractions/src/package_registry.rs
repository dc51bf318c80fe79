//! 包注册表抽象接口

use crate::package::{DependencyKind, InitializablePackage, PackageDeclaration};
use crate::tree::DependencyTree;
use services_common::{
    ComponentInterfaceId, PackageId, RegistryError, RegistryResult,
};
use std::sync::Arc;

/// 包注册表 trait
///
/// 在启动窗口内收集包、依赖与提供声明，并持有 [`DependencyTree`]。
pub trait PackageRegistry: Send + Sync {
    /// 注册包，返回包标识
    fn register_package(
        &mut self,
        package: Arc<dyn InitializablePackage>,
    ) -> RegistryResult<PackageId>;

    /// 注册必需依赖
    fn register_dependency(
        &mut self,
        package: &PackageId,
        component: ComponentInterfaceId,
    ) -> RegistryResult<()>;

    /// 注册可选依赖
    fn register_optional_dependency(
        &mut self,
        package: &PackageId,
        component: ComponentInterfaceId,
    ) -> RegistryResult<()>;

    /// 注册组件提供声明
    fn register_provision(
        &mut self,
        package: &PackageId,
        component: ComponentInterfaceId,
    ) -> RegistryResult<()>;

    /// 当前依赖树
    fn tree(&self) -> Option<&DependencyTree>;

    /// 取出依赖树，供启动流程排序与初始化
    fn take_tree(&mut self) -> RegistryResult<DependencyTree>;

    /// 是否已锁定
    fn is_locked(&self) -> bool {
        false
    }

    /// 原子地应用一份包声明
    ///
    /// 先完成全部校验，校验失败时注册表保持不变。
    fn register_declaration(
        &mut self,
        declaration: PackageDeclaration,
    ) -> RegistryResult<PackageId> {
        let tree = self.tree().ok_or(RegistryError::TreeUnavailable)?;
        let package = declaration.package.id();
        if tree.contains_package(&package) {
            return Err(RegistryError::DuplicatePackage { package });
        }

        let mut provisions: Vec<ComponentInterfaceId> = Vec::new();
        for component in &declaration.provisions {
            if let Some(existing) = tree.provider_of(component) {
                return Err(RegistryError::DuplicateProvider {
                    interface: component.clone(),
                    existing: existing.clone(),
                    package: package.clone(),
                });
            }
            if !provisions.contains(component) {
                provisions.push(component.clone());
            }
        }

        let id = self.register_package(declaration.package)?;
        for (component, kind) in declaration.dependencies {
            match kind {
                DependencyKind::Required => self.register_dependency(&id, component)?,
                DependencyKind::Optional => self.register_optional_dependency(&id, component)?,
            }
        }
        for component in provisions {
            self.register_provision(&id, component)?;
        }

        Ok(id)
    }
}
