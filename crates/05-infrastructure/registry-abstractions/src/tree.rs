//! 包与组件之间的依赖树

use crate::package::{DependencyKind, InitializablePackage};
use serde_json::{json, Value};
use services_common::{
    ComponentInterfaceId, ComponentSlot, PackageId, RegistryError, RegistryResult,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 包的一条依赖
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    /// 依赖的组件接口
    pub component: ComponentInterfaceId,
    /// 依赖类型
    pub kind: DependencyKind,
}

impl Dependency {
    /// 是否为可选依赖
    pub fn is_optional(&self) -> bool {
        self.kind == DependencyKind::Optional
    }
}

/// 依赖树
///
/// 记录包的注册顺序、包到依赖的映射、组件到提供者的映射以及组件槽位。
#[derive(Default)]
pub struct DependencyTree {
    /// 按注册顺序排列的包
    package_order: Vec<PackageId>,
    /// 包实例
    packages: HashMap<PackageId, Arc<dyn InitializablePackage>>,
    /// 包的依赖列表
    dependencies: HashMap<PackageId, Vec<Dependency>>,
    /// 组件的提供者
    providers: HashMap<ComponentInterfaceId, PackageId>,
    /// 组件槽位
    components: HashMap<ComponentInterfaceId, ComponentSlot>,
}

impl DependencyTree {
    /// 创建空的依赖树
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加包，返回包标识
    pub fn add_package(
        &mut self,
        package: Arc<dyn InitializablePackage>,
    ) -> RegistryResult<PackageId> {
        let id = package.id();
        if self.packages.contains_key(&id) {
            return Err(RegistryError::DuplicatePackage { package: id });
        }

        debug!("依赖树添加包: {}", id);
        self.package_order.push(id.clone());
        self.packages.insert(id.clone(), package);
        self.dependencies.insert(id.clone(), Vec::new());
        Ok(id)
    }

    /// 添加依赖
    ///
    /// 同一个包重复声明同一组件时只保留一条记录，必需依赖优先于可选依赖。
    pub fn add_dependency(
        &mut self,
        package: &PackageId,
        component: ComponentInterfaceId,
        kind: DependencyKind,
    ) -> RegistryResult<()> {
        let dependencies = self
            .dependencies
            .get_mut(package)
            .ok_or_else(|| RegistryError::PackageNotRegistered {
                package: package.clone(),
            })?;

        self.components
            .entry(component.clone())
            .or_insert_with(|| ComponentSlot::missing(component.clone()));

        match dependencies.iter_mut().find(|dep| dep.component == component) {
            Some(existing) => {
                if kind == DependencyKind::Required {
                    existing.kind = DependencyKind::Required;
                }
            }
            None => {
                debug!("包 {} 声明依赖 {} ({:?})", package, component, kind);
                dependencies.push(Dependency { component, kind });
            }
        }

        Ok(())
    }

    /// 记录包是组件的提供者
    pub fn add_provision(
        &mut self,
        package: &PackageId,
        component: ComponentInterfaceId,
    ) -> RegistryResult<()> {
        self.check_provision(package, &component)?;

        debug!("包 {} 提供组件 {}", package, component);
        self.components
            .entry(component.clone())
            .or_insert_with(|| ComponentSlot::missing(component.clone()));
        self.providers.insert(component, package.clone());
        Ok(())
    }

    /// 检查提供声明是否有效，不修改依赖树
    pub fn check_provision(
        &self,
        package: &PackageId,
        component: &ComponentInterfaceId,
    ) -> RegistryResult<()> {
        if !self.packages.contains_key(package) {
            return Err(RegistryError::PackageNotRegistered {
                package: package.clone(),
            });
        }

        match self.providers.get(component) {
            Some(existing) if existing != package => Err(RegistryError::DuplicateProvider {
                interface: component.clone(),
                existing: existing.clone(),
                package: package.clone(),
            }),
            _ => Ok(()),
        }
    }

    /// 是否包含包
    pub fn contains_package(&self, package: &PackageId) -> bool {
        self.packages.contains_key(package)
    }

    /// 获取包实例
    pub fn package(&self, package: &PackageId) -> Option<Arc<dyn InitializablePackage>> {
        self.packages.get(package).cloned()
    }

    /// 按注册顺序排列的包标识
    pub fn package_ids(&self) -> &[PackageId] {
        &self.package_order
    }

    /// 包的依赖列表
    pub fn dependencies_of(&self, package: &PackageId) -> Option<&[Dependency]> {
        self.dependencies.get(package).map(Vec::as_slice)
    }

    /// 组件的提供者
    pub fn provider_of(&self, component: &ComponentInterfaceId) -> Option<&PackageId> {
        self.providers.get(component)
    }

    /// 组件是否有提供者
    pub fn is_provided(&self, component: &ComponentInterfaceId) -> bool {
        self.providers.contains_key(component)
    }

    /// 所有组件槽位
    pub fn component_slots(&self) -> &HashMap<ComponentInterfaceId, ComponentSlot> {
        &self.components
    }

    /// 包数量
    pub fn package_count(&self) -> usize {
        self.package_order.len()
    }

    /// 移除没有提供者的可选依赖
    pub fn remove_unprovided_optional_dependencies(&mut self) {
        let providers = &self.providers;
        for (package, dependencies) in self.dependencies.iter_mut() {
            dependencies.retain(|dep| {
                let keep = !dep.is_optional() || providers.contains_key(&dep.component);
                if !keep {
                    debug!("包 {} 的可选依赖 {} 无人提供，已忽略", package, dep.component);
                }
                keep
            });
        }
    }

    /// 导出为 JSON，用于诊断
    pub fn to_json(&self, order: Option<&[PackageId]>) -> Value {
        let ordered: Vec<Value> = order
            .unwrap_or_default()
            .iter()
            .map(|package| self.package_json(package))
            .collect();

        let packages: Vec<Value> = self
            .package_order
            .iter()
            .map(|package| self.package_json(package))
            .collect();

        let mut component_ids: Vec<&ComponentInterfaceId> = self.components.keys().collect();
        component_ids.sort();
        let components: Vec<Value> = component_ids
            .into_iter()
            .map(|component| {
                json!({
                    "component": component.as_str(),
                    "slot": self.describe_slot(component),
                    "provider": self.providers.get(component).map(PackageId::as_str),
                })
            })
            .collect();

        json!({
            "ordered": ordered,
            "packages": packages,
            "components": components,
        })
    }

    fn package_json(&self, package: &PackageId) -> Value {
        let dependencies: Vec<Value> = self
            .dependencies
            .get(package)
            .map(|deps| {
                deps.iter()
                    .map(|dep| {
                        json!({
                            "component": dep.component.as_str(),
                            "slot": self.describe_slot(&dep.component),
                            "provided": self.is_provided(&dep.component),
                            "optional": dep.is_optional(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        json!({
            "package": package.as_str(),
            "registered": self.packages.contains_key(package),
            "dependencies": dependencies,
        })
    }

    fn describe_slot(&self, component: &ComponentInterfaceId) -> String {
        self.components
            .get(component)
            .map(ComponentSlot::describe)
            .unwrap_or_else(|| "null".to_string())
    }
}

impl fmt::Debug for DependencyTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyTree")
            .field("packages", &self.package_order)
            .field("dependencies", &self.dependencies)
            .field("providers", &self.providers)
            .field("components", &self.components.keys().collect::<Vec<_>>())
            .finish()
    }
}
