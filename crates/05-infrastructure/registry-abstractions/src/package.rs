//! 可初始化包抽象接口

use crate::component_registry::ComponentRegistry;
use async_trait::async_trait;
use services_common::{
    ComponentInterface, ComponentInterfaceId, InitializationOptions, PackageId, PackageResult,
};
use std::fmt;
use std::sync::Arc;

/// 可初始化包 trait
///
/// 包在启动窗口内注册自身及其依赖，初始化时向注册表提供它声明的组件。
#[async_trait]
pub trait InitializablePackage: Send + Sync {
    /// 包标识
    fn id(&self) -> PackageId;

    /// 初始化包
    ///
    /// 必需依赖在调用前已经全部就绪，可以通过 `registry` 获取。
    async fn initialize(
        &self,
        registry: &mut dyn ComponentRegistry,
        options: &InitializationOptions,
    ) -> PackageResult<()>;
}

/// 依赖类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// 必需依赖，未满足时包不会初始化
    Required,
    /// 可选依赖，缺失时不阻塞初始化
    Optional,
}

/// 包声明
///
/// 一次性描述包及其全部依赖和提供的组件，由注册表原子地应用。
#[derive(Clone)]
pub struct PackageDeclaration {
    /// 包实例
    pub package: Arc<dyn InitializablePackage>,
    /// 依赖列表
    pub dependencies: Vec<(ComponentInterfaceId, DependencyKind)>,
    /// 提供的组件
    pub provisions: Vec<ComponentInterfaceId>,
}

impl PackageDeclaration {
    /// 创建新的包声明
    pub fn new(package: Arc<dyn InitializablePackage>) -> Self {
        Self {
            package,
            dependencies: Vec::new(),
            provisions: Vec::new(),
        }
    }

    /// 添加必需依赖
    pub fn requires<I: ComponentInterface>(mut self) -> Self {
        self.dependencies.push((I::id(), DependencyKind::Required));
        self
    }

    /// 添加可选依赖
    pub fn optionally_requires<I: ComponentInterface>(mut self) -> Self {
        self.dependencies.push((I::id(), DependencyKind::Optional));
        self
    }

    /// 添加提供的组件
    pub fn provides<I: ComponentInterface>(mut self) -> Self {
        self.provisions.push(I::id());
        self
    }
}

impl fmt::Debug for PackageDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageDeclaration")
            .field("package", &self.package.id())
            .field("dependencies", &self.dependencies)
            .field("provisions", &self.provisions)
            .finish()
    }
}
