//! 包初始化器
//!
//! 按排序结果依次初始化包，记录每个包的耗时，并收集所有失败。

use crate::core_registry::CoreRegistry;
use registry_abstractions::DependencyTree;
use services_common::{
    InitializationOptions, InitializationResult, PackageError, PackageFailure, PackageId,
    PackageInitializationInfo,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 初始化报告
#[derive(Debug, Default)]
pub struct InitializationReport {
    /// 成功初始化的包，按初始化顺序排列
    pub infos: Vec<PackageInitializationInfo>,
    /// 失败或被跳过的包
    pub failures: Vec<PackageFailure>,
}

impl InitializationReport {
    /// 是否全部成功
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// 成功初始化的包标识
    pub fn initialized_packages(&self) -> Vec<&PackageId> {
        self.infos.iter().map(|info| &info.package).collect()
    }

    /// 所有成功包的耗时总和
    pub fn total_elapsed(&self) -> Duration {
        self.infos.iter().map(|info| info.elapsed).sum()
    }
}

/// 核心注册表初始化器
///
/// 一个包失败不会中断后续包；依赖它提供的组件的包会因为必需依赖缺失而被跳过。
pub struct CoreRegistryInitializer<'a> {
    registry: &'a mut CoreRegistry,
    tree: DependencyTree,
    order: Vec<PackageId>,
}

impl<'a> CoreRegistryInitializer<'a> {
    /// 创建初始化器
    pub fn new(registry: &'a mut CoreRegistry, tree: DependencyTree, order: Vec<PackageId>) -> Self {
        Self {
            registry,
            tree,
            order,
        }
    }

    /// 按顺序初始化所有包
    ///
    /// 开始前用依赖树中的组件槽位重置组件注册表，之前直接注册的组件会被丢弃。
    pub async fn initialize(
        self,
        options: &InitializationOptions,
    ) -> InitializationResult<InitializationReport> {
        let Self {
            registry,
            tree,
            order,
        } = self;

        registry
            .component_registry_mut()
            .reset_provided_components(tree.component_slots().clone())?;

        let mut report = InitializationReport::default();
        info!("开始初始化 {} 个包", order.len());

        for package_id in &order {
            let Some(package) = tree.package(package_id) else {
                warn!("初始化顺序中的包不在依赖树中: {}", package_id);
                continue;
            };

            if let Some(error) = Self::check_required_dependencies(registry, &tree, package_id) {
                warn!("跳过包 {}: {}", package_id, error);
                report.failures.push(PackageFailure {
                    package: package_id.clone(),
                    error,
                });
                continue;
            }

            debug!("初始化包: {}", package_id);
            let started_at = chrono::Utc::now();
            let start = Instant::now();
            let result = package
                .initialize(registry.component_registry_mut(), options)
                .await;
            let elapsed = start.elapsed();

            match result {
                Ok(()) => {
                    Self::warn_unprovided_components(registry, &tree, package_id);
                    info!("包 {} 初始化完成，耗时 {:?}", package_id, elapsed);
                    report.infos.push(PackageInitializationInfo {
                        package: package_id.clone(),
                        started_at,
                        elapsed,
                    });
                }
                Err(error) => {
                    error!("包 {} 初始化失败: {}", package_id, error);
                    report.failures.push(PackageFailure {
                        package: package_id.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            "包初始化结束: 成功 {} 个，失败 {} 个",
            report.infos.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn check_required_dependencies(
        registry: &CoreRegistry,
        tree: &DependencyTree,
        package: &PackageId,
    ) -> Option<PackageError> {
        let components = registry.component_registry();
        tree.dependencies_of(package)?
            .iter()
            .filter(|dep| !dep.is_optional())
            .find(|dep| !components.is_provided(&dep.component))
            .map(|dep| PackageError::MissingRequiredDependency {
                package: package.clone(),
                interface: dep.component.clone(),
            })
    }

    fn warn_unprovided_components(
        registry: &CoreRegistry,
        tree: &DependencyTree,
        package: &PackageId,
    ) {
        let components = registry.component_registry();
        for component in tree.component_slots().keys() {
            if tree.provider_of(component) == Some(package) && !components.is_provided(component)
            {
                warn!("包 {} 声明提供 {}，但初始化后仍未注册", package, component);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DependencyTreeSorter;
    use async_trait::async_trait;
    use registry_abstractions::{
        ComponentRegistry, ComponentRegistryExt, InitializablePackage, PackageDeclaration,
    };
    use services_common::{ComponentInterface, PackageResult, RegistryError};
    use std::sync::{Arc, Mutex};

    struct ConfigInterface;

    impl ComponentInterface for ConfigInterface {
        const ID: &'static str = "test.config";
        type Instance = String;
    }

    struct GreeterInterface;

    impl ComponentInterface for GreeterInterface {
        const ID: &'static str = "test.greeter";
        type Instance = String;
    }

    /// 记录初始化顺序的包
    struct ConfigPackage {
        log: Arc<Mutex<Vec<&'static str>>>,
        fail: bool,
    }

    #[async_trait]
    impl InitializablePackage for ConfigPackage {
        fn id(&self) -> PackageId {
            PackageId::from_static("config")
        }

        async fn initialize(
            &self,
            registry: &mut dyn ComponentRegistry,
            options: &InitializationOptions,
        ) -> PackageResult<()> {
            self.log.lock().unwrap().push("config");
            if self.fail {
                return Err(PackageError::failed(self.id(), "配置源不可用"));
            }
            let environment = options
                .environment_name()
                .unwrap_or_else(|| "production".to_string());
            registry.register_component::<ConfigInterface>(Arc::new(environment))?;
            Ok(())
        }
    }

    struct GreeterPackage {
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl InitializablePackage for GreeterPackage {
        fn id(&self) -> PackageId {
            PackageId::from_static("greeter")
        }

        async fn initialize(
            &self,
            registry: &mut dyn ComponentRegistry,
            _options: &InitializationOptions,
        ) -> PackageResult<()> {
            self.log.lock().unwrap().push("greeter");
            let environment = registry.get_component::<ConfigInterface>()?;
            registry
                .register_component::<GreeterInterface>(Arc::new(format!("hello {}", environment)))?;
            Ok(())
        }
    }

    fn registry_with(fail_config: bool) -> (CoreRegistry, Arc<Mutex<Vec<&'static str>>>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CoreRegistry::new();
        registry
            .register_declaration(
                PackageDeclaration::new(Arc::new(GreeterPackage { log: log.clone() }))
                    .requires::<ConfigInterface>()
                    .provides::<GreeterInterface>(),
            )
            .unwrap();
        registry
            .register_declaration(
                PackageDeclaration::new(Arc::new(ConfigPackage {
                    log: log.clone(),
                    fail: fail_config,
                }))
                .provides::<ConfigInterface>(),
            )
            .unwrap();
        (registry, log)
    }

    #[tokio::test]
    async fn test_packages_initialized_in_dependency_order() {
        let (mut registry, log) = registry_with(false);
        let mut tree = registry.package_registry_mut().take_tree().unwrap();
        let order = DependencyTreeSorter::sort(&mut tree).unwrap();

        let options = InitializationOptions::new().set_environment_name("staging");
        let report = CoreRegistryInitializer::new(&mut registry, tree, order)
            .initialize(&options)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(*log.lock().unwrap(), vec!["config", "greeter"]);
        assert_eq!(
            report.initialized_packages(),
            vec![
                &PackageId::from_static("config"),
                &PackageId::from_static("greeter")
            ]
        );
        assert_eq!(
            report.total_elapsed(),
            report.infos.iter().map(|info| info.elapsed).sum::<Duration>()
        );
        assert_eq!(
            registry
                .get_service_component::<GreeterInterface>()
                .unwrap()
                .as_str(),
            "hello staging"
        );
    }

    #[tokio::test]
    async fn test_failure_skips_dependents_and_is_aggregated() {
        let (mut registry, log) = registry_with(true);
        let mut tree = registry.package_registry_mut().take_tree().unwrap();
        let order = DependencyTreeSorter::sort(&mut tree).unwrap();

        let report = CoreRegistryInitializer::new(&mut registry, tree, order)
            .initialize(&InitializationOptions::new())
            .await
            .unwrap();

        assert!(!report.is_success());
        // greeter 没有被调用
        assert_eq!(*log.lock().unwrap(), vec!["config"]);
        assert_eq!(report.failures.len(), 2);
        assert!(report.initialized_packages().is_empty());
        assert_eq!(report.total_elapsed(), Duration::ZERO);
        assert!(matches!(
            report.failures[1].error,
            PackageError::MissingRequiredDependency { .. }
        ));
        assert_eq!(
            registry.get_service_component::<GreeterInterface>().unwrap_err(),
            RegistryError::ComponentMissing {
                interface: GreeterInterface::id()
            }
        );
    }

    #[test]
    fn test_reset_discards_previously_registered_components() {
        struct StrayInterface;

        impl ComponentInterface for StrayInterface {
            const ID: &'static str = "test.stray";
            type Instance = u8;
        }

        let (mut registry, _log) = registry_with(false);
        registry
            .register_service_component::<StrayInterface>(Arc::new(1))
            .unwrap();

        let mut tree = registry.package_registry_mut().take_tree().unwrap();
        let order = DependencyTreeSorter::sort(&mut tree).unwrap();
        let options = InitializationOptions::new();
        tokio_test::block_on(
            CoreRegistryInitializer::new(&mut registry, tree, order).initialize(&options),
        )
        .unwrap();

        assert_eq!(
            registry.get_service_component::<StrayInterface>().unwrap_err(),
            RegistryError::ComponentNotDeclared {
                interface: StrayInterface::id()
            }
        );
    }
}
