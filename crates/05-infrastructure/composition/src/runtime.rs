//! 服务运行时
//!
//! 持有核心注册表、初始化状态机以及诊断和指标出口。

use crate::core_package::{ProjectConfigurationInterface, CORE_PACKAGE_ID};
use crate::diagnostics::CoreDiagnostics;
use crate::metrics::CoreMetrics;
use crate::threading::MainThreadPump;
use registry_abstractions::PackageDeclaration;
use registry_impl::{CoreRegistry, CoreRegistryInitializer, DependencyTreeSorter};
use serde_json::Value;
use services_common::{
    ComponentInterface, DependencyTreeError, InitializationError, InitializationOptions,
    InitializationResult, InitializationState, PackageId, PackageInitializationInfo,
    RegistryResult,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// 服务运行时
pub struct ServicesRuntime {
    registry: CoreRegistry,
    state: InitializationState,
    options: InitializationOptions,
    diagnostics: CoreDiagnostics,
    metrics: CoreMetrics,
    dependency_tree: Option<Value>,
    package_infos: Vec<PackageInitializationInfo>,
    main_thread_pump: Option<MainThreadPump>,
}

impl ServicesRuntime {
    /// 创建服务运行时
    pub fn new(registry: CoreRegistry, diagnostics: CoreDiagnostics, metrics: CoreMetrics) -> Self {
        Self {
            registry,
            state: InitializationState::Uninitialized,
            options: InitializationOptions::new(),
            diagnostics,
            metrics,
            dependency_tree: None,
            package_infos: Vec::new(),
            main_thread_pump: None,
        }
    }

    /// 设置基础初始化选项
    pub fn with_options(mut self, options: InitializationOptions) -> Self {
        self.options = options;
        self
    }

    /// 设置主线程泵
    pub fn with_main_thread_pump(mut self, pump: MainThreadPump) -> Self {
        self.main_thread_pump = Some(pump);
        self
    }

    /// 当前初始化状态
    pub fn state(&self) -> InitializationState {
        self.state
    }

    /// 核心注册表
    pub fn registry(&self) -> &CoreRegistry {
        &self.registry
    }

    /// 可变核心注册表，初始化前用于注册包
    pub fn registry_mut(&mut self) -> &mut CoreRegistry {
        &mut self.registry
    }

    /// 注册包声明
    pub fn register_package(&mut self, declaration: PackageDeclaration) -> RegistryResult<PackageId> {
        self.registry.register_declaration(declaration)
    }

    /// 获取组件实例
    pub fn get_service_component<I>(&self) -> RegistryResult<Arc<I::Instance>>
    where
        I: ComponentInterface,
    {
        self.registry.get_service_component::<I>()
    }

    /// 最近一次初始化时的依赖树快照
    pub fn dependency_tree(&self) -> Option<&Value> {
        self.dependency_tree.as_ref()
    }

    /// 成功初始化的包及耗时
    pub fn package_infos(&self) -> &[PackageInitializationInfo] {
        &self.package_infos
    }

    /// 取出主线程泵，交给主线程驱动
    pub fn take_main_thread_pump(&mut self) -> Option<MainThreadPump> {
        self.main_thread_pump.take()
    }

    /// 诊断
    pub fn diagnostics(&self) -> &CoreDiagnostics {
        &self.diagnostics
    }

    /// 初始化所有已注册的包
    ///
    /// 已初始化时直接返回成功；失败后不能重试。无论成功与否，组件注册都会被锁定。
    /// 初始化过程中被取消时状态停留在 `Initializing`。
    pub async fn initialize(&mut self, options: &InitializationOptions) -> InitializationResult<()> {
        match self.state {
            InitializationState::Initialized => return Ok(()),
            InitializationState::Initializing => {
                return Err(InitializationError::AlreadyInitializing)
            }
            InitializationState::Failed => return Err(InitializationError::PreviouslyFailed),
            InitializationState::Uninitialized => {}
        }

        info!("开始初始化服务");
        self.state = InitializationState::Initializing;

        let options = self.options.clone().merge(options);
        let result = self.run_initialization(&options).await;

        self.registry.lock_component_registration();
        match &result {
            Ok(()) => {
                self.state = InitializationState::Initialized;
                info!("服务初始化完成");
            }
            Err(e) => {
                self.state = InitializationState::Failed;
                error!("服务初始化失败: {}", e);
            }
        }
        result
    }

    async fn run_initialization(&mut self, options: &InitializationOptions) -> InitializationResult<()> {
        self.registry.lock_package_registration();

        let mut tree = match self.registry.package_registry_mut().take_tree() {
            Ok(tree) => tree,
            Err(e) => {
                self.diagnostics.send_operate_services_init_diagnostics(&e);
                return Err(e.into());
            }
        };

        let order = match DependencyTreeSorter::sort(&mut tree) {
            Ok(order) => order,
            Err(e) => {
                let snapshot = tree.to_json(None);
                match &e {
                    DependencyTreeError::CircularDependency { .. } => self
                        .diagnostics
                        .send_circular_dependency_diagnostics(&e, &snapshot),
                    _ => self.diagnostics.send_operate_services_init_diagnostics(&e),
                }
                self.dependency_tree = Some(snapshot);
                return Err(e.into());
            }
        };
        self.dependency_tree = Some(tree.to_json(Some(&order)));

        let started = Instant::now();
        let report = CoreRegistryInitializer::new(&mut self.registry, tree, order)
            .initialize(options)
            .await?;
        let total = started.elapsed();
        info!(
            "已初始化的包: {:?}，各包耗时合计 {:?}",
            report.initialized_packages(),
            report.total_elapsed()
        );

        if let Ok(config) = self
            .registry
            .get_service_component::<ProjectConfigurationInterface>()
        {
            self.diagnostics.set_project_config(&config.to_json());
        }

        if let Some(failure) = report
            .failures
            .iter()
            .find(|failure| failure.package.as_str() == CORE_PACKAGE_ID)
        {
            self.diagnostics
                .send_core_package_init_diagnostics(&failure.error);
        }

        self.package_infos = report.infos;
        if !report.failures.is_empty() {
            let error = InitializationError::PackagesFailed {
                failures: report.failures,
            };
            self.diagnostics
                .send_operate_services_init_diagnostics(&error);
            return Err(error);
        }

        for info in &self.package_infos {
            self.metrics
                .send_package_init_time(&info.package, info.elapsed_seconds());
        }
        self.metrics.send_all_packages_init_success();
        self.metrics.send_all_packages_init_time(total.as_secs_f64());
        Ok(())
    }
}

impl std::fmt::Debug for ServicesRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServicesRuntime")
            .field("state", &self.state)
            .field("registry", &self.registry)
            .field("diagnostics", &self.diagnostics)
            .finish()
    }
}
