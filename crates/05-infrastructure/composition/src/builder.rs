//! 服务运行时构建器

use crate::config::ServicesConfig;
use crate::core_package::{CorePackage, ProjectConfiguration};
use crate::diagnostics::{CoreDiagnostics, TracingDiagnostics};
use crate::logging::{init_logging, LoggingConfig};
use crate::metrics::{CoreMetrics, TracingMetrics};
use crate::runtime::ServicesRuntime;
use crate::scheduler::TimeProvider;
use crate::threading::main_thread_channel;
use registry_abstractions::{Diagnostics, Metrics, PackageDeclaration};
use registry_impl::CoreRegistry;
use services_common::ServicesResult;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// 服务运行时构建器
///
/// 使用建造者模式组装配置、日志、诊断出口和初始包集合。
pub struct ServicesBuilder {
    /// 服务配置
    config: ServicesConfig,
    /// 初始注册的包
    packages: Vec<PackageDeclaration>,
    /// 诊断出口
    diagnostics: Arc<dyn Diagnostics>,
    /// 指标出口
    metrics: Arc<dyn Metrics>,
    /// 调度器时间来源
    time_provider: Option<Arc<dyn TimeProvider>>,
    /// 是否注册核心包
    core_package_enabled: bool,
    /// 日志配置，为 `None` 时不初始化日志
    logging_config: Option<LoggingConfig>,
}

impl ServicesBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: ServicesConfig::default(),
            packages: Vec::new(),
            diagnostics: Arc::new(TracingDiagnostics),
            metrics: Arc::new(TracingMetrics),
            time_provider: None,
            core_package_enabled: true,
            logging_config: None, // 默认不初始化日志，避免测试中重复初始化
        }
    }

    /// 使用已加载的配置
    pub fn with_config(mut self, config: ServicesConfig) -> Self {
        self.config = config;
        self
    }

    /// 从文件加载配置，按扩展名选择 TOML 或 JSON
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> ServicesResult<Self> {
        let path = path.as_ref();
        info!("加载配置文件: {}", path.display());
        self.config = ServicesConfig::from_file(path)?;
        Ok(self)
    }

    /// 应用环境变量覆盖
    pub fn with_env_overrides(mut self, prefix: &str) -> ServicesResult<Self> {
        debug!("应用环境变量覆盖，前缀: {}", prefix);
        self.config = self.config.apply_env_overrides(prefix)?;
        Ok(self)
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = Some(config);
        self
    }

    /// 按配置文件中的日志设置初始化日志
    pub fn with_configured_logging(mut self) -> ServicesResult<Self> {
        self.logging_config = Some(self.config.logging_config()?);
        Ok(self)
    }

    /// 设置诊断出口
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// 设置指标出口
    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// 设置调度器时间来源
    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = Some(time_provider);
        self
    }

    /// 不注册核心包
    pub fn without_core_package(mut self) -> Self {
        self.core_package_enabled = false;
        self
    }

    /// 添加包声明
    pub fn add_package(mut self, declaration: PackageDeclaration) -> Self {
        debug!("添加包: {}", declaration.package.id());
        self.packages.push(declaration);
        self
    }

    /// 构建服务运行时
    ///
    /// 调用线程成为主线程派发器的目标线程。
    pub fn build(self) -> ServicesResult<ServicesRuntime> {
        if let Some(logging) = &self.logging_config {
            init_logging(logging)?;
        }

        info!("开始构建服务运行时");
        let mut registry = CoreRegistry::new();
        let (dispatcher, pump) = main_thread_channel();

        if self.core_package_enabled {
            let mut core = CorePackage::new(self.config.project.clone(), dispatcher)
                .with_telemetry(self.diagnostics.clone(), self.metrics.clone());
            if let Some(time_provider) = self.time_provider {
                core = core.with_time_provider(time_provider);
            }
            registry.register_declaration(core.declaration())?;
        }

        for declaration in self.packages {
            registry.register_declaration(declaration)?;
        }

        // 核心包初始化成功后运行时会用合并后的配置替换该标签
        let mut diagnostics = CoreDiagnostics::new(self.diagnostics);
        diagnostics
            .set_project_config(&ProjectConfiguration::new(self.config.project.clone()).to_json());

        let runtime = ServicesRuntime::new(registry, diagnostics, CoreMetrics::new(self.metrics))
            .with_options(self.config.initialization_options())
            .with_main_thread_pump(pump);

        info!("服务运行时构建完成");
        Ok(runtime)
    }
}

impl Default for ServicesBuilder {
    fn default() -> Self {
        Self::new()
    }
}
