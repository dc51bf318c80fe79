//! # 服务组合层
//!
//! 把注册表、核心包、诊断与指标、配置和日志组合成一个可运行的服务运行时。
//!
//! ## 主要功能
//!
//! - **运行时构建器**: 使用构建者模式组装配置、日志和初始包集合
//! - **初始化状态机**: 锁定包注册、排序、按顺序初始化、锁定组件注册
//! - **核心包**: 提供项目配置、环境与身份标识、遥测工厂、延迟动作调度器和主线程派发器
//! - **诊断与指标**: 循环依赖、初始化失败和初始化耗时
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use services_common::InitializationOptions;
//! use services_composition::{ProjectConfigurationInterface, ServicesBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = ServicesBuilder::new()
//!         .with_config_file("services.toml")?
//!         .with_env_overrides("SERVICES")?
//!         .build()?;
//!
//!     runtime.initialize(&InitializationOptions::new()).await?;
//!
//!     let config = runtime.get_service_component::<ProjectConfigurationInterface>()?;
//!     println!("应用名称: {}", config.get_string("app.name", "unknown"));
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod core_components;
pub mod core_package;
pub mod diagnostics;
pub mod logging;
pub mod metrics;
pub mod package_telemetry;
pub mod runtime;
pub mod scheduler;
pub mod threading;


// 重新导出主要类型
pub use builder::ServicesBuilder;
pub use config::{LoggingSettings, ServicesConfig};
pub use core_components::{
    CloudProjectId, Environments, ExternalUserId, InstallationId, DEFAULT_ENVIRONMENT_NAME,
};
pub use core_package::{
    ActionSchedulerInterface, CloudProjectIdInterface, CorePackage, DiagnosticsFactoryInterface,
    EnvironmentsInterface, ExternalUserIdInterface, InstallationIdInterface,
    MetricsFactoryInterface, ProjectConfiguration, ProjectConfigurationInterface,
    ThreadUtilsInterface, CORE_PACKAGE_ID,
};
pub use diagnostics::{
    CoreDiagnostics, DiagnosticRecord, InMemoryDiagnostics, TracingDiagnostics,
    CIRCULAR_DEPENDENCY_DIAGNOSTIC, CORE_PACKAGE_INIT_DIAGNOSTIC, OPERATE_SERVICES_INIT_DIAGNOSTIC,
};
pub use logging::{init_logging, LoggingConfig};
pub use metrics::{
    CoreMetrics, InMemoryMetrics, MetricSample, TracingMetrics, ALL_PACKAGES_INIT_SUCCESS_METRIC,
    ALL_PACKAGES_INIT_TIME_METRIC, PACKAGE_INIT_TIME_METRIC,
};
pub use package_telemetry::{
    DiagnosticsFactory, MetricsFactory, PackageDiagnostics, PackageMetrics,
    TELEMETRY_DISABLED_KEY,
};
pub use runtime::ServicesRuntime;
pub use scheduler::{ActionScheduler, ManualTimeProvider, SystemTimeProvider, TimeProvider};
pub use threading::{main_thread_channel, MainThreadDispatcher, MainThreadPump};

// 重新导出错误类型
pub use services_common::ServicesError;
