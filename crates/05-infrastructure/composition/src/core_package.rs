//! 核心包
//!
//! 在其他包之前初始化，提供项目配置、环境、身份标识、遥测工厂、
//! 延迟动作调度器和主线程派发器。所有组件都创建成功后才统一注册。

use crate::core_components::{CloudProjectId, Environments, ExternalUserId, InstallationId};
use crate::diagnostics::TracingDiagnostics;
use crate::metrics::TracingMetrics;
use crate::package_telemetry::{
    common_tags, is_telemetry_disabled, DiagnosticsFactory, MetricsFactory,
};
use crate::scheduler::{ActionScheduler, SystemTimeProvider, TimeProvider};
use crate::threading::MainThreadDispatcher;
use async_trait::async_trait;
use registry_abstractions::{
    ComponentRegistry, ComponentRegistryExt, Diagnostics, InitializablePackage, Metrics,
    PackageDeclaration,
};
use serde_json::{Map, Value};
use services_common::{
    ComponentInterface, InitializationOptions, PackageError, PackageId, PackageResult,
    ENVIRONMENT_NAME_KEY,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 核心包标识
pub const CORE_PACKAGE_ID: &str = "com.services.core";

/// 项目配置组件接口
pub struct ProjectConfigurationInterface;

impl ComponentInterface for ProjectConfigurationInterface {
    const ID: &'static str = "services.core.project-configuration";
    type Instance = ProjectConfiguration;
}

/// 延迟动作调度器组件接口
pub struct ActionSchedulerInterface;

impl ComponentInterface for ActionSchedulerInterface {
    const ID: &'static str = "services.core.action-scheduler";
    type Instance = ActionScheduler;
}

/// 主线程派发组件接口
pub struct ThreadUtilsInterface;

impl ComponentInterface for ThreadUtilsInterface {
    const ID: &'static str = "services.core.thread-utils";
    type Instance = MainThreadDispatcher;
}

/// 环境组件接口
pub struct EnvironmentsInterface;

impl ComponentInterface for EnvironmentsInterface {
    const ID: &'static str = "services.core.environments";
    type Instance = Environments;
}

/// 安装标识组件接口
pub struct InstallationIdInterface;

impl ComponentInterface for InstallationIdInterface {
    const ID: &'static str = "services.core.installation-id";
    type Instance = InstallationId;
}

/// 云项目标识组件接口
pub struct CloudProjectIdInterface;

impl ComponentInterface for CloudProjectIdInterface {
    const ID: &'static str = "services.core.cloud-project-id";
    type Instance = CloudProjectId;
}

/// 外部用户标识组件接口
pub struct ExternalUserIdInterface;

impl ComponentInterface for ExternalUserIdInterface {
    const ID: &'static str = "services.core.external-user-id";
    type Instance = ExternalUserId;
}

/// 诊断工厂组件接口
pub struct DiagnosticsFactoryInterface;

impl ComponentInterface for DiagnosticsFactoryInterface {
    const ID: &'static str = "services.core.diagnostics-factory";
    type Instance = DiagnosticsFactory;
}

/// 指标工厂组件接口
pub struct MetricsFactoryInterface;

impl ComponentInterface for MetricsFactoryInterface {
    const ID: &'static str = "services.core.metrics-factory";
    type Instance = MetricsFactory;
}

/// 项目配置
///
/// 只读键值视图，值类型不符时返回调用方给出的默认值。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfiguration {
    values: HashMap<String, Value>,
}

impl ProjectConfiguration {
    /// 创建项目配置
    pub fn new(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    /// 获取字符串
    pub fn get_string(&self, key: &str, default: &str) -> String {
        match self.values.get(key) {
            Some(Value::String(value)) => value.clone(),
            Some(Value::Null) | None => default.to_string(),
            Some(other) => other.to_string(),
        }
    }

    /// 获取布尔值
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(Value::Bool(value)) => *value,
            Some(Value::String(value)) => value.parse().unwrap_or(default),
            _ => default,
        }
    }

    /// 获取整数
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(Value::Number(value)) => value.as_i64().unwrap_or(default),
            Some(Value::String(value)) => value.parse().unwrap_or(default),
            _ => default,
        }
    }

    /// 获取浮点数
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(Value::Number(value)) => value.as_f64().unwrap_or(default),
            Some(Value::String(value)) => value.parse().unwrap_or(default),
            _ => default,
        }
    }

    /// 是否包含键
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// 导出为 JSON 对象，键按字典序排列
    pub fn to_json(&self) -> Value {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        let mut map = Map::new();
        for key in keys {
            map.insert(key.clone(), self.values[key].clone());
        }
        Value::Object(map)
    }
}

/// 核心包
pub struct CorePackage {
    project: HashMap<String, Value>,
    dispatcher: MainThreadDispatcher,
    time_provider: Arc<dyn TimeProvider>,
    installation_id: InstallationId,
    diagnostics_sink: Arc<dyn Diagnostics>,
    metrics_sink: Arc<dyn Metrics>,
}

impl CorePackage {
    /// 创建核心包
    pub fn new(project: HashMap<String, Value>, dispatcher: MainThreadDispatcher) -> Self {
        Self {
            project,
            dispatcher,
            time_provider: Arc::new(SystemTimeProvider),
            installation_id: InstallationId::generate(),
            diagnostics_sink: Arc::new(TracingDiagnostics),
            metrics_sink: Arc::new(TracingMetrics),
        }
    }

    /// 设置包诊断与包指标的出口
    pub fn with_telemetry(
        mut self,
        diagnostics: Arc<dyn Diagnostics>,
        metrics: Arc<dyn Metrics>,
    ) -> Self {
        self.diagnostics_sink = diagnostics;
        self.metrics_sink = metrics;
        self
    }

    /// 使用指定时间来源创建调度器
    pub fn with_time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    /// 核心包的完整声明
    pub fn declaration(self) -> PackageDeclaration {
        PackageDeclaration::new(Arc::new(self))
            .provides::<ProjectConfigurationInterface>()
            .provides::<ActionSchedulerInterface>()
            .provides::<ThreadUtilsInterface>()
            .provides::<EnvironmentsInterface>()
            .provides::<InstallationIdInterface>()
            .provides::<CloudProjectIdInterface>()
            .provides::<ExternalUserIdInterface>()
            .provides::<DiagnosticsFactoryInterface>()
            .provides::<MetricsFactoryInterface>()
    }

    /// 合并项目配置与初始化选项，选项中的同名键优先
    fn project_configuration(
        &self,
        options: &InitializationOptions,
    ) -> PackageResult<ProjectConfiguration> {
        if let Some(value) = options.get_raw(ENVIRONMENT_NAME_KEY) {
            if !value.is_string() {
                return Err(PackageError::failed(
                    self.id(),
                    format!("环境名称必须是字符串，实际为 {}", value),
                ));
            }
        }

        let mut values = self.project.clone();
        for (key, value) in options.values() {
            values.insert(key.clone(), value.clone());
        }
        Ok(ProjectConfiguration::new(values))
    }
}

#[async_trait]
impl InitializablePackage for CorePackage {
    fn id(&self) -> PackageId {
        PackageId::from_static(CORE_PACKAGE_ID)
    }

    async fn initialize(
        &self,
        registry: &mut dyn ComponentRegistry,
        options: &InitializationOptions,
    ) -> PackageResult<()> {
        let configuration = self.project_configuration(options)?;
        info!("项目配置包含 {} 个键", configuration.values.len());

        let environments = Environments::from_configuration(&configuration);
        let cloud_project_id = CloudProjectId::from_configuration(&configuration);
        let installation_id = InstallationId::resolve(&configuration, &self.installation_id);
        let external_user_id = ExternalUserId::from_configuration(&configuration);
        let scheduler = ActionScheduler::with_time_provider(self.time_provider.clone());

        let (diagnostics_factory, metrics_factory) = if is_telemetry_disabled(&configuration) {
            (DiagnosticsFactory::disabled(), MetricsFactory::disabled())
        } else {
            let tags = common_tags(&cloud_project_id, &environments);
            (
                DiagnosticsFactory::new(self.diagnostics_sink.clone(), tags.clone()),
                MetricsFactory::new(self.metrics_sink.clone(), tags),
            )
        };
        info!(
            "核心包环境 {}，安装标识 {}",
            environments.current(),
            installation_id.identifier()
        );

        registry.register_component::<ProjectConfigurationInterface>(Arc::new(configuration))?;
        registry.register_component::<ActionSchedulerInterface>(Arc::new(scheduler))?;
        registry
            .register_component::<ThreadUtilsInterface>(Arc::new(self.dispatcher.clone()))?;
        registry.register_component::<EnvironmentsInterface>(Arc::new(environments))?;
        registry.register_component::<InstallationIdInterface>(Arc::new(installation_id))?;
        registry.register_component::<CloudProjectIdInterface>(Arc::new(cloud_project_id))?;
        registry.register_component::<ExternalUserIdInterface>(Arc::new(external_user_id))?;
        registry
            .register_component::<DiagnosticsFactoryInterface>(Arc::new(diagnostics_factory))?;
        registry.register_component::<MetricsFactoryInterface>(Arc::new(metrics_factory))?;
        Ok(())
    }
}
