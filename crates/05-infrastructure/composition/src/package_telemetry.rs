//! 按包创建的诊断与指标
//!
//! 核心包注册诊断工厂和指标工厂，其他包用自己的名称创建各自的出口，
//! 发出的每条记录都带有公共标签和包名标签。

use crate::core_components::{CloudProjectId, Environments};
use crate::core_package::ProjectConfiguration;
use crate::metrics::PACKAGE_NAME_TAG;
use registry_abstractions::{Diagnostics, Metrics};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 关闭遥测的项目配置键
pub const TELEMETRY_DISABLED_KEY: &str = "services.telemetry-disabled";
/// 云项目标识标签
pub const CLOUD_PROJECT_ID_TAG: &str = "cloud_project_id";
/// 环境名称标签
pub const ENVIRONMENT_NAME_TAG: &str = "environment_name";

/// 由云项目标识和当前环境计算公共标签
pub fn common_tags(
    cloud_project_id: &CloudProjectId,
    environments: &Environments,
) -> HashMap<String, String> {
    let mut tags = HashMap::new();
    tags.insert(
        ENVIRONMENT_NAME_TAG.to_string(),
        environments.current().to_string(),
    );
    if let Some(id) = cloud_project_id.get() {
        tags.insert(CLOUD_PROJECT_ID_TAG.to_string(), id.to_string());
    }
    tags
}

/// 项目配置是否关闭了遥测
pub fn is_telemetry_disabled(configuration: &ProjectConfiguration) -> bool {
    let disabled = configuration.get_bool(TELEMETRY_DISABLED_KEY, false);
    if disabled {
        info!("项目配置关闭了遥测，包诊断与指标将被丢弃");
    }
    disabled
}

fn package_tags(common: &HashMap<String, String>, package_name: &str) -> HashMap<String, String> {
    let mut tags = common.clone();
    tags.insert(PACKAGE_NAME_TAG.to_string(), package_name.to_string());
    tags
}

fn with_extra(
    tags: &HashMap<String, String>,
    extra: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut merged = tags.clone();
    merged.extend(extra.iter().map(|(key, value)| (key.clone(), value.clone())));
    merged
}

/// 诊断工厂
#[derive(Clone)]
pub struct DiagnosticsFactory {
    sink: Option<Arc<dyn Diagnostics>>,
    common_tags: HashMap<String, String>,
}

impl DiagnosticsFactory {
    /// 创建工厂
    pub fn new(sink: Arc<dyn Diagnostics>, common_tags: HashMap<String, String>) -> Self {
        Self {
            sink: Some(sink),
            common_tags,
        }
    }

    /// 创建丢弃所有诊断的工厂
    pub fn disabled() -> Self {
        Self {
            sink: None,
            common_tags: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// 公共标签
    pub fn common_tags(&self) -> &HashMap<String, String> {
        &self.common_tags
    }

    /// 为指定包创建诊断出口
    pub fn create(&self, package_name: &str) -> PackageDiagnostics {
        PackageDiagnostics {
            sink: self.sink.clone(),
            tags: package_tags(&self.common_tags, package_name),
        }
    }
}

impl std::fmt::Debug for DiagnosticsFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticsFactory")
            .field("enabled", &self.is_enabled())
            .field("common_tags", &self.common_tags)
            .finish()
    }
}

/// 单个包的诊断出口
#[derive(Clone)]
pub struct PackageDiagnostics {
    sink: Option<Arc<dyn Diagnostics>>,
    tags: HashMap<String, String>,
}

impl PackageDiagnostics {
    /// 发送诊断，`extra` 中的同名标签覆盖公共标签
    pub fn send_diagnostic(&self, name: &str, message: &str, extra: &HashMap<String, String>) {
        let Some(sink) = &self.sink else {
            return;
        };
        sink.send_diagnostic(name, message, &with_extra(&self.tags, extra));
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }
}

/// 指标工厂
#[derive(Clone)]
pub struct MetricsFactory {
    sink: Option<Arc<dyn Metrics>>,
    common_tags: HashMap<String, String>,
}

impl MetricsFactory {
    /// 创建工厂
    pub fn new(sink: Arc<dyn Metrics>, common_tags: HashMap<String, String>) -> Self {
        Self {
            sink: Some(sink),
            common_tags,
        }
    }

    /// 创建丢弃所有指标的工厂
    pub fn disabled() -> Self {
        Self {
            sink: None,
            common_tags: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// 为指定包创建指标出口
    pub fn create(&self, package_name: &str) -> PackageMetrics {
        PackageMetrics {
            sink: self.sink.clone(),
            tags: package_tags(&self.common_tags, package_name),
        }
    }
}

impl std::fmt::Debug for MetricsFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsFactory")
            .field("enabled", &self.is_enabled())
            .field("common_tags", &self.common_tags)
            .finish()
    }
}

/// 单个包的指标出口
#[derive(Clone)]
pub struct PackageMetrics {
    sink: Option<Arc<dyn Metrics>>,
    tags: HashMap<String, String>,
}

impl PackageMetrics {
    /// 发送累加指标
    pub fn send_sum(&self, name: &str, value: f64, extra: &HashMap<String, String>) {
        if let Some(sink) = &self.sink {
            sink.send_sum_metric(name, value, &with_extra(&self.tags, extra));
        }
    }

    /// 发送直方图指标
    pub fn send_histogram(&self, name: &str, value: f64, extra: &HashMap<String, String>) {
        if let Some(sink) = &self.sink {
            sink.send_histogram_metric(name, value, &with_extra(&self.tags, extra));
        }
    }

    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }
}
