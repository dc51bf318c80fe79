//! 启动诊断

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use registry_abstractions::Diagnostics;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// 循环依赖诊断名称
pub const CIRCULAR_DEPENDENCY_DIAGNOSTIC: &str = "circular_dependency";
/// 核心包初始化诊断名称
pub const CORE_PACKAGE_INIT_DIAGNOSTIC: &str = "core_package_init";
/// 服务初始化诊断名称
pub const OPERATE_SERVICES_INIT_DIAGNOSTIC: &str = "operate_services_init";
/// 项目配置标签
pub const PROJECT_CONFIG_TAG: &str = "project_config";
/// 初始化标识标签
pub const INITIALIZATION_ID_TAG: &str = "initialization_id";

/// 核心诊断
///
/// 给每条诊断附加运行时级别的公共标签。
#[derive(Clone)]
pub struct CoreDiagnostics {
    sink: Arc<dyn Diagnostics>,
    tags: HashMap<String, String>,
}

impl CoreDiagnostics {
    /// 创建核心诊断，生成新的初始化标识
    pub fn new(sink: Arc<dyn Diagnostics>) -> Self {
        let mut tags = HashMap::new();
        tags.insert(INITIALIZATION_ID_TAG.to_string(), Uuid::new_v4().to_string());
        Self { sink, tags }
    }

    /// 设置项目配置标签
    pub fn set_project_config(&mut self, project_config: &Value) {
        self.tags
            .insert(PROJECT_CONFIG_TAG.to_string(), project_config.to_string());
    }

    /// 公共标签
    pub fn tags(&self) -> &HashMap<String, String> {
        &self.tags
    }

    /// 初始化标识
    pub fn initialization_id(&self) -> Option<&str> {
        self.tags.get(INITIALIZATION_ID_TAG).map(String::as_str)
    }

    /// 发送循环依赖诊断
    pub fn send_circular_dependency_diagnostics(&self, error: &dyn Display, tree: &Value) {
        let message = format!("{}\n{}", error, tree);
        self.sink
            .send_diagnostic(CIRCULAR_DEPENDENCY_DIAGNOSTIC, &message, &self.tags);
    }

    /// 发送核心包初始化诊断
    pub fn send_core_package_init_diagnostics(&self, error: &dyn Display) {
        self.sink.send_diagnostic(
            CORE_PACKAGE_INIT_DIAGNOSTIC,
            &error.to_string(),
            &self.tags,
        );
    }

    /// 发送服务初始化诊断
    pub fn send_operate_services_init_diagnostics(&self, error: &dyn Display) {
        self.sink.send_diagnostic(
            OPERATE_SERVICES_INIT_DIAGNOSTIC,
            &error.to_string(),
            &self.tags,
        );
    }
}

impl std::fmt::Debug for CoreDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreDiagnostics")
            .field("tags", &self.tags)
            .finish()
    }
}

/// 通过 tracing 输出的诊断
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn send_diagnostic(&self, name: &str, message: &str, tags: &HashMap<String, String>) {
        match name {
            CIRCULAR_DEPENDENCY_DIAGNOSTIC | OPERATE_SERVICES_INIT_DIAGNOSTIC => {
                error!(diagnostic = name, tags = ?tags, "{}", message)
            }
            _ => warn!(diagnostic = name, tags = ?tags, "{}", message),
        }
    }
}

/// 一条诊断记录
#[derive(Debug, Clone)]
pub struct DiagnosticRecord {
    /// 诊断名称
    pub name: String,
    /// 内容
    pub message: String,
    /// 标签
    pub tags: HashMap<String, String>,
    /// 记录时间
    pub recorded_at: DateTime<Utc>,
}

/// 保存在内存中的诊断，用于测试和演示
#[derive(Debug, Default)]
pub struct InMemoryDiagnostics {
    records: Mutex<Vec<DiagnosticRecord>>,
}

impl InMemoryDiagnostics {
    /// 创建空记录器
    pub fn new() -> Self {
        Self::default()
    }

    /// 所有记录
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().clone()
    }

    /// 指定名称的记录数量
    pub fn count(&self, name: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|record| record.name == name)
            .count()
    }

    /// 记录总数
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// 是否没有记录
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl Diagnostics for InMemoryDiagnostics {
    fn send_diagnostic(&self, name: &str, message: &str, tags: &HashMap<String, String>) {
        self.records.lock().push(DiagnosticRecord {
            name: name.to_string(),
            message: message.to_string(),
            tags: tags.clone(),
            recorded_at: Utc::now(),
        });
    }
}
