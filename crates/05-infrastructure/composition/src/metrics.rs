//! 启动指标

use dashmap::DashMap;
use registry_abstractions::Metrics;
use services_common::PackageId;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// 单个包初始化耗时
pub const PACKAGE_INIT_TIME_METRIC: &str = "package_init_time";
/// 全部包初始化成功次数
pub const ALL_PACKAGES_INIT_SUCCESS_METRIC: &str = "all_packages_init_success";
/// 全部包初始化总耗时
pub const ALL_PACKAGES_INIT_TIME_METRIC: &str = "all_packages_init_time";
/// 包名标签
pub const PACKAGE_NAME_TAG: &str = "package_name";

/// 核心指标
#[derive(Clone)]
pub struct CoreMetrics {
    sink: Arc<dyn Metrics>,
}

impl CoreMetrics {
    /// 创建核心指标
    pub fn new(sink: Arc<dyn Metrics>) -> Self {
        Self { sink }
    }

    /// 发送单个包的初始化耗时（秒）
    pub fn send_package_init_time(&self, package: &PackageId, seconds: f64) {
        let mut tags = HashMap::new();
        tags.insert(PACKAGE_NAME_TAG.to_string(), package.to_string());
        self.sink
            .send_histogram_metric(PACKAGE_INIT_TIME_METRIC, seconds, &tags);
    }

    /// 记录一次全部包初始化成功
    pub fn send_all_packages_init_success(&self) {
        self.sink
            .send_sum_metric(ALL_PACKAGES_INIT_SUCCESS_METRIC, 1.0, &HashMap::new());
    }

    /// 发送全部包初始化总耗时（秒）
    pub fn send_all_packages_init_time(&self, seconds: f64) {
        self.sink
            .send_histogram_metric(ALL_PACKAGES_INIT_TIME_METRIC, seconds, &HashMap::new());
    }
}

impl std::fmt::Debug for CoreMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreMetrics").finish_non_exhaustive()
    }
}

/// 通过 tracing 输出的指标
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMetrics;

impl Metrics for TracingMetrics {
    fn send_sum_metric(&self, name: &str, value: f64, tags: &HashMap<String, String>) {
        info!(metric = name, kind = "sum", value, tags = ?tags, "指标");
    }

    fn send_histogram_metric(&self, name: &str, value: f64, tags: &HashMap<String, String>) {
        info!(metric = name, kind = "histogram", value, tags = ?tags, "指标");
    }
}

/// 一条指标样本
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSample {
    /// 样本值
    pub value: f64,
    /// 标签
    pub tags: HashMap<String, String>,
}

/// 保存在内存中的指标
#[derive(Debug, Default)]
pub struct InMemoryMetrics {
    sums: DashMap<String, f64>,
    histograms: DashMap<String, Vec<MetricSample>>,
}

impl InMemoryMetrics {
    /// 创建空记录器
    pub fn new() -> Self {
        Self::default()
    }

    /// 累加指标当前值
    pub fn sum(&self, name: &str) -> f64 {
        self.sums.get(name).map(|value| *value).unwrap_or(0.0)
    }

    /// 直方图样本
    pub fn histogram(&self, name: &str) -> Vec<MetricSample> {
        self.histograms
            .get(name)
            .map(|samples| samples.clone())
            .unwrap_or_default()
    }
}

impl Metrics for InMemoryMetrics {
    fn send_sum_metric(&self, name: &str, value: f64, _tags: &HashMap<String, String>) {
        *self.sums.entry(name.to_string()).or_insert(0.0) += value;
    }

    fn send_histogram_metric(&self, name: &str, value: f64, tags: &HashMap<String, String>) {
        self.histograms
            .entry(name.to_string())
            .or_default()
            .push(MetricSample {
                value,
                tags: tags.clone(),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_metrics_recorded() {
        let sink = Arc::new(InMemoryMetrics::new());
        let metrics = CoreMetrics::new(sink.clone());

        metrics.send_package_init_time(&PackageId::from_static("core"), 0.25);
        metrics.send_all_packages_init_success();
        metrics.send_all_packages_init_success();
        metrics.send_all_packages_init_time(0.5);

        let samples = sink.histogram(PACKAGE_INIT_TIME_METRIC);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 0.25);
        assert_eq!(samples[0].tags[PACKAGE_NAME_TAG], "core");
        assert_eq!(sink.sum(ALL_PACKAGES_INIT_SUCCESS_METRIC), 2.0);
        assert_eq!(sink.histogram(ALL_PACKAGES_INIT_TIME_METRIC)[0].value, 0.5);
        assert!(sink.histogram("unknown").is_empty());
    }
}
